//! Chip enrollment session.
//!
//! In registration mode the kiosk does not lend anything. Every tap asks the
//! backend whether the chip is already known and shows the chip to the
//! operator, who registers it through the UI.

use crate::session::{CHECK_UID_CONTEXT, SessionCore};
use kiosk_booking::{BookingApi, BookingOutcome, ResponseKind};
use kiosk_core::Uid;
use kiosk_ui::{UiEvent, UiSink};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct RegistrationSession<B> {
    pub(crate) core: SessionCore,
    api: Arc<B>,
}

impl<B: BookingApi> RegistrationSession<B> {
    pub fn new(api: Arc<B>, sink: Arc<dyn UiSink>, logout_timeout: Duration) -> Self {
        Self {
            core: SessionCore::new(sink, logout_timeout),
            api,
        }
    }

    pub fn is_active(&self) -> bool {
        self.core.lock().active
    }

    pub fn is_busy(&self) -> bool {
        self.core.lock().busy
    }

    pub async fn run(&self, uid: &Uid) {
        if !self.core.begin_run() {
            return;
        }

        let sink = &self.core.sink;
        sink.push_ui(UiEvent::GettingChipInfo);

        match self.api.unknown_action_for_uid(uid).await {
            BookingOutcome::TransportFault(e) => sink.report_error(&e, CHECK_UID_CONTEXT),
            BookingOutcome::Malformed { message } => {
                warn!(%uid, %message, "Unexpected reply while checking uid");
                self.core.push_unknown_response();
            }
            outcome => {
                let known = outcome.kind() != Some(ResponseKind::UuidNotFound);
                info!(%uid, known, "Chip scanned for registration");
                sink.push_ui(UiEvent::ChipScanned {
                    uid: uid.clone(),
                    known,
                });
            }
        }

        self.complete(false, false);
    }

    /// Registration sessions never wait for a second tap.
    pub async fn more_input(&self, uid: &Uid) {
        debug!(%uid, "Ignoring further input in registration mode");
    }

    pub fn complete(&self, more_allowed: bool, infinite_timeout: bool) {
        self.core.complete(more_allowed, infinite_timeout);
    }

    pub fn cancel(&self) {
        self.complete(false, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, RecordingSink, user_info};
    use kiosk_booking::BookingError;

    fn uid(token: &str) -> Uid {
        Uid::new(token).unwrap()
    }

    fn session(api: FakeApi) -> (RegistrationSession<FakeApi>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let session =
            RegistrationSession::new(Arc::new(api), sink.clone(), Duration::from_secs(30));
        (session, sink)
    }

    #[tokio::test]
    async fn test_unknown_chip() {
        let (session, sink) = session(FakeApi::default());

        session.run(&uid("4abcef")).await;

        assert_eq!(
            sink.events(),
            [
                UiEvent::GettingChipInfo,
                UiEvent::ChipScanned {
                    uid: uid("4abcef"),
                    known: false
                }
            ]
        );
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_known_chip() {
        let (session, sink) = session(
            FakeApi::default()
                .on_lookup("abc123", || user_info("Ada", false)),
        );

        session.run(&uid("abc123")).await;

        assert_eq!(
            sink.last(),
            Some(UiEvent::ChipScanned {
                uid: uid("abc123"),
                known: true
            })
        );
    }

    #[tokio::test]
    async fn test_transport_fault() {
        let (session, sink) = session(FakeApi::default().on_lookup("abc123", || {
            BookingOutcome::TransportFault(BookingError::Status { code: 503 })
        }));

        session.run(&uid("abc123")).await;

        assert_eq!(sink.names(), ["gettingChipInfo", "error"]);
        assert!(!session.is_active());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_more_input_is_ignored() {
        let (session, sink) = session(FakeApi::default());

        session.more_input(&uid("abc123")).await;

        assert!(sink.events().is_empty());
    }
}
