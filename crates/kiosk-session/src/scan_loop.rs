//! Reader polling loop.
//!
//! ```text
//! ChipReader ──try_read──> ScanLoop ──run / more_input──> Session ──> BookingApi
//!                             │                              │
//!                             └──── report_error ──> UiSink <┘
//! ```
//!
//! Cycles are strictly sequential: the pause before the next poll starts
//! only once the current cycle, backend calls included, has settled. The
//! loop holds at most one session and is the only place that creates or
//! discards it.

use crate::session::Session;
use kiosk_booking::BookingApi;
use kiosk_core::{SessionMode, Tunables, Uid};
use kiosk_hardware::ChipReader;
use kiosk_ui::UiSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

const READ_ERROR_CONTEXT: &str = "Error occurred while reading uid";

/// Collapses repeated reads of the same chip.
///
/// A read is accepted unless it is the same Uid as the last accepted read
/// and less than `window` has passed since then.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last: Option<(Uid, Instant)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Decide on a read at `now`, remembering it when accepted.
    pub fn accept(&mut self, uid: &Uid, now: Instant) -> bool {
        if let Some((last_uid, at)) = &self.last
            && last_uid == uid
            && now.saturating_duration_since(*at) < self.window
        {
            return false;
        }

        self.last = Some((uid.clone(), now));
        true
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No chip in range.
    NoRead,
    /// Same chip again within the debounce window.
    Debounced,
    /// Reading or acknowledging the chip failed; reported to the UI.
    ReadFailed,
    /// A new session was started.
    Started,
    /// The live session received further input.
    Continued,
    /// The live session is waiting on the backend; the read was dropped.
    SkippedBusy,
    /// The live session was in an impossible state and was cancelled.
    Recovered,
}

pub struct ScanLoop<R, B> {
    reader: R,
    api: Arc<B>,
    sink: Arc<dyn UiSink>,
    tunables: Tunables,
    mode: SessionMode,
    debouncer: Debouncer,
    session: Option<Session<B>>,
}

impl<R: ChipReader, B: BookingApi> ScanLoop<R, B> {
    pub fn new(
        reader: R,
        api: Arc<B>,
        sink: Arc<dyn UiSink>,
        tunables: Tunables,
        mode: SessionMode,
    ) -> Self {
        Self {
            reader,
            api,
            sink,
            debouncer: Debouncer::new(tunables.debounce),
            tunables,
            mode,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session<B>> {
        self.session.as_ref()
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Run one cycle: read, debounce, dispatch.
    pub async fn tick(&mut self) -> Tick {
        let uid = match self.reader.try_read().await {
            Ok(Some(uid)) => uid,
            Ok(None) => return Tick::NoRead,
            Err(e) => {
                self.sink.report_error(&e, READ_ERROR_CONTEXT);
                return Tick::ReadFailed;
            }
        };

        if !self.reader.is_manual() {
            if !self.debouncer.accept(&uid, Instant::now()) {
                trace!(%uid, "Debounced repeated read");
                return Tick::Debounced;
            }

            if let Err(e) = self.reader.feedback().await {
                self.sink.report_error(&e, READ_ERROR_CONTEXT);
                return Tick::ReadFailed;
            }
        }

        debug!(%uid, "Chip read");
        self.dispatch(&uid).await
    }

    async fn dispatch(&mut self, uid: &Uid) -> Tick {
        if self
            .session
            .as_ref()
            .is_some_and(|s| !s.is_active() && !s.is_busy())
        {
            trace!("Discarding finished session");
            self.session = None;
        }

        let state = self.session.as_ref().map(|s| (s.is_active(), s.is_busy()));

        match state {
            None => {
                let session = self.session.insert(Session::new(
                    self.mode,
                    Arc::clone(&self.api),
                    Arc::clone(&self.sink),
                    self.tunables.logout_timeout,
                ));
                session.run(uid).await;
                Tick::Started
            }
            Some((true, false)) => {
                if let Some(session) = &self.session {
                    session.more_input(uid).await;
                }
                Tick::Continued
            }
            Some((true, true)) => {
                debug!(%uid, "Session busy, dropping read");
                Tick::SkippedBusy
            }
            Some((active, busy)) => {
                warn!(
                    active,
                    busy,
                    "Unexpected edge case occurred, cancelling session"
                );
                if let Some(session) = self.session.take() {
                    session.cancel();
                }
                Tick::Recovered
            }
        }
    }

    /// Poll until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            mode = %self.mode,
            poll_period = ?self.tunables.poll_period,
            debounce = ?self.tunables.debounce,
            "Listening for chips"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.tick() => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.tunables.poll_period) => {}
            }
        }

        if let Some(session) = self.session.take() {
            session.cancel();
        }
        info!("Scan loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, RecordingSink, user_info};
    use kiosk_hardware::mock::{MockReader, MockReaderHandle};
    use proptest::prelude::*;

    const WINDOW: Duration = Duration::from_millis(3000);
    const LOGOUT: Duration = Duration::from_millis(30_000);

    struct Harness {
        scan_loop: ScanLoop<MockReader, FakeApi>,
        reader: MockReaderHandle,
        api: Arc<FakeApi>,
        ui: Arc<RecordingSink>,
    }

    impl Harness {
        fn new() -> Self {
            let (reader, handle) = MockReader::new();
            let api = Arc::new(
                FakeApi::default()
                    .on_lookup("abc123", || user_info("Ada", false)),
            );
            let ui = Arc::new(RecordingSink::default());
            let tunables = Tunables::new(3000, 200, 30_000).unwrap();
            let scan_loop = ScanLoop::new(
                reader,
                Arc::clone(&api),
                ui.clone(),
                tunables,
                SessionMode::Booking,
            );
            Self {
                scan_loop,
                reader: handle,
                api,
                ui,
            }
        }

        async fn tap(&mut self, token: &str) -> Tick {
            self.reader.present_chip(Uid::new(token).unwrap()).await.unwrap();
            self.scan_loop.tick().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_session_drops_read() {
        let mut harness = Harness::new();
        assert_eq!(harness.tap("abc123").await, Tick::Started);

        harness.scan_loop.session().unwrap().force_state(true, true);

        assert_eq!(harness.tap("dev01").await, Tick::SkippedBusy);
        assert_eq!(harness.api.bookings(), 0);
        assert_eq!(harness.ui.names(), ["gettingChipInfo", "userInfo"]);
        assert!(harness.scan_loop.session().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_busy_session_is_cancelled() {
        let mut harness = Harness::new();
        assert_eq!(harness.tap("abc123").await, Tick::Started);
        assert!(harness.scan_loop.session().unwrap().has_pending_logout());

        harness.scan_loop.session().unwrap().force_state(false, true);

        assert_eq!(harness.tap("dev01").await, Tick::Recovered);
        assert!(harness.scan_loop.session().is_none());
        assert_eq!(harness.api.lookups(), 1);
        assert_eq!(harness.api.bookings(), 0);

        // The cancelled session's logout timer never fires
        tokio::time::sleep(LOGOUT + Duration::from_millis(1)).await;
        assert_eq!(harness.ui.count("userLogout"), 0);

        // The next chip starts a fresh session
        assert_eq!(harness.tap("abc123").await, Tick::Started);
        assert_eq!(harness.api.lookups(), 2);
    }

    fn uid_strategy() -> impl Strategy<Value = Uid> {
        "[0-9a-f]{4,8}".prop_map(|s| Uid::new(&s).unwrap())
    }

    proptest! {
        #[test]
        fn prop_same_uid_within_window_collapses(uid in uid_strategy(), offset in 0u64..3000) {
            let mut debouncer = Debouncer::new(WINDOW);
            let start = Instant::now();

            prop_assert!(debouncer.accept(&uid, start));
            let later = start + Duration::from_millis(offset);
            prop_assert!(!debouncer.accept(&uid, later));
        }

        #[test]
        fn prop_same_uid_after_window_passes(uid in uid_strategy(), offset in 3000u64..60_000) {
            let mut debouncer = Debouncer::new(WINDOW);
            let start = Instant::now();

            prop_assert!(debouncer.accept(&uid, start));
            let later = start + Duration::from_millis(offset);
            prop_assert!(debouncer.accept(&uid, later));
        }

        #[test]
        fn prop_different_uid_always_passes(
            a in uid_strategy(),
            b in uid_strategy(),
            offset in 0u64..3000,
        ) {
            prop_assume!(a != b);
            let mut debouncer = Debouncer::new(WINDOW);
            let start = Instant::now();

            prop_assert!(debouncer.accept(&a, start));
            prop_assert!(debouncer.accept(&b, start + Duration::from_millis(offset)));
        }
    }

    #[test]
    fn test_window_restarts_only_on_accept() {
        let mut debouncer = Debouncer::new(WINDOW);
        let uid = Uid::new("abc123").unwrap();
        let start = Instant::now();

        assert!(debouncer.accept(&uid, start));
        assert!(!debouncer.accept(&uid, start + Duration::from_millis(2000)));
        // Suppressed reads do not extend the window
        assert!(debouncer.accept(&uid, start + Duration::from_millis(3000)));
    }
}
