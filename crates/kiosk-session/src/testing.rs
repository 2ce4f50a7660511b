//! In-memory stand-ins for the UI and the booking backend.
//!
//! Used by the tests of this crate and by anyone driving sessions without a
//! real backend, such as demos.

use kiosk_booking::{ApiUser, BookingApi, BookingOutcome, ResponseKind};
use kiosk_core::Uid;
use kiosk_ui::{UiEvent, UiSink};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// UI sink remembering every pushed event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wire names of the pushed events, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(UiEvent::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().into_iter().filter(|n| *n == name).count()
    }

    pub fn last(&self) -> Option<UiEvent> {
        self.events().pop()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl UiSink for RecordingSink {
    fn push_ui(&self, event: UiEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

type Reply = Box<dyn Fn() -> BookingOutcome + Send + Sync>;

/// Scripted booking backend counting the calls it receives.
///
/// Unscripted chips are unknown (`UUID_NOT_FOUND`); unscripted bookings
/// succeed.
#[derive(Default)]
pub struct FakeApi {
    lookup: HashMap<String, Reply>,
    book: Option<Reply>,
    delay: Option<Duration>,
    lookups: AtomicUsize,
    booked: Mutex<Vec<(Uid, Uid)>>,
}

impl FakeApi {
    pub fn on_lookup<F>(mut self, uid: &str, reply: F) -> Self
    where
        F: Fn() -> BookingOutcome + Send + Sync + 'static,
    {
        self.lookup.insert(uid.to_string(), Box::new(reply));
        self
    }

    pub fn on_book<F>(mut self, reply: F) -> Self
    where
        F: Fn() -> BookingOutcome + Send + Sync + 'static,
    {
        self.book = Some(Box::new(reply));
        self
    }

    /// Make every call take this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn bookings(&self) -> usize {
        self.booked().len()
    }

    /// `(user, device)` pairs of every booking request, in order.
    pub fn booked(&self) -> Vec<(Uid, Uid)> {
        self.booked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn wait(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl BookingApi for FakeApi {
    async fn unknown_action_for_uid(&self, uid: &Uid) -> BookingOutcome {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.wait().await;

        match self.lookup.get(uid.as_str()) {
            Some(reply) => reply(),
            None => BookingOutcome::BusinessError {
                kind: ResponseKind::UuidNotFound,
                message: "Unknown chip".to_string(),
                user: None,
            },
        }
    }

    async fn book(&self, user_uid: &Uid, device_uid: &Uid) -> BookingOutcome {
        self.booked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((user_uid.clone(), device_uid.clone()));
        self.wait().await;

        match &self.book {
            Some(reply) => reply(),
            None => BookingOutcome::Success {
                kind: ResponseKind::DeviceBooked,
                message: String::new(),
                user: None,
                device: None,
            },
        }
    }
}

/// A `USER_INFO` reply for a person with the given first name.
pub fn user_info(name: &str, teacher: bool) -> BookingOutcome {
    BookingOutcome::Success {
        kind: ResponseKind::UserInfo,
        message: String::new(),
        user: Some(ApiUser {
            name: name.to_string(),
            lastname: "Tester".to_string(),
            user_id: 1,
            class: (!teacher).then(|| "10b".to_string()),
            teacher,
            history: None,
        }),
        device: None,
    }
}
