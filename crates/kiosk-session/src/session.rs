//! Tap-sequence state machine.
//!
//! A session owns the resolution of one tap sequence: the first chip decides
//! whether a device comes back or a person logs in; further chips from a
//! logged-in person are devices to lend, or the person's own chip to log out.
//!
//! # States
//!
//! - `Idle`: no live session (the scan loop holds none)
//! - `Active`: a person is logged in and a second tap is awaited
//! - `Busy`: a backend call is in flight, further taps are dropped
//!
//! # Valid Transitions
//!
//! - Idle → Busy → Idle (device returned, rejection, fault)
//! - Idle → Busy → Active (person recognized)
//! - Active → Busy → Active (teacher booked a device)
//! - Active → Busy → Idle (booking finished, manual logout, fault)
//! - Active → Idle (logout timer elapsed)
//!
//! # Logout timer
//!
//! Every transition goes through [`complete`](BookingSession::complete),
//! which cancels the armed timer before arming a new one. Each arm carries a
//! generation number; a timer that already woke up but lost the race against
//! a newer transition sees a stale generation and does nothing.

use crate::registration::RegistrationSession;
use crate::timer::LogoutTimer;
use kiosk_booking::{BookingApi, BookingOutcome, ResponseKind};
use kiosk_core::{SessionMode, Uid};
use kiosk_ui::{ReturnTarget, UiEvent, UiSink};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

pub(crate) const CHECK_UID_CONTEXT: &str = "Error occurred while checking uid.";
const BOOK_DEVICE_CONTEXT: &str = "Error occurred while booking device.";
const UNKNOWN_RESPONSE_MESSAGE: &str = "Unknown API response.";

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub owner: Option<Uid>,
    pub active: bool,
    pub busy: bool,
    generation: u64,
    timer: Option<LogoutTimer>,
}

impl SessionState {
    /// Invalidate the armed timer, if any.
    fn cancel_timer(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(timer) = self.timer.take() {
            trace!(generation = self.generation, "Logout timer cancelled");
            timer.cancel();
        }
    }
}

/// State and collaborators shared by every session variant.
#[derive(Clone)]
pub(crate) struct SessionCore {
    state: Arc<Mutex<SessionState>>,
    pub sink: Arc<dyn UiSink>,
    logout_timeout: Duration,
}

impl SessionCore {
    pub fn new(sink: Arc<dyn UiSink>, logout_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            sink,
            logout_timeout,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enter `Busy` from `Idle`. Returns `false` if the session is already
    /// active, in which case nothing changes.
    pub fn begin_run(&self) -> bool {
        let mut state = self.lock();
        if state.active {
            return false;
        }
        state.active = true;
        state.busy = true;
        true
    }

    pub fn complete(&self, more_allowed: bool, infinite_timeout: bool) {
        let mut state = self.lock();
        self.settle(&mut state, more_allowed, infinite_timeout);
    }

    fn settle(&self, state: &mut SessionState, more_allowed: bool, infinite_timeout: bool) {
        state.busy = true;
        state.active = more_allowed;
        state.cancel_timer();

        if more_allowed && !infinite_timeout {
            state.timer = Some(self.arm_logout(state.generation));
        }

        state.busy = false;
        debug!(
            active = state.active,
            logout_armed = state.timer.is_some(),
            "Session settled"
        );
    }

    fn arm_logout(&self, generation: u64) -> LogoutTimer {
        let state = Arc::downgrade(&self.state);
        let sink = Arc::clone(&self.sink);
        let logout_timeout = self.logout_timeout;

        LogoutTimer::arm(logout_timeout, move || {
            fire_logout(state, sink, logout_timeout, generation);
        })
    }

    pub fn has_pending_logout(&self) -> bool {
        self.lock().timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn push_unknown_response(&self) {
        self.sink.push_ui(UiEvent::Error {
            kind: ResponseKind::UnexpectedError,
            message: UNKNOWN_RESPONSE_MESSAGE.to_string(),
            return_target: ReturnTarget::Home,
        });
    }
}

fn fire_logout(
    state: Weak<Mutex<SessionState>>,
    sink: Arc<dyn UiSink>,
    logout_timeout: Duration,
    generation: u64,
) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let core = SessionCore {
        state,
        sink,
        logout_timeout,
    };

    {
        let mut state = core.lock();
        if state.generation != generation || state.busy {
            trace!(generation, "Ignoring stale logout timer");
            return;
        }
        info!(timeout = ?logout_timeout, "No input before logout timeout, logging out");
        core.settle(&mut state, false, false);
    }

    core.sink.push_ui(UiEvent::UserLogout);
}

/// Standard kiosk session: return devices, log in, lend devices.
pub struct BookingSession<B> {
    core: SessionCore,
    api: Arc<B>,
}

impl<B: BookingApi> BookingSession<B> {
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

    /// Chip of the logged-in person, if any.
    pub fn owner(&self) -> Option<Uid> {
        self.core.lock().owner.clone()
    }

    pub fn has_pending_logout(&self) -> bool {
        self.core.has_pending_logout()
    }

    /// Handle the first chip of a tap sequence.
    pub async fn run(&self, uid: &Uid) {
        if !self.core.begin_run() {
            debug!(%uid, "Session already active, ignoring run");
            return;
        }

        let sink = &self.core.sink;
        sink.push_ui(UiEvent::GettingChipInfo);

        match self.api.unknown_action_for_uid(uid).await {
            BookingOutcome::Success {
                kind: ResponseKind::DeviceReturned,
                ..
            } => {
                info!(%uid, "Device returned");
                sink.push_ui(UiEvent::DeviceReturned);
                self.complete(false, false);
            }
            BookingOutcome::Success {
                kind: ResponseKind::UserInfo,
                user: Some(user),
                ..
            } => {
                let teacher = user.teacher;
                info!(%uid, user_id = user.user_id, teacher, "User logged in");
                self.core.lock().owner = Some(uid.clone());
                sink.push_ui(UiEvent::UserInfo { user });
                self.complete(true, teacher);
            }
            BookingOutcome::BusinessError { kind, message, .. } => {
                info!(%uid, %kind, "Chip rejected");
                sink.push_ui(UiEvent::Error {
                    kind,
                    message,
                    return_target: ReturnTarget::Home,
                });
                self.complete(false, false);
            }
            BookingOutcome::TransportFault(e) => {
                sink.report_error(&e, CHECK_UID_CONTEXT);
                self.complete(false, false);
            }
            other => {
                warn!(%uid, outcome = ?other, "Unexpected reply while checking uid");
                self.core.push_unknown_response();
                self.complete(false, false);
            }
        }
    }

    /// Handle a further chip while a person is logged in.
    pub async fn more_input(&self, uid: &Uid) {
        let owner = {
            let mut state = self.core.lock();
            if !state.active || state.busy {
                return;
            }
            let Some(owner) = state.owner.clone() else {
                return;
            };
            state.busy = true;
            state.cancel_timer();
            owner
        };

        let sink = &self.core.sink;

        if *uid == owner {
            info!(%uid, "Owner chip scanned again, logging out");
            sink.push_ui(UiEvent::UserLogout);
            self.complete(false, false);
            return;
        }

        sink.push_ui(UiEvent::DeviceBookingLoading);

        let outcome = self.api.book(&owner, uid).await;
        let teacher = outcome.is_teacher();
        let return_target = ReturnTarget::for_teacher(teacher);

        match outcome {
            BookingOutcome::Success { kind, .. } => {
                info!(user = %owner, device = %uid, %kind, "Device booked");
                sink.push_ui(UiEvent::DeviceBookingCompleted { return_target });
                self.complete(teacher, teacher);
            }
            BookingOutcome::BusinessError { kind, message, .. } => {
                info!(user = %owner, device = %uid, %kind, "Booking rejected");
                sink.push_ui(UiEvent::Error {
                    kind,
                    message,
                    return_target,
                });
                self.complete(teacher, teacher);
            }
            BookingOutcome::Malformed { message } => {
                warn!(%message, "Unexpected reply while booking device");
                self.core.push_unknown_response();
                self.complete(false, false);
            }
            BookingOutcome::TransportFault(e) => {
                sink.report_error(&e, BOOK_DEVICE_CONTEXT);
                self.complete(false, false);
            }
        }
    }

    /// Settle the current operation.
    ///
    /// `more_allowed` keeps the session active for another tap; unless
    /// `infinite_timeout` is set, an idle logout is scheduled.
    pub fn complete(&self, more_allowed: bool, infinite_timeout: bool) {
        self.core.complete(more_allowed, infinite_timeout);
    }

    /// Force the session into its terminal state.
    pub fn cancel(&self) {
        self.complete(false, false);
    }
}

/// The session variant in use, chosen once at startup.
pub enum Session<B> {
    Booking(BookingSession<B>),
    Registration(RegistrationSession<B>),
}

impl<B: BookingApi> Session<B> {
    pub fn new(
        mode: SessionMode,
        api: Arc<B>,
        sink: Arc<dyn UiSink>,
        logout_timeout: Duration,
    ) -> Self {
        match mode {
            SessionMode::Booking => {
                Session::Booking(BookingSession::new(api, sink, logout_timeout))
            }
            SessionMode::Registration => {
                Session::Registration(RegistrationSession::new(api, sink, logout_timeout))
            }
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Session::Booking(s) => s.is_active(),
            Session::Registration(s) => s.is_active(),
        }
    }

    pub fn is_busy(&self) -> bool {
        match self {
            Session::Booking(s) => s.is_busy(),
            Session::Registration(s) => s.is_busy(),
        }
    }

    pub fn has_pending_logout(&self) -> bool {
        match self {
            Session::Booking(s) => s.has_pending_logout(),
            Session::Registration(_) => false,
        }
    }

    pub async fn run(&self, uid: &Uid) {
        match self {
            Session::Booking(s) => s.run(uid).await,
            Session::Registration(s) => s.run(uid).await,
        }
    }

    pub async fn more_input(&self, uid: &Uid) {
        match self {
            Session::Booking(s) => s.more_input(uid).await,
            Session::Registration(s) => s.more_input(uid).await,
        }
    }

    pub fn complete(&self, more_allowed: bool, infinite_timeout: bool) {
        match self {
            Session::Booking(s) => s.complete(more_allowed, infinite_timeout),
            Session::Registration(s) => s.complete(more_allowed, infinite_timeout),
        }
    }

    pub fn cancel(&self) {
        match self {
            Session::Booking(s) => s.cancel(),
            Session::Registration(s) => s.cancel(),
        }
    }

    /// Overwrite the state flags without going through a transition.
    #[cfg(test)]
    pub(crate) fn force_state(&self, active: bool, busy: bool) {
        let core = match self {
            Session::Booking(s) => &s.core,
            Session::Registration(s) => &s.core,
        };
        let mut state = core.lock();
        state.active = active;
        state.busy = busy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, RecordingSink, user_info};
    use kiosk_booking::BookingError;

    const LOGOUT: Duration = Duration::from_secs(30);

    fn uid(token: &str) -> Uid {
        Uid::new(token).unwrap()
    }

    fn session(api: FakeApi) -> (BookingSession<FakeApi>, Arc<FakeApi>, Arc<RecordingSink>) {
        let api = Arc::new(api);
        let sink = Arc::new(RecordingSink::default());
        let session = BookingSession::new(Arc::clone(&api), sink.clone(), LOGOUT);
        (session, api, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_false_clears_timer() {
        let (session, _api, _sink) = session(FakeApi::default());

        session.complete(true, false);
        assert!(session.is_active());
        assert!(session.has_pending_logout());

        session.complete(false, false);
        assert!(!session.is_active());
        assert!(!session.is_busy());
        assert!(!session.has_pending_logout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_infinite_timeout_arms_nothing() {
        let (session, _api, _sink) = session(FakeApi::default());

        session.complete(true, true);

        assert!(session.is_active());
        assert!(!session.has_pending_logout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_fires_once() {
        let (session, _api, sink) = session(FakeApi::default());

        session.complete(true, false);
        tokio::time::sleep(Duration::from_secs(20)).await;
        session.complete(true, false);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(sink.count("userLogout"), 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(sink.count("userLogout"), 1);
        assert!(!session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_returned() {
        let (session, _api, sink) =
            session(FakeApi::default().on_lookup("ret01", || BookingOutcome::Success {
                kind: ResponseKind::DeviceReturned,
                message: String::new(),
                user: None,
                device: None,
            }));

        session.run(&uid("ret01")).await;

        assert_eq!(sink.names(), ["gettingChipInfo", "deviceReturned"]);
        assert!(!session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teacher_login_has_no_logout() {
        let (session, _api, sink) = session(
            FakeApi::default()
                .on_lookup("t01", || user_info("Grace", true)),
        );

        session.run(&uid("t01")).await;

        assert_eq!(sink.names(), ["gettingChipInfo", "userInfo"]);
        assert_eq!(session.owner(), Some(uid("t01")));
        assert!(session.is_active());
        assert!(!session.has_pending_logout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_is_idempotent_while_active() {
        let (session, api, _sink) = session(
            FakeApi::default()
                .on_lookup("abc123", || user_info("Ada", false)),
        );

        session.run(&uid("abc123")).await;
        session.run(&uid("abc123")).await;

        assert_eq!(api.lookups(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_business_error_goes_home() {
        let (session, _api, sink) =
            session(FakeApi::default().on_lookup("zzz", || BookingOutcome::BusinessError {
                kind: ResponseKind::UuidNotFound,
                message: "Unknown chip".to_string(),
                user: None,
            }));

        session.run(&uid("zzz")).await;

        assert_eq!(
            sink.last(),
            Some(UiEvent::Error {
                kind: ResponseKind::UuidNotFound,
                message: "Unknown chip".to_string(),
                return_target: ReturnTarget::Home,
            })
        );
        assert!(!session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_reply_is_unexpected_error() {
        let (session, _api, sink) =
            session(FakeApi::default().on_lookup("abc123", || BookingOutcome::Malformed {
                message: "Unknown response status '2'".to_string(),
            }));

        session.run(&uid("abc123")).await;

        assert_eq!(
            sink.last(),
            Some(UiEvent::Error {
                kind: ResponseKind::UnexpectedError,
                message: UNKNOWN_RESPONSE_MESSAGE.to_string(),
                return_target: ReturnTarget::Home,
            })
        );
        assert!(!session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_fault_is_reported() {
        let (session, _api, sink) = session(FakeApi::default().on_lookup("abc123", || {
            BookingOutcome::TransportFault(BookingError::Request("refused".to_string()))
        }));

        session.run(&uid("abc123")).await;

        assert_eq!(
            sink.last(),
            Some(UiEvent::Error {
                kind: ResponseKind::UnexpectedError,
                message: CHECK_UID_CONTEXT.to_string(),
                return_target: ReturnTarget::Home,
            })
        );
        assert!(!session.is_active());
        assert!(!session.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_owner_retap_logs_out_without_network() {
        let (session, api, sink) = session(
            FakeApi::default()
                .on_lookup("abc123", || user_info("Ada", false)),
        );

        session.run(&uid("abc123")).await;
        session.more_input(&uid("abc123")).await;

        assert_eq!(sink.last(), Some(UiEvent::UserLogout));
        assert_eq!(api.bookings(), 0);
        assert!(!session.is_active());
        assert!(!session.has_pending_logout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_booking_rejection_for_teacher_returns_to_user_home() {
        let (session, _api, sink) = session(
            FakeApi::default()
                .on_lookup("t01", || user_info("Grace", true))
                .on_book(|| match user_info("Grace", true) {
                    BookingOutcome::Success { user, .. } => BookingOutcome::BusinessError {
                        kind: ResponseKind::DeviceAlreadyBooked,
                        message: "Already lent".to_string(),
                        user,
                    },
                    other => other,
                }),
        );

        session.run(&uid("t01")).await;
        session.more_input(&uid("dev99")).await;

        assert_eq!(
            sink.last(),
            Some(UiEvent::Error {
                kind: ResponseKind::DeviceAlreadyBooked,
                message: "Already lent".to_string(),
                return_target: ReturnTarget::UserHome,
            })
        );
        assert!(session.is_active());
        assert!(!session.has_pending_logout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_session_rejects_concurrent_input() {
        let (session, api, _sink) = session(
            FakeApi::default()
                .on_lookup("abc123", || user_info("Ada", false))
                .with_delay(Duration::from_secs(1)),
        );
        session.run(&uid("abc123")).await;

        let (dev01, dev02) = (uid("dev01"), uid("dev02"));
        let first = session.more_input(&dev01);
        let second = async {
            tokio::task::yield_now().await;
            assert!(session.is_busy());
            session.more_input(&dev02).await;
        };
        tokio::join!(first, second);

        assert_eq!(api.bookings(), 1);
    }
}
