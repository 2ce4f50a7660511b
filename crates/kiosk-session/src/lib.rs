//! Scan sessions for the check-out kiosk.
//!
//! This crate turns physical chip reads into booking operations:
//!
//! - **ScanLoop**: polls the reader, debounces, owns the live session
//! - **Session**: tap-sequence state machine (booking or registration)
//! - **LogoutTimer**: cancellable idle-logout watchdog
//!
//! # Example
//!
//! ```no_run
//! use kiosk_core::{SessionMode, Tunables};
//! use kiosk_hardware::mock::MockReader;
//! use kiosk_session::ScanLoop;
//! use kiosk_session::testing::{FakeApi, RecordingSink};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let (reader, _handle) = MockReader::new();
//! let scan_loop = ScanLoop::new(
//!     reader,
//!     Arc::new(FakeApi::default()),
//!     Arc::new(RecordingSink::default()),
//!     Tunables::default(),
//!     SessionMode::Booking,
//! );
//! scan_loop.run(CancellationToken::new()).await;
//! # }
//! ```

pub mod registration;
pub mod scan_loop;
pub mod session;
pub mod testing;
pub mod timer;

pub use registration::RegistrationSession;
pub use scan_loop::{Debouncer, ScanLoop, Tick};
pub use session::{BookingSession, Session};
pub use timer::LogoutTimer;
