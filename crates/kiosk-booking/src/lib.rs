//! Booking backend access for the device check-out kiosk.
//!
//! This crate turns the backend's wire replies into a closed outcome model:
//!
//! - [`ResponseKind`]: the fixed table of status identifiers, with a total
//!   [`lookup`](ResponseKind::lookup)
//! - [`BookingOutcome`]: success, business rejection, malformed reply or
//!   transport fault
//! - [`BookingApi`]: the operations sessions call, implemented over HTTP by
//!   [`HttpBookingClient`]

mod client;
pub mod model;
mod outcome;
mod response;

pub use client::{BookingApi, BookingClientConfig, HttpBookingClient};
pub use model::{ApiDevice, ApiUser};
pub use outcome::{BookingError, BookingOutcome};
pub use response::{Lookup, ResponseKind};
