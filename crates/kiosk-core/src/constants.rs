//! Default tunables and wire names shared across the kiosk crates.
//!
//! All durations are expressed in milliseconds, matching the way the
//! deployment environment supplies them (`READ_TIMEOUT`, `READ_CYCLE`,
//! `LOGOUT_TIMEOUT`, ...).
//!
//! # Usage
//!
//! ```
//! use kiosk_core::constants::*;
//! use std::time::Duration;
//!
//! let debounce = Duration::from_millis(DEFAULT_DEBOUNCE_MS);
//! assert!(debounce > Duration::from_millis(DEFAULT_POLL_PERIOD_MS));
//! ```

// ============================================================================
// Scan loop
// ============================================================================

/// Window during which a repeated read of the same chip is ignored.
pub const DEFAULT_DEBOUNCE_MS: u64 = 3_000;

/// Delay between two consecutive reader polls.
pub const DEFAULT_POLL_PERIOD_MS: u64 = 200;

// ============================================================================
// Session
// ============================================================================

/// Idle time after which a logged-in (non-teacher) user is logged out.
pub const DEFAULT_LOGOUT_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// Network
// ============================================================================

/// Timeout for a single request to the booking backend.
pub const DEFAULT_API_TIMEOUT_MS: u64 = 5_000;

/// Interval at which the UI pings the backend.
///
/// The UI gives up on the connection if a ping is not answered within
/// [`UI_PING_REPLY_TIMEOUT_MS`].
pub const UI_PING_INTERVAL_MS: u64 = 15_000;

/// Time the UI waits for a ping reply before reconnecting.
pub const UI_PING_REPLY_TIMEOUT_MS: u64 = 3_000;

/// A UI connection that stays silent this long is considered lost.
///
/// Three missed ping intervals.
pub const DEFAULT_UI_IDLE_TIMEOUT_MS: u64 = 3 * UI_PING_INTERVAL_MS;

/// Default bind address of the UI websocket server.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8081";

/// Path of the UI websocket endpoint.
pub const UI_WEBSOCKET_PATH: &str = "/ws/ui";

// ============================================================================
// UI wire protocol
// ============================================================================

/// Envelope type of UI-initiated events and backend pushes.
pub const ENVELOPE_EVENT: &str = "event";

/// Envelope type of backend replies to UI requests.
pub const ENVELOPE_RESPONSE: &str = "response";

/// Event name of the UI liveness ping.
pub const PING_EVENT: &str = "ping";

/// Reply error code for requests that cannot be parsed.
pub const ERROR_INVALID_REQUEST: &str = "INVALID_REQUEST";

/// Reply error code for events without a registered listener.
pub const ERROR_UNKNOWN_EVENT: &str = "UNKNOWN_EVENT";
