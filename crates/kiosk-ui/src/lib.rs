//! UI side of the kiosk.
//!
//! The kiosk UI is a browser page connected over a websocket. This crate
//! provides:
//!
//! - **Protocol**: JSON envelopes and the [`UiEvent`] state changes
//! - **EventBus**: per-connection routing of inbound UI events to listeners
//! - **Hub**: the [`UiSink`] sessions push to, fanning out to all connections
//! - **Server**: the axum websocket endpoint with idle detection

pub mod bus;
pub mod hub;
pub mod protocol;
pub mod server;

pub use bus::{Dispatch, EventBus, Listener, Responder, UiSink, ping_listener};
pub use hub::{ConnectionInfo, UiHub};
pub use protocol::{Inbound, Outbound, ReturnTarget, UiEvent};
pub use server::{UiServer, UiServerConfig, UiServerError, run_connection};
