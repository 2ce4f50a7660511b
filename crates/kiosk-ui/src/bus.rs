//! Per-connection event dispatch between the UI and the kiosk.
//!
//! Every UI connection owns one [`EventBus`]. Inbound text frames are parsed
//! and routed to the listeners registered for their event name; outbound
//! traffic goes through the connection's [`Responder`].
//!
//! ```text
//! UI ──text frame──> EventBus::handle_message ──> Listener(s)
//!  ^                                                  │
//!  └──────────── Responder (outbound queue) <─────────┘
//! ```

use crate::protocol::{Inbound, Outbound, ReturnTarget, UiEvent};
use kiosk_booking::ResponseKind;
use kiosk_core::constants::PING_EVENT;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

/// Anything that can show kiosk state changes to the UI.
///
/// Sessions talk to this trait; the server side decides which connections
/// actually receive the events.
pub trait UiSink: Send + Sync {
    /// Push a state change to the UI.
    fn push_ui(&self, event: UiEvent);

    /// Log an unexpected failure and show a generic error screen.
    ///
    /// Never fails and never propagates; the kiosk keeps running.
    fn report_error(&self, err: &dyn std::error::Error, context: &str) {
        error!(error = %err, "{context}");
        self.push_ui(UiEvent::Error {
            kind: ResponseKind::UnexpectedError,
            message: context.to_string(),
            return_target: ReturnTarget::Home,
        });
    }
}

/// Outbound handle of a single UI connection.
#[derive(Debug, Clone)]
pub struct Responder {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Responder {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }

    /// Queue a message for the connection.
    ///
    /// Returns `false` if the connection is gone.
    pub fn send(&self, message: Outbound) -> bool {
        self.tx.send(message).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl UiSink for Responder {
    fn push_ui(&self, event: UiEvent) {
        trace!(event = event.name(), "Pushing UI event");
        if !self.send(event.into()) {
            debug!("UI connection closed, event dropped");
        }
    }
}

type Callback = Arc<dyn Fn(&Responder, &Value) + Send + Sync>;

/// Callback bound to one event name.
#[derive(Clone)]
pub struct Listener {
    event_name: String,
    callback: Callback,
}

impl Listener {
    pub fn new<F>(event_name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Responder, &Value) + Send + Sync + 'static,
    {
        Self {
            event_name: event_name.into(),
            callback: Arc::new(callback),
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("event_name", &self.event_name)
            .finish_non_exhaustive()
    }
}

/// Answers UI keep-alive pings.
pub fn ping_listener() -> Listener {
    Listener::new(PING_EVENT, |responder, _data| {
        responder.send(Outbound::reply_to(PING_EVENT));
    })
}

/// What happened to an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Not an event envelope; silently dropped.
    Ignored,
    /// Not valid JSON or no event name; answered with `INVALID_REQUEST`.
    Invalid,
    /// No listener for the event; answered with `UNKNOWN_EVENT`.
    Unknown,
    /// Delivered to this many listeners.
    Delivered(usize),
}

/// Event router for one UI connection.
#[derive(Debug)]
pub struct EventBus {
    responder: Responder,
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new(responder: Responder) -> Self {
        Self {
            responder,
            listeners: Vec::new(),
        }
    }

    /// Register a listener. Listeners fire in registration order.
    pub fn listen(&mut self, listener: Listener) {
        debug!(event = listener.event_name(), "Listener registered");
        self.listeners.push(listener);
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Parse an inbound text frame and route it.
    ///
    /// Only unparseable JSON and event messages without a name are answered
    /// with `INVALID_REQUEST`; anything that is not an event is dropped.
    pub fn handle_message(&self, raw: &str) -> Dispatch {
        let inbound = match serde_json::from_str::<Value>(raw) {
            Ok(value) => Inbound::from_value(value),
            Err(e) => {
                warn!(error = %e, "Invalid message from UI");
                self.responder.send(Outbound::invalid_request());
                return Dispatch::Invalid;
            }
        };

        if !inbound.is_event() {
            trace!(kind = ?inbound.kind, "Ignoring non-event message");
            return Dispatch::Ignored;
        }

        let Some(event) = inbound.event_name() else {
            warn!("Event message without event name");
            self.responder.send(Outbound::invalid_request());
            return Dispatch::Invalid;
        };
        let name = event.as_str();

        let data = inbound
            .data
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));

        let mut delivered = 0;
        for listener in self
            .listeners
            .iter()
            .filter(|l| Some(l.event_name.as_str()) == name)
        {
            (listener.callback)(&self.responder, &data);
            delivered += 1;
        }

        if delivered == 0 {
            debug!(%event, "No listener for UI event");
            self.responder.send(Outbound::unknown_event());
            return Dispatch::Unknown;
        }

        trace!(%event, listeners = delivered, "UI event dispatched");
        Dispatch::Delivered(delivered)
    }
}

impl UiSink for EventBus {
    fn push_ui(&self, event: UiEvent) {
        self.responder.push_ui(event);
    }
}
