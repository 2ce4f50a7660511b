//! JSON envelopes exchanged with the kiosk UI.
//!
//! ```text
//! UI -> backend   {"type":"event","event":"ping","data":{...}}
//! backend -> UI   {"type":"response","success":false,"error":"UNKNOWN_EVENT","message":"..."}
//! backend -> UI   {"type":"event","event":"userInfo","data":{"user":{...}}}
//! ```

use kiosk_booking::{ApiUser, ResponseKind};
use kiosk_core::Uid;
use kiosk_core::constants::{ENVELOPE_EVENT, ERROR_INVALID_REQUEST, ERROR_UNKNOWN_EVENT};
use serde::Serialize;
use serde_json::{Value, json};

/// Message received from the UI.
///
/// Read leniently out of any JSON value: frames that are not objects, or
/// whose fields have unexpected types, simply lack those fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inbound {
    pub kind: Option<Value>,
    pub event: Option<Value>,
    pub data: Option<Value>,
}

impl Inbound {
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };

        Self {
            kind: map.remove("type"),
            event: map.remove("event"),
            data: map.remove("data"),
        }
    }

    pub fn is_event(&self) -> bool {
        self.kind.as_ref().and_then(Value::as_str) == Some(ENVELOPE_EVENT)
    }

    /// The event name, unless missing or blank (`null`, `""`, `false`, `0`).
    pub fn event_name(&self) -> Option<&Value> {
        self.event.as_ref().filter(|event| !is_blank(event))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Message sent to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    /// Reply to a UI request.
    Response {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Name of the event being answered.
        #[serde(skip_serializing_if = "Option::is_none")]
        to: Option<String>,
    },
    /// Pushed UI state change.
    Event {
        event: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
}

impl Outbound {
    pub fn invalid_request() -> Self {
        Outbound::Response {
            success: false,
            error: Some(ERROR_INVALID_REQUEST.to_string()),
            message: Some("Received invalid JSON object".to_string()),
            to: None,
        }
    }

    pub fn unknown_event() -> Self {
        Outbound::Response {
            success: false,
            error: Some(ERROR_UNKNOWN_EVENT.to_string()),
            message: Some("The specified event was not found".to_string()),
            to: None,
        }
    }

    /// Successful reply correlated with the event it answers.
    pub fn reply_to(event: &str) -> Self {
        Outbound::Response {
            success: true,
            error: None,
            message: None,
            to: Some(event.to_string()),
        }
    }

    /// Serialize to the text frame sent over the socket.
    ///
    /// # Errors
    /// Returns an error if a payload value fails to serialize.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Screen the UI returns to after an error or a finished booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnTarget {
    /// Idle screen, the session is over.
    Home,
    /// The logged-in user's overview, the session continues.
    UserHome,
}

impl ReturnTarget {
    /// Teachers stay logged in after a booking; everyone else goes home.
    pub fn for_teacher(is_teacher: bool) -> Self {
        if is_teacher {
            ReturnTarget::UserHome
        } else {
            ReturnTarget::Home
        }
    }
}

/// UI state changes pushed by the kiosk.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Loading,
    Waiting,
    GettingChipInfo,
    UserInfo {
        user: ApiUser,
    },
    UserLogout,
    DeviceReturned,
    DeviceBookingLoading,
    DeviceBookingCompleted {
        return_target: ReturnTarget,
    },
    Error {
        kind: ResponseKind,
        message: String,
        return_target: ReturnTarget,
    },
    /// Registration mode: a chip was scanned and may be enrolled.
    ChipScanned {
        uid: Uid,
        known: bool,
    },
}

impl UiEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::Loading => "loading",
            UiEvent::Waiting => "waiting",
            UiEvent::GettingChipInfo => "gettingChipInfo",
            UiEvent::UserInfo { .. } => "userInfo",
            UiEvent::UserLogout => "userLogout",
            UiEvent::DeviceReturned => "deviceReturned",
            UiEvent::DeviceBookingLoading => "deviceBookingLoading",
            UiEvent::DeviceBookingCompleted { .. } => "deviceBookingCompleted",
            UiEvent::Error { .. } => "error",
            UiEvent::ChipScanned { .. } => "chipScanned",
        }
    }

    /// Payload of the event, if it carries one.
    pub fn data(&self) -> Option<Value> {
        match self {
            UiEvent::UserInfo { user } => Some(json!({ "user": user })),
            UiEvent::DeviceBookingCompleted { return_target } => {
                Some(json!({ "returnTarget": return_target }))
            }
            UiEvent::Error {
                kind,
                message,
                return_target,
            } => Some(json!({
                "kind": kind,
                "message": message,
                "returnTarget": return_target,
            })),
            UiEvent::ChipScanned { uid, known } => Some(json!({ "uid": uid, "known": known })),
            _ => None,
        }
    }
}

impl From<UiEvent> for Outbound {
    fn from(event: UiEvent) -> Self {
        Outbound::Event {
            event: event.name().to_string(),
            data: event.data(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::constants::ENVELOPE_RESPONSE;
    use rstest::rstest;

    fn user(teacher: bool) -> ApiUser {
        ApiUser {
            name: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            user_id: 1,
            class: Some("10b".to_string()),
            teacher,
            history: None,
        }
    }

    #[test]
    fn test_inbound_reads_optional_fields() {
        let msg = Inbound::from_value(json!({ "type": "event", "event": "ping" }));
        assert!(msg.is_event());
        assert_eq!(msg.event_name(), Some(&json!("ping")));
        assert!(msg.data.is_none());
    }

    #[test]
    fn test_inbound_from_non_object_is_empty() {
        let msg = Inbound::from_value(json!([1, 2, 3]));
        assert_eq!(msg, Inbound::default());
        assert!(!msg.is_event());
    }

    #[rstest]
    #[case(json!(null))]
    #[case(json!(""))]
    #[case(json!(false))]
    #[case(json!(0))]
    fn test_blank_event_name(#[case] event: Value) {
        let msg = Inbound::from_value(json!({ "type": "event", "event": event }));
        assert!(msg.event_name().is_none());
    }

    #[test]
    fn test_invalid_request_envelope() {
        let json = Outbound::invalid_request().to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], ENVELOPE_RESPONSE);
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "INVALID_REQUEST");
        assert!(value.get("to").is_none());
    }

    #[test]
    fn test_reply_to_ping_envelope() {
        let value: Value =
            serde_json::from_str(&Outbound::reply_to("ping").to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "type": "response", "success": true, "to": "ping" })
        );
    }

    #[rstest]
    #[case(UiEvent::Loading, "loading")]
    #[case(UiEvent::Waiting, "waiting")]
    #[case(UiEvent::GettingChipInfo, "gettingChipInfo")]
    #[case(UiEvent::UserLogout, "userLogout")]
    #[case(UiEvent::DeviceReturned, "deviceReturned")]
    #[case(UiEvent::DeviceBookingLoading, "deviceBookingLoading")]
    fn test_events_without_payload(#[case] event: UiEvent, #[case] name: &str) {
        let value: Value = serde_json::from_str(&Outbound::from(event).to_json().unwrap()).unwrap();
        assert_eq!(value, json!({ "type": "event", "event": name }));
    }

    #[test]
    fn test_user_info_payload() {
        let outbound = Outbound::from(UiEvent::UserInfo { user: user(false) });
        let value: Value = serde_json::from_str(&outbound.to_json().unwrap()).unwrap();
        assert_eq!(value["event"], "userInfo");
        assert_eq!(value["data"]["user"]["name"], "Ada");
        assert_eq!(value["data"]["user"]["teacher"], false);
    }

    #[test]
    fn test_error_payload() {
        let outbound = Outbound::from(UiEvent::Error {
            kind: ResponseKind::DeviceAlreadyBooked,
            message: "Already lent".to_string(),
            return_target: ReturnTarget::UserHome,
        });
        let value: Value = serde_json::from_str(&outbound.to_json().unwrap()).unwrap();
        assert_eq!(
            value["data"],
            json!({
                "kind": "DEVICE_ALREADY_BOOKED",
                "message": "Already lent",
                "returnTarget": "userHome",
            })
        );
    }

    #[test]
    fn test_booking_completed_payload() {
        let event = UiEvent::DeviceBookingCompleted {
            return_target: ReturnTarget::for_teacher(false),
        };
        assert_eq!(event.data(), Some(json!({ "returnTarget": "home" })));
    }

    #[test]
    fn test_chip_scanned_payload() {
        let event = UiEvent::ChipScanned {
            uid: Uid::new("4abcef").unwrap(),
            known: false,
        };
        assert_eq!(event.name(), "chipScanned");
        assert_eq!(
            event.data(),
            Some(json!({ "uid": "4abcef", "known": false }))
        );
    }
}
