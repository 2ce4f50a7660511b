//! Normalized result of a booking backend call.

use crate::model::{ApiDevice, ApiUser, WireResponse};
use crate::response::{Lookup, ResponseKind};
use thiserror::Error;

/// Failures that prevented getting a usable reply from the backend.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Connection refused, timeout, broken body, ...
    #[error("Request to booking backend failed: {0}")]
    Request(String),

    /// Non-success HTTP status without a structured rejection body.
    #[error("Booking backend answered with HTTP {code}")]
    Status { code: u16 },

    /// Configured backend URL is not usable.
    #[error("Invalid booking backend URL: {0}")]
    InvalidUrl(String),

    /// HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for BookingError {
    fn from(err: reqwest::Error) -> Self {
        BookingError::Request(err.to_string())
    }
}

/// What a booking call resolved to.
#[derive(Debug)]
pub enum BookingOutcome {
    /// A known, non-error kind.
    Success {
        kind: ResponseKind,
        message: String,
        user: Option<ApiUser>,
        device: Option<ApiDevice>,
    },

    /// The backend rejected the request for a business reason.
    BusinessError {
        kind: ResponseKind,
        message: String,
        user: Option<ApiUser>,
    },

    /// The backend answered, but not in a way the contract allows.
    Malformed { message: String },

    /// The backend could not be reached or did not answer usefully.
    TransportFault(BookingError),
}

impl BookingOutcome {
    /// Teacher flag of the user attached to the reply, `false` if none.
    #[must_use]
    pub fn is_teacher(&self) -> bool {
        match self {
            BookingOutcome::Success { user, .. } | BookingOutcome::BusinessError { user, .. } => {
                user.as_ref().is_some_and(|u| u.teacher)
            }
            _ => false,
        }
    }

    /// Response kind, when the backend reported a known one.
    #[must_use]
    pub fn kind(&self) -> Option<ResponseKind> {
        match self {
            BookingOutcome::Success { kind, .. } | BookingOutcome::BusinessError { kind, .. } => {
                Some(*kind)
            }
            _ => None,
        }
    }

    /// Normalize a successfully received body.
    pub(crate) fn from_wire(wire: WireResponse) -> Self {
        let kind = match ResponseKind::lookup(&wire.status) {
            Lookup::Known(kind) => kind,
            Lookup::Unknown(status) => {
                return BookingOutcome::Malformed {
                    message: format!("Unknown response status '{status}'"),
                };
            }
        };

        if kind.is_error() {
            return BookingOutcome::BusinessError {
                kind,
                message: wire.message,
                user: wire.data.user,
            };
        }

        if kind == ResponseKind::UserInfo && wire.data.user.is_none() {
            return BookingOutcome::Malformed {
                message: "USER_INFO reply without user".to_string(),
            };
        }

        BookingOutcome::Success {
            kind,
            message: wire.message,
            user: wire.data.user,
            device: wire.data.device,
        }
    }

    /// Normalize a raw HTTP reply.
    ///
    /// Success statuses must carry a parseable body. Failure statuses become
    /// business errors only when they carry a structured body with a known
    /// error kind; everything else is a transport fault.
    pub(crate) fn from_http(code: u16, body: &[u8]) -> Self {
        let parsed = serde_json::from_slice::<WireResponse>(body);

        if (200..300).contains(&code) {
            return match parsed {
                Ok(wire) => Self::from_wire(wire),
                Err(e) => BookingOutcome::Malformed {
                    message: format!("Unparseable response body: {e}"),
                },
            };
        }

        match parsed {
            Ok(wire) => match ResponseKind::lookup(&wire.status) {
                Lookup::Known(kind) if kind.is_error() => BookingOutcome::BusinessError {
                    kind,
                    message: wire.message,
                    user: wire.data.user,
                },
                _ => BookingOutcome::TransportFault(BookingError::Status { code }),
            },
            Err(_) => BookingOutcome::TransportFault(BookingError::Status { code }),
        }
    }
}

impl From<BookingError> for BookingOutcome {
    fn from(err: BookingError) -> Self {
        BookingOutcome::TransportFault(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_user_info_success() {
        let outcome = BookingOutcome::from_http(
            200,
            &body(json!({
                "status": "USER_INFO",
                "message": "",
                "data": {
                    "user": { "name": "Ada", "lastname": "L", "user_id": 3, "teacher": true }
                }
            })),
        );

        assert!(matches!(
            outcome,
            BookingOutcome::Success { kind: ResponseKind::UserInfo, user: Some(_), .. }
        ));
        assert!(outcome.is_teacher());
    }

    #[test]
    fn test_user_info_without_user_is_malformed() {
        let outcome = BookingOutcome::from_http(200, &body(json!({ "status": "USER_INFO" })));
        assert!(matches!(outcome, BookingOutcome::Malformed { .. }));
    }

    #[test]
    fn test_device_returned_success() {
        let outcome = BookingOutcome::from_http(
            200,
            &body(json!({ "status": "DEVICE_RETURNED", "data": { "device": { "id": 5 } } })),
        );

        assert_eq!(outcome.kind(), Some(ResponseKind::DeviceReturned));
        assert!(!outcome.is_teacher());
    }

    #[rstest]
    #[case("UUID_NOT_FOUND", ResponseKind::UuidNotFound)]
    #[case("DEVICE_ALREADY_BOOKED", ResponseKind::DeviceAlreadyBooked)]
    #[case("NOT_A_DEVICE", ResponseKind::NotADevice)]
    fn test_business_error_in_success_body(#[case] status: &str, #[case] kind: ResponseKind) {
        let outcome =
            BookingOutcome::from_http(200, &body(json!({ "status": status, "message": "no" })));

        match outcome {
            BookingOutcome::BusinessError { kind: k, message, .. } => {
                assert_eq!(k, kind);
                assert_eq!(message, "no");
            }
            other => panic!("expected business error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_status_is_malformed() {
        let outcome = BookingOutcome::from_http(200, &body(json!({ "status": "2" })));
        match outcome {
            BookingOutcome::Malformed { message } => assert!(message.contains("'2'")),
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_success_body_is_malformed() {
        let outcome = BookingOutcome::from_http(200, b"<html>oops</html>");
        assert!(matches!(outcome, BookingOutcome::Malformed { .. }));
    }

    #[test]
    fn test_structured_http_error_is_business_error() {
        let outcome = BookingOutcome::from_http(
            404,
            &body(json!({ "status": "DEVICE_NOT_FOUND", "message": "Unknown device" })),
        );
        assert_eq!(outcome.kind(), Some(ResponseKind::DeviceNotFound));
        assert!(matches!(outcome, BookingOutcome::BusinessError { .. }));
    }

    #[rstest]
    #[case(500, b"".as_slice())]
    #[case(502, b"Bad Gateway".as_slice())]
    #[case(400, br#"{"status":"MYSTERY","message":"?"}"#.as_slice())]
    #[case(500, br#"{"status":"DEVICE_BOOKED","message":""}"#.as_slice())]
    fn test_other_http_errors_are_transport_faults(#[case] code: u16, #[case] raw: &[u8]) {
        match BookingOutcome::from_http(code, raw) {
            BookingOutcome::TransportFault(BookingError::Status { code: c }) => assert_eq!(c, code),
            other => panic!("expected transport fault, got {other:?}"),
        }
    }
}
