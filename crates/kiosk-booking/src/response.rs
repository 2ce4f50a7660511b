//! Closed set of booking backend response kinds.
//!
//! The backend answers every request with a status identifier. Each
//! identifier maps to exactly one [`ResponseKind`]; identifiers outside the
//! table are reported as [`Lookup::Unknown`] so the caller can treat them as
//! a malformed reply instead of passing them through.
//!
//! | Identifier              | Error |
//! |-------------------------|-------|
//! | `DEVICE_BOOKED`         | no    |
//! | `DEVICE_RETURNED`       | no    |
//! | `USER_INFO`             | no    |
//! | `UUID_NOT_FOUND`        | yes   |
//! | `DEVICE_NOT_FOUND`      | yes   |
//! | `YOU_ALREADY_BOOKING`   | yes   |
//! | `DEVICE_ALREADY_BOOKED` | yes   |
//! | `NOT_A_DEVICE`          | yes   |
//! | `NO_UUID_SPECIFIED`     | yes   |
//! | `UNEXPECTED_ERROR`      | yes   |

use serde::{Serialize, Serializer};
use std::fmt;

/// A status the booking backend can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    DeviceBooked,
    DeviceReturned,
    UserInfo,
    UuidNotFound,
    DeviceNotFound,
    YouAlreadyBooking,
    DeviceAlreadyBooked,
    NotADevice,
    NoUuidSpecified,
    UnexpectedError,
}

/// Result of looking up a wire identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Known(ResponseKind),
    /// The identifier is not part of the contract.
    Unknown(String),
}

impl ResponseKind {
    /// Every kind, in contract order.
    pub const ALL: [ResponseKind; 10] = [
        ResponseKind::DeviceBooked,
        ResponseKind::DeviceReturned,
        ResponseKind::UserInfo,
        ResponseKind::UuidNotFound,
        ResponseKind::DeviceNotFound,
        ResponseKind::YouAlreadyBooking,
        ResponseKind::DeviceAlreadyBooked,
        ResponseKind::NotADevice,
        ResponseKind::NoUuidSpecified,
        ResponseKind::UnexpectedError,
    ];

    /// Wire identifier of this kind.
    #[must_use]
    pub fn identifier(self) -> &'static str {
        match self {
            ResponseKind::DeviceBooked => "DEVICE_BOOKED",
            ResponseKind::DeviceReturned => "DEVICE_RETURNED",
            ResponseKind::UserInfo => "USER_INFO",
            ResponseKind::UuidNotFound => "UUID_NOT_FOUND",
            ResponseKind::DeviceNotFound => "DEVICE_NOT_FOUND",
            ResponseKind::YouAlreadyBooking => "YOU_ALREADY_BOOKING",
            ResponseKind::DeviceAlreadyBooked => "DEVICE_ALREADY_BOOKED",
            ResponseKind::NotADevice => "NOT_A_DEVICE",
            ResponseKind::NoUuidSpecified => "NO_UUID_SPECIFIED",
            ResponseKind::UnexpectedError => "UNEXPECTED_ERROR",
        }
    }

    /// Whether the backend reports a rejection with this kind.
    #[must_use]
    pub fn is_error(self) -> bool {
        !matches!(
            self,
            ResponseKind::DeviceBooked | ResponseKind::DeviceReturned | ResponseKind::UserInfo
        )
    }

    /// Map a wire identifier to a kind. Never fails: unrecognized
    /// identifiers come back as [`Lookup::Unknown`].
    ///
    /// # Examples
    ///
    /// ```
    /// use kiosk_booking::{Lookup, ResponseKind};
    ///
    /// assert_eq!(ResponseKind::lookup("USER_INFO"), Lookup::Known(ResponseKind::UserInfo));
    /// assert_eq!(ResponseKind::lookup("7"), Lookup::Unknown("7".to_string()));
    /// ```
    #[must_use]
    pub fn lookup(identifier: &str) -> Lookup {
        Self::ALL
            .into_iter()
            .find(|kind| kind.identifier() == identifier)
            .map_or_else(|| Lookup::Unknown(identifier.to_string()), Lookup::Known)
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Serialize for ResponseKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.identifier())
    }
}
