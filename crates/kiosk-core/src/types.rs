use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use subtle::ConstantTimeEq;

/// Chip identifier read from the reader.
///
/// The token is opaque: it is only ever compared for equality and forwarded
/// to the booking backend verbatim.
///
/// # Security
/// Comparison is constant-time, as a UID doubles as a login credential.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    /// Create a UID from a textual token.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns `Error::InvalidUid` if the token is empty after trimming.
    pub fn new(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidUid("UID cannot be empty".to_string()));
        }
        Ok(Uid(token.to_string()))
    }

    /// Render raw chip bytes the way the backend registers them.
    ///
    /// Every byte is written as lowercase hex without zero padding, so
    /// `[0x04, 0xab, 0x0c, 0xef]` becomes `"4abcef"`.
    ///
    /// # Errors
    /// Returns `Error::InvalidUid` if `bytes` is empty.
    pub fn from_chip_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidUid("chip returned no UID bytes".to_string()));
        }
        Ok(Uid(bytes.iter().map(|b| format!("{b:x}")).collect()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Uid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uid::new(s)
    }
}

impl TryFrom<String> for Uid {
    type Error = Error;

    fn try_from(token: String) -> Result<Self> {
        Uid::new(&token)
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl PartialEq for Uid {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for Uid {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Timing parameters consumed by the scan loop and sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tunables {
    /// Repeated reads of the same chip inside this window are dropped.
    pub debounce: Duration,
    /// Pause between two reader polls.
    pub poll_period: Duration,
    /// Idle time before a logged-in user is logged out.
    pub logout_timeout: Duration,
}

impl Tunables {
    /// Build tunables from millisecond values.
    ///
    /// # Errors
    /// Returns `Error::InvalidTunable` naming the first value that is zero.
    pub fn new(debounce_ms: u64, poll_period_ms: u64, logout_timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            debounce: positive_millis("debounce", debounce_ms)?,
            poll_period: positive_millis("poll_period", poll_period_ms)?,
            logout_timeout: positive_millis("logout_timeout", logout_timeout_ms)?,
        })
    }
}

impl Default for Tunables {
    fn default() -> Self {
        use crate::constants::{
            DEFAULT_DEBOUNCE_MS, DEFAULT_LOGOUT_TIMEOUT_MS, DEFAULT_POLL_PERIOD_MS,
        };
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            poll_period: Duration::from_millis(DEFAULT_POLL_PERIOD_MS),
            logout_timeout: Duration::from_millis(DEFAULT_LOGOUT_TIMEOUT_MS),
        }
    }
}

fn positive_millis(name: &'static str, value: u64) -> Result<Duration> {
    if value == 0 {
        return Err(Error::InvalidTunable { name, value });
    }
    Ok(Duration::from_millis(value))
}

/// Which session variant the scan loop creates.
///
/// Chosen once at startup and never switched while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Normal lending and returning of devices.
    #[default]
    Booking,
    /// Enrollment of new chips; scanned UIDs are shown to the operator.
    Registration,
}

impl SessionMode {
    #[must_use]
    pub fn from_register_flag(register_mode: bool) -> Self {
        if register_mode {
            SessionMode::Registration
        } else {
            SessionMode::Booking
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionMode::Booking => write!(f, "booking"),
            SessionMode::Registration => write!(f, "registration"),
        }
    }
}
