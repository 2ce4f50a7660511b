//! HTTP client for the booking backend.
//!
//! Every call is a bearer-authorized `GET` on a single endpoint. The UIDs
//! travel as query parameters: `rfid1` for the first chip (person or device
//! to return), `rfid2` for the device to lend.
//!
//! ```text
//! Session ──> BookingApi ──(HTTP GET ?rfid1=..&rfid2=..)──> Booking backend
//!                 │
//!                 └─> BookingOutcome (normalized reply)
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use kiosk_booking::{BookingApi, BookingClientConfig, HttpBookingClient};
//! use kiosk_core::Uid;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpBookingClient::new(BookingClientConfig {
//!     api_url: "https://booking.example.org/api".to_string(),
//!     api_token: "secret".to_string(),
//!     timeout: Duration::from_millis(5000),
//! })?;
//!
//! let outcome = client.unknown_action_for_uid(&Uid::new("abc123")?).await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

#![allow(async_fn_in_trait)]

use crate::outcome::{BookingError, BookingOutcome};
use kiosk_core::Uid;
use kiosk_core::constants::DEFAULT_API_TIMEOUT_MS;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, warn};

/// Operations the kiosk needs from the booking backend.
///
/// Implementations never fail: every problem is folded into the returned
/// [`BookingOutcome`].
pub trait BookingApi: Send + Sync {
    /// Ask what a single chip means: a returned device, a known person, or a
    /// rejection.
    async fn unknown_action_for_uid(&self, uid: &Uid) -> BookingOutcome;

    /// Lend the device behind `device_uid` to the person behind `user_uid`.
    async fn book(&self, user_uid: &Uid, device_uid: &Uid) -> BookingOutcome;
}

/// Configuration for the HTTP booking client
#[derive(Debug, Clone)]
pub struct BookingClientConfig {
    /// Booking endpoint
    pub api_url: String,

    /// Bearer token sent with every request
    pub api_token: String,

    /// Timeout for a whole request (connect, send, body)
    pub timeout: Duration,
}

impl Default for BookingClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/api".to_string(),
            api_token: String::new(),
            timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
        }
    }
}

/// Booking backend client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBookingClient {
    client: reqwest::Client,
    api_url: Url,
    api_token: String,
}

impl HttpBookingClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the underlying HTTP
    /// client cannot be built.
    pub fn new(config: BookingClientConfig) -> Result<Self, BookingError> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| BookingError::InvalidUrl(format!("{}: {e}", config.api_url)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BookingError::Client(e.to_string()))?;

        debug!(url = %api_url, "Created booking client");

        Ok(Self {
            client,
            api_url,
            api_token: config.api_token,
        })
    }

    /// Query the backend without any UID.
    ///
    /// Used as a reachability check at startup; a reachable backend answers
    /// with a business error (no UID specified).
    pub async fn status(&self) -> BookingOutcome {
        self.request(&[]).await
    }

    async fn request(&self, params: &[(&str, &str)]) -> BookingOutcome {
        match self.send(params).await {
            Ok((code, body)) => {
                let outcome = BookingOutcome::from_http(code, &body);
                debug!(code, kind = ?outcome.kind(), "Booking backend replied");
                outcome
            }
            Err(e) => {
                warn!(error = %e, "Booking backend unreachable");
                e.into()
            }
        }
    }

    async fn send(&self, params: &[(&str, &str)]) -> Result<(u16, Vec<u8>), BookingError> {
        let response = self
            .client
            .get(self.api_url.clone())
            .bearer_auth(&self.api_token)
            .query(params)
            .send()
            .await?;

        let code = response.status().as_u16();
        let body = response.bytes().await?;
        Ok((code, body.to_vec()))
    }
}

impl BookingApi for HttpBookingClient {
    async fn unknown_action_for_uid(&self, uid: &Uid) -> BookingOutcome {
        self.request(&[("rfid1", uid.as_str())]).await
    }

    async fn book(&self, user_uid: &Uid, device_uid: &Uid) -> BookingOutcome {
        self.request(&[
            ("rfid1", user_uid.as_str()),
            ("rfid2", device_uid.as_str()),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_url() {
        let result = HttpBookingClient::new(BookingClientConfig {
            api_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(BookingError::InvalidUrl(_))));
    }

    #[test]
    fn test_accepts_default_config() {
        assert!(HttpBookingClient::new(BookingClientConfig::default()).is_ok());
    }
}
