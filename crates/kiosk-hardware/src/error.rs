//! Error types for reader operations.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while talking to the chip reader.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Reader is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Reader communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Chip answered but the UID could not be decoded.
    #[error("Card read error: {message}")]
    CardReadError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new card read error.
    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardReadError {
            message: message.into(),
        }
    }
}

impl From<kiosk_core::Error> for HardwareError {
    fn from(err: kiosk_core::Error) -> Self {
        Self::card_read(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("MFRC522");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: MFRC522");
    }

    #[test]
    fn test_card_read_error_from_core() {
        let error: HardwareError = kiosk_core::Error::InvalidUid("empty".to_string()).into();
        assert!(matches!(error, HardwareError::CardReadError { .. }));
        assert_eq!(
            error.to_string(),
            "Card read error: Invalid chip UID: empty"
        );
    }
}
