//! Types shared across reader implementations.

use serde::{Deserialize, Serialize};

/// Reader information.
///
/// Contains reader-specific metadata such as supported protocols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Reader name (e.g., "MFRC522").
    pub name: String,

    /// List of supported protocols (e.g., ["ISO14443A"]).
    pub protocols: Vec<String>,
}

impl ReaderInfo {
    /// Create a new ReaderInfo.
    pub fn new(name: impl Into<String>, protocols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            protocols,
        }
    }
}
