//! Records returned by the booking backend.

use serde::{Deserialize, Serialize};

/// A person known to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    pub name: String,
    pub lastname: String,
    pub user_id: u64,

    /// School class label, absent for staff in some deployments.
    #[serde(default)]
    pub class: Option<String>,

    /// Staff flag; teachers are never logged out automatically.
    #[serde(default)]
    pub teacher: bool,

    /// Past bookings, forwarded to the UI as-is.
    #[serde(default)]
    pub history: Option<Vec<serde_json::Value>>,
}

/// A lendable device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDevice {
    pub id: u64,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub rfid_code: String,
}

/// Body of every backend reply, successful or not.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: WireData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WireData {
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub device: Option<ApiDevice>,
}
