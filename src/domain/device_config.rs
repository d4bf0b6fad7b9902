use crate::domain::DeviceId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Temperature-monitoring configuration of a device, as stored by the control service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub device_id: DeviceId,
    pub temperature_limit: f64,
    pub high_tolerance_enabled: bool,
    pub high_tolerance_reason: Option<String>,
    pub reading_interval_ms: u64,
    /// Limit the device actually applies, raised by the service when high tolerance is on.
    pub effective_temperature_limit: Option<f64>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Body of the create and update config requests.
///
/// Unlike [`DeviceConfig`] the interval travels in whole seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequest {
    pub device_id: DeviceId,
    pub temperature_limit: f64,
    pub high_tolerance_enabled: bool,
    pub high_tolerance_reason: Option<String>,
    pub reading_interval_seconds: u32,
}
