use crate::domain::DeviceId;
use chrono::NaiveDateTime;
use serde::Deserialize;

/// A temperature sample reported by a device. Readings are never modified by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: i64,
    pub device_id: DeviceId,
    pub temperature: f64,
    /// Limit the device applied when it captured the sample.
    pub temperature_limit: f64,
    pub is_over_limit: bool,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingStatus {
    Ok,
    OverLimit,
}

impl Reading {
    /// The over-limit flag is computed by the logging service and trusted as-is.
    pub fn status(&self) -> ReadingStatus {
        if self.is_over_limit { ReadingStatus::OverLimit } else { ReadingStatus::Ok }
    }
}
