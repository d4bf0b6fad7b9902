use crate::config_sync::validation::{ValidationError, parse_reading_interval, parse_temperature_limit};
use crate::domain::{ConfigRequest, DeviceConfig, DeviceId};

/// Locally edited copy of a device configuration, held as the operator typed it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftForm {
    pub temperature_limit: String,
    /// Whole seconds, unlike the milliseconds stored by the service.
    pub reading_interval: String,
    pub high_tolerance_enabled: bool,
    pub high_tolerance_reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    TemperatureLimit(String),
    ReadingInterval(String),
    HighTolerance(bool),
    HighToleranceReason(String),
}

impl DraftForm {
    pub fn from_config(config: &DeviceConfig) -> Self {
        DraftForm {
            temperature_limit: config.temperature_limit.to_string(),
            reading_interval: (config.reading_interval_ms as f64 / 1000.0).to_string(),
            high_tolerance_enabled: config.high_tolerance_enabled,
            high_tolerance_reason: config.high_tolerance_reason.clone().unwrap_or_default(),
        }
    }

    pub fn apply(&mut self, edit: DraftEdit) {
        match edit {
            DraftEdit::TemperatureLimit(value) => self.temperature_limit = value,
            DraftEdit::ReadingInterval(value) => self.reading_interval = value,
            DraftEdit::HighTolerance(enabled) => self.high_tolerance_enabled = enabled,
            DraftEdit::HighToleranceReason(value) => self.high_tolerance_reason = value,
        }
    }

    /// Validates the draft in field order and builds the request body. The reason is only
    /// sent while high tolerance is enabled.
    pub fn to_request(&self, device_id: Option<&DeviceId>) -> Result<ConfigRequest, ValidationError> {
        let device_id = device_id.cloned().ok_or(ValidationError::MissingIdentifier)?;
        let temperature_limit = parse_temperature_limit(&self.temperature_limit)?;
        let reading_interval_seconds = parse_reading_interval(&self.reading_interval)?;
        let high_tolerance_reason = self.high_tolerance_enabled.then(|| self.high_tolerance_reason.clone());

        Ok(ConfigRequest {
            device_id,
            temperature_limit,
            high_tolerance_enabled: self.high_tolerance_enabled,
            high_tolerance_reason,
            reading_interval_seconds,
        })
    }
}
