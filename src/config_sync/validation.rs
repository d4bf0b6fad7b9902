use thiserror::Error;

/// Devices may not be asked to report more often than this.
pub const MIN_READING_INTERVAL_SECONDS: u32 = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Enter a device identifier before saving.")]
    MissingIdentifier,
    #[error("Wait until the device has been checked before saving.")]
    DeviceNotChecked,
    #[error("The temperature limit must be a number.")]
    InvalidTemperatureLimit,
    #[error("The reading interval must be a whole number of at least {minimum} seconds.")]
    InvalidReadingInterval { minimum: u32 },
}

/// Accepts both decimal separators: commas become dots, then everything that is not an
/// ASCII digit or a dot is dropped.
pub fn normalize_number(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == ',' { '.' } else { c })
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

pub fn parse_temperature_limit(raw: &str) -> Result<f64, ValidationError> {
    leading_real(&normalize_number(raw)).ok_or(ValidationError::InvalidTemperatureLimit)
}

pub fn parse_reading_interval(raw: &str) -> Result<u32, ValidationError> {
    leading_integer(&normalize_number(raw))
        .filter(|seconds| *seconds >= MIN_READING_INTERVAL_SECONDS)
        .ok_or(ValidationError::InvalidReadingInterval {
            minimum: MIN_READING_INTERVAL_SECONDS,
        })
}

// Input is normalized, only digits and dots remain. Anything from a second dot on is ignored.
fn leading_real(normalized: &str) -> Option<f64> {
    let end = normalized.match_indices('.').nth(1).map_or(normalized.len(), |(index, _)| index);
    normalized[..end].parse().ok()
}

fn leading_integer(normalized: &str) -> Option<u32> {
    let end = normalized.find(|c: char| !c.is_ascii_digit()).unwrap_or(normalized.len());
    normalized[..end].parse().ok()
}
