use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Identifier of a monitored device as typed by the operator.
///
/// Surrounding whitespace is not part of the identifier, and blank input means
/// no device at all, so a `DeviceId` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() { None } else { Some(DeviceId(trimmed.to_string())) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = BlankDeviceId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DeviceId::parse(&value).ok_or(BlankDeviceId)
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("device identifier is blank")]
pub struct BlankDeviceId;
