mod client;
mod config_api;
mod error;
mod readings_api;

pub use client::{ApiClient, new_client};
pub use config_api::{DeviceConfigApi, HttpDeviceConfigApi};
pub use error::ApiError;
pub use readings_api::{HttpReadingsApi, ReadingsApi};
