use crate::api::ApiClient;
use crate::api::error::{ApiError, expect_success};
use crate::domain::{DeviceId, FilterMode, Reading};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Reading history endpoints of the logging service.
#[async_trait]
pub trait ReadingsApi: Debug + Send + Sync {
    /// Lists readings in the order the service returns them. An unknown device is
    /// [`ApiError::NotFound`].
    async fn fetch(&self, device_id: &DeviceId, filter: FilterMode) -> Result<Vec<Reading>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpReadingsApi {
    client: ApiClient,
}

impl HttpReadingsApi {
    pub fn new(client: ApiClient) -> Self {
        HttpReadingsApi { client }
    }
}

#[async_trait]
impl ReadingsApi for HttpReadingsApi {
    #[instrument(skip_all, fields(device_id = %device_id, ?filter))]
    async fn fetch(&self, device_id: &DeviceId, filter: FilterMode) -> Result<Vec<Reading>, ApiError> {
        let url = match filter {
            FilterMode::All => self.client.endpoint(&["api", "readings", device_id.as_str()]),
            FilterMode::CriticalOnly => self.client.endpoint(&["api", "readings", device_id.as_str(), "criticals"]),
        };
        let response = self.client.http().get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(device_id.clone()));
        }

        let readings = expect_success(response).await?.json::<Vec<Reading>>().await?;
        debug!("Fetched {} reading(s)", readings.len());
        Ok(readings)
    }
}
