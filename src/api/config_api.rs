use crate::api::ApiClient;
use crate::api::error::{ApiError, expect_success};
use crate::domain::{ConfigRequest, DeviceConfig, DeviceId};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Device configuration endpoints of the control service.
#[async_trait]
pub trait DeviceConfigApi: Debug + Send + Sync {
    /// Returns `None` when the device has no stored configuration.
    async fn fetch(&self, device_id: &DeviceId) -> Result<Option<DeviceConfig>, ApiError>;

    async fn create(&self, request: &ConfigRequest) -> Result<DeviceConfig, ApiError>;

    async fn update(&self, request: &ConfigRequest) -> Result<DeviceConfig, ApiError>;

    /// Replaces the stored configuration with the service defaults and returns it.
    async fn reset(&self, device_id: &DeviceId) -> Result<DeviceConfig, ApiError>;

    async fn delete(&self, device_id: &DeviceId) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpDeviceConfigApi {
    client: ApiClient,
}

impl HttpDeviceConfigApi {
    pub fn new(client: ApiClient) -> Self {
        HttpDeviceConfigApi { client }
    }

    async fn save(&self, method: Method, request: &ConfigRequest) -> Result<DeviceConfig, ApiError> {
        let response = self
            .client
            .http()
            .request(method, self.client.endpoint(&["api", "config"]))
            .json(request)
            .send()
            .await?;

        Ok(expect_success(response).await?.json::<DeviceConfig>().await?)
    }
}

#[async_trait]
impl DeviceConfigApi for HttpDeviceConfigApi {
    #[instrument(skip_all, fields(device_id = %device_id))]
    async fn fetch(&self, device_id: &DeviceId) -> Result<Option<DeviceConfig>, ApiError> {
        let url = self.client.endpoint(&["api", "config", device_id.as_str()]);
        let response = self.client.http().get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("No configuration stored for device '{}'", device_id);
            return Ok(None);
        }

        let config = expect_success(response).await?.json::<DeviceConfig>().await?;
        Ok(Some(config))
    }

    #[instrument(skip_all, fields(device_id = %request.device_id))]
    async fn create(&self, request: &ConfigRequest) -> Result<DeviceConfig, ApiError> {
        self.save(Method::POST, request).await
    }

    #[instrument(skip_all, fields(device_id = %request.device_id))]
    async fn update(&self, request: &ConfigRequest) -> Result<DeviceConfig, ApiError> {
        self.save(Method::PUT, request).await
    }

    #[instrument(skip_all, fields(device_id = %device_id))]
    async fn reset(&self, device_id: &DeviceId) -> Result<DeviceConfig, ApiError> {
        let url = self.client.endpoint(&["api", "config", device_id.as_str(), "reset"]);
        let response = self.client.http().put(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(device_id.clone()));
        }

        Ok(expect_success(response).await?.json::<DeviceConfig>().await?)
    }

    #[instrument(skip_all, fields(device_id = %device_id))]
    async fn delete(&self, device_id: &DeviceId) -> Result<(), ApiError> {
        let url = self.client.endpoint(&["api", "config", device_id.as_str()]);
        let response = self.client.http().delete(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(device_id.clone()));
        }

        expect_success(response).await?;
        Ok(())
    }
}
