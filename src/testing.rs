//! In-memory API doubles whose requests are answered by the test, in whatever order it likes.

use crate::api::{ApiError, DeviceConfigApi, ReadingsApi};
use crate::domain::{ConfigRequest, DeviceConfig, DeviceId, FilterMode, Reading};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::oneshot;

pub fn server_error() -> ApiError {
    ApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".to_string(),
    }
}

fn dropped_reply() -> ApiError {
    ApiError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "test dropped the reply".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigCall {
    Fetch(DeviceId),
    Create(ConfigRequest),
    Update(ConfigRequest),
    Reset(DeviceId),
    Delete(DeviceId),
}

/// One request made against [`ScriptedConfigApi`]. Every call is answered with an optional
/// record: mutations treat `None` as not found, delete ignores the record.
#[derive(Debug)]
pub struct ConfigExchange {
    pub call: ConfigCall,
    reply: oneshot::Sender<Result<Option<DeviceConfig>, ApiError>>,
}

impl ConfigExchange {
    pub fn reply(self, result: Result<Option<DeviceConfig>, ApiError>) {
        self.reply.send(result).ok();
    }
}

#[derive(Debug)]
pub struct ScriptedConfigApi {
    exchanges: UnboundedSender<ConfigExchange>,
}

impl ScriptedConfigApi {
    pub fn new() -> (Arc<Self>, UnboundedReceiver<ConfigExchange>) {
        let (exchanges, rx) = unbounded_channel();
        (Arc::new(ScriptedConfigApi { exchanges }), rx)
    }

    async fn exchange(&self, call: ConfigCall) -> Result<Option<DeviceConfig>, ApiError> {
        let (reply, response) = oneshot::channel();
        if self.exchanges.send(ConfigExchange { call, reply }).is_err() {
            return Err(dropped_reply());
        }
        response.await.unwrap_or_else(|_| Err(dropped_reply()))
    }

    async fn saved(&self, call: ConfigCall, device_id: &DeviceId) -> Result<DeviceConfig, ApiError> {
        self.exchange(call).await?.ok_or_else(|| ApiError::NotFound(device_id.clone()))
    }
}

#[async_trait]
impl DeviceConfigApi for ScriptedConfigApi {
    async fn fetch(&self, device_id: &DeviceId) -> Result<Option<DeviceConfig>, ApiError> {
        self.exchange(ConfigCall::Fetch(device_id.clone())).await
    }

    async fn create(&self, request: &ConfigRequest) -> Result<DeviceConfig, ApiError> {
        self.saved(ConfigCall::Create(request.clone()), &request.device_id).await
    }

    async fn update(&self, request: &ConfigRequest) -> Result<DeviceConfig, ApiError> {
        self.saved(ConfigCall::Update(request.clone()), &request.device_id).await
    }

    async fn reset(&self, device_id: &DeviceId) -> Result<DeviceConfig, ApiError> {
        self.saved(ConfigCall::Reset(device_id.clone()), device_id).await
    }

    async fn delete(&self, device_id: &DeviceId) -> Result<(), ApiError> {
        self.exchange(ConfigCall::Delete(device_id.clone())).await.map(|_| ())
    }
}

#[derive(Debug)]
pub struct ReadingsExchange {
    pub device_id: DeviceId,
    pub filter: FilterMode,
    reply: oneshot::Sender<Result<Vec<Reading>, ApiError>>,
}

impl ReadingsExchange {
    pub fn reply(self, result: Result<Vec<Reading>, ApiError>) {
        self.reply.send(result).ok();
    }
}

#[derive(Debug)]
pub struct ScriptedReadingsApi {
    exchanges: UnboundedSender<ReadingsExchange>,
}

impl ScriptedReadingsApi {
    pub fn new() -> (Arc<Self>, UnboundedReceiver<ReadingsExchange>) {
        let (exchanges, rx) = unbounded_channel();
        (Arc::new(ScriptedReadingsApi { exchanges }), rx)
    }
}

#[async_trait]
impl ReadingsApi for ScriptedReadingsApi {
    async fn fetch(&self, device_id: &DeviceId, filter: FilterMode) -> Result<Vec<Reading>, ApiError> {
        let (reply, response) = oneshot::channel();
        let exchange = ReadingsExchange {
            device_id: device_id.clone(),
            filter,
            reply,
        };
        if self.exchanges.send(exchange).is_err() {
            return Err(dropped_reply());
        }
        response.await.unwrap_or_else(|_| Err(dropped_reply()))
    }
}
