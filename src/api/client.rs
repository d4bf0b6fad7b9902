use crate::app_config::AppConfig;
use reqwest::header::HeaderValue;
use reqwest::{Client, Url, header};
use thiserror::Error;

/// HTTP client bound to the base URL of the Prevenfire backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

pub fn new_client(config: &AppConfig) -> Result<ApiClient, ApiClientError> {
    let url = config.api().url();
    let base_url = Url::parse(url).map_err(|e| ApiClientError::InvalidBaseUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if base_url.cannot_be_a_base() {
        return Err(ApiClientError::InvalidBaseUrl {
            url: url.to_string(),
            reason: "cannot be a base URL".to_string(),
        });
    }

    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    let http = Client::builder()
        .default_headers(headers)
        .timeout(config.api().request_timeout())
        .build()?;

    Ok(ApiClient { http, base_url })
}

impl ApiClient {
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Appends `segments` to the base URL, percent-encoding each one so identifiers
    /// containing `/` stay a single path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in new_client
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[derive(Error, Debug)]
pub enum ApiClientError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
