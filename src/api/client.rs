//! Zendesk Sell resource client
//!
//! Wraps [`HttpClient`] with the endpoints the tap talks to: paged lists,
//! single objects and the sync session calls.

use super::types::{decode_queue, ListPage, ListRequest, QueueItem, SyncSession};
use crate::config::TapConfig;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig, RequestConfig};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::debug;

/// Header carrying the device identity on sync calls
pub const DEVICE_UUID_HEADER: &str = "X-Basecrm-Device-UUID";

/// Capability for talking to the CRM API.
///
/// Streams and the event synchronizer depend on this trait rather than on
/// HTTP, so tests can script responses.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch one page of a list (or single-object) endpoint
    async fn get_page(&self, request: &ListRequest) -> Result<ListPage>;

    /// Start a sync session; `None` when the server has nothing to deliver
    async fn start_session(&self, device_uuid: &str) -> Result<Option<SyncSession>>;

    /// Fetch the next batch from the session's main queue
    async fn fetch_queue(&self, device_uuid: &str, session_id: &str) -> Result<Vec<QueueItem>>;

    /// Acknowledge delivered events
    async fn ack(&self, device_uuid: &str, ack_keys: &[String]) -> Result<()>;
}

/// HTTP implementation of [`ResourceClient`]
#[derive(Debug)]
pub struct SellClient {
    http: HttpClient,
}

impl SellClient {
    /// Build a client from validated tap configuration
    pub fn new(config: &TapConfig) -> Result<Self> {
        let mut builder = HttpClientConfig::builder()
            .base_url(&config.base_url)
            .timeout(config.timeout())
            .bearer_token(config.token())
            .header("Accept", "application/json")
            .rate_limit(RateLimiterConfig::per_second(config.requests_per_second));

        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent);
        }

        Ok(Self::with_http(HttpClient::with_config(builder.build())?))
    }

    /// Wrap an existing HTTP client
    pub fn with_http(http: HttpClient) -> Self {
        Self { http }
    }

    /// Underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

#[async_trait]
impl ResourceClient for SellClient {
    async fn get_page(&self, request: &ListRequest) -> Result<ListPage> {
        let mut config = RequestConfig::new();
        for (key, value) in &request.query {
            config = config.query(key, value);
        }

        match self
            .http
            .request_value(Method::GET, &request.target, config)
            .await?
        {
            Some(body) => ListPage::from_body(body),
            None => Ok(ListPage::empty()),
        }
    }

    async fn start_session(&self, device_uuid: &str) -> Result<Option<SyncSession>> {
        let config = RequestConfig::new().header(DEVICE_UUID_HEADER, device_uuid);
        let body = self
            .http
            .request_value(Method::POST, "/sync/start", config)
            .await?;

        let session = body.as_ref().and_then(SyncSession::from_body);
        debug!("Sync start returned session {:?}", session.as_ref().map(|s| &s.id));
        Ok(session)
    }

    async fn fetch_queue(&self, device_uuid: &str, session_id: &str) -> Result<Vec<QueueItem>> {
        let config = RequestConfig::new().header(DEVICE_UUID_HEADER, device_uuid);
        let path = format!("/sync/{session_id}/queues/main");

        match self.http.request_value(Method::GET, &path, config).await? {
            Some(body) => decode_queue(&body),
            None => Ok(Vec::new()),
        }
    }

    async fn ack(&self, device_uuid: &str, ack_keys: &[String]) -> Result<()> {
        let config = RequestConfig::new()
            .header(DEVICE_UUID_HEADER, device_uuid)
            .json(json!({ "data": { "ack_keys": ack_keys } }));

        self.http.post_with_config("/sync/ack", config).await?;
        Ok(())
    }
}
