//! Best-effort delivery of canonical events to the collection endpoint.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Url,
    header::{CONTENT_TYPE, COOKIE, USER_AGENT},
};
use tracing::debug;

use crate::{
    error::{Result, TapError},
    types::CanonicalEvent,
};

pub const PIXEL_USER_AGENT: &str = "Shopify-Pixel-Extension/1.0";
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: Url,
    pub body: String,
    pub cookie: Option<String>,
}

/// Outbound network capability. Returns the HTTP status of the response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: OutboundRequest) -> Result<u16>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: OutboundRequest) -> Result<u16> {
        let mut builder = self
            .client
            .post(request.url)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, PIXEL_USER_AGENT)
            .body(request.body);

        if let Some(cookie) = request.cookie {
            builder = builder.header(COOKIE, cookie);
        }

        let response = builder.send().await?;
        Ok(response.status().as_u16())
    }
}

/// Sends one request per event. No retry, no queue.
pub struct Dispatcher {
    endpoint: Url,
    transport: Arc<dyn Transport>,
    forward_cookies: bool,
}

impl Dispatcher {
    pub fn new(endpoint: Url, transport: Arc<dyn Transport>, forward_cookies: bool) -> Self {
        Self {
            endpoint,
            transport,
            forward_cookies,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn request_for(&self, event: &CanonicalEvent) -> Result<OutboundRequest> {
        Ok(OutboundRequest {
            url: self.endpoint.clone(),
            body: serde_json::to_string(event)?,
            cookie: self
                .forward_cookies
                .then(|| event.context.cookie_header())
                .flatten(),
        })
    }

    /// Fails with [`TapError::Rejected`] on any non-2xx status.
    pub async fn deliver(&self, event: &CanonicalEvent) -> Result<()> {
        let request = self.request_for(event)?;
        let status = self.transport.post(request).await?;

        if !(200..300).contains(&status) {
            return Err(TapError::Rejected { status });
        }

        debug!(event_name = %event.event_name, status, "event delivered");
        Ok(())
    }
}
