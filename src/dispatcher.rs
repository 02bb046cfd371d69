use crate::{
    command::Command,
    configuration::{AccessoryConfig, RequestSpec},
    error::{Result, StatelessBlindsError},
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client, Method,
};
use std::{collections::BTreeMap, sync::Arc};
use tokio::task::JoinHandle;
use tracing::*;

/// Request as it goes out on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl OutboundRequest {
    /// GET requests never carry a body, everything else sends the configured body as JSON
    pub fn from_spec(spec: &RequestSpec) -> Result<Self> {
        let body = if spec.is_get() {
            None
        } else {
            spec.body.as_ref().map(serde_json::to_string).transpose()?
        };
        Ok(Self {
            method: spec.method.to_uppercase(),
            url: spec.url.clone(),
            headers: spec.headers.clone(),
            body,
        })
    }
}

#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestSender {
    http_client: Client,
}

impl ReqwestSender {
    pub fn new() -> Self {
        let http_client = Client::new();
        Self { http_client }
    }

    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

/// Content type attached to bodies that don't configure one
const DEFAULT_BODY_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut header_map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| StatelessBlindsError::InvalidHeaderName(name.clone()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| StatelessBlindsError::InvalidHeaderValue(name.clone()))?;
        header_map.insert(header_name, header_value);
    }
    Ok(header_map)
}

#[async_trait]
impl RequestSender for ReqwestSender {
    async fn send(&self, request: OutboundRequest) -> Result<()> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| StatelessBlindsError::InvalidHttpMethod(request.method.clone()))?;
        let mut headers = header_map(&request.headers)?;
        if request.body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static(DEFAULT_BODY_CONTENT_TYPE),
            );
        }
        let mut builder = self
            .http_client
            .request(method, &request.url)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await?.error_for_status()?;
        debug!("{} {} returned {}", request.method, request.url, response.status());
        Ok(())
    }
}

/// Maps commands to their configured requests and fires them off.
///
/// Nothing is awaited on behalf of the caller. Failures are logged and dropped
/// and a delayed request can not be cancelled once scheduled.
#[derive(Clone)]
pub struct CommandDispatcher {
    config: Arc<AccessoryConfig>,
    sender: Arc<dyn RequestSender>,
}

impl CommandDispatcher {
    pub fn new(config: Arc<AccessoryConfig>, sender: Arc<dyn RequestSender>) -> Self {
        Self { config, sender }
    }

    pub fn config(&self) -> &AccessoryConfig {
        &self.config
    }

    /// Must be called from within a tokio runtime
    pub fn dispatch(&self, command: Command) -> JoinHandle<()> {
        let spec = self.config.request(command);
        let delay = spec.delay();
        let request = OutboundRequest::from_spec(spec);
        let sender = self.sender.clone();

        info!(%command, ?delay, "Dispatching command");

        tokio::spawn(async move {
            let request = match request {
                Ok(request) => request,
                Err(e) => {
                    error!("Failed to build request for {}: {}", command, e);
                    return;
                }
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            debug!("Sending {} {} for {}", request.method, request.url, command);
            if let Err(e) = sender.send(request).await {
                warn!("Request for {} failed: {:?}", command, e);
            }
        })
    }
}
