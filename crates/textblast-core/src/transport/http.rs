//! HTTP gateway transport

use super::{MessageTransport, TransportError};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Transport that hands messages to an HTTP SMS gateway
pub struct HttpGatewayTransport {
    client: reqwest::Client,
    gateway_url: String,
    api_key: Option<String>,
}

impl HttpGatewayTransport {
    pub fn new(gateway_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            gateway_url: gateway_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl MessageTransport for HttpGatewayTransport {
    fn is_available(&self) -> bool {
        !self.gateway_url.is_empty()
    }

    async fn send(&self, phone: &str, body: &str) -> Result<(), TransportError> {
        let mut request = self
            .client
            .post(&self.gateway_url)
            .json(&json!({ "to": phone, "body": body }));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Failed(format!("gateway request failed: {}", e)))?;

        if response.status().is_success() {
            debug!("gateway accepted message to {}", phone);
            Ok(())
        } else {
            Err(TransportError::Failed(format!(
                "gateway returned {}",
                response.status()
            )))
        }
    }
}
