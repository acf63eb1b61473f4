#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use crate::backend::decoder::{DeltaStream, decode_stream};
use crate::backend::{ArcBackend, Backend, BackendError};
use crate::config::{BackendConfig, user_agent};
use crate::models::Message;
use async_trait::async_trait;
use eyre::{Context, Result, bail};
use serde::Serialize;
use std::sync::Arc;
use std::time;

const DEFAULT_ALIAS: &str = "EmpathyBot";

/// HTTP client for the streaming chat endpoint.
pub struct ChatClient {
    alias: String,
    endpoint: String,
    api_key: Option<String>,
    timeout: Option<time::Duration>,
    idle_timeout: Option<time::Duration>,
    http: reqwest::Client,
}

#[async_trait]
impl Backend for ChatClient {
    fn name(&self) -> &str {
        &self.alias
    }

    async fn stream_chat(&self, messages: &[Message]) -> Result<DeltaStream> {
        if messages.is_empty() {
            bail!("no messages to send");
        }

        let chat_req = ChatRequest { messages };

        let mut req = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("User-Agent", user_agent());

        if let Some(token) = &self.api_key {
            req = req.bearer_auth(token);
        }

        log::trace!("Sending chat request: {:?}", chat_req);

        let send = req.json(&chat_req).send();
        let res = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, send)
                .await
                .map_err(|_| BackendError::RequestTimeout(timeout))?,
            None => send.await,
        }
        .wrap_err("sending chat request")?;

        if !res.status().is_success() {
            let http_code = res.status().as_u16();
            let resp = res.text().await.unwrap_or_default();
            log::error!("Error response ({}): {}", http_code, resp);
            return Err(BackendError::from_status(http_code).into());
        }

        log::debug!("Chat stream opened ({} messages)", messages.len());
        Ok(decode_stream(res.bytes_stream(), self.idle_timeout))
    }
}

impl From<ChatClient> for ArcBackend {
    fn from(value: ChatClient) -> Self {
        Arc::new(value)
    }
}

impl From<&BackendConfig> for ChatClient {
    fn from(value: &BackendConfig) -> Self {
        let mut client = ChatClient::default().with_endpoint(&value.endpoint);

        if let Some(api_key) = value.api_key.as_deref() {
            client = client.with_api_key(api_key);
        }

        if let Some(alias) = value.alias.as_deref() {
            client.alias = alias.to_string();
        }

        if let Some(timeout) = value.timeout() {
            client = client.with_timeout(timeout);
        }

        if let Some(idle_timeout) = value.idle_timeout() {
            client = client.with_idle_timeout(idle_timeout);
        }
        client
    }
}

impl ChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: time::Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn timeout(&self) -> Option<time::Duration> {
        self.timeout
    }

    pub fn idle_timeout(&self) -> Option<time::Duration> {
        self.idle_timeout
    }
}

impl Default for ChatClient {
    fn default() -> Self {
        Self {
            alias: DEFAULT_ALIAS.to_string(),
            endpoint: crate::config::constants::DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout: None,
            idle_timeout: None,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Message],
}
