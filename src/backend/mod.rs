pub mod client;
pub mod decoder;
pub mod error;

pub use client::ChatClient;
pub use decoder::{DeltaStream, FrameDecoder, decode_stream};
pub use error::BackendError;

#[cfg(test)]
use mockall::automock;

use crate::{config::BackendConfig, models::Message};
use async_trait::async_trait;
use eyre::Result;
use std::sync::Arc;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Backend {
    fn name(&self) -> &str;

    /// Sends the whole history in one request and returns the reply as a
    /// stream of content deltas. `messages` must not be empty.
    async fn stream_chat(&self, messages: &[Message]) -> Result<DeltaStream>;
}

pub type ArcBackend = Arc<dyn Backend + Send + Sync>;

pub fn new_backend(config: &BackendConfig) -> ArcBackend {
    Arc::new(ChatClient::from(config))
}
