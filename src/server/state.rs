//! Shared application state.

use crate::config::ServiceConfig;
use crate::convert::Converter;
use crate::error::DocmillError;
use crate::llm::ChatClient;
use crate::remote::CloudParser;
use std::sync::Arc;

/// State shared by every handler.
///
/// The converter is the process-wide pipeline instance, constructed once
/// at startup; the chat client is present only when an API key was found
/// in the environment.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub converter: Arc<Converter>,
    pub cloud: Arc<CloudParser>,
    pub chat: Option<Arc<ChatClient>>,
}

impl AppState {
    /// Build the state from a validated configuration, reading API keys
    /// from the process environment where the config does not carry them.
    pub fn new(config: ServiceConfig) -> Result<Self, DocmillError> {
        let converter = Converter::new(config.ocr.clone(), config.extract_timeout_secs);

        let mut cloud_config = config.cloud.clone();
        if cloud_config.api_key.is_none() {
            cloud_config.api_key = std::env::var("LLAMA_CLOUD_API_KEY")
                .ok()
                .filter(|k| !k.is_empty());
        }
        let cloud = CloudParser::new(cloud_config)?;

        let chat = ChatClient::from_env(config.chat.clone()).map(Arc::new);

        Ok(Self {
            config: Arc::new(config),
            converter: Arc::new(converter),
            cloud: Arc::new(cloud),
            chat,
        })
    }

    /// Replace the chat client, mainly for tests that point it at a
    /// mock endpoint.
    pub fn with_chat(mut self, chat: ChatClient) -> Self {
        self.chat = Some(Arc::new(chat));
        self
    }
}
