//! Chat-completion client for per-file document analysis.
//!
//! Built once at startup from `OPENAI_API_KEY`; absent key means absent
//! client, and the analyze endpoint reports 503 instead of erroring on
//! every file. The prompt lives here as a constant so changing the
//! analysis behaviour requires editing exactly one place and tests can
//! inspect it without a live API.

use crate::config::ChatConfig;
use crate::error::DocmillError;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

/// System prompt for document analysis.
pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a careful document analyst. Summarise the document you are \
     given: the key points, figures, and conclusions, in Markdown. Use \
     only the document content, no outside knowledge.";

/// Build the user message for one converted document.
pub fn analysis_prompt(markdown: &str) -> String {
    format!(
        "Can you summarize the following document:\n\n{}",
        markdown
    )
}

/// Thin wrapper over the chat-completion API.
pub struct ChatClient {
    client: Client<OpenAIConfig>,
    config: ChatConfig,
}

impl ChatClient {
    /// Construct from the process environment.
    ///
    /// Returns `None` when `OPENAI_API_KEY` is unset or empty, so the
    /// service can start without the analysis feature.
    pub fn from_env(config: ChatConfig) -> Option<Self> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => Some(Self {
                client: Client::with_config(OpenAIConfig::new().with_api_key(key)),
                config,
            }),
            _ => None,
        }
    }

    /// Construct with an explicit key and API base, mainly for tests.
    pub fn with_endpoint(config: ChatConfig, api_key: &str, api_base: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);
        Self {
            client: Client::with_config(openai_config),
            config,
        }
    }

    /// Ask the model to analyse one converted document.
    pub async fn analyze(&self, markdown: &str) -> Result<String, DocmillError> {
        debug!(
            "Requesting analysis from {} ({} bytes of Markdown)",
            self.config.model,
            markdown.len()
        );

        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(ANALYSIS_SYSTEM_PROMPT)
            .build()
            .map_err(|e| DocmillError::Chat {
                detail: e.to_string(),
            })?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(analysis_prompt(markdown))
            .build()
            .map_err(|e| DocmillError::Chat {
                detail: e.to_string(),
            })?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages([
                ChatCompletionRequestMessage::System(system),
                ChatCompletionRequestMessage::User(user),
            ])
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build()
            .map_err(|e| DocmillError::Chat {
                detail: e.to_string(),
            })?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("Chat completion failed: {}", e);
            DocmillError::Chat {
                detail: e.to_string(),
            }
        })?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .ok_or_else(|| DocmillError::Chat {
                detail: "model returned no content".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_embeds_the_document() {
        let prompt = analysis_prompt("# Quarterly Report\n\nRevenue rose.");
        assert!(prompt.contains("Quarterly Report"));
        assert!(prompt.starts_with("Can you summarize"));
    }

    #[test]
    fn from_env_without_key_is_none() {
        // Skipped when the test environment happens to carry a real key.
        if std::env::var("OPENAI_API_KEY").is_err() {
            assert!(ChatClient::from_env(ChatConfig::default()).is_none());
        }
    }
}
