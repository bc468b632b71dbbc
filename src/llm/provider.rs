use async_trait::async_trait;
use crate::config::LLMConfig;
use crate::types::{AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Connection settings for a chat model provider
pub struct LLMProviderConfig {
    pub provider: LLMProvider,
    pub base_url: String,
    pub api_key: String,
}

impl From<&LLMConfig> for LLMProviderConfig {
    fn from(config: &LLMConfig) -> Self {
        Self {
            provider: config.provider,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> Self {
        let adapter: Box<dyn LLMAdapter> = match provider.provider {
            LLMProvider::Ollama => Box::new(crate::llm::ollama::OllamaAdapter::new(&provider.base_url)),
            // Any server speaking the OpenAI chat completions dialect (vLLM, llama.cpp, OpenAI itself)
            LLMProvider::OpenAI => Box::new(crate::llm::openai::OpenAIAdapter::new(
                &provider.base_url,
                &provider.api_key,
            )),
        };

        Self {
            adapter,
            provider_name: provider.provider.to_string(),
        }
    }

    /// Wrap an already-built adapter
    pub fn from_adapter(name: impl Into<String>, adapter: Box<dyn LLMAdapter>) -> Self {
        Self {
            adapter,
            provider_name: name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}
