use super::types::*;
use crate::{Error, Result, config::LlmConfig};
use async_openai::{Client, config::OpenAIConfig, types as openai_types};
use async_trait::async_trait;
use tracing::debug;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    system_prompt: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(config.api_key);

        if !config.base_url.is_empty() {
            openai_config = openai_config.with_api_base(config.base_url);
        }

        let client = Client::with_config(openai_config);

        Self {
            client,
            model: config.model,
            system_prompt: config.system_prompt,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        debug!(
            "Requesting structured generation for '{}' ({} prompt bytes)",
            request.schema_name,
            request.prompt.len()
        );

        let mut messages: Vec<openai_types::ChatCompletionRequestMessage> = Vec::new();

        if let Some(ref system_prompt) = self.system_prompt {
            let msg = openai_types::ChatCompletionRequestSystemMessageArgs::default()
                .content(openai_types::ChatCompletionRequestSystemMessageContent::Text(
                    system_prompt.clone(),
                ))
                .build()
                .map_err(|e| Error::backend(format!("Failed to build system message: {}", e)))?;
            messages.push(msg.into());
        }

        let msg = openai_types::ChatCompletionRequestUserMessageArgs::default()
            .content(openai_types::ChatCompletionRequestUserMessageContent::Text(
                request.prompt,
            ))
            .build()
            .map_err(|e| Error::backend(format!("Failed to build user message: {}", e)))?;
        messages.push(msg.into());

        let response_format = openai_types::ResponseFormat::JsonSchema {
            json_schema: openai_types::ResponseFormatJsonSchema {
                description: None,
                name: request.schema_name.clone(),
                schema: Some(request.schema),
                strict: None,
            },
        };

        let mut request_builder = openai_types::CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.model)
            .messages(messages)
            .response_format(response_format)
            .temperature(request.temperature.unwrap_or(0.7));

        if let Some(max_tokens) = request.max_tokens {
            request_builder.max_tokens(max_tokens as u32);
        }

        let openai_request = request_builder
            .build()
            .map_err(|e| Error::backend(format!("Failed to build completion request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(|e| Error::backend(e.to_string()))?;

        debug!(
            "Received completion response with {} choices for '{}'",
            response.choices.len(),
            request.schema_name
        );

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::backend("Completion response has no choices"))?;

        let content = choice.message.content.unwrap_or_default();

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(GenerationResponse {
            content,
            model: response.model,
            usage,
        })
    }
}
