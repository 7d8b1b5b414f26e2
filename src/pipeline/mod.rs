mod shape;
mod template;

pub use shape::{FieldKind, FieldSpec, Shape, Violation};
pub use template::PromptTemplate;

use crate::{
    Error, Result,
    llm::{GenerationRequest, LlmClient},
};
use serde_json::Value;
use tracing::{debug, warn};

/// Binds a request shape, a response shape and a prompt template for one
/// invocation kind. Built once at startup and shared read-only; the pipeline
/// itself keeps no per-call state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationConfig {
    name: &'static str,
    request_shape: &'static Shape,
    response_shape: &'static Shape,
    template: PromptTemplate,
}

impl InvocationConfig {
    /// Fails if the template references fields the request shape does not
    /// declare, so rendering never meets an unknown placeholder at call time.
    pub fn new(
        name: &'static str,
        request_shape: &'static Shape,
        response_shape: &'static Shape,
        template: PromptTemplate,
    ) -> Result<Self> {
        template.check_against(request_shape)?;

        Ok(Self {
            name,
            request_shape,
            response_shape,
            template,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Steps 1 and 2: validate the request and render the prompt.
    pub fn render(&self, request: &Value) -> Result<String> {
        self.request_shape
            .validate(request)
            .map_err(|v| Error::invalid_request(v.field, v.reason))?;

        Ok(self.template.render(self.request_shape, request))
    }
}

/// A single best-effort round trip: validate the request, render the prompt,
/// call the backend, validate the reply. The first failing step decides the
/// error kind and no later step runs; there is no retry or caching.
pub async fn invoke(
    config: &InvocationConfig,
    client: &dyn LlmClient,
    request: &Value,
) -> Result<Value> {
    let prompt = config.render(request)?;
    debug!(
        "Rendered '{}' prompt ({} bytes)",
        config.name,
        prompt.len()
    );

    let generation = client
        .generate(GenerationRequest {
            prompt,
            schema_name: config.name.to_string(),
            schema: config.response_shape.json_schema(),
            temperature: None,
            max_tokens: None,
        })
        .await;

    let generation = match generation {
        Ok(generation) => generation,
        Err(e) => {
            warn!("Backend call for '{}' failed: {}", config.name, e);
            return Err(e);
        }
    };

    let payload: Value = serde_json::from_str(&generation.content)
        .map_err(|e| Error::backend(format!("Backend returned malformed payload: {}", e)))?;

    config
        .response_shape
        .validate(&payload)
        .map_err(|v| Error::invalid_response(v.field, v.reason))?;

    debug!("'{}' invocation completed", config.name);

    Ok(payload)
}
