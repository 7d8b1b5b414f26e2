use crate::{
    Result,
    llm::LlmClient,
    pipeline::{self, FieldKind, FieldSpec, InvocationConfig, PromptTemplate, Shape},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRecommendationsInput {
    pub reading_history: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre_preferences: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingRecommendationsOutput {
    pub recommendations: String,
}

static REQUEST_SHAPE: Shape = Shape::new(&[
    FieldSpec::required("readingHistory", FieldKind::Text),
    FieldSpec::optional("genrePreferences", FieldKind::Text),
]);

static RESPONSE_SHAPE: Shape =
    Shape::new(&[FieldSpec::required("recommendations", FieldKind::Text)]);

const TEMPLATE: &str = "\
You are a book recommendation expert. Based on the user's reading history, provide personalized book recommendations. If the user specifies any genre preferences, incorporate those preferences into your recommendations.

Reading History: {{readingHistory}}
Genre Preferences: {{genrePreferences}}

Provide a list of book recommendations.
";

pub fn config() -> Result<InvocationConfig> {
    InvocationConfig::new(
        "reading_recommendations",
        &REQUEST_SHAPE,
        &RESPONSE_SHAPE,
        PromptTemplate::new(TEMPLATE),
    )
}

pub async fn run(
    config: &InvocationConfig,
    client: &dyn LlmClient,
    request: &Value,
) -> Result<ReadingRecommendationsOutput> {
    let payload = pipeline::invoke(config, client, request).await?;
    Ok(serde_json::from_value(payload)?)
}
