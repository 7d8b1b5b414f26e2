use crate::{
    Result,
    llm::LlmClient,
    pipeline::{self, FieldKind, FieldSpec, InvocationConfig, PromptTemplate, Shape},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub category: String,
    pub amount: f64,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseInsightsInput {
    pub expenses: Vec<ExpenseEntry>,
    pub income: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInsightsOutput {
    pub summary: String,
    pub key_spending_areas: Vec<String>,
    pub potential_savings_areas: Vec<String>,
    pub recommendations: String,
}

static EXPENSE_ENTRY_SHAPE: Shape = Shape::new(&[
    FieldSpec::required("category", FieldKind::Text),
    FieldSpec::required("amount", FieldKind::Number),
    FieldSpec::required("date", FieldKind::Text),
]);

static REQUEST_SHAPE: Shape = Shape::new(&[
    FieldSpec::required("expenses", FieldKind::RecordList(&EXPENSE_ENTRY_SHAPE)),
    FieldSpec::required("income", FieldKind::Number),
]);

static RESPONSE_SHAPE: Shape = Shape::new(&[
    FieldSpec::required("summary", FieldKind::Text),
    FieldSpec::required("keySpendingAreas", FieldKind::TextList),
    FieldSpec::required("potentialSavingsAreas", FieldKind::TextList),
    FieldSpec::required("recommendations", FieldKind::Text),
]);

const TEMPLATE: &str = "\
You are a personal finance advisor. Analyze the user's spending habits and provide insights and recommendations.

Here's the user's monthly income: {{income}}

Here's a list of their expenses:
{{expenses}}

Provide a summary of their spending habits, identify key spending areas and potential savings areas, and give recommendations for better financial management.
";

const EXPENSE_LINE: &str = "- Category: {{category}}, Amount: {{amount}}, Date: {{date}}";

pub fn config() -> Result<InvocationConfig> {
    InvocationConfig::new(
        "expense_insights",
        &REQUEST_SHAPE,
        &RESPONSE_SHAPE,
        PromptTemplate::with_elements(TEMPLATE, &[("expenses", EXPENSE_LINE)]),
    )
}

pub async fn run(
    config: &InvocationConfig,
    client: &dyn LlmClient,
    request: &Value,
) -> Result<ExpenseInsightsOutput> {
    let payload = pipeline::invoke(config, client, request).await?;
    Ok(serde_json::from_value(payload)?)
}
