use crate::{
    Result,
    llm::LlmClient,
    pipeline::{self, FieldKind, FieldSpec, InvocationConfig, PromptTemplate, Shape},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalChallengesInput {
    pub tasks_completed: f64,
    pub pages_read: f64,
    pub spending_last_week: f64,
    pub current_budget_goal: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub title: String,
    pub description: String,
    pub xp_bonus: f64,
    #[serde(default)]
    pub badge_reward: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalChallengesOutput {
    pub challenges: Vec<Challenge>,
}

static REQUEST_SHAPE: Shape = Shape::new(&[
    FieldSpec::required("tasksCompleted", FieldKind::Number),
    FieldSpec::required("pagesRead", FieldKind::Number),
    FieldSpec::required("spendingLastWeek", FieldKind::Number),
    FieldSpec::required("currentBudgetGoal", FieldKind::Number),
]);

static CHALLENGE_SHAPE: Shape = Shape::new(&[
    FieldSpec::required("title", FieldKind::Text),
    FieldSpec::required("description", FieldKind::Text),
    FieldSpec::required("xpBonus", FieldKind::Number),
    FieldSpec::optional("badgeReward", FieldKind::Text),
]);

static RESPONSE_SHAPE: Shape = Shape::new(&[FieldSpec::required(
    "challenges",
    FieldKind::RecordList(&CHALLENGE_SHAPE),
)]);

const TEMPLATE: &str = "\
You are a motivational coach. Based on the user's activity from the last week, create 3 personalized challenges to encourage them to improve. The challenges should be slightly more difficult than their previous week's performance.

User's activity last week:
- Tasks Completed: {{tasksCompleted}}
- Pages Read: {{pagesRead}}
- Last Week's Spending: {{spendingLastWeek}}
- Weekly Budget Goal: {{currentBudgetGoal}}

Generate creative and inspiring challenges. For each challenge, provide a title, a short description, and an XP bonus. One of the challenges can optionally award a special badge.
";

pub fn config() -> Result<InvocationConfig> {
    InvocationConfig::new(
        "personal_challenges",
        &REQUEST_SHAPE,
        &RESPONSE_SHAPE,
        PromptTemplate::new(TEMPLATE),
    )
}

pub async fn run(
    config: &InvocationConfig,
    client: &dyn LlmClient,
    request: &Value,
) -> Result<PersonalChallengesOutput> {
    let payload = pipeline::invoke(config, client, request).await?;
    Ok(serde_json::from_value(payload)?)
}
