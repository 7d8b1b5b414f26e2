use super::types::{
    ErrorResponse, NewBookRequest, NewExpenseRequest, NewHoldingRequest, NewTaskRequest,
    SessionCreated,
};
use crate::{
    Error,
    flows::{
        Flows, expense_insights,
        expense_insights::ExpenseInsightsOutput,
        personal_challenges,
        personal_challenges::PersonalChallengesOutput,
        reading_recommendations,
        reading_recommendations::ReadingRecommendationsOutput,
    },
    llm::LlmClient,
    store::{ActivitySummary, Book, Expense, Holding, SessionStore, Task},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub flows: Arc<Flows>,
    pub llm: Arc<dyn LlmClient>,
}

type Rejection = (StatusCode, Json<ErrorResponse>);
type HandlerResult<T> = Result<Json<T>, Rejection>;

/// Maps an error to its HTTP rendition. Validation and lookup failures carry
/// their own detail; backend causes are replaced by `user_message` and only
/// logged, since they are not actionable for the caller.
fn reject(err: Error, user_message: &str) -> Rejection {
    let status = match &err {
        Error::InvalidRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Backend(_) | Error::InvalidResponse { .. } => StatusCode::BAD_GATEWAY,
        Error::SessionNotFound { .. } | Error::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = match &err {
        Error::InvalidRequest { .. } | Error::SessionNotFound { .. } | Error::NotFound { .. } => {
            err.to_string()
        }
        _ => {
            error!("Request failed: {}", err);
            user_message.to_string()
        }
    };

    (status, Json(ErrorResponse { error: body }))
}

fn require(condition: bool, field: &str, reason: &str) -> Result<(), Rejection> {
    if condition {
        Ok(())
    } else {
        Err(reject(
            Error::invalid_request(field, reason),
            "Invalid request",
        ))
    }
}

// Session lifecycle

pub async fn create_session(State(state): State<AppState>) -> HandlerResult<SessionCreated> {
    let session_id = state
        .store
        .create_session()
        .map_err(|e| reject(e, "Failed to create session"))?;

    Ok(Json(SessionCreated { session_id }))
}

// Tasks

pub async fn list_tasks(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> HandlerResult<Vec<Task>> {
    state
        .store
        .tasks(&session_id)
        .map(Json)
        .map_err(|e| reject(e, "Failed to list tasks"))
}

pub async fn add_task(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<NewTaskRequest>,
) -> HandlerResult<Task> {
    require(!request.title.trim().is_empty(), "title", "must not be empty")?;

    state
        .store
        .add_task(&session_id, request.title, request.priority)
        .map(Json)
        .map_err(|e| reject(e, "Failed to add task"))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path((session_id, task_id)): Path<(String, i64)>,
) -> HandlerResult<Task> {
    state
        .store
        .toggle_task(&session_id, task_id)
        .map(Json)
        .map_err(|e| reject(e, "Failed to toggle task"))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path((session_id, task_id)): Path<(String, i64)>,
) -> Result<StatusCode, Rejection> {
    state
        .store
        .delete_task(&session_id, task_id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|e| reject(e, "Failed to delete task"))
}

// Expenses

pub async fn list_expenses(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> HandlerResult<Vec<Expense>> {
    state
        .store
        .expenses(&session_id)
        .map(Json)
        .map_err(|e| reject(e, "Failed to list expenses"))
}

pub async fn add_expense(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<NewExpenseRequest>,
) -> HandlerResult<Expense> {
    require(
        !request.description.trim().is_empty(),
        "description",
        "must not be empty",
    )?;
    require(request.amount > 0.0, "amount", "must be positive")?;
    require(
        !request.category.trim().is_empty(),
        "category",
        "must not be empty",
    )?;

    state
        .store
        .add_expense(
            &session_id,
            request.description,
            request.amount,
            request.category,
            request.date,
        )
        .map(Json)
        .map_err(|e| reject(e, "Failed to add expense"))
}

// Portfolio

pub async fn list_portfolio(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> HandlerResult<Vec<Holding>> {
    state
        .store
        .portfolio(&session_id)
        .map(Json)
        .map_err(|e| reject(e, "Failed to list portfolio"))
}

pub async fn add_holding(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<NewHoldingRequest>,
) -> HandlerResult<Holding> {
    let ticker = request.ticker.trim();
    require(
        !ticker.is_empty() && ticker.len() <= 5,
        "ticker",
        "must be 1 to 5 characters",
    )?;
    require(request.shares > 0.0, "shares", "must be positive")?;

    state
        .store
        .add_holding(&session_id, ticker.to_string(), request.shares)
        .map(Json)
        .map_err(|e| reject(e, "Failed to add holding"))
}

pub async fn refresh_portfolio(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> HandlerResult<Vec<Holding>> {
    state
        .store
        .refresh_quotes(&session_id)
        .map(Json)
        .map_err(|e| reject(e, "Failed to refresh quotes"))
}

pub async fn remove_holding(
    State(state): State<AppState>,
    Path((session_id, ticker)): Path<(String, String)>,
) -> Result<StatusCode, Rejection> {
    state
        .store
        .remove_holding(&session_id, &ticker)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|e| reject(e, "Failed to remove holding"))
}

// Reading log

pub async fn list_books(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> HandlerResult<Vec<Book>> {
    state
        .store
        .books(&session_id)
        .map(Json)
        .map_err(|e| reject(e, "Failed to list books"))
}

pub async fn add_book(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<NewBookRequest>,
) -> HandlerResult<Book> {
    require(!request.title.trim().is_empty(), "title", "must not be empty")?;
    require(
        !request.author.trim().is_empty(),
        "author",
        "must not be empty",
    )?;
    require(request.progress <= 100, "progress", "must be at most 100")?;

    state
        .store
        .add_book(&session_id, request.title, request.author, request.progress)
        .map(Json)
        .map_err(|e| reject(e, "Failed to add book"))
}

pub async fn activity_summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> HandlerResult<ActivitySummary> {
    state
        .store
        .summary(&session_id)
        .map(Json)
        .map_err(|e| reject(e, "Failed to build activity summary"))
}

// AI flows. Bodies arrive as raw JSON and are validated by the invocation
// pipeline itself, so the three-way error taxonomy (not the HTTP extractor)
// decides the outcome.

pub async fn generate_expense_insights(
    State(state): State<AppState>,
    Json(request): Json<Value>,
) -> HandlerResult<ExpenseInsightsOutput> {
    info!("Received expense insights request");

    expense_insights::run(&state.flows.expense_insights, state.llm.as_ref(), &request)
        .await
        .map(Json)
        .map_err(|e| reject(e, "Failed to generate insights"))
}

pub async fn generate_personal_challenges(
    State(state): State<AppState>,
    Json(request): Json<Value>,
) -> HandlerResult<PersonalChallengesOutput> {
    info!("Received personal challenges request");

    personal_challenges::run(
        &state.flows.personal_challenges,
        state.llm.as_ref(),
        &request,
    )
    .await
    .map(Json)
    .map_err(|e| reject(e, "Failed to generate challenges"))
}

pub async fn generate_reading_recommendations(
    State(state): State<AppState>,
    Json(request): Json<Value>,
) -> HandlerResult<ReadingRecommendationsOutput> {
    info!("Received reading recommendations request");

    reading_recommendations::run(
        &state.flows.reading_recommendations,
        state.llm.as_ref(),
        &request,
    )
    .await
    .map(Json)
    .map_err(|e| reject(e, "Failed to generate recommendations"))
}
