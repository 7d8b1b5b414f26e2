use crate::store::Priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct NewTaskRequest {
    pub title: String,
    pub priority: Priority,
}

#[derive(Debug, Deserialize)]
pub struct NewExpenseRequest {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewHoldingRequest {
    pub ticker: String,
    pub shares: f64,
}

#[derive(Debug, Deserialize)]
pub struct NewBookRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub progress: u8,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
