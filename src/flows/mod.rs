pub mod expense_insights;
pub mod personal_challenges;
pub mod reading_recommendations;

use crate::{Result, pipeline::InvocationConfig};

/// The three invocation configs, built once at startup and shared read-only
/// across all calls.
#[derive(Debug, Clone)]
pub struct Flows {
    pub expense_insights: InvocationConfig,
    pub personal_challenges: InvocationConfig,
    pub reading_recommendations: InvocationConfig,
}

impl Flows {
    pub fn new() -> Result<Self> {
        Ok(Self {
            expense_insights: expense_insights::config()?,
            personal_challenges: personal_challenges::config()?,
            reading_recommendations: reading_recommendations::config()?,
        })
    }
}
