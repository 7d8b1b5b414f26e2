pub mod handlers;
pub mod types;

pub use handlers::AppState;

use crate::{Result, config::Config, flows::Flows, llm::{LlmClient, OpenAiClient}, store::SessionStore};
use axum::{
    Router,
    routing::{delete, get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/:session_id/tasks",
            get(handlers::list_tasks).post(handlers::add_task),
        )
        .route(
            "/api/sessions/:session_id/tasks/:task_id/toggle",
            post(handlers::toggle_task),
        )
        .route(
            "/api/sessions/:session_id/tasks/:task_id",
            delete(handlers::delete_task),
        )
        .route(
            "/api/sessions/:session_id/expenses",
            get(handlers::list_expenses).post(handlers::add_expense),
        )
        .route(
            "/api/sessions/:session_id/portfolio",
            get(handlers::list_portfolio).post(handlers::add_holding),
        )
        .route(
            "/api/sessions/:session_id/portfolio/refresh",
            post(handlers::refresh_portfolio),
        )
        .route(
            "/api/sessions/:session_id/portfolio/:ticker",
            delete(handlers::remove_holding),
        )
        .route(
            "/api/sessions/:session_id/books",
            get(handlers::list_books).post(handlers::add_book),
        )
        .route(
            "/api/sessions/:session_id/summary",
            get(handlers::activity_summary),
        )
        .route(
            "/api/insights/expenses",
            post(handlers::generate_expense_insights),
        )
        .route("/api/challenges", post(handlers::generate_personal_challenges))
        .route(
            "/api/recommendations/reading",
            post(handlers::generate_reading_recommendations),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let flows = Flows::new()?;
    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(config.llm.clone()));

    let state = AppState {
        store: Arc::new(SessionStore::new()),
        flows: Arc::new(flows),
        llm,
    };

    let app = router(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
