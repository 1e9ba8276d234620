mod error;
mod models;
mod services;
mod utils;

use axum::{
    Router,
    extract::State,
    response::{Html, Json},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::ApiError;
use crate::models::{BookPlan, BookPlanRequest, ChapterRequest, ChapterResponse};
use crate::services::llm::{LLMClient, TextGenerator};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone)]
struct AppState {
    generator: Arc<dyn TextGenerator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // A missing credential stops the process before it accepts traffic
    let llm_client = LLMClient::new()?;
    tracing::info!(model = %llm_client.model(), "Gemini client configured");

    let app = build_router(AppState {
        generator: Arc::new(llm_client),
    });

    let addr = std::env::var("LISTEN_ADDR")
        .ok()
        .filter(|addr| !addr.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/generate-book-plan", post(generate_book_plan))
        .route("/generate-chapter", post(generate_chapter))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        )
}

async fn index() -> Html<&'static str> {
    Html(
        r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Kreate Book Generation Service</title>
        <meta charset="utf-8">
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .endpoint { background-color: #f5f5f5; padding: 10px; margin: 10px 0; border-radius: 4px; font-family: monospace; }
        </style>
    </head>
    <body>
        <h1>Kreate Book Generation Service</h1>
        <p>Plans books and writes their chapters with a generation model.</p>

        <h2>Available Endpoints:</h2>
        <div class="endpoint">GET / - This information page</div>
        <div class="endpoint">GET /health - Health check</div>
        <div class="endpoint">POST /generate-book-plan - Plan a book from its title, type, category and chapter count</div>
        <div class="endpoint">POST /generate-chapter - Write one chapter from its title and summary</div>
    </body>
    </html>
    "#,
    )
}

async fn health_check() -> &'static str {
    "OK"
}

async fn generate_book_plan(
    State(state): State<AppState>,
    Json(request): Json<BookPlanRequest>,
) -> Result<Json<BookPlan>, ApiError> {
    let plan = services::book_planner::generate_plan(&request, state.generator.as_ref())
        .await
        .map_err(ApiError::book_plan)?;

    Ok(Json(plan))
}

async fn generate_chapter(
    State(state): State<AppState>,
    Json(request): Json<ChapterRequest>,
) -> Result<Json<ChapterResponse>, ApiError> {
    let response = services::chapter_writer::generate_chapter(&request, state.generator.as_ref())
        .await
        .map_err(ApiError::chapter)?;

    Ok(Json(response))
}
