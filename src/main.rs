use axum::routing::{get, post};
use axum::Router;
use dotenvy::dotenv;
use tracing::{debug, error, info};

mod config;
mod db;
mod handlers;
mod llm;
mod prompt;
mod state;
mod storage;
mod utils;

use config::CONFIG;
use db::database::Database;
use handlers::{generate, health, posts};
use state::AppState;
use utils::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging();

    info!("Starting instadream service");

    let db = Database::init(&CONFIG.database_url).await?;
    let state = AppState::new(db);

    for facet in prompt::templates::Facet::ALL {
        debug!(
            "Template catalog facet {} loaded with {} options",
            facet.as_str(),
            facet.options().len()
        );
    }

    let app = Router::new()
        .route(
            "/api/generate-image",
            post(generate::generate_image_handler),
        )
        .route(
            "/api/generate-caption",
            post(generate::generate_caption_handler),
        )
        .route(
            "/api/prompt-preview",
            post(generate::prompt_preview_handler),
        )
        .route("/api/templates", get(generate::templates_handler))
        .route("/api/posts", get(posts::list_posts_handler))
        .route(
            "/api/posts/:id",
            get(posts::get_post_handler).delete(posts::delete_post_handler),
        )
        .route("/api/health", get(health::health_handler))
        .route("/api/storage-health", get(health::storage_health_handler))
        .with_state(state);

    let address = format!("{}:{}", CONFIG.server_host, CONFIG.server_port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutdown signal received");
}
