use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use daybreak_common::Config;
use daybreak_store::{migrate, Store};

mod view;

use view::ViewState;

/// Seconds between background snapshot refreshes.
const REFRESH_INTERVAL: Duration = Duration::from_secs(600);

async fn get_stories(State(view): State<Arc<ViewState>>) -> impl IntoResponse {
    let snapshot = view.load();
    Json(snapshot.ranked.clone())
}

async fn get_story(
    State(view): State<Arc<ViewState>>,
    Path(story_id): Path<i64>,
) -> impl IntoResponse {
    let snapshot = view.load();
    match snapshot.story(story_id) {
        Some(story) => Json(story.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn post_refresh(State(view): State<Arc<ViewState>>) -> impl IntoResponse {
    match view.refresh().await {
        Ok(stories) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "stories refreshed successfully",
                "stories": stories,
            })),
        ),
        Err(e) => {
            warn!(error = %e, "Refresh failed, keeping current snapshot");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        }
    }
}

/// Background refresher: polls on an interval until shutdown. Errors keep
/// the previous snapshot in place.
async fn refresh_loop(view: Arc<ViewState>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(REFRESH_INTERVAL) => {
                if let Err(e) = view.refresh().await {
                    warn!(error = %e, "Background refresh failed");
                }
            }
            _ = shutdown.changed() => {
                info!("Refresher shutting down");
                return;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("daybreak=info".parse()?))
        .init();

    let config = Config::load()?;
    let store = Store::connect(config.store()).await?;
    migrate::migrate(&store).await?;

    let view = Arc::new(ViewState::new(store));

    // First assembly before serving; an empty store is fine.
    if let Err(e) = view.refresh().await {
        warn!(error = %e, "Initial snapshot assembly failed, serving empty view");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let refresher = tokio::spawn(refresh_loop(Arc::clone(&view), shutdown_rx));

    let app = Router::new()
        .route("/stories", get(get_stories))
        .route("/story/{story_id}", get(get_story))
        .route("/refresh", post(post_refresh))
        .with_state(view)
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let host = std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("API_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "8000".to_string());
    let addr = format!("{host}:{port}");
    info!("daybreak API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Join the refresher on the way out.
    let _ = shutdown_tx.send(true);
    let _ = refresher.await;

    Ok(())
}
