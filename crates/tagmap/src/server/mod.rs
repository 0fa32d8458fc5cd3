//! HTTP front end.
//!
//! Routes:
//!
//! - `GET /` upload form
//! - `POST /` multipart upload (field `file`), builds the map, redirects to `/map`
//! - `GET /map` viewer page
//! - `GET /map/document` the generated document
//! - `GET /download-map` the generated document as an attachment
//!
//! Builds run on the blocking pool, one at a time.

mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::builder::MapBuilder;
use crate::error::Result;

pub use handlers::{sanitize_filename, DOWNLOAD_FILE_NAME};

/// State shared by all handlers.
#[derive(Debug)]
pub struct AppState {
    builder: Arc<MapBuilder>,
    build_lock: Mutex<()>,
}

impl AppState {
    /// Wrap a builder for use by the router.
    #[must_use]
    pub fn new(builder: MapBuilder) -> Self {
        Self {
            builder: Arc::new(builder),
            build_lock: Mutex::new(()),
        }
    }

    /// The builder behind the routes.
    #[must_use]
    pub fn builder(&self) -> &MapBuilder {
        &self.builder
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.builder.config().server.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::index).post(handlers::upload))
        .route("/map", get(handlers::map_view))
        .route("/map/document", get(handlers::map_document))
        .route("/download-map", get(handlers::download_map))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the directories cannot be created or the address cannot be bound.
pub async fn serve(builder: MapBuilder) -> Result<()> {
    builder.prepare_dirs()?;
    let addr = builder.config().bind_address();
    let app = router(Arc::new(AppState::new(builder)));

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
