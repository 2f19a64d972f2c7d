//! ecop-annotator library - poem similarity annotation service
//!
//! Annotators log in, read each assigned poem next to its precomputed
//! recommendations, and rate how similar every recommendation is. Ratings
//! are appended to the annotation store.

use axum::{
    middleware,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ecop_common::config::DataPaths;
use ecop_common::corpus::PoemCorpus;
use ecop_common::{AnnotationLayout, AnnotationStore, Catalog};

pub mod api;
pub mod error;
pub mod normalize;
pub mod session;

pub use error::{ApiError, ApiResult};
use session::SessionStore;

/// Runtime settings that are not part of the data root
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub secret_key: String,
    /// Extension restored when turning a URL slug back into a poem id
    pub poem_extension: String,
    pub annotation_layout: AnnotationLayout,
    pub session_ttl: chrono::Duration,
}

/// Longest accepted session idle timeout
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

impl ServiceSettings {
    /// Session idle timeout from the configured minutes
    ///
    /// Values beyond [`MAX_SESSION_TTL_DAYS`] are clamped with a warning.
    pub fn session_ttl_from_minutes(minutes: u64) -> chrono::Duration {
        let max = chrono::Duration::days(MAX_SESSION_TTL_DAYS);
        match i64::try_from(minutes).ok().and_then(chrono::Duration::try_minutes) {
            Some(ttl) if ttl <= max => ttl,
            _ => {
                warn!(
                    "session_ttl_minutes = {} is too large, using {} days",
                    minutes, MAX_SESSION_TTL_DAYS
                );
                max
            }
        }
    }
}

/// `RUST_LOG` filter, or `default` when `RUST_LOG` is unset or invalid
pub fn env_filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Users, titles and similarity tables (read-only after startup)
    pub catalog: Arc<Catalog>,
    pub corpus: Arc<PoemCorpus>,
    pub annotations: Arc<AnnotationStore>,
    pub sessions: SessionStore,
    pub poem_extension: Arc<str>,
    /// Server startup time
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(catalog: Catalog, paths: &DataPaths, settings: ServiceSettings) -> Self {
        Self {
            catalog: Arc::new(catalog),
            corpus: Arc::new(PoemCorpus::new(paths.corpus_dir())),
            annotations: Arc::new(AnnotationStore::new(paths, settings.annotation_layout)),
            sessions: SessionStore::new(&settings.secret_key, settings.session_ttl),
            poem_extension: Arc::from(settings.poem_extension.as_str()),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Every request passes the session middleware; the annotation pages also
/// require a logged-in session.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/instructions", get(api::instructions_page))
        .route("/start_annotation", get(api::start_annotation))
        .route(
            "/annotate/:poem_url",
            get(api::annotate_page).post(api::submit_annotation),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_login,
        ));

    let public = Router::new()
        .route("/", get(api::home_page))
        .route("/login", get(api::login_page).post(api::login_submit))
        .route("/logout", get(api::logout))
        .merge(api::ui::static_routes())
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
