//! UI pages and static assets
//!
//! - **Pages** (`pages`): HTML rendering for every page of the service
//! - **Static Assets** (`static_assets`): CSS/JS file serving

use axum::{routing::get, Router};

use crate::AppState;

pub mod pages;
mod static_assets;

use static_assets::{serve_ecop_ui_css, serve_form_validation_js, serve_page_warning_js};

/// Build static asset routes
pub fn static_routes() -> Router<AppState> {
    Router::new()
        .route("/static/ecop-ui.css", get(serve_ecop_ui_css))
        .route("/static/form-validation.js", get(serve_form_validation_js))
        .route("/static/page-warning.js", get(serve_page_warning_js))
}
