//! Static asset handlers
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const ECOP_UI_CSS: &str = include_str!("../../../static/ecop-ui.css");
const FORM_VALIDATION_JS: &str = include_str!("../../../static/form-validation.js");
const PAGE_WARNING_JS: &str = include_str!("../../../static/page-warning.js");

fn asset(content_type: &'static str, body: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", content_type),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        body,
    )
        .into_response()
}

/// GET /static/ecop-ui.css
pub async fn serve_ecop_ui_css() -> Response {
    asset("text/css", ECOP_UI_CSS)
}

/// GET /static/form-validation.js
///
/// Blocks submitting an annotation while a rating is missing
pub async fn serve_form_validation_js() -> Response {
    asset("application/javascript", FORM_VALIDATION_JS)
}

/// GET /static/page-warning.js
///
/// Warns before leaving an annotation page with unsaved ratings
pub async fn serve_page_warning_js() -> Response {
    asset("application/javascript", PAGE_WARNING_JS)
}
