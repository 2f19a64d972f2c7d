//! Instructions page and the entry point into the annotation flow

use axum::{
    extract::State,
    response::{Html, Redirect},
    Extension,
};
use tracing::info;

use ecop_common::progress::{NextStep, Progress};

use crate::api::ui::pages;
use crate::error::ApiResult;
use crate::session::CurrentUser;
use crate::AppState;

/// GET /instructions
pub async fn instructions_page(
    State(state): State<AppState>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> ApiResult<Html<String>> {
    let progress = Progress::for_user(&state.catalog, &state.annotations, &username).await?;
    Ok(Html(pages::instructions_page(&username, &progress)))
}

/// GET /start_annotation
///
/// Sends the user to their first pending poem, or back to the instructions
/// once everything is annotated.
pub async fn start_annotation(
    State(state): State<AppState>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> ApiResult<Redirect> {
    let progress = Progress::for_user(&state.catalog, &state.annotations, &username).await?;
    match progress.next_step() {
        NextStep::Annotate(poem) => Ok(Redirect::to(&format!("/annotate/{}", poem.url_slug()))),
        NextStep::AllDone => {
            info!("User {} has no pending poems", username);
            Ok(Redirect::to("/instructions"))
        }
    }
}
