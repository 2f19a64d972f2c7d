//! Annotation page: one poem, its recommendations and a rating per recommendation

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use ecop_common::progress::{PoemAccess, Progress};
use ecop_common::submission::validate_labels;
use ecop_common::{Annotation, PoemId};

use crate::api::ui::pages;
use crate::error::{ApiError, ApiResult};
use crate::session::{CurrentUser, Session, CSRF_FIELD};
use crate::AppState;

/// A recommended poem as shown on the page
#[derive(Debug, Clone)]
pub struct NeighborView {
    pub poem: PoemId,
    pub title: String,
    /// `None` when the text could not be loaded
    pub text: Option<String>,
}

/// Everything the annotation page displays
#[derive(Debug, Clone)]
pub struct AnnotationView {
    pub poem: PoemId,
    pub author: String,
    pub original_title: String,
    pub text: String,
    pub neighbors: Vec<NeighborView>,
}

impl AnnotationView {
    pub fn neighbor_ids(&self) -> Vec<PoemId> {
        self.neighbors.iter().map(|n| n.poem.clone()).collect()
    }
}

/// Resolve the requested poem for `username`
///
/// `Err(redirect)` inside `Ok` means the poem is already annotated and the
/// user should move on.
async fn prepare(
    state: &AppState,
    username: &str,
    poem_url: &str,
) -> ApiResult<Result<AnnotationView, Redirect>> {
    let poem = PoemId::from_url_slug(poem_url, &state.poem_extension)
        .map_err(|e| ApiError::NotFound(format!("{}: {}", poem_url, e)))?;

    let progress = Progress::for_user(&state.catalog, &state.annotations, username).await?;
    match progress.access(&poem) {
        PoemAccess::Denied => {
            return Err(ApiError::Forbidden(format!(
                "Poem {} is not assigned to {}",
                poem, username
            )))
        }
        PoemAccess::AlreadyAnnotated => {
            debug!("{} already annotated {}", username, poem);
            return Ok(Err(Redirect::to("/start_annotation")));
        }
        PoemAccess::Open => {}
    }

    let main = state
        .corpus
        .resolve_text(&state.catalog.titles, &poem)
        .await?;

    let use_randomized = state
        .catalog
        .user(username)
        .map(|u| u.use_random_recommendations)
        .unwrap_or(false);

    let mut neighbors = Vec::new();
    for neighbor in state.catalog.neighbors(&poem, use_randomized) {
        let view = match state
            .corpus
            .resolve_text(&state.catalog.titles, neighbor)
            .await
        {
            Ok(text) => NeighborView {
                poem: neighbor.clone(),
                title: text.original_title,
                text: Some(text.text),
            },
            Err(e) => {
                warn!("Recommendation {} of {}: {}", neighbor, poem, e);
                NeighborView {
                    poem: neighbor.clone(),
                    title: neighbor.display_title(),
                    text: None,
                }
            }
        };
        neighbors.push(view);
    }

    Ok(Ok(AnnotationView {
        author: poem.display_author(),
        poem,
        original_title: main.original_title,
        text: main.text,
        neighbors,
    }))
}

/// GET /annotate/:poem_url
pub async fn annotate_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Path(poem_url): Path<String>,
) -> ApiResult<Response> {
    match prepare(&state, &username, &poem_url).await? {
        Ok(view) => Ok(Html(pages::annotate_page(&view, &session.csrf_token, None, None)).into_response()),
        Err(redirect) => Ok(redirect.into_response()),
    }
}

/// POST /annotate/:poem_url
///
/// Incomplete submissions re-render the page with an inline error and save
/// nothing. A complete one is appended, then the browser is sent back to the
/// same URL, which moves on to the next pending poem.
pub async fn submit_annotation(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Path(poem_url): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Response> {
    if !state
        .sessions
        .verify_csrf(&session, form.get(CSRF_FIELD).map(String::as_str))
    {
        return Err(ApiError::InvalidCsrfToken);
    }

    let view = match prepare(&state, &username, &poem_url).await? {
        Ok(view) => view,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let labels = match validate_labels(&view.neighbor_ids(), &form) {
        Ok(labels) => labels,
        Err(incomplete) => {
            info!(
                "Rejected annotation of {} by {}: {}",
                view.poem, username, incomplete
            );
            let message = format!("Please rate every recommended poem ({}).", incomplete);
            let page = pages::annotate_page(&view, &session.csrf_token, Some(&form), Some(&message));
            return Ok(Html(page).into_response());
        }
    };

    state
        .annotations
        .append(Annotation::new(username, view.poem.clone(), labels))
        .await?;

    Ok(Redirect::to(&format!("/annotate/{}", view.poem.url_slug())).into_response())
}
