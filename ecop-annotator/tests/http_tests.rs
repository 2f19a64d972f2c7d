//! Integration tests for the ecop-annotator HTTP surface
//!
//! Tests cover:
//! - Health endpoint (no session required)
//! - Login, logout and the login-required redirect
//! - Session storage: no entry for cookieless traffic, new id on login
//! - CSRF rejection on every form
//! - The annotation flow: next poem, access control, incomplete and
//!   complete submissions, poems without recommendations
//! - Randomized recommendations and the shared annotation file

mod helpers;

use axum::http::StatusCode;
use serde_json::Value;
use std::fs;

use ecop_common::{AnnotationLayout, AnnotationStore, PoemId};
use helpers::*;

fn store(app: &TestApp) -> AnnotationStore {
    AnnotationStore::new(&app.paths, AnnotationLayout::PerUser)
}

// =============================================================================
// Health and static assets
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_session_required() {
    let app = setup();
    let response = app.send(get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ecop-annotator");
    assert!(body["version"].is_string());
    assert_eq!(body["active_sessions"], 0);
}

#[tokio::test]
async fn test_cookieless_requests_store_no_session() {
    let app = setup();
    for _ in 0..50 {
        for uri in ["/health", "/static/ecop-ui.css", "/", "/instructions"] {
            let response = app.send(get(uri, None)).await;
            assert!(set_cookie_header(&response).is_none(), "{}", uri);
        }
    }
    assert_eq!(app.active_sessions().await, 0);

    // the login page is where an anonymous session starts
    app.anonymous_session().await;
    assert_eq!(app.active_sessions().await, 1);
}

#[tokio::test]
async fn test_static_assets_served() {
    let app = setup();
    let response = app.send(get("/static/ecop-ui.css", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/css");

    let response = app.send(get("/static/form-validation.js", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Login / logout
// =============================================================================

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let app = setup();
    for uri in ["/instructions", "/start_annotation", "/annotate/borges__el-otro"] {
        let response = app.send(get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), Some("/login"));
    }
}

#[tokio::test]
async fn test_login_with_wrong_password_rerenders_form() {
    let app = setup();
    let response = app.send(get("/login", None)).await;
    let cookie = session_cookie(&response).unwrap();
    let csrf = csrf_token(&body_string(response).await).unwrap();

    let body = format!("username=ana&password=wrong&csrf_token={}", csrf);
    let response = app.send(post_form("/login", Some(&cookie), body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Invalid credentials"));

    let response = app.send(get("/instructions", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_login_with_bad_csrf_token_is_rejected() {
    let app = setup();
    let response = app.send(get("/login", None)).await;
    let cookie = session_cookie(&response).unwrap();

    let body = "username=ana&password=secreto&csrf_token=forged".to_string();
    let response = app.send(post_form("/login", Some(&cookie), body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.send(get("/instructions", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_login_moves_to_new_session_id() {
    let app = setup();
    let (anonymous, csrf) = app.anonymous_session().await;

    let body = format!("username=ana&password=secreto&csrf_token={}", csrf);
    let response = app.send(post_form("/login", Some(&anonymous), body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response).unwrap();
    assert_ne!(cookie, anonymous);

    // the id known before login does not carry the login
    let response = app.send(get("/instructions", Some(&anonymous))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));

    let response = app.send(get("/instructions", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.active_sessions().await, 1);

    // the old token is bound to the old id
    assert_ne!(app.csrf_from_page("/login", &cookie).await, csrf);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = setup();
    let (cookie, _) = app.login("ana", "secreto").await;

    let response = app.send(get("/instructions", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(get("/logout", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(set_cookie_header(&response).unwrap().contains("Max-Age=0"));
    assert_eq!(app.active_sessions().await, 0);

    let response = app.send(get("/instructions", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/login"));
}

// =============================================================================
// Instructions and next poem
// =============================================================================

#[tokio::test]
async fn test_instructions_list_pending_poems() {
    let app = setup();
    let (cookie, _) = app.login("ana", "secreto").await;

    let response = app.send(get("/instructions", Some(&cookie))).await;
    let html = body_string(response).await;
    assert!(html.contains("0 of 2 poems annotated"));
    assert!(html.contains("Borges"));
    assert!(html.contains("Oda Al Mar"));
}

#[tokio::test]
async fn test_start_annotation_redirects_to_first_pending_poem() {
    let app = setup();
    let (cookie, _) = app.login("ana", "secreto").await;

    let response = app.send(get("/start_annotation", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/annotate/borges__el-otro"));
}

// =============================================================================
// Annotation page
// =============================================================================

#[tokio::test]
async fn test_annotation_page_shows_poem_and_recommendations() {
    let app = setup();
    let (cookie, _) = app.login("ana", "secreto").await;

    let response = app.send(get("/annotate/borges__el-otro", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("El otro"));
    assert!(html.contains("febrero de 1969"));
    assert_eq!(html.matches(r#"class="label-select""#).count(), EL_OTRO_NEIGHBORS);
    assert!(html.contains("Texto del poema 1"));
    // poema-10 has no text: placeholder instead of an error page
    assert!(html.contains("could not be loaded"));
}

#[tokio::test]
async fn test_unassigned_poem_is_forbidden() {
    let app = setup();
    let (cookie, _) = app.login("ana", "secreto").await;

    let response = app.send(get("/annotate/other__poem", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unresolvable_poem_is_not_found() {
    let app = setup();
    let (cookie, _) = app.login("carla", "llave").await;

    let response = app.send(get("/annotate/fantasma__perdido", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_incomplete_submission_is_rejected() {
    let app = setup();
    let (cookie, csrf) = app.login("ana", "secreto").await;

    let body = labels_form(&csrf, EL_OTRO_NEIGHBORS - 1);
    let response = app
        .send(post_form("/annotate/borges__el-otro", Some(&cookie), body))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("1 of 10 recommended poems have no label"));
    // earlier choices are kept
    assert!(html.contains(r#"<option value="2" selected>"#));

    assert!(store(&app).load("ana").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_complete_submission_is_saved_and_flow_moves_on() {
    let app = setup();
    let (cookie, csrf) = app.login("ana", "secreto").await;

    let body = labels_form(&csrf, EL_OTRO_NEIGHBORS);
    let response = app
        .send(post_form("/annotate/borges__el-otro", Some(&cookie), body))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/annotate/borges__el-otro"));

    let records = store(&app).load("ana").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].poem, PoemId::parse("borges/el-otro.pt").unwrap());
    assert_eq!(records[0].labels.len(), EL_OTRO_NEIGHBORS);
    assert_eq!(
        records[0].labels[&PoemId::parse(&neighbor_key(1)).unwrap()],
        "2"
    );

    // the annotated poem is not shown again
    let response = app.send(get("/annotate/borges__el-otro", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/start_annotation"));

    let response = app.send(get("/start_annotation", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/annotate/neruda__oda-al-mar"));
}

#[tokio::test]
async fn test_annotation_with_bad_csrf_token_is_rejected() {
    let app = setup();
    let (cookie, _) = app.login("ana", "secreto").await;

    let body = labels_form("forged", EL_OTRO_NEIGHBORS);
    let response = app
        .send(post_form("/annotate/borges__el-otro", Some(&cookie), body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store(&app).load("ana").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_poem_without_recommendations_is_trivially_complete() {
    let app = setup();
    let (cookie, csrf) = app.login("beto", "clave").await;

    let response = app.send(get("/annotate/poeta__sin-vecinos", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert_eq!(html.matches(r#"class="label-select""#).count(), 0);

    let body = format!("csrf_token={}", csrf);
    let response = app
        .send(post_form("/annotate/poeta__sin-vecinos", Some(&cookie), body))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let records = store(&app).load("beto").await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].labels.is_empty());

    let response = app.send(get("/start_annotation", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/instructions"));
}

// =============================================================================
// Randomized recommendations and annotation layouts
// =============================================================================

#[tokio::test]
async fn test_randomized_recommendations_follow_random_table() {
    let app = setup();
    let (cookie, _) = app.login("dora", "azar").await;

    let response = app.send(get("/annotate/borges__el-otro", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert_eq!(html.matches(r#"class="label-select""#).count(), 2);

    let third = html.find(r#"name="vecino/poema-3.pt""#).unwrap();
    let first = html.find(r#"name="vecino/poema-1.pt""#).unwrap();
    assert!(third < first);
    assert!(!html.contains(r#"name="vecino/poema-2.pt""#));

    // the primary table's ten neighbors are not required
    let csrf = app.csrf_from_page("/annotate/borges__el-otro", &cookie).await;
    let body = format!(
        "csrf_token={}&vecino/poema-3.pt=5&vecino/poema-1.pt=1",
        csrf
    );
    let response = app
        .send(post_form("/annotate/borges__el-otro", Some(&cookie), body))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let records = store(&app).load("dora").await.unwrap();
    assert_eq!(records.len(), 1);
    let keys: Vec<String> = records[0].labels.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["vecino/poema-3.pt", "vecino/poema-1.pt"]);
}

#[tokio::test]
async fn test_shared_layout_writes_single_file() {
    let app = setup_with_layout(AnnotationLayout::Shared);
    let (cookie, csrf) = app.login("beto", "clave").await;

    let body = format!("csrf_token={}", csrf);
    let response = app
        .send(post_form("/annotate/poeta__sin-vecinos", Some(&cookie), body))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let shared = app.paths.shared_annotations_path();
    let text = fs::read_to_string(&shared).unwrap();
    assert!(text.contains("poeta/sin-vecinos.pt"));
    assert!(!app.paths.annotations_dir().join("beto").exists());

    let shared_store = AnnotationStore::new(&app.paths, AnnotationLayout::Shared);
    assert_eq!(shared_store.load("beto").await.unwrap().len(), 1);
    assert!(shared_store.load("ana").await.unwrap().is_empty());

    let response = app.send(get("/start_annotation", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/instructions"));
}
