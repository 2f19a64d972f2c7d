//! Shared fixtures for the HTTP tests
//!
//! Builds a complete data root in a temp dir and drives the router with
//! `oneshot`, carrying the session cookie by hand.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use std::fs;
use tempfile::TempDir;
use tower::ServiceExt;

use ecop_annotator::{build_router, AppState, ServiceSettings};
use ecop_common::config::DataPaths;
use ecop_common::{AnnotationLayout, Catalog};

const USERS_JSON: &str = r#"{
    "ana": {
        "password": "secreto",
        "assigned_poems": ["borges/el-otro.pt", "neruda/oda-al-mar.pt"],
        "use_random_recommendations": false
    },
    "beto": {
        "password": "clave",
        "assigned_poems": ["poeta/sin-vecinos.pt"],
        "use_random_recommendations": false
    },
    "carla": {
        "password": "llave",
        "assigned_poems": ["fantasma/perdido.pt"]
    },
    "dora": {
        "password": "azar",
        "assigned_poems": ["borges/el-otro.pt"],
        "use_random_recommendations": true
    }
}"#;

/// Randomized table: two recommendations for `borges/el-otro.pt`, out of numeric order
const RANDOM_SIMILARITY_CSV: &str = "poem,1,2\nborges/el-otro.pt,vecino/poema-3.pt,vecino/poema-1.pt\n";

/// Ten recommendations for `borges/el-otro.pt`
pub const EL_OTRO_NEIGHBORS: usize = 10;

pub fn neighbor_key(i: usize) -> String {
    format!("vecino/poema-{}.pt", i)
}

pub struct TestApp {
    pub dir: TempDir,
    pub paths: DataPaths,
    pub router: Router,
}

fn write_root(dir: &TempDir) {
    let root = dir.path();
    fs::write(root.join("users.json"), USERS_JSON).unwrap();

    let mut titles = String::from("original_title,formatted_title\n");
    titles.push_str("El otro,el-otro.txt\nOda al mar,oda-al-mar.txt\nSin vecinos,sin-vecinos.txt\n");
    for i in 1..=EL_OTRO_NEIGHBORS {
        titles.push_str(&format!("Poema {},poema-{}.txt\n", i, i));
    }
    fs::write(root.join("original_to_formatted_titles.csv"), titles).unwrap();

    let neighbors: Vec<String> = (1..=EL_OTRO_NEIGHBORS).map(neighbor_key).collect();
    let similarity = format!(
        "poem,1,2,3,4,5,6,7,8,9,10\nborges/el-otro.pt,{}\nneruda/oda-al-mar.pt,borges/el-otro.pt\n",
        neighbors.join(",")
    );
    fs::write(root.join("similarity_matrix.csv"), similarity).unwrap();
    fs::write(root.join("similarity_random.csv"), RANDOM_SIMILARITY_CSV).unwrap();

    let corpus = root.join("corpus");
    for (author, file, text) in [
        ("borges", "el-otro.txt", "El hecho ocurrio en el mes de febrero de 1969"),
        ("neruda", "oda-al-mar.txt", "Aqui en la isla el mar"),
        ("poeta", "sin-vecinos.txt", "Nadie se parece a mi"),
    ] {
        fs::create_dir_all(corpus.join(author)).unwrap();
        fs::write(corpus.join(author).join(file), text).unwrap();
    }
    // poema-10 has no text on disk
    fs::create_dir_all(corpus.join("vecino")).unwrap();
    for i in 1..EL_OTRO_NEIGHBORS {
        fs::write(
            corpus.join("vecino").join(format!("poema-{}.txt", i)),
            format!("Texto del poema {}", i),
        )
        .unwrap();
    }
}

pub fn setup() -> TestApp {
    setup_with_layout(AnnotationLayout::PerUser)
}

pub fn setup_with_layout(layout: AnnotationLayout) -> TestApp {
    let dir = TempDir::new().unwrap();
    write_root(&dir);

    let paths = DataPaths::new(dir.path().to_path_buf());
    paths.ensure_directories().unwrap();

    let catalog = Catalog::load(&paths);
    let settings = ServiceSettings {
        secret_key: "test-secret".to_string(),
        poem_extension: "pt".to_string(),
        annotation_layout: layout,
        session_ttl: chrono::Duration::minutes(30),
    };
    let router = build_router(AppState::new(catalog, &paths, settings));

    TestApp { dir, paths, router }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Log in and return `(cookie, csrf_token)` of the logged-in session
    pub async fn login(&self, username: &str, password: &str) -> (String, String) {
        let (anonymous, csrf) = self.anonymous_session().await;

        let body = format!("username={}&password={}&csrf_token={}", username, password, csrf);
        let response = self.send(post_form("/login", Some(&anonymous), body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/instructions"));
        let cookie = session_cookie(&response).expect("login sets a new session cookie");
        assert_ne!(cookie, anonymous);

        let csrf = self.csrf_from_page("/login", &cookie).await;
        (cookie, csrf)
    }

    /// Visit the login page without a cookie and return `(cookie, csrf_token)`
    pub async fn anonymous_session(&self) -> (String, String) {
        let response = self.send(get("/login", None)).await;
        let cookie = session_cookie(&response).expect("login page sets a session cookie");
        let csrf = csrf_token(&body_string(response).await).expect("login page has a token");
        (cookie, csrf)
    }

    /// CSRF token rendered for `cookie`'s session on `uri`
    pub async fn csrf_from_page(&self, uri: &str, cookie: &str) -> String {
        let response = self.send(get(uri, Some(cookie))).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        csrf_token(&body_string(response).await).expect("page has a token")
    }

    /// `active_sessions` reported by `/health`
    pub async fn active_sessions(&self) -> u64 {
        let response = self.send(get("/health", None)).await;
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        body["active_sessions"].as_u64().expect("health reports active_sessions")
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, cookie: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Form body rating the first `count` recommendations of `borges/el-otro.pt`
pub fn labels_form(csrf: &str, count: usize) -> String {
    let mut pairs = vec![format!("csrf_token={}", csrf)];
    for i in 1..=count {
        pairs.push(format!("{}={}", neighbor_key(i), (i % 5) + 1));
    }
    pairs.join("&")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn set_cookie_header(response: &Response<Body>) -> Option<&str> {
    response.headers().get(header::SET_COOKIE)?.to_str().ok()
}

/// `name=value` part of the `Set-Cookie` header
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response.headers().get(header::LOCATION)?.to_str().ok()
}

pub fn csrf_token(html: &str) -> Option<String> {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}
