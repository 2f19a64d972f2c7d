//! Cookie sessions and CSRF tokens
//!
//! Sessions are server-side: the cookie carries only a random id. The
//! middleware resumes a known session or hands the request an unsaved one;
//! an unsaved session is stored only when the login page registers it, so
//! anonymous traffic (health checks, assets, crawlers) leaves no entries.
//! Logging in replaces the session id.
//!
//! CSRF tokens are derived, not stored: `hex(SHA-256(secret ":" session_id))`.
//! A form posted from another session (or after a restart with a new
//! generated secret) fails verification.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "ecop_session";

/// Form field carrying the CSRF token
pub const CSRF_FIELD: &str = "csrf_token";

/// Upper bound on stored sessions; the least recently seen is evicted
pub const MAX_SESSIONS: usize = 10_000;

/// Session attached to the current request
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub csrf_token: String,
    /// Not stored yet and no cookie sent for it
    pub is_new: bool,
}

/// Username of a logged-in session, inserted by the login middleware
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[derive(Debug)]
struct SessionEntry {
    username: Option<String>,
    last_seen: DateTime<Utc>,
}

/// In-memory session table
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<RwLock<HashMap<String, SessionEntry>>>,
    secret: Arc<str>,
    ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self::with_capacity(secret, ttl, MAX_SESSIONS)
    }

    pub fn with_capacity(secret: &str, ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            secret: Arc::from(secret),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Continue the stored session named by the cookie
    ///
    /// Unknown or expired ids yield `None`; an expired entry is dropped.
    pub async fn resume(&self, cookie_id: &str) -> Option<Session> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(cookie_id)?;
        if now - entry.last_seen >= self.ttl {
            entries.remove(cookie_id);
            return None;
        }
        entry.last_seen = now;
        Some(self.session(cookie_id, false))
    }

    /// A fresh session that is not stored until [`SessionStore::register`]
    pub fn unsaved(&self) -> Session {
        self.session(&Uuid::new_v4().simple().to_string(), true)
    }

    /// Store an anonymous session so its CSRF token survives the next request
    pub async fn register(&self, session: &Session) {
        let mut entries = self.entries.write().await;
        self.insert(&mut entries, session.id.clone(), None);
        debug!("Started session ({} active)", entries.len());
    }

    /// Username of a logged-in session
    pub async fn username(&self, session: &Session) -> Option<String> {
        self.entries
            .read()
            .await
            .get(&session.id)
            .and_then(|entry| entry.username.clone())
    }

    /// Log `username` in under a new session id
    ///
    /// The old id is forgotten; the returned session must be sent as the
    /// new cookie.
    pub async fn log_in(&self, session: &Session, username: &str) -> Session {
        let mut entries = self.entries.write().await;
        entries.remove(&session.id);

        let fresh = self.unsaved();
        self.insert(&mut entries, fresh.id.clone(), Some(username.to_string()));
        Session {
            is_new: false,
            ..fresh
        }
    }

    /// Forget the session entirely
    pub async fn log_out(&self, session: &Session) {
        self.entries.write().await.remove(&session.id);
    }

    pub async fn active_sessions(&self) -> usize {
        self.entries.read().await.len()
    }

    pub fn csrf_token_for(&self, session_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(session_id.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Check a submitted token against the session's token
    pub fn verify_csrf(&self, session: &Session, submitted: Option<&str>) -> bool {
        match submitted {
            Some(token) => constant_time_eq(token.as_bytes(), session.csrf_token.as_bytes()),
            None => false,
        }
    }

    fn session(&self, id: &str, is_new: bool) -> Session {
        Session {
            id: id.to_string(),
            csrf_token: self.csrf_token_for(id),
            is_new,
        }
    }

    /// Insert after purging expired entries and, when full, the stalest one
    fn insert(
        &self,
        entries: &mut HashMap<String, SessionEntry>,
        id: String,
        username: Option<String>,
    ) {
        let now = Utc::now();
        entries.retain(|_, entry| now - entry.last_seen < self.ttl);

        while entries.len() >= self.capacity {
            let stalest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            match stalest {
                Some(stalest) => {
                    warn!("Session table full ({}), evicting the oldest session", self.capacity);
                    entries.remove(&stalest);
                }
                None => break,
            }
        }

        entries.insert(
            id,
            SessionEntry {
                username,
                last_seen: now,
            },
        );
    }
}

/// Random 256-bit secret, hex encoded
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Session id from the request's `Cookie` headers
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Attach the session cookie for `session` to a response
pub fn set_session_cookie(response: &mut Response, session: &Session) {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session.id
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// Expire the session cookie in the browser
pub fn clear_session_cookie(response: &mut Response) {
    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// Attach a [`Session`] to every request
///
/// Requests without a known cookie get an unsaved session; nothing is
/// stored here.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resumed = match session_cookie(request.headers()) {
        Some(id) => state.sessions.resume(&id).await,
        None => None,
    };
    let session = resumed.unwrap_or_else(|| state.sessions.unsaved());
    request.extensions_mut().insert(session);

    next.run(request).await
}
