//! HTTP handlers for ecop-annotator

pub mod annotate;
pub mod auth;
pub mod health;
pub mod instructions;
pub mod ui;

pub use annotate::{annotate_page, submit_annotation};
pub use auth::{home_page, login_page, login_submit, logout, require_login};
pub use health::health_routes;
pub use instructions::{instructions_page, start_annotation};
