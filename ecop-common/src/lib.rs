//! # Ecopoetic Annotation Common Library
//!
//! Shared code for the annotation service and its tools:
//! - Canonical poem identifiers and file name normalization
//! - Static catalog tables (users, title mapping, similarity)
//! - Poem text resolution
//! - Annotation store and assignment progress
//! - Configuration loading

pub mod annotations;
pub mod catalog;
pub mod config;
pub mod corpus;
pub mod error;
pub mod poem_id;
pub mod progress;
pub mod submission;

pub use annotations::{Annotation, AnnotationLayout, AnnotationStore, Labels};
pub use catalog::Catalog;
pub use error::{Error, Result};
pub use poem_id::PoemId;
