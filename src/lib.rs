//! Lending library catalog core
//!
//! Authors, genres, languages and books, the copies that can be lent out, and
//! the rules for moving those copies between borrowers. Presentation, routing
//! and authentication live elsewhere; this crate only sees an authenticated
//! [`models::Caller`].

use std::sync::Arc;

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared by whatever front end embeds the core
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
