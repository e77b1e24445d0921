//! Book (title-level record) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::{AppError, AppResult};

use super::name::Genre;

/// A title in the catalog, as opposed to a physical copy of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: Option<i64>,
    pub summary: String,
    pub isbn: String,
    pub language_id: Option<i64>,
    /// Loaded by an explicit query after the row itself
    #[sqlx(skip)]
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl Book {
    /// Names of the first three genres, comma separated
    pub fn display_genre(&self) -> String {
        self.genres
            .iter()
            .take(3)
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Create/update book request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub author_id: Option<i64>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub summary: String,
    /// 13 character ISBN, compared exactly
    #[validate(length(equal = 13))]
    pub isbn: String,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    pub language_id: Option<i64>,
}

impl BookInput {
    pub fn new(title: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author_id: None,
            summary: String::new(),
            isbn: isbn.into(),
            genre_ids: Vec::new(),
            language_id: None,
        }
    }

    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title", "blank"));
        }
        Ok(())
    }
}

/// Book list filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    /// Substring of the title, case sensitive
    pub title: Option<String>,
    /// Substring of any linked genre name, case insensitive
    pub genre: Option<String>,
    pub author_id: Option<i64>,
    pub language_id: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Counts shown on the catalog home page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub books: i64,
    pub copies: i64,
    pub copies_available: i64,
    pub authors: i64,
    pub genres: i64,
    pub languages: i64,
}
