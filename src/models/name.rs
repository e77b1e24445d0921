//! Name-like records (genres, languages) and case-insensitive keys

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicode_normalization::UnicodeNormalization;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Comparison key for name uniqueness. The stored name keeps its casing; only
/// this key is indexed.
pub fn fold_name(name: &str) -> String {
    name.trim().nfkc().collect::<String>().to_lowercase()
}

/// Book genre (e.g. "Science Fiction", "French Poetry")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Natural language a book is written in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Language {
    pub id: i64,
    pub name: String,
}

/// Create/update request shared by genres and languages
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NameInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

impl NameInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name", "blank"));
        }
        Ok(())
    }
}
