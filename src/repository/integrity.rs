//! Referential integrity policy applied before every delete.
//!
//! Each rule names a dependent column and what happens to it when the parent
//! goes away:
//!
//! | parent        | dependent                    | action    |
//! |---------------|------------------------------|-----------|
//! | author        | books.author_id              | restrict  |
//! | language      | books.language_id            | set null  |
//! | genre         | book_genres.genre_id         | unlink    |
//! | book          | book_instances.book_id       | restrict  |
//! | book          | book_genres.book_id          | unlink    |
//! | borrower      | book_instances.borrower      | set null  |
//!
//! All restrict rules are checked before any other rule touches a row, and the
//! caller runs [`apply`] inside the transaction that performs the delete.

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Record about to be removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Author(i64),
    Genre(i64),
    Language(i64),
    Book(i64),
    BookInstance(Uuid),
    /// Borrower account removed by the identity system
    Borrower(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    Author,
    Genre,
    Language,
    Book,
    Borrower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnDelete {
    Restrict,
    SetNull,
    Unlink,
}

#[derive(Debug)]
struct Rule {
    parent: Parent,
    table: &'static str,
    column: &'static str,
    dependents: &'static str,
    action: OnDelete,
    /// Dependent rows carry a compare-and-swap version that must move
    bumps_version: bool,
}

const RULES: &[Rule] = &[
    Rule {
        parent: Parent::Author,
        table: "books",
        column: "author_id",
        dependents: "books",
        action: OnDelete::Restrict,
        bumps_version: false,
    },
    Rule {
        parent: Parent::Language,
        table: "books",
        column: "language_id",
        dependents: "books",
        action: OnDelete::SetNull,
        bumps_version: false,
    },
    Rule {
        parent: Parent::Genre,
        table: "book_genres",
        column: "genre_id",
        dependents: "books",
        action: OnDelete::Unlink,
        bumps_version: false,
    },
    Rule {
        parent: Parent::Book,
        table: "book_instances",
        column: "book_id",
        dependents: "book instances",
        action: OnDelete::Restrict,
        bumps_version: false,
    },
    Rule {
        parent: Parent::Book,
        table: "book_genres",
        column: "book_id",
        dependents: "genres",
        action: OnDelete::Unlink,
        bumps_version: false,
    },
    Rule {
        parent: Parent::Borrower,
        table: "book_instances",
        column: "borrower",
        dependents: "book instances",
        action: OnDelete::SetNull,
        bumps_version: true,
    },
];

enum Key {
    Int(i64),
    Text(String),
}

impl DeleteTarget {
    fn parent(&self) -> Option<Parent> {
        match self {
            DeleteTarget::Author(_) => Some(Parent::Author),
            DeleteTarget::Genre(_) => Some(Parent::Genre),
            DeleteTarget::Language(_) => Some(Parent::Language),
            DeleteTarget::Book(_) => Some(Parent::Book),
            DeleteTarget::Borrower(_) => Some(Parent::Borrower),
            DeleteTarget::BookInstance(_) => None,
        }
    }

    fn key(&self) -> Key {
        match self {
            DeleteTarget::Author(id)
            | DeleteTarget::Genre(id)
            | DeleteTarget::Language(id)
            | DeleteTarget::Book(id) => Key::Int(*id),
            DeleteTarget::BookInstance(id) => Key::Text(id.to_string()),
            DeleteTarget::Borrower(id) => Key::Text(id.clone()),
        }
    }

    pub fn entity(&self) -> &'static str {
        match self {
            DeleteTarget::Author(_) => "Author",
            DeleteTarget::Genre(_) => "Genre",
            DeleteTarget::Language(_) => "Language",
            DeleteTarget::Book(_) => "Book",
            DeleteTarget::BookInstance(_) => "BookInstance",
            DeleteTarget::Borrower(_) => "Borrower",
        }
    }

    pub fn id(&self) -> String {
        match self.key() {
            Key::Int(id) => id.to_string(),
            Key::Text(id) => id,
        }
    }
}

fn rules_for(parent: Parent) -> impl Iterator<Item = &'static Rule> {
    RULES.iter().filter(move |rule| rule.parent == parent)
}

/// Enforce the policy for `target`. Returns the number of dependent rows that
/// were nulled out or unlinked.
pub async fn apply(conn: &mut SqliteConnection, target: &DeleteTarget) -> AppResult<u64> {
    let Some(parent) = target.parent() else {
        return Ok(0);
    };

    for rule in rules_for(parent).filter(|r| r.action == OnDelete::Restrict) {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            rule.table, rule.column
        );
        let count: i64 = match target.key() {
            Key::Int(id) => sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?,
            Key::Text(id) => sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?,
        };

        if count > 0 {
            tracing::warn!(
                "Delete of {} {} refused: {} {} still reference it",
                target.entity(),
                target.id(),
                count,
                rule.dependents
            );
            return Err(AppError::ReferencedEntity {
                entity: target.entity(),
                id: target.id(),
                dependents: rule.dependents,
            });
        }
    }

    let mut touched = 0;
    for rule in rules_for(parent) {
        let sql = match rule.action {
            OnDelete::Restrict => continue,
            OnDelete::SetNull => format!(
                "UPDATE {table} SET {column} = NULL{bump} WHERE {column} = $1",
                table = rule.table,
                column = rule.column,
                bump = if rule.bumps_version {
                    ", version = version + 1"
                } else {
                    ""
                }
            ),
            OnDelete::Unlink => format!("DELETE FROM {} WHERE {} = $1", rule.table, rule.column),
        };

        let result = match target.key() {
            Key::Int(id) => sqlx::query(&sql).bind(id).execute(&mut *conn).await?,
            Key::Text(id) => sqlx::query(&sql).bind(id).execute(&mut *conn).await?,
        };
        let affected = result.rows_affected();

        if affected > 0 {
            tracing::debug!(
                "{} {}: {:?} on {}.{} touched {} rows",
                target.entity(),
                target.id(),
                rule.action,
                rule.table,
                rule.column,
                affected
            );
        }
        touched += affected;
    }

    Ok(touched)
}
