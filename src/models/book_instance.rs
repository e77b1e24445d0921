//! Book instance (loanable copy) model and its availability state machine

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Availability of a copy. Stored as a single character code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl CopyStatus {
    pub fn as_code(self) -> &'static str {
        match self {
            CopyStatus::Maintenance => "m",
            CopyStatus::OnLoan => "o",
            CopyStatus::Available => "a",
            CopyStatus::Reserved => "r",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "m" => Some(CopyStatus::Maintenance),
            "o" => Some(CopyStatus::OnLoan),
            "a" => Some(CopyStatus::Available),
            "r" => Some(CopyStatus::Reserved),
            _ => None,
        }
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CopyStatus::Maintenance => "Maintenance",
            CopyStatus::OnLoan => "On loan",
            CopyStatus::Available => "Available",
            CopyStatus::Reserved => "Reserved",
        };
        write!(f, "{}", label)
    }
}

/// Explicit requests that move a copy between states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyAction {
    MarkAvailable,
    Reserve,
    Checkout { borrower: String, due_back: NaiveDate },
    Return,
    PullForMaintenance,
}

impl CopyAction {
    /// Stable identifier, carried by `InvalidState` errors
    pub fn name(&self) -> &'static str {
        match self {
            CopyAction::MarkAvailable => "mark_available",
            CopyAction::Reserve => "reserve",
            CopyAction::Checkout { .. } => "checkout",
            CopyAction::Return => "return",
            CopyAction::PullForMaintenance => "pull_for_maintenance",
        }
    }
}

/// A specific copy of a book that can be borrowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i64,
    pub imprint: String,
    /// Authoritative only while the copy is on loan
    pub due_back: Option<NaiveDate>,
    pub status: CopyStatus,
    pub borrower: Option<String>,
    /// Bumped on every write; used for compare-and-swap
    pub version: i64,
}

impl BookInstance {
    pub fn new(book_id: i64, imprint: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            imprint: imprint.into(),
            due_back: None,
            status: CopyStatus::Maintenance,
            borrower: None,
            version: 0,
        }
    }

    /// Due date present and already passed, whatever the status.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.due_back, Some(due) if due < today)
    }

    /// Apply a transition, or leave the copy untouched and return why not.
    pub fn apply(&mut self, action: CopyAction, today: NaiveDate) -> AppResult<()> {
        match (self.status, action) {
            (_, CopyAction::PullForMaintenance) => {
                self.status = CopyStatus::Maintenance;
            }
            (CopyStatus::Maintenance, CopyAction::MarkAvailable) => {
                self.status = CopyStatus::Available;
            }
            (CopyStatus::Available, CopyAction::Reserve) => {
                self.status = CopyStatus::Reserved;
            }
            (
                CopyStatus::Available | CopyStatus::Reserved,
                CopyAction::Checkout { borrower, due_back },
            ) => {
                if borrower.trim().is_empty() {
                    return Err(AppError::validation("borrower", "blank"));
                }
                ensure_future(due_back, today)?;
                self.status = CopyStatus::OnLoan;
                self.borrower = Some(borrower);
                self.due_back = Some(due_back);
            }
            (CopyStatus::OnLoan, CopyAction::Return) => {
                // due_back is kept as history; it stops being authoritative here
                self.status = CopyStatus::Available;
                self.borrower = None;
            }
            (status, action) => {
                return Err(AppError::InvalidState {
                    id: self.id.to_string(),
                    status,
                    action: action.name(),
                });
            }
        }
        Ok(())
    }

    /// Move the due date of a copy on loan. Status and borrower stay as they are.
    pub fn renew(&mut self, due_back: NaiveDate, today: NaiveDate) -> AppResult<()> {
        if self.status != CopyStatus::OnLoan {
            return Err(AppError::InvalidState {
                id: self.id.to_string(),
                status: self.status,
                action: "renew",
            });
        }
        ensure_future(due_back, today)?;
        self.due_back = Some(due_back);
        Ok(())
    }
}

fn ensure_future(due_back: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if due_back <= today {
        return Err(AppError::validation("due_back", "not_future"));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
#[error("unknown copy status code {0:?}")]
pub struct UnknownStatusCode(pub String);

/// Raw book_instances row
#[derive(Debug, FromRow)]
pub struct BookInstanceRow {
    pub id: String,
    pub book_id: i64,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: String,
    pub borrower: Option<String>,
    pub version: i64,
}

impl TryFrom<BookInstanceRow> for BookInstance {
    type Error = sqlx::Error;

    fn try_from(row: BookInstanceRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id).map_err(|e| sqlx::Error::ColumnDecode {
            index: "id".to_string(),
            source: Box::new(e),
        })?;
        let status = CopyStatus::from_code(&row.status).ok_or_else(|| {
            sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(UnknownStatusCode(row.status.clone())),
            }
        })?;

        Ok(BookInstance {
            id,
            book_id: row.book_id,
            imprint: row.imprint,
            due_back: row.due_back,
            status,
            borrower: row.borrower,
            version: row.version,
        })
    }
}

/// Create/update copy request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CopyInput {
    pub book_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub imprint: String,
}

impl CopyInput {
    pub fn new(book_id: i64, imprint: impl Into<String>) -> Self {
        Self {
            book_id,
            imprint: imprint.into(),
        }
    }

    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.imprint.trim().is_empty() {
            return Err(AppError::validation("imprint", "blank"));
        }
        Ok(())
    }
}

/// Copy on loan together with what a listing needs to show it
#[derive(Debug, Clone, Serialize)]
pub struct LoanDetails {
    #[serde(flatten)]
    pub copy: BookInstance,
    pub title: String,
    pub is_overdue: bool,
}
