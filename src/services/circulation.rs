//! Circulation service: returns, renewals and loan listings.
//!
//! Everything that moves a copy back from a borrower, or shows other people's
//! loans, requires [`Capability::CanMarkReturned`]. The capability check runs
//! before any read so a refused caller learns nothing about the copy.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::{
    clock::Clock,
    config::LoanPolicyConfig,
    error::{AppError, AppResult},
    models::{BookInstance, Caller, Capability, CopyAction, LoanDetails},
    repository::Repository,
};

use super::ledger::CopyLedgerService;

/// Due date arithmetic for renewals
#[derive(Debug, Clone)]
pub struct RenewalPolicy {
    period_days: u32,
    max_days: Option<u32>,
}

impl RenewalPolicy {
    pub fn new(config: &LoanPolicyConfig) -> Self {
        Self {
            period_days: config.renewal_period_days,
            max_days: config.max_renewal_days,
        }
    }

    /// Requested date, or today plus the renewal period. A period that runs
    /// past the representable calendar is a validation failure.
    pub fn due_date(
        &self,
        today: NaiveDate,
        requested: Option<NaiveDate>,
    ) -> AppResult<NaiveDate> {
        match requested {
            Some(date) => Ok(date),
            None => today
                .checked_add_days(Days::new(u64::from(self.period_days)))
                .ok_or_else(|| AppError::validation("due_back", "out_of_range")),
        }
    }

    /// Reject dates beyond the configured horizon, if there is one. A horizon
    /// past the end of the calendar bounds nothing.
    pub fn check_horizon(&self, due_back: NaiveDate, today: NaiveDate) -> AppResult<()> {
        let Some(max_days) = self.max_days else {
            return Ok(());
        };

        match today.checked_add_days(Days::new(u64::from(max_days))) {
            Some(limit) if due_back > limit => {
                Err(AppError::validation("due_back", "beyond_horizon"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    ledger: CopyLedgerService,
    policy: RenewalPolicy,
    clock: Arc<dyn Clock>,
}

impl CirculationService {
    pub fn new(
        repository: Repository,
        ledger: CopyLedgerService,
        config: &LoanPolicyConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            ledger,
            policy: RenewalPolicy::new(config),
            clock,
        }
    }

    /// Extend the loan of a copy. Without a date, the configured renewal
    /// period is added to today.
    pub async fn renew_loan(
        &self,
        id: Uuid,
        caller: &Caller,
        due_back: Option<NaiveDate>,
    ) -> AppResult<BookInstance> {
        self.authorize(caller, "renew", id)?;

        let today = self.clock.today();
        let mut copy = self.repository.book_instances.get_by_id(id).await?;
        let read_version = copy.version;
        let due_back = self.policy.due_date(today, due_back)?;

        copy.renew(due_back, today)?;
        self.policy.check_horizon(due_back, today)?;

        let stored = self
            .repository
            .book_instances
            .store_state(&copy, read_version)
            .await?;

        tracing::info!("Copy {} renewed by {} until {}", id, caller.id, due_back);
        Ok(stored)
    }

    /// Take a copy back from its borrower and make it available again
    pub async fn mark_returned(&self, id: Uuid, caller: &Caller) -> AppResult<BookInstance> {
        self.authorize(caller, "return", id)?;
        self.ledger.transition(id, CopyAction::Return).await
    }

    /// Copies the caller currently has on loan
    pub async fn list_my_loans(&self, caller: &Caller) -> AppResult<Vec<LoanDetails>> {
        let loans = self
            .repository
            .book_instances
            .list_on_loan(Some(caller.id.as_str()))
            .await?;
        Ok(self.details(loans))
    }

    /// Every copy on loan, whoever holds it
    pub async fn list_all_loans(&self, caller: &Caller) -> AppResult<Vec<LoanDetails>> {
        caller.require(Capability::CanMarkReturned)?;
        let loans = self.repository.book_instances.list_on_loan(None).await?;
        Ok(self.details(loans))
    }

    pub async fn list_overdue(&self, caller: &Caller) -> AppResult<Vec<LoanDetails>> {
        caller.require(Capability::CanMarkReturned)?;
        let today = self.clock.today();
        let loans = self.repository.book_instances.list_overdue(today).await?;
        Ok(self.details(loans))
    }

    /// Forget a borrower whose account was removed elsewhere. Copies they held
    /// keep their status.
    pub async fn release_borrower(&self, borrower: &str) -> AppResult<u64> {
        let touched = self
            .repository
            .book_instances
            .release_borrower(borrower)
            .await?;
        tracing::info!("Released borrower {} from {} copies", borrower, touched);
        Ok(touched)
    }

    fn authorize(&self, caller: &Caller, what: &str, id: Uuid) -> AppResult<()> {
        caller.require(Capability::CanMarkReturned).map_err(|e| {
            tracing::warn!("{} may not {} copy {}", caller.id, what, id);
            e
        })
    }

    fn details(&self, loans: Vec<(BookInstance, String)>) -> Vec<LoanDetails> {
        let today = self.clock.today();
        loans
            .into_iter()
            .map(|(copy, title)| LoanDetails {
                is_overdue: copy.is_overdue(today),
                copy,
                title,
            })
            .collect()
    }
}
