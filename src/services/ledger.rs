//! Copy ledger service: book instances and their availability transitions

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::AppResult,
    models::{BookInstance, CopyAction, CopyInput},
    repository::Repository,
};

#[derive(Clone)]
pub struct CopyLedgerService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl CopyLedgerService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// New copies start in maintenance until staff mark them ready
    pub async fn create_copy(&self, input: CopyInput) -> AppResult<BookInstance> {
        input.check()?;
        let copy = BookInstance::new(input.book_id, input.imprint);
        let copy = self.repository.book_instances.create(&copy).await?;
        tracing::info!("Created copy {} of book {}", copy.id, copy.book_id);
        Ok(copy)
    }

    pub async fn get_copy(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.book_instances.get_by_id(id).await
    }

    pub async fn update_copy(&self, id: Uuid, input: CopyInput) -> AppResult<BookInstance> {
        input.check()?;
        self.repository.book_instances.update_details(id, &input).await
    }

    pub async fn delete_copy(&self, id: Uuid) -> AppResult<()> {
        self.repository.book_instances.delete(id).await?;
        tracing::info!("Deleted copy {}", id);
        Ok(())
    }

    pub async fn list_copies(&self) -> AppResult<Vec<BookInstance>> {
        self.repository.book_instances.list().await
    }

    pub async fn list_copies_of_book(&self, book_id: i64) -> AppResult<Vec<BookInstance>> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository.book_instances.list_by_book(book_id).await
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    pub async fn mark_available(&self, id: Uuid) -> AppResult<BookInstance> {
        self.transition(id, CopyAction::MarkAvailable).await
    }

    pub async fn reserve(&self, id: Uuid) -> AppResult<BookInstance> {
        self.transition(id, CopyAction::Reserve).await
    }

    pub async fn checkout(
        &self,
        id: Uuid,
        borrower: &str,
        due_back: NaiveDate,
    ) -> AppResult<BookInstance> {
        let action = CopyAction::Checkout {
            borrower: borrower.trim().to_string(),
            due_back,
        };
        self.transition(id, action).await
    }

    pub async fn pull_for_maintenance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.transition(id, CopyAction::PullForMaintenance).await
    }

    /// Read the copy, run the state machine on it, then write it back only if
    /// nobody changed it in between.
    pub(crate) async fn transition(&self, id: Uuid, action: CopyAction) -> AppResult<BookInstance> {
        let mut copy = self.repository.book_instances.get_by_id(id).await?;
        let read_version = copy.version;
        let from = copy.status;
        let name = action.name();

        if let Err(e) = copy.apply(action, self.clock.today()) {
            tracing::warn!("Refused to {} copy {}: {}", name, id, e);
            return Err(e);
        }

        let stored = self
            .repository
            .book_instances
            .store_state(&copy, read_version)
            .await?;

        tracing::info!("Copy {}: {} -> {} ({})", id, from, stored.status, name);
        Ok(stored)
    }
}
