//! Book instances (copies) repository for database operations.
//!
//! State writes go through [`BookInstancesRepository::store_state`], which only
//! lands if the row still carries the version the caller read.

use chrono::NaiveDate;
use sqlx::{FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceRow, CopyInput, CopyStatus},
};

use super::{
    ensure_exists,
    integrity::{self, DeleteTarget},
};

const INSTANCE_COLUMNS: &str = "bi.id, bi.book_id, bi.imprint, bi.due_back, bi.status, bi.borrower, bi.version";

/// Copies list by due date; copies without one come last
const INSTANCE_ORDER: &str = "ORDER BY bi.due_back IS NULL, bi.due_back, bi.id";

#[derive(Debug, FromRow)]
struct LoanRow {
    #[sqlx(flatten)]
    instance: BookInstanceRow,
    title: String,
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Sqlite>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        let sql = format!("SELECT {} FROM book_instances bi WHERE bi.id = $1", INSTANCE_COLUMNS);
        let row = sqlx::query_as::<_, BookInstanceRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("BookInstance", id))?;

        Ok(BookInstance::try_from(row)?)
    }

    /// Every copy in the catalog
    pub async fn list(&self) -> AppResult<Vec<BookInstance>> {
        let sql = format!("SELECT {} FROM book_instances bi {}", INSTANCE_COLUMNS, INSTANCE_ORDER);
        let rows = sqlx::query_as::<_, BookInstanceRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        into_instances(rows)
    }

    /// Copies of one title
    pub async fn list_by_book(&self, book_id: i64) -> AppResult<Vec<BookInstance>> {
        let sql = format!(
            "SELECT {} FROM book_instances bi WHERE bi.book_id = $1 {}",
            INSTANCE_COLUMNS, INSTANCE_ORDER
        );
        let rows = sqlx::query_as::<_, BookInstanceRow>(&sql)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;

        into_instances(rows)
    }

    /// Copies on loan, optionally narrowed to one borrower, with book titles
    pub async fn list_on_loan(
        &self,
        borrower: Option<&str>,
    ) -> AppResult<Vec<(BookInstance, String)>> {
        let sql = format!(
            r#"
            SELECT {}, b.title
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            WHERE bi.status = $1 AND ($2 IS NULL OR bi.borrower = $2)
            {}
            "#,
            INSTANCE_COLUMNS, INSTANCE_ORDER
        );
        let rows = sqlx::query_as::<_, LoanRow>(&sql)
            .bind(CopyStatus::OnLoan.as_code())
            .bind(borrower)
            .fetch_all(&self.pool)
            .await?;

        into_loans(rows)
    }

    /// Copies on loan whose due date is before `today`, with book titles
    pub async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<(BookInstance, String)>> {
        let sql = format!(
            r#"
            SELECT {}, b.title
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            WHERE bi.status = $1 AND bi.due_back IS NOT NULL AND bi.due_back < $2
            {}
            "#,
            INSTANCE_COLUMNS, INSTANCE_ORDER
        );
        let rows = sqlx::query_as::<_, LoanRow>(&sql)
            .bind(CopyStatus::OnLoan.as_code())
            .bind(today)
            .fetch_all(&self.pool)
            .await?;

        into_loans(rows)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Insert a freshly built copy. The book it points at must exist.
    pub async fn create(&self, copy: &BookInstance) -> AppResult<BookInstance> {
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, "books", "Book", copy.book_id).await?;

        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, status, borrower, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(copy.id.to_string())
        .bind(copy.book_id)
        .bind(&copy.imprint)
        .bind(copy.due_back)
        .bind(copy.status.as_code())
        .bind(&copy.borrower)
        .bind(copy.version)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_by_id(copy.id).await
    }

    /// Change which book a copy belongs to and its imprint. Availability
    /// fields are left alone.
    pub async fn update_details(&self, id: Uuid, input: &CopyInput) -> AppResult<BookInstance> {
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, "books", "Book", input.book_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE book_instances SET
                book_id = $1,
                imprint = $2,
                version = version + 1
            WHERE id = $3
            "#,
        )
        .bind(input.book_id)
        .bind(&input.imprint)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("BookInstance", id));
        }

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Compare-and-swap write of status, borrower and due date.
    ///
    /// Succeeds only if the stored version still equals `expected_version`;
    /// otherwise another request got there first and nothing is written.
    pub async fn store_state(
        &self,
        copy: &BookInstance,
        expected_version: i64,
    ) -> AppResult<BookInstance> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances SET
                status = $1,
                borrower = $2,
                due_back = $3,
                version = version + 1
            WHERE id = $4 AND version = $5
            "#,
        )
        .bind(copy.status.as_code())
        .bind(&copy.borrower)
        .bind(copy.due_back)
        .bind(copy.id.to_string())
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Either the row vanished or its version moved on
            let current = self.get_by_id(copy.id).await?;
            return Err(AppError::Conflict {
                id: copy.id.to_string(),
                expected: expected_version,
                found: current.version,
            });
        }

        self.get_by_id(copy.id).await
    }

    /// Explicit removal of a copy by staff
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        integrity::apply(&mut tx, &DeleteTarget::BookInstance(id)).await?;

        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("BookInstance", id));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Clear every reference to a borrower whose account is gone. Returns how
    /// many copies were touched.
    pub async fn release_borrower(&self, borrower: &str) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;
        let touched =
            integrity::apply(&mut tx, &DeleteTarget::Borrower(borrower.to_string())).await?;
        tx.commit().await?;
        Ok(touched)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(&self, status: CopyStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status.as_code())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn into_instances(rows: Vec<BookInstanceRow>) -> AppResult<Vec<BookInstance>> {
    rows.into_iter()
        .map(|row| BookInstance::try_from(row).map_err(AppError::from))
        .collect()
}

fn into_loans(rows: Vec<LoanRow>) -> AppResult<Vec<(BookInstance, String)>> {
    rows.into_iter()
        .map(|row| {
            let copy = BookInstance::try_from(row.instance).map_err(AppError::from)?;
            Ok((copy, row.title))
        })
        .collect()
}
