//! Repository for name-like records (genres, languages).
//!
//! Uniqueness is enforced by a unique index on the folded `name_key` column,
//! so two concurrent inserts of "Fiction" and "fiction" cannot both land.

use std::marker::PhantomData;

use sqlx::{sqlite::SqliteRow, FromRow, Pool, Sqlite};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::{fold_name, Genre, Language, NameInput},
};

use super::{
    ensure_exists,
    integrity::{self, DeleteTarget},
};

/// Table binding for a name-like record
pub trait NamedRecord: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    const TABLE: &'static str;
    const ENTITY: &'static str;

    fn delete_target(id: i64) -> DeleteTarget;
}

impl NamedRecord for Genre {
    const TABLE: &'static str = "genres";
    const ENTITY: &'static str = "Genre";

    fn delete_target(id: i64) -> DeleteTarget {
        DeleteTarget::Genre(id)
    }
}

impl NamedRecord for Language {
    const TABLE: &'static str = "languages";
    const ENTITY: &'static str = "Language";

    fn delete_target(id: i64) -> DeleteTarget {
        DeleteTarget::Language(id)
    }
}

pub struct NamesRepository<T> {
    pool: Pool<Sqlite>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for NamesRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: NamedRecord> NamesRepository<T> {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    /// All records ordered by name
    pub async fn list(&self) -> AppResult<Vec<T>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY name_key, id", T::TABLE);
        let records = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;
        Ok(records)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<T> {
        let sql = format!("SELECT id, name FROM {} WHERE id = $1", T::TABLE);
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(T::ENTITY, id))
    }

    pub async fn create(&self, input: &NameInput) -> AppResult<T> {
        let sql = format!(
            "INSERT INTO {} (name, name_key) VALUES ($1, $2) RETURNING id",
            T::TABLE
        );
        let id = sqlx::query_scalar::<_, i64>(&sql)
            .bind(&input.name)
            .bind(fold_name(&input.name))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_duplicate(e, &input.name))?;

        self.get_by_id(id).await
    }

    pub async fn update(&self, id: i64, input: &NameInput) -> AppResult<T> {
        let sql = format!(
            "UPDATE {} SET name = $1, name_key = $2 WHERE id = $3",
            T::TABLE
        );
        let result = sqlx::query(&sql)
            .bind(&input.name)
            .bind(fold_name(&input.name))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_duplicate(e, &input.name))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(T::ENTITY, id));
        }

        self.get_by_id(id).await
    }

    /// Delete after the integrity policy has unlinked or nulled dependents
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, T::TABLE, T::ENTITY, id).await?;
        integrity::apply(&mut tx, &T::delete_target(id)).await?;

        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        sqlx::query(&sql).bind(id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

fn map_duplicate(error: sqlx::Error, name: &str) -> AppError {
    if is_unique_violation(&error) {
        AppError::DuplicateName {
            field: "name",
            value: name.to_string(),
        }
    } else {
        AppError::Database(error)
    }
}
