//! Books repository for database operations

use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::{
        book::{Book, BookInput, BookQuery},
        fold_name, Genre,
    },
};

use super::{
    ensure_exists,
    integrity::{self, DeleteTarget},
};

const BOOK_COLUMNS: &str = "b.id, b.title, b.author_id, b.summary, b.isbn, b.language_id";

/// Upper bound on a requested page size
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID, genres included
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        let sql = format!("SELECT {} FROM books b WHERE b.id = $1", BOOK_COLUMNS);
        let mut book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))?;

        book.genres = self.genres_for(id).await?;
        Ok(book)
    }

    /// Genres linked to a book, ordered by name
    pub async fn genres_for(&self, book_id: i64) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.id
            WHERE bg.book_id = $1
            ORDER BY g.name_key
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Filtered listing ordered by title. Paginates only when `per_page` is set.
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let window = page_window(query)?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM books b WHERE 1=1");
        push_filters(&mut count, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM books b WHERE 1=1", BOOK_COLUMNS));
        push_filters(&mut select, query);
        select.push(" ORDER BY b.title, b.id");

        if let Some((limit, offset)) = window {
            select
                .push(" LIMIT ")
                .push_bind(limit)
                .push(" OFFSET ")
                .push_bind(offset);
        }

        let mut books = select
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        for book in &mut books {
            book.genres = self.genres_for(book.id).await?;
        }

        Ok((books, total))
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    pub async fn create(&self, book: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        check_references(&mut tx, book).await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.language_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_duplicate_isbn(e, &book.isbn))?;

        link_genres(&mut tx, id, &book.genre_ids).await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Replace every field of a book, genre set included
    pub async fn update(&self, id: i64, book: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, "books", "Book", id).await?;
        check_references(&mut tx, book).await?;

        sqlx::query(
            r#"
            UPDATE books SET
                title = $1,
                author_id = $2,
                summary = $3,
                isbn = $4,
                language_id = $5
            WHERE id = $6
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.language_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_duplicate_isbn(e, &book.isbn))?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_genres(&mut tx, id, &book.genre_ids).await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Delete a book. Refused while any copy of it exists.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, "books", "Book", id).await?;
        integrity::apply(&mut tx, &DeleteTarget::Book(id)).await?;

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// LIMIT and OFFSET for the requested page, if paging was asked for
fn page_window(query: &BookQuery) -> AppResult<Option<(i64, i64)>> {
    let Some(per_page) = query.per_page else {
        return Ok(None);
    };

    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1)
        .checked_mul(per_page)
        .ok_or_else(|| AppError::validation("page", "out_of_range"))?;

    Ok(Some((per_page, offset)))
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &BookQuery) {
    if let Some(ref title) = query.title {
        builder
            .push(" AND instr(b.title, ")
            .push_bind(title.clone())
            .push(") > 0");
    }

    if let Some(ref genre) = query.genre {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM book_genres bg JOIN genres g ON g.id = bg.genre_id \
                 WHERE bg.book_id = b.id AND instr(g.name_key, ",
            )
            .push_bind(fold_name(genre))
            .push(") > 0)");
    }

    if let Some(author_id) = query.author_id {
        builder.push(" AND b.author_id = ").push_bind(author_id);
    }

    if let Some(language_id) = query.language_id {
        builder.push(" AND b.language_id = ").push_bind(language_id);
    }
}

/// Author, language and genres named by the input must exist
async fn check_references(conn: &mut SqliteConnection, book: &BookInput) -> AppResult<()> {
    if let Some(author_id) = book.author_id {
        ensure_exists(&mut *conn, "authors", "Author", author_id).await?;
    }
    if let Some(language_id) = book.language_id {
        ensure_exists(&mut *conn, "languages", "Language", language_id).await?;
    }
    for genre_id in &book.genre_ids {
        ensure_exists(&mut *conn, "genres", "Genre", *genre_id).await?;
    }
    Ok(())
}

async fn link_genres(conn: &mut SqliteConnection, book_id: i64, genre_ids: &[i64]) -> AppResult<()> {
    for genre_id in genre_ids {
        sqlx::query("INSERT OR IGNORE INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
            .bind(book_id)
            .bind(*genre_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn map_duplicate_isbn(error: sqlx::Error, isbn: &str) -> AppError {
    if is_unique_violation(&error) {
        AppError::DuplicateIsbn(isbn.to_string())
    } else {
        AppError::Database(error)
    }
}
