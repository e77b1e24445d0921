//! Catalog directory service: authors, genres, languages and books

use crate::{
    error::AppResult,
    models::{
        Author, AuthorInput, Book, BookInput, BookQuery, CatalogSummary, CopyStatus, Genre,
        Language, NameInput,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn get_author(&self, id: i64) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, input: AuthorInput) -> AppResult<Author> {
        input.check()?;
        let author = self.repository.authors.create(&input).await?;
        tracing::info!("Created author {} ({})", author.id, author);
        Ok(author)
    }

    pub async fn update_author(&self, id: i64, input: AuthorInput) -> AppResult<Author> {
        input.check()?;
        self.repository.authors.update(id, &input).await
    }

    pub async fn delete_author(&self, id: i64) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Deleted author {}", id);
        Ok(())
    }

    /// Books written by an author, ordered by title
    pub async fn list_author_books(&self, author_id: i64) -> AppResult<Vec<Book>> {
        self.repository.authors.get_by_id(author_id).await?;

        let query = BookQuery {
            author_id: Some(author_id),
            ..Default::default()
        };
        let (books, _) = self.repository.books.search(&query).await?;
        Ok(books)
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get_genre(&self, id: i64) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await
    }

    pub async fn create_genre(&self, input: NameInput) -> AppResult<Genre> {
        input.check()?;
        let genre = self.repository.genres.create(&input).await?;
        tracing::info!("Created genre {} ({})", genre.id, genre.name);
        Ok(genre)
    }

    pub async fn update_genre(&self, id: i64, input: NameInput) -> AppResult<Genre> {
        input.check()?;
        self.repository.genres.update(id, &input).await
    }

    /// Books lose the genre; the delete itself is never refused
    pub async fn delete_genre(&self, id: i64) -> AppResult<()> {
        self.repository.genres.delete(id).await?;
        tracing::info!("Deleted genre {}", id);
        Ok(())
    }

    // =========================================================================
    // LANGUAGES
    // =========================================================================

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list().await
    }

    pub async fn get_language(&self, id: i64) -> AppResult<Language> {
        self.repository.languages.get_by_id(id).await
    }

    pub async fn create_language(&self, input: NameInput) -> AppResult<Language> {
        input.check()?;
        let language = self.repository.languages.create(&input).await?;
        tracing::info!("Created language {} ({})", language.id, language.name);
        Ok(language)
    }

    pub async fn update_language(&self, id: i64, input: NameInput) -> AppResult<Language> {
        input.check()?;
        self.repository.languages.update(id, &input).await
    }

    /// Books written in the language keep existing with no language
    pub async fn delete_language(&self, id: i64) -> AppResult<()> {
        self.repository.languages.delete(id).await?;
        tracing::info!("Deleted language {}", id);
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    /// Search books with filters. Returns the page and the total match count.
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        tracing::debug!("Book search: {:?}", query);
        self.repository.books.search(query).await
    }

    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, input: BookInput) -> AppResult<Book> {
        input.check()?;
        let book = self.repository.books.create(&input).await?;
        tracing::info!("Created book {} ({}, isbn {})", book.id, book.title, book.isbn);
        Ok(book)
    }

    pub async fn update_book(&self, id: i64, input: BookInput) -> AppResult<Book> {
        input.check()?;
        self.repository.books.update(id, &input).await
    }

    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    // =========================================================================
    // SUMMARY
    // =========================================================================

    pub async fn summary(&self) -> AppResult<CatalogSummary> {
        Ok(CatalogSummary {
            books: self.repository.books.count().await?,
            copies: self.repository.book_instances.count().await?,
            copies_available: self
                .repository
                .book_instances
                .count_by_status(CopyStatus::Available)
                .await?,
            authors: self.repository.authors.count().await?,
            genres: self.repository.genres.count().await?,
            languages: self.repository.languages.count().await?,
        })
    }
}
