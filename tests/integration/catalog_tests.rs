//! Catalog directory: names, authors, books and delete policy

use catalog_core::{
    error::AppError,
    models::{AuthorInput, BookInput, BookQuery, CopyInput, NameInput},
};

use crate::common::{available_copy_of, seed_book, setup};

#[tokio::test]
async fn test_genre_names_are_unique_ignoring_case() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    catalog.create_genre(NameInput::new("Fiction")).await.unwrap();
    let err = catalog
        .create_genre(NameInput::new("fiction"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateName { field: "name", .. }));

    // First casing wins and only one record exists
    let genres = catalog.list_genres().await.unwrap();
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0].name, "Fiction");
}

#[tokio::test]
async fn test_language_rename_cannot_collide() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    catalog.create_language(NameInput::new("English")).await.unwrap();
    let french = catalog.create_language(NameInput::new("French")).await.unwrap();

    let err = catalog
        .update_language(french.id, NameInput::new("ENGLISH"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateName { .. }));

    // Recasing a record's own name is fine
    let renamed = catalog
        .update_language(french.id, NameInput::new("FRENCH"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "FRENCH");
}

#[tokio::test]
async fn test_blank_names_are_rejected() {
    let app = setup().await;
    let err = app
        .services
        .catalog
        .create_genre(NameInput::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn test_authors_list_by_last_then_first_name() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    catalog.create_author(AuthorInput::new("Zadie", "Smith")).await.unwrap();
    catalog.create_author(AuthorInput::new("Big", "Bob")).await.unwrap();
    catalog.create_author(AuthorInput::new("Adam", "Smith")).await.unwrap();

    let names: Vec<String> = catalog
        .list_authors()
        .await
        .unwrap()
        .iter()
        .map(|a| a.to_string())
        .collect();
    assert_eq!(names, vec!["Bob, Big", "Smith, Adam", "Smith, Zadie"]);
}

#[tokio::test]
async fn test_delete_referenced_author_is_refused() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    let author = catalog.create_author(AuthorInput::new("Big", "Bob")).await.unwrap();
    let mut input = BookInput::new("Wild Fire", "1234567890123");
    input.author_id = Some(author.id);
    let book = catalog.create_book(input).await.unwrap();

    let err = catalog.delete_author(author.id).await.unwrap_err();
    assert!(matches!(err, AppError::ReferencedEntity { entity: "Author", .. }));

    // Nothing changed
    assert!(catalog.get_author(author.id).await.is_ok());
    assert_eq!(catalog.get_book(book.id).await.unwrap().author_id, Some(author.id));

    catalog.delete_book(book.id).await.unwrap();
    catalog.delete_author(author.id).await.unwrap();
    assert!(matches!(
        catalog.get_author(author.id).await,
        Err(AppError::NotFound { entity: "Author", .. })
    ));
}

#[tokio::test]
async fn test_delete_language_clears_book_reference() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    let english = catalog.create_language(NameInput::new("English")).await.unwrap();
    let mut input = BookInput::new("Wild Fire", "1234567890123");
    input.language_id = Some(english.id);
    let book = catalog.create_book(input).await.unwrap();

    catalog.delete_language(english.id).await.unwrap();

    assert_eq!(catalog.get_book(book.id).await.unwrap().language_id, None);
    assert!(catalog.list_languages().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_genre_unlinks_books() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    let fiction = catalog.create_genre(NameInput::new("Fiction")).await.unwrap();
    let drama = catalog.create_genre(NameInput::new("Drama")).await.unwrap();
    let mut input = BookInput::new("Wild Fire", "1234567890123");
    input.genre_ids = vec![fiction.id, drama.id];
    let book = catalog.create_book(input).await.unwrap();
    assert_eq!(book.display_genre(), "Drama, Fiction");

    catalog.delete_genre(fiction.id).await.unwrap();

    let book = catalog.get_book(book.id).await.unwrap();
    assert_eq!(book.display_genre(), "Drama");
}

#[tokio::test]
async fn test_delete_book_with_copies_is_refused() {
    let app = setup().await;
    let book = seed_book(&app, "Wild Fire", "1234567890123").await;
    let copy = available_copy_of(&app, book.id).await;

    let err = app.services.catalog.delete_book(book.id).await.unwrap_err();
    assert!(matches!(err, AppError::ReferencedEntity { entity: "Book", .. }));
    assert!(app.services.ledger.get_copy(copy.id).await.is_ok());

    app.services.ledger.delete_copy(copy.id).await.unwrap();
    app.services.catalog.delete_book(book.id).await.unwrap();
    assert!(matches!(
        app.services.catalog.get_book(book.id).await,
        Err(AppError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_duplicate_isbn_is_rejected() {
    let app = setup().await;
    seed_book(&app, "Wild Fire", "1234567890123").await;

    let err = app
        .services
        .catalog
        .create_book(BookInput::new("Other", "1234567890123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateIsbn(ref isbn) if isbn == "1234567890123"));

    let other = seed_book(&app, "Other", "9999999999999").await;
    let err = app
        .services
        .catalog
        .update_book(other.id, BookInput::new("Other", "1234567890123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateIsbn(_)));
}

#[tokio::test]
async fn test_isbn_must_have_thirteen_characters() {
    let app = setup().await;
    let err = app
        .services
        .catalog
        .create_book(BookInput::new("Short", "12345"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn test_book_references_must_resolve() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    let mut input = BookInput::new("Wild Fire", "1234567890123");
    input.author_id = Some(42);
    let err = catalog.create_book(input).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: "Author", .. }));

    let mut input = BookInput::new("Wild Fire", "1234567890123");
    input.genre_ids = vec![7];
    let err = catalog.create_book(input).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: "Genre", .. }));

    // Neither attempt left a row behind
    assert_eq!(catalog.summary().await.unwrap().books, 0);
}

#[tokio::test]
async fn test_update_replaces_genre_set() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    let fiction = catalog.create_genre(NameInput::new("Fiction")).await.unwrap();
    let poetry = catalog.create_genre(NameInput::new("Poetry")).await.unwrap();
    let mut input = BookInput::new("Wild Fire", "1234567890123");
    input.genre_ids = vec![fiction.id];
    let book = catalog.create_book(input.clone()).await.unwrap();

    input.genre_ids = vec![poetry.id];
    input.summary = "A long summer".to_string();
    let book = catalog.update_book(book.id, input).await.unwrap();

    assert_eq!(book.genres.len(), 1);
    assert_eq!(book.genres[0].name, "Poetry");
    assert_eq!(book.summary, "A long summer");
}

#[tokio::test]
async fn test_book_filters() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    let author = catalog.create_author(AuthorInput::new("Big", "Bob")).await.unwrap();
    let english = catalog.create_language(NameInput::new("English")).await.unwrap();
    let scifi = catalog.create_genre(NameInput::new("Science Fiction")).await.unwrap();

    let mut wild = BookInput::new("Wild Fire", "1000000000001");
    wild.author_id = Some(author.id);
    wild.genre_ids = vec![scifi.id];
    catalog.create_book(wild).await.unwrap();

    let mut calm = BookInput::new("Calm Water", "1000000000002");
    calm.language_id = Some(english.id);
    catalog.create_book(calm).await.unwrap();

    catalog
        .create_book(BookInput::new("Wildlife", "1000000000003"))
        .await
        .unwrap();

    let titles = |books: Vec<catalog_core::models::Book>| -> Vec<String> {
        books.into_iter().map(|b| b.title).collect()
    };

    let query = BookQuery {
        title: Some("Wild".into()),
        ..Default::default()
    };
    let (books, total) = catalog.list_books(&query).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(titles(books), vec!["Wild Fire", "Wildlife"]);

    // Title match is case sensitive
    let query = BookQuery {
        title: Some("wild".into()),
        ..Default::default()
    };
    assert_eq!(catalog.list_books(&query).await.unwrap().1, 0);

    // Genre match is not
    let query = BookQuery {
        genre: Some("FICTION".into()),
        ..Default::default()
    };
    let (books, _) = catalog.list_books(&query).await.unwrap();
    assert_eq!(titles(books), vec!["Wild Fire"]);

    let query = BookQuery {
        language_id: Some(english.id),
        ..Default::default()
    };
    let (books, _) = catalog.list_books(&query).await.unwrap();
    assert_eq!(titles(books), vec!["Calm Water"]);

    let by_author = catalog.list_author_books(author.id).await.unwrap();
    assert_eq!(titles(by_author), vec!["Wild Fire"]);
}

#[tokio::test]
async fn test_book_pagination() {
    let app = setup().await;
    for i in 0..5 {
        seed_book(&app, &format!("Book {}", i), &format!("100000000000{}", i)).await;
    }

    let query = BookQuery {
        page: Some(2),
        per_page: Some(2),
        ..Default::default()
    };
    let (books, total) = app.services.catalog.list_books(&query).await.unwrap();
    assert_eq!(total, 5);
    let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Book 2", "Book 3"]);
}

#[tokio::test]
async fn test_out_of_range_pages_are_rejected() {
    let app = setup().await;
    seed_book(&app, "Wild Fire", "1234567890123").await;

    let query = BookQuery {
        page: Some(i64::MAX),
        per_page: Some(2),
        ..Default::default()
    };
    let err = app.services.catalog.list_books(&query).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "page"));

    // An oversized page is clamped rather than refused
    let query = BookQuery {
        page: Some(1),
        per_page: Some(i64::MAX),
        ..Default::default()
    };
    let (books, total) = app.services.catalog.list_books(&query).await.unwrap();
    assert_eq!((books.len(), total), (1, 1));
}

#[tokio::test]
async fn test_missing_records_report_not_found() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    assert!(matches!(
        catalog.delete_genre(99).await,
        Err(AppError::NotFound { entity: "Genre", .. })
    ));
    assert!(matches!(
        catalog.update_author(99, AuthorInput::new("A", "B")).await,
        Err(AppError::NotFound { entity: "Author", .. })
    ));
    assert!(matches!(
        catalog.list_author_books(99).await,
        Err(AppError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_summary_counts() {
    let app = setup().await;
    let catalog = &app.services.catalog;

    catalog.create_author(AuthorInput::new("Big", "Bob")).await.unwrap();
    catalog.create_genre(NameInput::new("Fiction")).await.unwrap();
    let book = seed_book(&app, "Wild Fire", "1234567890123").await;
    available_copy_of(&app, book.id).await;
    app.services
        .ledger
        .create_copy(CopyInput::new(book.id, "Second printing"))
        .await
        .unwrap();

    let summary = catalog.summary().await.unwrap();
    assert_eq!(summary.books, 1);
    assert_eq!(summary.copies, 2);
    assert_eq!(summary.copies_available, 1);
    assert_eq!(summary.authors, 1);
    assert_eq!(summary.genres, 1);
    assert_eq!(summary.languages, 0);
}
