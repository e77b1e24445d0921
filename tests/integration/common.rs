//! Shared setup for integration tests

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use catalog_core::{
    clock::ManualClock,
    config::{DatabaseConfig, LoanPolicyConfig},
    models::{Book, BookInput, BookInstance, Caller, Capability, CopyInput},
    repository::{self, Repository},
    services::Services,
};

pub struct TestApp {
    pub services: Services,
    pub repository: Repository,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn today(&self) -> NaiveDate {
        use catalog_core::clock::Clock;
        self.clock.today()
    }

    pub fn in_days(&self, days: i64) -> NaiveDate {
        self.today() + Duration::days(days)
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

pub async fn setup() -> TestApp {
    setup_with_policy(LoanPolicyConfig::default()).await
}

pub async fn setup_with_policy(policy: LoanPolicyConfig) -> TestApp {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };
    let pool = repository::connect(&config).await.expect("connect");
    let repository = Repository::new(pool);
    repository.migrate().await.expect("migrate");

    let clock = Arc::new(ManualClock::new(start_date()));
    let services = Services::new(repository.clone(), &policy, clock.clone());

    TestApp {
        services,
        repository,
        clock,
    }
}

pub fn librarian() -> Caller {
    Caller::patron("librarian").with_capability(Capability::CanMarkReturned)
}

pub async fn seed_book(app: &TestApp, title: &str, isbn: &str) -> Book {
    app.services
        .catalog
        .create_book(BookInput::new(title, isbn))
        .await
        .expect("create book")
}

/// Copy of a fresh book, already marked available
pub async fn available_copy(app: &TestApp) -> BookInstance {
    let book = seed_book(app, "Wild Fire", "1234567890123").await;
    available_copy_of(app, book.id).await
}

pub async fn available_copy_of(app: &TestApp, book_id: i64) -> BookInstance {
    let copy = app
        .services
        .ledger
        .create_copy(CopyInput::new(book_id, "Penguin, 1999"))
        .await
        .expect("create copy");
    app.services
        .ledger
        .mark_available(copy.id)
        .await
        .expect("mark available")
}
