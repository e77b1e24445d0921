//! Data models for the catalog core

pub mod author;
pub mod book;
pub mod book_instance;
pub mod caller;
pub mod name;

// Re-export commonly used types
pub use author::{Author, AuthorInput};
pub use book::{Book, BookInput, BookQuery, CatalogSummary};
pub use book_instance::{BookInstance, CopyAction, CopyInput, CopyStatus, LoanDetails};
pub use caller::{Caller, Capability};
pub use name::{fold_name, Genre, Language, NameInput};
