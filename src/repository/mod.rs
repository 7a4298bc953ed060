//! Repository layer for database operations
//!
//! Each entity is reached through a small storage capability trait
//! (`save`, `find_by_id`, `find_all`, `delete_by_id`). The PostgreSQL
//! implementations live in [`authors`] and [`books`]; [`memory`] provides
//! the same contract without a database.

pub mod authors;
pub mod books;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Author, Book},
};

/// Storage for `Author` rows
#[async_trait]
pub trait AuthorStore: Send + Sync {
    /// Insert when `id` is `None`, otherwise overwrite the row.
    /// A duplicate name fails with `AppError::Conflict`.
    async fn save(&self, author: Author) -> AppResult<Author>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Author>>;

    async fn find_all(&self) -> AppResult<Vec<Author>>;

    /// Deleting an absent row succeeds. An author still linked to a book
    /// fails with `AppError::Conflict`.
    async fn delete_by_id(&self, id: i64) -> AppResult<()>;

    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> AppResult<()>;
}

/// Storage for `Book` rows and their `book_author` join rows
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert when `id` is `None`, otherwise overwrite the row. The join rows
    /// are replaced by `book.authors` in the same unit of work.
    async fn save(&self, book: Book) -> AppResult<Book>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>>;

    async fn find_all(&self) -> AppResult<Vec<Book>>;

    /// Deleting an absent row succeeds; join rows go with the book.
    async fn delete_by_id(&self, id: i64) -> AppResult<()>;
}

/// Main repository struct holding the PostgreSQL pool and per-entity stores
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            pool,
        }
    }

    /// Trait objects handed to the services
    pub fn stores(&self) -> (Arc<dyn AuthorStore>, Arc<dyn BookStore>) {
        (Arc::new(self.authors.clone()), Arc::new(self.books.clone()))
    }
}

/// Whether the error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Whether the error is a FOREIGN KEY constraint violation
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}
