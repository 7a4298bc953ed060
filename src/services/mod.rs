//! Business logic services

pub mod authors;
pub mod books;

use std::sync::Arc;

use crate::{
    error::AppResult,
    repository::{AuthorStore, BookStore},
    storage::FileStore,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
    pub files: FileStore,
}

impl Services {
    /// Create all services over the given stores
    pub fn new(
        author_store: Arc<dyn AuthorStore>,
        book_store: Arc<dyn BookStore>,
        files: FileStore,
    ) -> Self {
        Self {
            authors: authors::AuthorsService::new(author_store.clone()),
            books: books::BooksService::new(book_store, author_store),
            files,
        }
    }

    /// Persistence store answers and the upload directory exists
    pub async fn check_ready(&self) -> AppResult<bool> {
        self.authors.ping().await?;
        Ok(self.files.is_ready().await)
    }
}
