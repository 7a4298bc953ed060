//! In-memory stores
//!
//! Mirrors the PostgreSQL schema constraints: unique author names, join rows
//! that must reference existing authors, cascade from books and restrict from
//! authors. Selected with `database.url = "memory:"` and used by the tests.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AuthorStore, BookStore};
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book},
};

#[derive(Default)]
struct Tables {
    authors: BTreeMap<i64, Author>,
    /// Book rows without their authors
    books: BTreeMap<i64, Book>,
    /// `book_author` join rows, keyed by book id
    book_author: BTreeMap<i64, Vec<i64>>,
    next_author_id: i64,
    next_book_id: i64,
}

impl Tables {
    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.authors
            .values()
            .any(|a| a.name == name && a.id != except)
    }

    fn book_with_authors(&self, row: &Book) -> Book {
        let mut book = row.clone();
        let ids = row
            .id
            .and_then(|id| self.book_author.get(&id))
            .cloned()
            .unwrap_or_default();
        // BTreeMap iteration keeps authors ordered by id
        book.authors = self
            .authors
            .values()
            .filter(|a| a.id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect();
        book
    }
}

/// Shared in-memory tables implementing both [`AuthorStore`] and [`BookStore`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trait objects over the same tables
    pub fn stores(&self) -> (Arc<dyn AuthorStore>, Arc<dyn BookStore>) {
        (Arc::new(self.clone()), Arc::new(self.clone()))
    }
}

#[async_trait]
impl AuthorStore for MemoryStore {
    async fn save(&self, mut author: Author) -> AppResult<Author> {
        let mut tables = self.tables.lock().await;

        if tables.name_taken(&author.name, author.id) {
            return Err(AppError::Conflict(format!(
                "An author named '{}' already exists",
                author.name
            )));
        }

        let id = match author.id {
            Some(id) if tables.authors.contains_key(&id) => id,
            Some(id) => return Err(AppError::NotFound(format!("Author {} not found", id))),
            None => {
                tables.next_author_id += 1;
                tables.next_author_id
            }
        };

        author.id = Some(id);
        tables.authors.insert(id, author.clone());
        Ok(author)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Author>> {
        Ok(self.tables.lock().await.authors.get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Author>> {
        Ok(self.tables.lock().await.authors.values().cloned().collect())
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.book_author.values().any(|ids| ids.contains(&id)) {
            return Err(AppError::Conflict(format!(
                "Author {} is still linked to books",
                id
            )));
        }
        tables.authors.remove(&id);
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn save(&self, mut book: Book) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;

        let author_ids = book.author_ids();
        if let Some(missing) = author_ids.iter().find(|id| !tables.authors.contains_key(*id)) {
            return Err(AppError::NotFound(format!("Author {} not found", missing)));
        }

        let id = match book.id {
            Some(id) if tables.books.contains_key(&id) => id,
            Some(id) => return Err(AppError::NotFound(format!("Book {} not found", id))),
            None => {
                tables.next_book_id += 1;
                tables.next_book_id
            }
        };
        book.id = Some(id);

        let row = Book {
            authors: Vec::new(),
            ..book.clone()
        };
        tables.books.insert(id, row);
        tables.book_author.insert(id, author_ids);
        Ok(book)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let tables = self.tables.lock().await;
        Ok(tables.books.get(&id).map(|row| tables.book_with_authors(row)))
    }

    async fn find_all(&self) -> AppResult<Vec<Book>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .books
            .values()
            .map(|row| tables.book_with_authors(row))
            .collect())
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        tables.books.remove(&id);
        tables.book_author.remove(&id);
        Ok(())
    }
}
