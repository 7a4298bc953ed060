//! Books repository (PostgreSQL), including the `book_author` join table

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};

use super::{is_foreign_key_violation, BookStore};
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book},
};

const BOOK_COLUMNS: &str =
    "id, title, author_display, page_count, available, publication_date, pdf_path";

/// Author joined with the book it is attached to
#[derive(FromRow)]
struct BookAuthorRow {
    book_id: i64,
    #[sqlx(flatten)]
    author: Author,
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Load all authors for a book via the book_author junction table
    async fn get_book_authors(&self, book_id: i64) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>(
            r#"
            SELECT a.id, a.name, a.birth_date, a.nationality, a.biography
            FROM book_author ba
            JOIN authors a ON a.id = ba.author_id
            WHERE ba.book_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn save(&self, book: Book) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = match book.id {
            None => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO books (title, author_display, page_count, available, publication_date, pdf_path)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id
                    "#,
                )
                .bind(&book.title)
                .bind(&book.author_display)
                .bind(book.page_count)
                .bind(book.available)
                .bind(book.publication_date)
                .bind(&book.pdf_path)
                .fetch_one(&mut *tx)
                .await?
            }
            Some(id) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    UPDATE books SET
                        title = $1,
                        author_display = $2,
                        page_count = $3,
                        available = $4,
                        publication_date = $5,
                        pdf_path = $6
                    WHERE id = $7
                    RETURNING id
                    "#,
                )
                .bind(&book.title)
                .bind(&book.author_display)
                .bind(book.page_count)
                .bind(book.available)
                .bind(book.publication_date)
                .bind(&book.pdf_path)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?
            }
        };

        // Replace the association wholesale
        sqlx::query("DELETE FROM book_author WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for author_id in book.author_ids() {
            sqlx::query(
                "INSERT INTO book_author (book_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(author_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::NotFound(format!("Author {} not found", author_id))
                } else {
                    AppError::Database(e)
                }
            })?;
        }

        tx.commit().await?;

        Ok(Book {
            id: Some(id),
            ..book
        })
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        let Some(mut book) = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        book.authors = self.get_book_authors(id).await?;
        Ok(Some(book))
    }

    async fn find_all(&self) -> AppResult<Vec<Book>> {
        let query = format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS);
        let mut books = sqlx::query_as::<_, Book>(&query)
            .fetch_all(&self.pool)
            .await?;

        let links = sqlx::query_as::<_, BookAuthorRow>(
            r#"
            SELECT ba.book_id, a.id, a.name, a.birth_date, a.nationality, a.biography
            FROM book_author ba
            JOIN authors a ON a.id = ba.author_id
            ORDER BY a.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_book: HashMap<i64, Vec<Author>> = HashMap::new();
        for link in links {
            by_book.entry(link.book_id).or_default().push(link.author);
        }

        for book in &mut books {
            if let Some(authors) = book.id.and_then(|id| by_book.remove(&id)) {
                book.authors = authors;
            }
        }

        Ok(books)
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<()> {
        // book_author rows cascade
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
