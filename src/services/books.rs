//! Book service: entity assembly, author resolution and PDF attachment

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookInput},
    },
    repository::{AuthorStore, BookStore},
};

#[derive(Clone)]
pub struct BooksService {
    books: Arc<dyn BookStore>,
    authors: Arc<dyn AuthorStore>,
}

impl BooksService {
    pub fn new(books: Arc<dyn BookStore>, authors: Arc<dyn AuthorStore>) -> Self {
        Self { books, authors }
    }

    /// Look up every requested author, in order. The first missing id fails
    /// the whole resolution.
    async fn resolve_authors(&self, ids: &[i64]) -> AppResult<Vec<Author>> {
        let mut authors = Vec::with_capacity(ids.len());
        for &id in ids {
            let author = self
                .authors
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Author not found with id {}", id)))?;
            authors.push(author);
        }
        Ok(authors)
    }

    /// Create a book, associating the requested authors (all or nothing)
    pub async fn create(&self, input: &BookInput) -> AppResult<Book> {
        tracing::info!("Creating book: {}", input.title);

        let mut book = Book::from_input(input);
        if let Some(ids) = input.requested_author_ids() {
            book.set_authors(self.resolve_authors(&ids).await?);
        }

        let saved = self.books.save(book).await?;
        tracing::info!(
            "Book '{}' created with id {}",
            saved.title,
            saved.id.unwrap_or_default()
        );
        Ok(saved)
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        tracing::info!("Listing all books");
        self.books.find_all().await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        tracing::info!("Fetching book {}", id);
        self.books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Overwrite the scalar fields. Authors are replaced only when the
    /// request names at least one; otherwise the association is kept.
    pub async fn update(&self, id: i64, input: &BookInput) -> AppResult<Book> {
        tracing::info!("Updating book {}", id);

        let mut book = self.get_by_id(id).await?;
        book.apply_scalars(input);
        if let Some(ids) = input.requested_author_ids() {
            book.set_authors(self.resolve_authors(&ids).await?);
        }

        let saved = self.books.save(book).await?;
        tracing::info!("Book {} updated", id);
        Ok(saved)
    }

    /// Delete a book; deleting an unknown id succeeds
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        tracing::info!("Deleting book {}", id);
        self.books.delete_by_id(id).await
    }

    /// Record the location of an already written PDF on an existing book
    pub async fn attach_file(&self, id: i64, path: String) -> AppResult<Book> {
        let mut book = self.get_by_id(id).await?;
        tracing::info!("Attaching {} to book {}", path, id);
        book.pdf_path = Some(path);
        self.save(book).await
    }

    /// Persist a full entity as is
    pub async fn save(&self, book: Book) -> AppResult<Book> {
        self.books.save(book).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::author::AuthorInput, repository::memory::MemoryStore,
        services::authors::AuthorsService,
    };
    use chrono::NaiveDate;

    fn services() -> (BooksService, AuthorsService) {
        let (authors, books) = MemoryStore::new().stores();
        (
            BooksService::new(books, authors.clone()),
            AuthorsService::new(authors),
        )
    }

    async fn author(service: &AuthorsService, name: &str) -> i64 {
        let input = AuthorInput {
            name: name.to_string(),
            birth_date: None,
            nationality: None,
            biography: None,
        };
        service.create(&input).await.unwrap().id.unwrap()
    }

    fn input(title: &str, author_ids: Option<Vec<i64>>) -> BookInput {
        BookInput {
            title: title.to_string(),
            page_count: 320,
            available: true,
            publication_date: NaiveDate::from_ymd_opt(1958, 3, 1).unwrap(),
            author_ids,
        }
    }

    #[tokio::test]
    async fn test_create_without_authors() {
        let (books, _) = services();
        let book = books.create(&input("Gabriela", None)).await.unwrap();
        assert!(book.id.is_some());
        assert!(book.authors.is_empty());
        assert_eq!(book.author_display, "");
    }

    #[tokio::test]
    async fn test_create_with_authors() {
        let (books, authors) = services();
        let a = author(&authors, "Jorge Amado").await;
        let b = author(&authors, "Zélia Gattai").await;

        let book = books.create(&input("Obra", Some(vec![a, b]))).await.unwrap();
        assert_eq!(book.author_display, "Jorge Amado, Zélia Gattai");
        let mut ids = book.author_ids();
        ids.sort();
        assert_eq!(ids, vec![a, b]);

        let fetched = books.get_by_id(book.id.unwrap()).await.unwrap();
        assert_eq!(fetched.author_display, "Jorge Amado, Zélia Gattai");
        assert_eq!(fetched.authors.len(), 2);
    }

    #[tokio::test]
    async fn test_display_follows_request_order() {
        let (books, authors) = services();
        let a = author(&authors, "A").await;
        let b = author(&authors, "B").await;

        let book = books.create(&input("T", Some(vec![b, a, b]))).await.unwrap();
        assert_eq!(book.author_display, "B, A");
        assert_eq!(book.authors.len(), 2);
    }

    #[tokio::test]
    async fn test_create_with_missing_author_persists_nothing() {
        let (books, authors) = services();
        let a = author(&authors, "Existe").await;

        let err = books.create(&input("T", Some(vec![a, 404]))).await.unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.contains("404")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(books.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_without_authors_keeps_association() {
        let (books, authors) = services();
        let a = author(&authors, "Graciliano Ramos").await;
        let created = books.create(&input("Vidas Secas", Some(vec![a]))).await.unwrap();
        let id = created.id.unwrap();

        let mut change = input("Vidas Secas (2ª ed.)", None);
        change.page_count = 176;
        change.available = false;
        let updated = books.update(id, &change).await.unwrap();
        assert_eq!(updated.title, "Vidas Secas (2ª ed.)");
        assert_eq!(updated.page_count, 176);
        assert!(!updated.available);
        assert_eq!(updated.author_display, "Graciliano Ramos");
        assert_eq!(updated.author_ids(), vec![a]);

        // An explicitly empty list behaves the same
        let updated = books.update(id, &input("Vidas Secas", Some(vec![]))).await.unwrap();
        assert_eq!(updated.author_ids(), vec![a]);
        assert_eq!(books.get_by_id(id).await.unwrap().author_display, "Graciliano Ramos");
    }

    #[tokio::test]
    async fn test_update_with_authors_replaces_set() {
        let (books, authors) = services();
        let a = author(&authors, "A").await;
        let b = author(&authors, "B").await;
        let c = author(&authors, "C").await;
        let created = books.create(&input("T", Some(vec![a, b]))).await.unwrap();
        let id = created.id.unwrap();

        let updated = books.update(id, &input("T", Some(vec![c]))).await.unwrap();
        assert_eq!(updated.author_ids(), vec![c]);
        assert_eq!(updated.author_display, "C");

        let fetched = books.get_by_id(id).await.unwrap();
        assert_eq!(fetched.author_ids(), vec![c]);
    }

    #[tokio::test]
    async fn test_update_with_missing_author_changes_nothing() {
        let (books, authors) = services();
        let a = author(&authors, "A").await;
        let created = books.create(&input("Original", Some(vec![a]))).await.unwrap();
        let id = created.id.unwrap();

        let err = books.update(id, &input("Changed", Some(vec![77]))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(books.get_by_id(id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_update_missing_book() {
        let (books, _) = services();
        let err = books.update(5, &input("T", None)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (books, _) = services();
        let request = input("Capitães da Areia", None);
        let created = books.create(&request).await.unwrap();
        let fetched = books.get_by_id(created.id.unwrap()).await.unwrap();

        assert_eq!(fetched.title, request.title);
        assert_eq!(fetched.page_count, request.page_count);
        assert_eq!(fetched.available, request.available);
        assert_eq!(fetched.publication_date, request.publication_date);
        assert_eq!(fetched.pdf_path, None);
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let (books, _) = services();
        let id = books.create(&input("T", None)).await.unwrap().id.unwrap();
        books.delete(id).await.unwrap();
        assert!(matches!(books.get_by_id(id).await, Err(AppError::NotFound(_))));
        books.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_attach_file() {
        let (books, _) = services();
        let id = books.create(&input("T", None)).await.unwrap().id.unwrap();

        let book = books.attach_file(id, "uploads/t.pdf".to_string()).await.unwrap();
        assert_eq!(book.pdf_path.as_deref(), Some("uploads/t.pdf"));
        assert_eq!(
            books.get_by_id(id).await.unwrap().pdf_path.as_deref(),
            Some("uploads/t.pdf")
        );

        let err = books.attach_file(99, "x".to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
