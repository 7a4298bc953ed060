//! Author service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, AuthorInput},
    repository::AuthorStore,
};

#[derive(Clone)]
pub struct AuthorsService {
    store: Arc<dyn AuthorStore>,
}

impl AuthorsService {
    pub fn new(store: Arc<dyn AuthorStore>) -> Self {
        Self { store }
    }

    /// Create an author. A duplicate name fails with `Conflict`.
    pub async fn create(&self, input: &AuthorInput) -> AppResult<Author> {
        tracing::info!("Creating author: {}", input.name);
        self.store.save(Author::from_input(input)).await
    }

    pub async fn list(&self) -> AppResult<Vec<Author>> {
        tracing::info!("Listing all authors");
        self.store.find_all().await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Author> {
        tracing::info!("Fetching author {}", id);
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    /// Replace every mutable field of an existing author
    pub async fn update(&self, id: i64, input: &AuthorInput) -> AppResult<Author> {
        tracing::info!("Updating author {}", id);
        let mut author = self.get_by_id(id).await?;
        author.apply(input);
        self.store.save(author).await
    }

    /// Delete an author; deleting an unknown id succeeds
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        tracing::info!("Deleting author {}", id);
        self.store.delete_by_id(id).await
    }

    pub(crate) async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;
    use chrono::NaiveDate;

    fn service() -> AuthorsService {
        let (authors, _) = MemoryStore::new().stores();
        AuthorsService::new(authors)
    }

    fn input(name: &str) -> AuthorInput {
        AuthorInput {
            name: name.to_string(),
            birth_date: NaiveDate::from_ymd_opt(1920, 12, 10),
            nationality: Some("Brasileira".to_string()),
            biography: Some("Romancista".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service();
        let created = service.create(&input("Clarice Lispector")).await.unwrap();
        let id = created.id.expect("id assigned");

        let fetched = service.get_by_id(id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.nationality.as_deref(), Some("Brasileira"));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let service = service();
        service.create(&input("Jorge Amado")).await.unwrap();
        let err = service.create(&input("Jorge Amado")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let named: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|a| a.name == "Jorge Amado")
            .collect();
        assert_eq!(named.len(), 1);
    }

    #[tokio::test]
    async fn test_update_is_full_replace() {
        let service = service();
        let created = service.create(&input("Cecília Meireles")).await.unwrap();
        let id = created.id.unwrap();

        let replacement = AuthorInput {
            name: "Cecília Benevides de Carvalho Meireles".to_string(),
            birth_date: None,
            nationality: None,
            biography: None,
        };
        let updated = service.update(id, &replacement).await.unwrap();
        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.name, replacement.name);
        assert_eq!(updated.birth_date, None);
        assert_eq!(updated.nationality, None);
        assert_eq!(updated.biography, None);
    }

    #[tokio::test]
    async fn test_update_to_taken_name_conflicts() {
        let service = service();
        service.create(&input("A")).await.unwrap();
        let b = service.create(&input("B")).await.unwrap();
        let err = service.update(b.id.unwrap(), &input("A")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(service.get_by_id(b.id.unwrap()).await.unwrap().name, "B");
    }

    #[tokio::test]
    async fn test_missing_author() {
        let service = service();
        assert!(matches!(service.get_by_id(9).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.update(9, &input("X")).await, Err(AppError::NotFound(_))));
        service.delete(9).await.unwrap();
    }
}
