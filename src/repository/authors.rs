//! Authors repository (PostgreSQL)

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{is_foreign_key_violation, is_unique_violation, AuthorStore};
use crate::{
    error::{AppError, AppResult},
    models::Author,
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorStore for AuthorsRepository {
    async fn save(&self, author: Author) -> AppResult<Author> {
        let saved = match author.id {
            None => sqlx::query_as::<_, Author>(
                r#"
                INSERT INTO authors (name, birth_date, nationality, biography)
                VALUES ($1, $2, $3, $4)
                RETURNING id, name, birth_date, nationality, biography
                "#,
            )
            .bind(&author.name)
            .bind(author.birth_date)
            .bind(&author.nationality)
            .bind(&author.biography)
            .fetch_one(&self.pool)
            .await
            .map(Some),
            Some(id) => sqlx::query_as::<_, Author>(
                r#"
                UPDATE authors
                SET name = $1, birth_date = $2, nationality = $3, biography = $4
                WHERE id = $5
                RETURNING id, name, birth_date, nationality, biography
                "#,
            )
            .bind(&author.name)
            .bind(author.birth_date)
            .bind(&author.nationality)
            .bind(&author.biography)
            .bind(id)
            .fetch_optional(&self.pool)
            .await,
        }
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("An author named '{}' already exists", author.name))
            } else {
                AppError::Database(e)
            }
        })?;

        saved.ok_or_else(|| {
            AppError::NotFound(format!("Author {} not found", author.id.unwrap_or_default()))
        })
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, name, birth_date, nationality, biography FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn find_all(&self) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>(
            "SELECT id, name, birth_date, nationality, biography FROM authors ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict(format!("Author {} is still linked to books", id))
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
