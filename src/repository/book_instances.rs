//! Book instances (copies) repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{BookInstance, BookInstanceStatus},
};

#[async_trait]
pub trait BookInstancesStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<BookInstance>>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance>;

    async fn list_by_book(&self, book: Uuid) -> AppResult<Vec<BookInstance>>;

    async fn create(&self, instance: &BookInstance) -> AppResult<()>;

    async fn update(&self, instance: &BookInstance) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    async fn count(&self) -> AppResult<i64>;

    async fn count_by_status(&self, status: BookInstanceStatus) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookInstancesStore for BookInstancesRepository {
    async fn list(&self) -> AppResult<Vec<BookInstance>> {
        let instances =
            sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances ORDER BY imprint, id")
                .fetch_all(&self.pool)
                .await?;

        Ok(instances)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book copy not found".to_string()))
    }

    async fn list_by_book(&self, book: Uuid) -> AppResult<Vec<BookInstance>> {
        let instances = sqlx::query_as::<_, BookInstance>(
            "SELECT * FROM book_instances WHERE book = $1 ORDER BY imprint, id",
        )
        .bind(book)
        .fetch_all(&self.pool)
        .await?;

        Ok(instances)
    }

    async fn create(&self, instance: &BookInstance) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book, imprint, status, due_back)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(instance.id)
        .bind(instance.book)
        .bind(&instance.imprint)
        .bind(instance.status)
        .bind(instance.due_back)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, instance: &BookInstance) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances SET
                book = $1,
                imprint = $2,
                status = $3,
                due_back = $4
            WHERE id = $5
            "#,
        )
        .bind(instance.book)
        .bind(&instance.imprint)
        .bind(instance.status)
        .bind(instance.due_back)
        .bind(instance.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book copy not found".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book copy not found".to_string()));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_status(&self, status: BookInstanceStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
