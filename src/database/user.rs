use crate::database::postgres_repository::PostgresRepository;
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::models::user::{ExternalProfile, User};
use chrono::Utc;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user on first login and refreshes email, name and avatar afterwards.
    async fn get_or_create_user(&self, profile: &ExternalProfile) -> Result<User, AppError>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
}

#[async_trait::async_trait]
impl UserRepository for PostgresRepository {
    async fn get_or_create_user(&self, profile: &ExternalProfile) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (external_id, email, name, avatar_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (external_id) DO UPDATE
            SET email = EXCLUDED.email, name = EXCLUDED.name, avatar_url = EXCLUDED.avatar_url
            RETURNING id, external_id, email, name, avatar_url, created_at
            "#,
        )
        .bind(&profile.external_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.avatar_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, email, name, avatar_url, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, email, name, avatar_url, created_at
            FROM users
            ORDER BY COALESCE(name, email), id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn get_or_create_user(&self, profile: &ExternalProfile) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (external_id, email, name, avatar_url, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (external_id) DO UPDATE
            SET email = excluded.email, name = excluded.name, avatar_url = excluded.avatar_url
            RETURNING id, external_id, email, name, avatar_url, created_at
            "#,
        )
        .bind(&profile.external_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.avatar_url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, email, name, avatar_url, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, email, name, avatar_url, created_at
            FROM users
            ORDER BY COALESCE(name, email), id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
