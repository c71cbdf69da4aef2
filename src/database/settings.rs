use crate::database::postgres_repository::PostgresRepository;
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::models::settings::{BOT_ENABLED_KEY, parse_flag};
use chrono::Utc;

#[async_trait::async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn put_setting(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// The bot answers tickets unless someone switched it off.
    async fn is_bot_enabled(&self) -> Result<bool, AppError> {
        let value = self.get_setting(BOT_ENABLED_KEY).await?;
        Ok(value.as_deref().and_then(parse_flag).unwrap_or(true))
    }

    async fn set_bot_enabled(&self, enabled: bool) -> Result<(), AppError> {
        self.put_setting(BOT_ENABLED_KEY, if enabled { "true" } else { "false" }).await
    }
}

#[async_trait::async_trait]
impl SettingsRepository for PostgresRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, AppError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, AppError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
