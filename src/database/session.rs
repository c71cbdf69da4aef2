use crate::database::postgres_repository::PostgresRepository;
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::models::session::SessionData;
use chrono::Utc;

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` for unknown or expired tokens; a stored payload that no longer
    /// decodes is reported as `AppError::SessionDecode`.
    async fn get_session(&self, token: &str) -> Result<Option<SessionData>, AppError>;
    async fn set_session(&self, token: &str, data: &SessionData, ttl_secs: i64) -> Result<(), AppError>;
    async fn destroy_session(&self, token: &str) -> Result<(), AppError>;
    async fn purge_expired_sessions(&self) -> Result<u64, AppError>;
}

fn decode_session(raw: &str) -> Result<SessionData, AppError> {
    serde_json::from_str(raw).map_err(AppError::session_decode)
}

fn encode_session(data: &SessionData) -> Result<String, AppError> {
    serde_json::to_string(data).map_err(AppError::session_decode)
}

fn expires_at(ttl_secs: i64) -> i64 {
    Utc::now().timestamp().saturating_add(ttl_secs.max(0))
}

#[async_trait::async_trait]
impl SessionStore for PostgresRepository {
    async fn get_session(&self, token: &str) -> Result<Option<SessionData>, AppError> {
        let raw = sqlx::query_scalar::<_, String>("SELECT sess FROM sessions WHERE sid = $1 AND expires > $2")
            .bind(token)
            .bind(Utc::now().timestamp())
            .fetch_optional(&self.pool)
            .await?;

        raw.as_deref().map(decode_session).transpose()
    }

    async fn set_session(&self, token: &str, data: &SessionData, ttl_secs: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (sid, sess, expires)
            VALUES ($1, $2, $3)
            ON CONFLICT (sid) DO UPDATE SET sess = EXCLUDED.sess, expires = EXCLUDED.expires
            "#,
        )
        .bind(token)
        .bind(encode_session(data)?)
        .bind(expires_at(ttl_secs))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn destroy_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE sid = $1").bind(token).execute(&self.pool).await?;

        Ok(())
    }

    async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires <= $1")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl SessionStore for SqliteRepository {
    async fn get_session(&self, token: &str) -> Result<Option<SessionData>, AppError> {
        let raw = sqlx::query_scalar::<_, String>("SELECT sess FROM sessions WHERE sid = ? AND expires > ?")
            .bind(token)
            .bind(Utc::now().timestamp())
            .fetch_optional(&self.pool)
            .await?;

        raw.as_deref().map(decode_session).transpose()
    }

    async fn set_session(&self, token: &str, data: &SessionData, ttl_secs: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (sid, sess, expires)
            VALUES (?, ?, ?)
            ON CONFLICT (sid) DO UPDATE SET sess = excluded.sess, expires = excluded.expires
            "#,
        )
        .bind(token)
        .bind(encode_session(data)?)
        .bind(expires_at(ttl_secs))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn destroy_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE sid = ?").bind(token).execute(&self.pool).await?;

        Ok(())
    }

    async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{postgres_repository, sqlite_repository};
    use std::time::Duration;

    const USER: SessionData = SessionData { user_id: 7 };

    #[tokio::test]
    async fn test_session_is_readable_after_set() {
        let repo = sqlite_repository().await;
        repo.set_session("token-a", &USER, 60).await.unwrap();

        assert_eq!(repo.get_session("token-a").await.unwrap(), Some(USER));
        assert_eq!(repo.get_session("token-b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_session() {
        let repo = sqlite_repository().await;
        repo.set_session("token-a", &USER, 60).await.unwrap();
        repo.set_session("token-a", &SessionData { user_id: 8 }, 60).await.unwrap();

        assert_eq!(repo.get_session("token-a").await.unwrap(), Some(SessionData { user_id: 8 }));
    }

    #[tokio::test]
    async fn test_zero_ttl_session_is_never_visible() {
        let repo = sqlite_repository().await;
        repo.set_session("token-a", &USER, 0).await.unwrap();

        assert_eq!(repo.get_session("token-a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_expires_without_destroy() {
        let repo = sqlite_repository().await;
        repo.set_session("token-a", &USER, 1).await.unwrap();
        assert!(repo.get_session("token-a").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(repo.get_session("token-a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_destroy_removes_session_and_ignores_unknown_tokens() {
        let repo = sqlite_repository().await;
        repo.set_session("token-a", &USER, 60).await.unwrap();

        repo.destroy_session("token-a").await.unwrap();
        repo.destroy_session("never-issued").await.unwrap();

        assert_eq!(repo.get_session("token-a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_a_decode_error() {
        let repo = sqlite_repository().await;
        sqlx::query("INSERT INTO sessions (sid, sess, expires) VALUES (?, ?, ?)")
            .bind("token-a")
            .bind(r#"{"passport":{"user":"x"}}"#)
            .bind(Utc::now().timestamp() + 60)
            .execute(&repo.pool)
            .await
            .unwrap();

        let result = repo.get_session("token-a").await;
        assert!(matches!(result, Err(AppError::SessionDecode { .. })));
    }

    #[tokio::test]
    async fn test_purge_deletes_only_expired_rows() {
        let repo = sqlite_repository().await;
        repo.set_session("expired", &USER, 0).await.unwrap();
        repo.set_session("live", &USER, 60).await.unwrap();

        assert_eq!(repo.purge_expired_sessions().await.unwrap(), 1);
        assert_eq!(repo.get_session("live").await.unwrap(), Some(USER));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_postgres_session_round_trip() {
        let repo = postgres_repository().await;
        let token = uuid::Uuid::new_v4().to_string();

        repo.set_session(&token, &USER, 60).await.unwrap();
        assert_eq!(repo.get_session(&token).await.unwrap(), Some(USER));

        repo.destroy_session(&token).await.unwrap();
        assert_eq!(repo.get_session(&token).await.unwrap(), None);
    }
}
