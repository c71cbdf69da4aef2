use crate::config::DatabaseConfig;
use crate::database::Store;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::sqlite_repository::SqliteRepository;
use rocket::fairing::AdHoc;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub fn is_sqlite_url(url: &str) -> bool {
    url.starts_with("sqlite:")
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

pub async fn connect_postgres(db_config: &DatabaseConfig) -> Result<PostgresRepository, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout))
        .idle_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&db_config.url)
        .await?;

    if db_config.run_migrations {
        sqlx::migrate!("./migrations/postgres")
            .run(&pool)
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
    }

    Ok(PostgresRepository { pool })
}

pub async fn connect_sqlite(db_config: &DatabaseConfig) -> Result<SqliteRepository, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&db_config.url)?.create_if_missing(true);

    let pool = if is_memory_url(&db_config.url) {
        // Every connection to an in-memory database sees its own empty database,
        // so the pool holds exactly one that never gets recycled.
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        if let Some(parent) = options.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        SqlitePoolOptions::new()
            .max_connections(db_config.max_connections)
            .min_connections(db_config.min_connections)
            .acquire_timeout(Duration::from_secs(db_config.acquire_timeout))
            .connect_with(options)
            .await?
    };

    if db_config.run_migrations {
        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
    }

    Ok(SqliteRepository { pool })
}

/// Picks the backend from the URL scheme.
pub async fn connect_store(db_config: &DatabaseConfig) -> Result<Store, sqlx::Error> {
    if is_sqlite_url(&db_config.url) {
        Ok(Arc::new(connect_sqlite(db_config).await?))
    } else {
        Ok(Arc::new(connect_postgres(db_config).await?))
    }
}

pub fn stage_db(db_config: DatabaseConfig) -> AdHoc {
    AdHoc::try_on_ignite("Database (sqlx)", |rocket| async move {
        let backend = if is_sqlite_url(&db_config.url) { "sqlite" } else { "postgres" };

        match connect_store(&db_config).await {
            Ok(store) => {
                tracing::info!(backend, "Database pool initialized successfully");
                Ok(rocket.manage(store))
            }
            Err(e) => {
                tracing::error!(backend, "Failed to initialize database pool: {}", e);
                Err(rocket)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ticket::TicketRepository;

    #[test]
    fn test_backend_is_chosen_by_scheme() {
        assert!(is_sqlite_url("sqlite://data/team-dashboard.db"));
        assert!(is_sqlite_url("sqlite::memory:"));
        assert!(!is_sqlite_url("postgres://dashboard@localhost/dashboard"));
    }

    #[test]
    fn test_memory_urls_are_detected() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://file:shared?mode=memory&cache=shared"));
        assert!(!is_memory_url("sqlite://data/team-dashboard.db"));
    }

    #[tokio::test]
    async fn test_connect_store_runs_migrations() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        let store = connect_store(&config).await.unwrap();

        assert!(store.list_tickets(10).await.unwrap().is_empty());
    }
}
