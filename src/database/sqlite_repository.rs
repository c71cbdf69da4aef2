use sqlx::SqlitePool;

/// Local file (or in-memory) backend; queries use `?` placeholders.
#[derive(Clone)]
pub struct SqliteRepository {
    pub pool: SqlitePool,
}
