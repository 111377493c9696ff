use macro_core::{MacroError, MacroResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Thin wrapper around a SQLite connection pool, grounded on the same
/// connect-and-migrate-on-open pattern used for the rest of the platform's
/// SQLite-backed services.
#[derive(Clone)]
pub struct MacroDb {
    pool: SqlitePool,
}

impl MacroDb {
    pub async fn new(database_url: &str) -> MacroResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> MacroResult<()> {
        let schema = include_str!("../../../schema.sql");
        for statement in schema.split(';') {
            let stmt = statement.trim();
            if stmt.is_empty() {
                continue;
            }
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_in_memory_and_creates_schema() {
        let db = MacroDb::new("sqlite::memory:").await.unwrap();
        assert!(db.pool().acquire().await.is_ok());
    }
}
