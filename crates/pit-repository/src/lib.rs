pub mod db;
pub mod loader;
pub mod repository;

pub use db::MacroDb;
pub use loader::PointInTimeLoader;
pub use repository::{Repository, SqliteRepository};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::sync::Arc;

    async fn seed(db: &MacroDb) {
        sqlx::query(
            "INSERT INTO macro_observations (series_id, observation_date, value, release_time, revision_number, source)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind("BR_IPCA_YOY")
        .bind("2026-02-20")
        .bind(5.2)
        .bind(Utc::now().to_rfc3339())
        .bind(0)
        .bind("ibge")
        .execute(db.pool())
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO macro_observations (series_id, observation_date, value, release_time, revision_number, source)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind("BR_IPCA_YOY")
        .bind("2026-02-21")
        .bind(5.3)
        .bind(Utc::now().to_rfc3339())
        .bind(0)
        .bind("ibge")
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn lookback_zero_returns_only_as_of_date_row() {
        let db = MacroDb::new("sqlite::memory:").await.unwrap();
        seed(&db).await;
        let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::new(db));
        let loader = PointInTimeLoader::new(repo);

        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let series = loader.get_macro_series("BR_IPCA_YOY", as_of, 0).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(&as_of).copied().flatten(), Some(5.3));
    }

    #[tokio::test]
    async fn replaying_same_as_of_date_is_bit_identical() {
        let db = MacroDb::new("sqlite::memory:").await.unwrap();
        seed(&db).await;
        let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::new(db));
        let loader = PointInTimeLoader::new(repo);

        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let first = loader.get_macro_series("BR_IPCA_YOY", as_of, 10).await.unwrap();
        let second = loader.get_macro_series("BR_IPCA_YOY", as_of, 10).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_series_returns_empty_not_error() {
        let db = MacroDb::new("sqlite::memory:").await.unwrap();
        let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::new(db));
        let loader = PointInTimeLoader::new(repo);

        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let series = loader.get_macro_series("NONEXISTENT", as_of, 30).await.unwrap();
        assert!(series.is_empty());
    }
}
