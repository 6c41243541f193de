use std::str::FromStr;

use reflex_core::GlobalStats;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use thiserror::Error;

use crate::stats::{summarize, Summary};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Participants and their reaction times in SQLite
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // every in-memory connection would be a separate database
        let max_connections = if database_url.starts_with("sqlite::memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// Registers a participant; returns `false` when it already existed.
    pub async fn add_user(&self, user_id: &str) -> Result<bool> {
        let done = sqlx::query("INSERT OR IGNORE INTO users (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn add_result(&self, user_id: &str, time_ms: i64) -> Result<()> {
        sqlx::query("INSERT INTO results (user_id, time) VALUES (?, ?)")
            .bind(user_id)
            .bind(time_ms)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<Summary> {
        let times: Vec<i64> = sqlx::query_scalar("SELECT time FROM results WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        let times: Vec<f64> = times.into_iter().map(|t| t as f64).collect();
        Ok(summarize(&times))
    }

    /// Mean time of every participant with at least one result.
    pub async fn user_means(&self) -> Result<Vec<f64>> {
        let means: Vec<f64> =
            sqlx::query_scalar("SELECT AVG(time) FROM results GROUP BY user_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(means)
    }

    /// Population statistics over per-participant means, so a participant
    /// with many trials weighs the same as one with a single trial.
    pub async fn global_stats(&self) -> Result<GlobalStats> {
        let means = self.user_means().await?;
        let summary = summarize(&means);
        Ok(GlobalStats {
            mean: summary.mean,
            stdev: Some(summary.stdev),
            count: summary.count,
            total_users: summary.count,
        })
    }
}

#[cfg(test)]
#[path = "tests/storage_tests.rs"]
mod tests;
