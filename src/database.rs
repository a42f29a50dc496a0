#[cfg(feature = "database")]
use async_trait::async_trait;
#[cfg(feature = "database")]
use chrono::SecondsFormat;
#[cfg(feature = "database")]
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Row, SqlitePool};
#[cfg(feature = "database")]
use tracing::info;

#[cfg(feature = "database")]
use crate::persistence::{PersistenceError, PersistenceResult, StateRepository, WorkflowSnapshot};

#[cfg(feature = "database")]
/// Snapshot repository backed by SQLite. Every commit appends a row.
pub struct SqliteStateRepository {
    pool: SqlitePool,
}

#[cfg(feature = "database")]
impl SqliteStateRepository {
    /// Open the database, creating it when missing
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        auto_migrate: bool,
    ) -> PersistenceResult<Self> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| PersistenceError::Database(e.into()))?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Drop snapshots older than `days_to_keep`, always keeping the newest
    pub async fn cleanup_old_snapshots(&self, days_to_keep: i64) -> PersistenceResult<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM workflow_snapshots
            WHERE saved_at < datetime('now', '-' || ?1 || ' days')
            AND id != (SELECT MAX(id) FROM workflow_snapshots)
            "#,
        )
        .bind(days_to_keep)
        .execute(&self.pool)
        .await?;

        info!("Cleaned up {} old workflow snapshots", deleted.rows_affected());
        Ok(deleted.rows_affected())
    }

    /// Close database connections gracefully
    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
    }
}

#[cfg(feature = "database")]
#[async_trait]
impl StateRepository for SqliteStateRepository {
    async fn load(&self) -> PersistenceResult<Option<WorkflowSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT body FROM workflow_snapshots
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let body: String = row.get("body");
        let snapshot: WorkflowSnapshot = serde_json::from_str(&body)?;
        snapshot.verify()?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &WorkflowSnapshot) -> PersistenceResult<()> {
        let body = serde_json::to_string(snapshot)?;
        sqlx::query(
            r#"
            INSERT INTO workflow_snapshots (format_version, saved_at, body)
            VALUES (?1, datetime(?2), ?3)
            "#,
        )
        .bind(snapshot.format_version as i64)
        .bind(snapshot.saved_at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .bind(body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(all(test, feature = "database"))]
mod tests {
    use super::*;
    use crate::items::NewLostItem;
    use crate::workflows::WorkflowState;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_latest_snapshot_wins() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("lostfound.db").display());
        let repo = SqliteStateRepository::connect(&url, 1, true).await.unwrap();
        assert!(repo.load().await.unwrap().is_none());

        let mut state = WorkflowState::default();
        state.items.report_lost(NewLostItem::titled("Keys"), Utc::now()).unwrap();
        repo.save(&WorkflowSnapshot::new(state.clone(), Utc::now())).await.unwrap();
        state.items.report_lost(NewLostItem::titled("Wallet"), Utc::now()).unwrap();
        let latest = WorkflowSnapshot::new(state, Utc::now());
        repo.save(&latest).await.unwrap();

        let loaded = repo.load().await.unwrap().unwrap();
        assert_eq!(loaded.state, latest.state);
        assert_eq!(repo.cleanup_old_snapshots(30).await.unwrap(), 0);
    }
}
