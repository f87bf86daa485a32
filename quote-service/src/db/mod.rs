use crate::deadline::Deadline;
use crate::error::StoreError;
use crate::models::RateRecord;
use chrono::Local;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Append-only log of bid rates backed by one SQLite pool.
#[derive(Clone)]
pub struct QuoteStore {
    pool: SqlitePool,
    budget: Duration,
}

impl QuoteStore {
    /// Opens (creating if needed) the database file and makes sure the table exists.
    pub async fn open(
        path: impl AsRef<Path>,
        max_connections: u32,
        budget: Duration,
    ) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(StoreError::Unavailable)?;

        let store = Self { pool, budget };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dollar_exchange_rates (
                id INTEGER NOT NULL PRIMARY KEY,
                date DATETIME NOT NULL,
                dollar_exchange_rate REAL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::Unavailable)?;

        info!("Database initialized successfully");
        Ok(())
    }

    /// Appends one rate row.
    ///
    /// Only `BEGIN` and the `INSERT` run under the store deadline. If it expires there,
    /// or before the commit is issued, the transaction is rolled back and `Timeout` is
    /// returned. Once the commit has been issued it runs to completion and the save
    /// reports success, even if the deadline passes while the commit is in flight.
    pub async fn save(&self, parent: &Deadline, rate: f64) -> Result<RateRecord, StoreError> {
        let deadline = parent.child(self.budget);
        let bound = deadline.remaining().unwrap_or(self.budget);

        let (tx, record) = match deadline.run(self.stage(rate)).await {
            Ok(staged) => staged?,
            Err(_) => return Err(StoreError::Timeout(bound)),
        };

        if deadline.is_expired() {
            if let Err(e) = tx.rollback().await {
                warn!("Failed to roll back expired write: {}", e);
            }
            return Err(StoreError::Timeout(bound));
        }

        tx.commit().await?;
        debug!("Stored rate {} as record {}", rate, record.id);
        Ok(record)
    }

    async fn stage(
        &self,
        rate: f64,
    ) -> Result<(Transaction<'static, Sqlite>, RateRecord), StoreError> {
        let mut tx = self.pool.begin().await?;
        let now = Local::now().naive_local();

        let result = sqlx::query(
            r#"
            INSERT INTO dollar_exchange_rates (date, dollar_exchange_rate)
            VALUES (?, ?)
            "#,
        )
        .bind(now)
        .bind(rate)
        .execute(&mut tx)
        .await?;

        let record = RateRecord {
            id: result.last_insert_rowid(),
            date: now,
            dollar_exchange_rate: rate,
        };
        Ok((tx, record))
    }

    /// All persisted rows in identity order.
    pub async fn records(&self) -> Result<Vec<RateRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, date, dollar_exchange_rate
            FROM dollar_exchange_rates
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<RateRecord, StoreError> {
                Ok(RateRecord {
                    id: row.try_get("id")?,
                    date: row.try_get("date")?,
                    dollar_exchange_rate: row.try_get("dollar_exchange_rate")?,
                })
            })
            .collect()
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM dollar_exchange_rates")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
