use crate::error::BackendError;
use crate::relational::{LogRow, RelationalBackend, Session};
use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Transaction;
use std::str::FromStr;

/// Table written by [`SqliteBackend`].
pub const LOGS_TABLE: &str = "logs";

const CREATE_LOGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    id          TEXT         PRIMARY KEY NOT NULL,
    level       VARCHAR(10)  NOT NULL,
    timestamp   TEXT         NOT NULL,
    message     VARCHAR(255) NOT NULL,
    name        VARCHAR(255) NOT NULL,
    module      VARCHAR(255) NOT NULL,
    function    VARCHAR(255) NOT NULL,
    lineno      INTEGER      NOT NULL,
    inserted_at TEXT         NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now'))
)
"#;

const CREATE_LEVEL_INDEX: &str = "CREATE INDEX IF NOT EXISTS ix_logs_level ON logs (level)";
const CREATE_MODULE_INDEX: &str = "CREATE INDEX IF NOT EXISTS ix_logs_module ON logs (module)";

const INSERT_LOG: &str = r#"
INSERT INTO logs (id, level, timestamp, message, name, module, function, lineno)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// [`RelationalBackend`] over a `sqlx` SQLite pool.
///
/// Each session is a pool transaction. `inserted_at` is filled in by the
/// database.
#[derive(Clone, Debug)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Connect using a URL such as `sqlite://logs.db` or `sqlite::memory:`.
    /// Database files are created when missing.
    pub async fn connect(url: &str) -> Result<Self, BackendError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(SqliteBackend { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        SqliteBackend { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the `logs` table and its indexes if they do not exist yet.
    pub async fn create_schema(&self) -> Result<(), BackendError> {
        for statement in [CREATE_LOGS_TABLE, CREATE_LEVEL_INDEX, CREATE_MODULE_INDEX] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RelationalBackend for SqliteBackend {
    async fn open_session(&self) -> Result<Box<dyn Session>, BackendError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteSession { tx: Some(tx) }))
    }
}

struct SqliteSession {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteSession {
    fn active(&mut self) -> Result<&mut Transaction<'static, Sqlite>, BackendError> {
        self.tx.as_mut().ok_or_else(|| "session already finished".into())
    }
}

#[async_trait]
impl Session for SqliteSession {
    async fn add(&mut self, row: &LogRow) -> Result<(), BackendError> {
        let tx = self.active()?;
        sqlx::query(INSERT_LOG)
            .bind(row.id.to_string())
            .bind(&row.level)
            .bind(row.timestamp)
            .bind(&row.message)
            .bind(&row.name)
            .bind(&row.module)
            .bind(&row.function)
            .bind(row.lineno)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), BackendError> {
        let tx = self.tx.take().ok_or("session already finished")?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), BackendError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        // An unfinished transaction rolls back when dropped; the connection
        // goes back to the pool either way.
        self.tx.take();
        Ok(())
    }
}
