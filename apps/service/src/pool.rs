use std::time::Duration;

use deadpool::managed::{self, Pool, RecycleResult};
use libsql::{Connection, Database, Error as LibsqlError};

/// SQLite's primary result code for a locked database
const SQLITE_BUSY: i32 = 5;

pub struct LibsqlManager {
    database: Database,
    /// How long a statement waits on a locked database before failing
    busy_timeout: Duration,
}

impl LibsqlManager {
    pub fn new(database: Database, busy_timeout: Duration) -> Self {
        Self { database, busy_timeout }
    }
}

/// Whether `err` means the database stayed locked for the whole busy timeout
pub fn is_busy(err: &LibsqlError) -> bool {
    match err {
        // Extended codes keep the primary code in the low byte
        LibsqlError::SqliteFailure(code, _) => *code & 0xff == SQLITE_BUSY,
        other => other.to_string().contains("database is locked"),
    }
}

impl managed::Manager for LibsqlManager {
    type Type = Connection;
    type Error = LibsqlError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        let conn = self.database.connect()?;
        // PRAGMA answers with a row, so it has to go through `query`
        conn.query(&format!("PRAGMA busy_timeout = {}", self.busy_timeout.as_millis()), ())
            .await?;
        Ok(conn)
    }

    async fn recycle(
        &self,
        conn: &mut Self::Type,
        _: &managed::Metrics,
    ) -> RecycleResult<Self::Error> {
        conn.query("SELECT 1", ())
            .await?
            .next()
            .await?
            .ok_or(LibsqlError::QueryReturnedNoRows)?;
        Ok(())
    }
}

pub type LibsqlPool = Pool<LibsqlManager>;
