//! Database Connection and Setup
//!
//! Opens the SQLite database and runs idempotent migrations.

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

/// Shared connection handle used by the gateway
pub type SharedConnection = Arc<Mutex<Connection>>;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("failed to open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("migration failed: {0}")]
    Migration(#[from] rusqlite::Error),
}

/// Open (or create) the database at `path`
pub fn init_db(path: &Path) -> Result<SharedConnection, RepoError> {
    let conn = Connection::open(path).map_err(|source| RepoError::Open {
        path: path.display().to_string(),
        source,
    })?;
    run_migrations(&conn)?;
    log::info!("Database ready at {}", path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

/// Fresh in-memory database, used by tests
pub fn init_memory_db() -> Result<SharedConnection, RepoError> {
    let conn = Connection::open_in_memory().map_err(|source| RepoError::Open {
        path: ":memory:".to_string(),
        source,
    })?;
    run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            card_type TEXT NOT NULL DEFAULT 'text',
            color TEXT NOT NULL DEFAULT 'blue',
            size TEXT NOT NULL DEFAULT '1x1',
            user_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Ordering column added after the first release
    if !column_exists(conn, "cards", "position")? {
        conn.execute("ALTER TABLE cards ADD COLUMN position INTEGER NOT NULL DEFAULT 0", [])?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_cards_user_position ON cards(user_id, position)",
        [],
    )?;
    Ok(())
}
