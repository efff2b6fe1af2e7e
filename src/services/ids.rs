use rusqlite::Connection;

use crate::models::ServiceKind;

const MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("could not allocate a unique id for {0} after {MAX_ATTEMPTS} attempts")]
    Exhausted(&'static str),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Allocates the human-readable `<prefix><NN>` ids carried by services.
/// Injected so tests can substitute a deterministic allocator.
pub trait SequenceAllocator: Send + Sync {
    fn next_id(&self, conn: &Connection, kind: ServiceKind) -> Result<String, IdError>;
}

/// Scans the live table for the numerically highest suffix and probes
/// upward from there. The numeric max (rather than lexicographic last)
/// keeps the sequence correct past 99.
pub struct SqliteSequenceAllocator;

impl SequenceAllocator for SqliteSequenceAllocator {
    fn next_id(&self, conn: &Connection, kind: ServiceKind) -> Result<String, IdError> {
        let prefix = kind.id_prefix();
        let mut next = highest_suffix(conn, kind)? + 1;

        for _ in 0..MAX_ATTEMPTS {
            let candidate = format!("{prefix}{next:02}");
            if !id_exists(conn, kind, &candidate)? {
                return Ok(candidate);
            }
            next += 1;
        }

        Err(IdError::Exhausted(kind.table()))
    }
}

fn highest_suffix(conn: &Connection, kind: ServiceKind) -> Result<u64, rusqlite::Error> {
    let sql = format!("SELECT id FROM {} WHERE id LIKE ?1", kind.table());
    let mut stmt = conn.prepare(&sql)?;
    let pattern = format!("{}%", kind.id_prefix());
    let rows = stmt.query_map([pattern], |row| row.get::<_, String>(0))?;

    let mut max = 0u64;
    for row in rows {
        let id = row?;
        if let Some(n) = id
            .strip_prefix(kind.id_prefix())
            .and_then(|suffix| suffix.parse::<u64>().ok())
        {
            max = max.max(n);
        }
    }
    Ok(max)
}

fn id_exists(conn: &Connection, kind: ServiceKind, id: &str) -> Result<bool, rusqlite::Error> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?1", kind.table());
    let count: i64 = conn.query_row(&sql, [id], |row| row.get(0))?;
    Ok(count > 0)
}
