use chrono::Utc;
use rusqlite::{params, Connection};

use crate::db::{fmt_dt, parse_dt};
use crate::models::Admin;

pub fn get_admin(conn: &Connection, id: &str) -> anyhow::Result<Option<Admin>> {
    let result = conn.query_row(
        "SELECT id, email, password_hash, created_at FROM admins WHERE id = ?1",
        params![id],
        |row| Ok(parse_admin_row(row)),
    );

    match result {
        Ok(admin) => Ok(Some(admin?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_admin_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<Admin>> {
    let result = conn.query_row(
        "SELECT id, email, password_hash, created_at FROM admins WHERE email = ?1",
        params![email],
        |row| Ok(parse_admin_row(row)),
    );

    match result {
        Ok(admin) => Ok(Some(admin?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Insert the bootstrap admin if no account with this email exists yet.
pub fn ensure_admin(conn: &Connection, email: &str, password_hash: &str) -> anyhow::Result<()> {
    let now = Utc::now().naive_utc();
    conn.execute(
        "INSERT INTO admins (id, email, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(email) DO NOTHING",
        params![
            uuid::Uuid::new_v4().to_string(),
            email,
            password_hash,
            fmt_dt(&now),
        ],
    )?;
    Ok(())
}

fn parse_admin_row(row: &rusqlite::Row) -> anyhow::Result<Admin> {
    let created_at_str: String = row.get(3)?;
    Ok(Admin {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_dt(&created_at_str),
    })
}
