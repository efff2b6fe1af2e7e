use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::db::{fmt_dt, parse_dt};
use crate::models::{Provider, ProviderStatus, ServiceKind};

const PROVIDER_COLUMNS: &str = "id, business_name, contact_name, email, phone, service_type, \
     address, description, document_file, image_file, status, payment_status, password_hash, \
     created_at, updated_at";

pub fn create_provider(conn: &Connection, provider: &Provider) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO providers (id, business_name, contact_name, email, phone, service_type,
             address, description, document_file, image_file, status, payment_status,
             password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            provider.id,
            provider.business_name,
            provider.contact_name,
            provider.email,
            provider.phone,
            provider.service_type.as_str(),
            provider.address,
            provider.description,
            provider.document_file,
            provider.image_file,
            provider.status.as_str(),
            provider.payment_status,
            provider.password_hash,
            fmt_dt(&provider.created_at),
            fmt_dt(&provider.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_provider(conn: &Connection, id: &str) -> anyhow::Result<Option<Provider>> {
    let sql = format!("SELECT {PROVIDER_COLUMNS} FROM providers WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_provider_row(row)));

    match result {
        Ok(provider) => Ok(Some(provider?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_provider_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<Provider>> {
    let sql = format!("SELECT {PROVIDER_COLUMNS} FROM providers WHERE email = ?1");
    let result = conn.query_row(&sql, params![email], |row| Ok(parse_provider_row(row)));

    match result {
        Ok(provider) => Ok(Some(provider?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_providers(
    conn: &Connection,
    status: Option<&str>,
) -> anyhow::Result<Vec<Provider>> {
    let (sql, bind): (String, Vec<String>) = match status {
        Some(s) => (
            format!(
                "SELECT {PROVIDER_COLUMNS} FROM providers WHERE status = ?1 ORDER BY created_at DESC"
            ),
            vec![s.to_string()],
        ),
        None => (
            format!("SELECT {PROVIDER_COLUMNS} FROM providers ORDER BY created_at DESC"),
            vec![],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
        bind.iter().map(|s| s as &dyn rusqlite::types::ToSql).collect();
    let rows = stmt.query_map(bind_refs.as_slice(), |row| Ok(parse_provider_row(row)))?;

    let mut providers = vec![];
    for row in rows {
        providers.push(row??);
    }
    Ok(providers)
}

/// Which registration field, if any, collides with an existing provider.
pub fn find_duplicate_field(
    conn: &Connection,
    email: &str,
    business_name: &str,
    phone: &str,
) -> anyhow::Result<Option<&'static str>> {
    let hit = |sql: &str, value: &str| -> anyhow::Result<bool> {
        let count: i64 = conn.query_row(sql, params![value], |row| row.get(0))?;
        Ok(count > 0)
    };

    if hit("SELECT COUNT(*) FROM providers WHERE email = ?1", email)? {
        return Ok(Some("email"));
    }
    if hit(
        "SELECT COUNT(*) FROM providers WHERE business_name = ?1",
        business_name,
    )? {
        return Ok(Some("business name"));
    }
    if hit("SELECT COUNT(*) FROM providers WHERE phone = ?1", phone)? {
        return Ok(Some("phone"));
    }
    Ok(None)
}

/// Transition a provider's status, setting or clearing the stored
/// credential hash in the same statement.
pub fn set_status_and_credential(
    conn: &Connection,
    id: &str,
    status: ProviderStatus,
    password_hash: Option<&str>,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE providers SET status = ?1, password_hash = ?2, updated_at = ?3 WHERE id = ?4",
        params![status.as_str(), password_hash, fmt_dt(now), id],
    )?;
    Ok(count > 0)
}

pub fn set_payment_status(
    conn: &Connection,
    id: &str,
    payment_status: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE providers SET payment_status = ?1, updated_at = ?2 WHERE id = ?3",
        params![payment_status, fmt_dt(now), id],
    )?;
    Ok(count > 0)
}

// ── OTP state (shared shape with admins, parameterized by table) ──

pub struct OtpState {
    pub code: String,
    pub expires_at: NaiveDateTime,
    pub pending_password_hash: String,
}

pub fn store_otp(
    conn: &Connection,
    table: &'static str,
    account_id: &str,
    code: &str,
    expires_at: &NaiveDateTime,
    pending_password_hash: &str,
) -> anyhow::Result<bool> {
    let sql = format!(
        "UPDATE {table} SET otp_code = ?1, otp_expires_at = ?2, pending_password_hash = ?3
         WHERE id = ?4"
    );
    let count = conn.execute(
        &sql,
        params![code, fmt_dt(expires_at), pending_password_hash, account_id],
    )?;
    Ok(count > 0)
}

pub fn get_otp(
    conn: &Connection,
    table: &'static str,
    account_id: &str,
) -> anyhow::Result<Option<OtpState>> {
    let sql = format!(
        "SELECT otp_code, otp_expires_at, pending_password_hash FROM {table} WHERE id = ?1"
    );
    let result = conn.query_row(&sql, params![account_id], |row| {
        let code: Option<String> = row.get(0)?;
        let expires_at: Option<String> = row.get(1)?;
        let pending: Option<String> = row.get(2)?;
        Ok((code, expires_at, pending))
    });

    match result {
        Ok((Some(code), Some(expires_at), Some(pending_password_hash))) => Ok(Some(OtpState {
            code,
            expires_at: parse_dt(&expires_at),
            pending_password_hash,
        })),
        Ok(_) => Ok(None),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Commit the pending password and clear all OTP state in one statement.
pub fn commit_password(
    conn: &Connection,
    table: &'static str,
    account_id: &str,
    password_hash: &str,
) -> anyhow::Result<bool> {
    let sql = format!(
        "UPDATE {table} SET password_hash = ?1, otp_code = NULL, otp_expires_at = NULL,
             pending_password_hash = NULL
         WHERE id = ?2"
    );
    let count = conn.execute(&sql, params![password_hash, account_id])?;
    Ok(count > 0)
}

fn parse_provider_row(row: &rusqlite::Row) -> anyhow::Result<Provider> {
    let service_type_str: String = row.get(5)?;
    let status_str: String = row.get(10)?;
    let created_at_str: String = row.get(13)?;
    let updated_at_str: String = row.get(14)?;

    Ok(Provider {
        id: row.get(0)?,
        business_name: row.get(1)?,
        contact_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        service_type: ServiceKind::parse(&service_type_str)
            .unwrap_or(ServiceKind::Accommodation),
        address: row.get(6)?,
        description: row.get(7)?,
        document_file: row.get(8)?,
        image_file: row.get(9)?,
        status: ProviderStatus::parse(&status_str),
        payment_status: row.get(11)?,
        password_hash: row.get(12)?,
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}
