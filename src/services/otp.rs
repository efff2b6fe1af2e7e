use chrono::{Duration, Utc};
use rand::Rng;
use rusqlite::Connection;

use crate::db::providers::{commit_password, get_otp, store_otp};
use crate::errors::ApiError;
use crate::services::credentials::CredentialVerifier;

pub const OTP_TTL_MINUTES: i64 = 10;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Which account table an OTP flow is operating on. The two flows are
/// otherwise identical.
#[derive(Debug, Clone, Copy)]
pub enum OtpParty {
    Admin,
    Provider,
}

impl OtpParty {
    pub fn table(&self) -> &'static str {
        match self {
            OtpParty::Admin => "admins",
            OtpParty::Provider => "providers",
        }
    }
}

/// Phase one: verify the current credential, stage the new password, and
/// persist a short-lived numeric code. Returns the code for delivery.
pub fn begin_password_change(
    conn: &Connection,
    credentials: &dyn CredentialVerifier,
    party: OtpParty,
    account_id: &str,
    stored_hash: Option<&str>,
    current_password: &str,
    new_password: &str,
) -> Result<String, ApiError> {
    if new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::PasswordPolicy(MIN_PASSWORD_LEN));
    }

    let stored = stored_hash.ok_or(ApiError::Auth)?;
    if !credentials.verify(current_password, stored)? {
        return Err(ApiError::Auth);
    }

    let code = generate_code();
    let expires_at = Utc::now().naive_utc() + Duration::minutes(OTP_TTL_MINUTES);
    let pending_hash = credentials.hash(new_password)?;

    if !store_otp(conn, party.table(), account_id, &code, &expires_at, &pending_hash)? {
        return Err(ApiError::NotFound("account".to_string()));
    }

    tracing::info!(account = account_id, table = party.table(), "issued password-change code");
    Ok(code)
}

/// Phase two: check code and expiry, re-verify the submitted new password
/// against the staged hash (a mismatch means the request was tampered
/// with), then commit. The code is single-use: commit clears it.
pub fn complete_password_change(
    conn: &Connection,
    credentials: &dyn CredentialVerifier,
    party: OtpParty,
    account_id: &str,
    code: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let state = get_otp(conn, party.table(), account_id)?.ok_or(ApiError::InvalidOtp)?;

    if state.code != code {
        return Err(ApiError::InvalidOtp);
    }
    if Utc::now().naive_utc() > state.expires_at {
        return Err(ApiError::ExpiredOtp);
    }
    if !credentials.verify(new_password, &state.pending_password_hash)? {
        return Err(ApiError::Validation(
            "new password does not match the one this code was issued for".to_string(),
        ));
    }

    commit_password(conn, party.table(), account_id, &state.pending_password_hash)?;
    tracing::info!(account = account_id, table = party.table(), "password changed");
    Ok(())
}

fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
