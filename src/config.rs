use std::env;

/// How status updates on already-decided bookings are handled. A
/// deployment choice rather than a hard rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalPolicy {
    /// Any transition attempt from Approved/Rejected is a 409.
    Forbid,
    /// Repeating the identical decision is a 200 no-op; a conflicting
    /// decision is still a 409.
    Idempotent,
}

impl TerminalPolicy {
    pub fn parse(s: &str) -> Self {
        match s {
            "idempotent" => TerminalPolicy::Idempotent,
            _ => TerminalPolicy::Forbid,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub upload_dir: String,
    pub status_policy: TerminalPolicy,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "wayfare.db".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            status_policy: TerminalPolicy::parse(
                &env::var("STATUS_POLICY").unwrap_or_default(),
            ),
            mail_api_url: env::var("MAIL_API_URL").unwrap_or_default(),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@wayfare.example".to_string()),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@wayfare.example".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "changeme".to_string()),
        }
    }
}
