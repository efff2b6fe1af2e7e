use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::Connection;

use crate::db::providers;
use crate::errors::ApiError;
use crate::models::{Provider, ProviderStatus};
use crate::services::credentials::CredentialVerifier;

const CREDENTIAL_LEN: usize = 12;

pub struct ApplicationDecision {
    pub provider: Provider,
    /// Plaintext credential to mail to the provider; only set on approval.
    pub credential: Option<String>,
}

/// Approve or reject a pending provider application. Approval mints a
/// login credential and stores its hash; rejection clears any stored
/// credential. Applications that already left Pending stay where they are.
pub fn decide_application(
    conn: &Connection,
    credentials: &dyn CredentialVerifier,
    provider_id: &str,
    decision: ProviderStatus,
) -> Result<ApplicationDecision, ApiError> {
    if decision == ProviderStatus::Pending {
        return Err(ApiError::Validation(
            "decision must be Approved or Rejected".to_string(),
        ));
    }

    let provider = providers::get_provider(conn, provider_id)?
        .ok_or_else(|| ApiError::NotFound(format!("provider {provider_id}")))?;

    if provider.status != ProviderStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "application already {}",
            provider.status.as_str()
        )));
    }

    let now = Utc::now().naive_utc();
    let credential = match decision {
        ProviderStatus::Approved => {
            let plain = generate_credential();
            let hash = credentials.hash(&plain)?;
            providers::set_status_and_credential(
                conn,
                provider_id,
                ProviderStatus::Approved,
                Some(&hash),
                &now,
            )?;
            Some(plain)
        }
        ProviderStatus::Rejected => {
            providers::set_status_and_credential(
                conn,
                provider_id,
                ProviderStatus::Rejected,
                None,
                &now,
            )?;
            None
        }
        ProviderStatus::Pending => unreachable!(),
    };

    tracing::info!(
        provider = provider_id,
        decision = decision.as_str(),
        "provider application decided"
    );

    let provider = providers::get_provider(conn, provider_id)?
        .ok_or_else(|| ApiError::NotFound(format!("provider {provider_id}")))?;

    Ok(ApplicationDecision {
        provider,
        credential,
    })
}

fn generate_credential() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CREDENTIAL_LEN)
        .map(char::from)
        .collect()
}
