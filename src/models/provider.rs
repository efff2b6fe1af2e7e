use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::service::ServiceKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub business_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub service_type: ServiceKind,
    pub address: Option<String>,
    pub description: Option<String>,
    pub document_file: Option<String>,
    pub image_file: Option<String>,
    pub status: ProviderStatus,
    pub payment_status: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProviderStatus {
    Pending,
    Approved,
    Rejected,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStatus::Pending => "Pending",
            ProviderStatus::Approved => "Approved",
            ProviderStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Approved" => ProviderStatus::Approved,
            "Rejected" => ProviderStatus::Rejected,
            _ => ProviderStatus::Pending,
        }
    }
}
