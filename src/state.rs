use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::credentials::CredentialVerifier;
use crate::services::ids::SequenceAllocator;
use crate::services::mailer::Mailer;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub mailer: Box<dyn Mailer>,
    pub credentials: Box<dyn CredentialVerifier>,
    pub ids: Box<dyn SequenceAllocator>,
}
