use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::db::{admins, providers};
use crate::errors::ApiError;
use crate::models::{Provider, ProviderStatus};
use crate::services::approval;
use crate::services::notify;
use crate::services::otp::{self, OtpParty};
use crate::state::AppState;

// POST /api/admin/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let admin = {
        let db = state.db.lock().unwrap();
        admins::get_admin_by_email(&db, &body.email)?
    }
    .ok_or(ApiError::Auth)?;

    if !state.credentials.verify(&body.password, &admin.password_hash)? {
        return Err(ApiError::Auth);
    }

    Ok(Json(serde_json::json!({
        "id": admin.id,
        "email": admin.email,
    })))
}

// GET /api/admin/providers?status=Pending
#[derive(Deserialize)]
pub struct ProvidersQuery {
    pub status: Option<String>,
}

pub async fn list_providers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProvidersQuery>,
) -> Result<Json<Vec<Provider>>, ApiError> {
    let list = {
        let db = state.db.lock().unwrap();
        providers::list_providers(&db, query.status.as_deref())?
    };
    Ok(Json(list))
}

// POST /api/admin/providers/:id/approve
pub async fn approve_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Provider>, ApiError> {
    let decision = {
        let db = state.db.lock().unwrap();
        approval::decide_application(
            &db,
            state.credentials.as_ref(),
            &id,
            ProviderStatus::Approved,
        )?
    };

    if let Some(credential) = &decision.credential {
        notify::application_approved(&state, &decision.provider, credential);
    }
    Ok(Json(decision.provider))
}

// POST /api/admin/providers/:id/reject
pub async fn reject_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Provider>, ApiError> {
    let decision = {
        let db = state.db.lock().unwrap();
        approval::decide_application(
            &db,
            state.credentials.as_ref(),
            &id,
            ProviderStatus::Rejected,
        )?
    };

    notify::application_rejected(&state, &decision.provider);
    Ok(Json(decision.provider))
}

// POST /api/admin/:admin_id/send-otp-password-change
#[derive(Deserialize)]
pub struct SendOtpRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn send_otp(
    State(state): State<Arc<AppState>>,
    Path(admin_id): Path<String>,
    Json(body): Json<SendOtpRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (email, code) = {
        let db = state.db.lock().unwrap();
        let admin = admins::get_admin(&db, &admin_id)?
            .ok_or_else(|| ApiError::NotFound(format!("admin {admin_id}")))?;
        let code = otp::begin_password_change(
            &db,
            state.credentials.as_ref(),
            OtpParty::Admin,
            &admin_id,
            Some(&admin.password_hash),
            &body.current_password,
            &body.new_password,
        )?;
        (admin.email, code)
    };

    notify::password_change_code(&state, &email, &code);
    Ok(Json(serde_json::json!({"ok": true})))
}

// PUT /api/admin/:admin_id/verify-otp-and-change-password
#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub otp: String,
    pub new_password: String,
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Path(admin_id): Path<String>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    {
        let db = state.db.lock().unwrap();
        if admins::get_admin(&db, &admin_id)?.is_none() {
            return Err(ApiError::NotFound(format!("admin {admin_id}")));
        }
        otp::complete_password_change(
            &db,
            state.credentials.as_ref(),
            OtpParty::Admin,
            &admin_id,
            &body.otp,
            &body.new_password,
        )?;
    }
    Ok(Json(serde_json::json!({"ok": true})))
}
