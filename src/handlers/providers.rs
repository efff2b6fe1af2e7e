use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::db::{bookings, providers};
use crate::errors::ApiError;
use crate::models::{Booking, Provider, ProviderStatus, ServiceKind};
use crate::services::notify;
use crate::services::otp::{self, OtpParty};
use crate::state::AppState;

// POST /api/become-provider (also /api/service-provider-applications)
//
// Multipart: profile fields plus a `document` file and an optional
// `image`. Files hit disk before validation, so every failure path has
// to sweep them back out.
pub async fn apply(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Provider>), ApiError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut document_file: Option<String> = None;
    let mut image_file: Option<String> = None;
    let mut saved_files: Vec<String> = vec![];

    let result = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "document" | "image" => {
                    let original = field.file_name().unwrap_or("upload").to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::Validation(e.to_string()))?;
                    if bytes.is_empty() {
                        continue;
                    }
                    let filename =
                        crate::services::uploads::store(&state.config.upload_dir, &original, &bytes)
                            .await?;
                    saved_files.push(filename.clone());
                    if name == "document" {
                        document_file = Some(filename);
                    } else {
                        image_file = Some(filename);
                    }
                }
                _ => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::Validation(e.to_string()))?;
                    fields.insert(name, value);
                }
            }
        }

        register_provider(&state, fields, document_file.take(), image_file.take())
    }
    .await;

    match result {
        Ok(provider) => Ok((StatusCode::CREATED, Json(provider))),
        Err(e) => {
            crate::services::uploads::remove_all(&state.config.upload_dir, &saved_files).await;
            Err(e)
        }
    }
}

fn register_provider(
    state: &Arc<AppState>,
    fields: HashMap<String, String>,
    document_file: Option<String>,
    image_file: Option<String>,
) -> Result<Provider, ApiError> {
    let required = |key: &str| -> Result<String, ApiError> {
        fields
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Validation(format!("{key} is required")))
    };

    let business_name = required("business_name")?;
    let contact_name = required("contact_name")?;
    let email = required("email")?;
    let phone = required("phone")?;
    let service_type_raw = required("service_type")?;

    if !email.contains('@') {
        return Err(ApiError::Validation("email is not valid".to_string()));
    }
    let service_type = ServiceKind::parse(&service_type_raw).ok_or_else(|| {
        ApiError::Validation(format!("unknown service type {service_type_raw}"))
    })?;

    let now = Utc::now().naive_utc();
    let provider = Provider {
        id: uuid::Uuid::new_v4().to_string(),
        business_name,
        contact_name,
        email,
        phone,
        service_type,
        address: fields.get("address").cloned().filter(|v| !v.is_empty()),
        description: fields.get("description").cloned().filter(|v| !v.is_empty()),
        document_file,
        image_file,
        status: ProviderStatus::Pending,
        payment_status: "Unpaid".to_string(),
        password_hash: None,
        created_at: now,
        updated_at: now,
    };

    let db = state.db.lock().unwrap();
    if let Some(field) = providers::find_duplicate_field(
        &db,
        &provider.email,
        &provider.business_name,
        &provider.phone,
    )? {
        return Err(ApiError::Conflict(format!(
            "a provider with this {field} already exists"
        )));
    }
    providers::create_provider(&db, &provider)?;

    tracing::info!(provider = %provider.id, business = %provider.business_name, "provider application received");
    Ok(provider)
}

// POST /api/provider/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let provider = {
        let db = state.db.lock().unwrap();
        providers::get_provider_by_email(&db, &body.email)?
    }
    .ok_or(ApiError::Auth)?;

    let stored = provider.password_hash.as_deref().ok_or(ApiError::Auth)?;
    if !state.credentials.verify(&body.password, stored)? {
        return Err(ApiError::Auth);
    }

    Ok(Json(serde_json::json!({
        "id": provider.id,
        "business_name": provider.business_name,
        "email": provider.email,
        "service_type": provider.service_type,
        "status": provider.status,
        "payment_status": provider.payment_status,
    })))
}

// GET /api/provider/:provider_id/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let bookings = {
        let db = state.db.lock().unwrap();
        let provider = providers::get_provider(&db, &provider_id)?
            .ok_or_else(|| ApiError::NotFound(format!("provider {provider_id}")))?;
        if provider.status != ProviderStatus::Approved {
            return Err(ApiError::Forbidden(
                "provider account is not approved".to_string(),
            ));
        }
        bookings::list_bookings_for_provider(&db, &provider_id)?
    };
    Ok(Json(bookings))
}

// POST /api/provider/:provider_id/send-otp-password-change
#[derive(Deserialize)]
pub struct SendOtpRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn send_otp(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    Json(body): Json<SendOtpRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (email, code) = {
        let db = state.db.lock().unwrap();
        let provider = providers::get_provider(&db, &provider_id)?
            .ok_or_else(|| ApiError::NotFound(format!("provider {provider_id}")))?;
        let code = otp::begin_password_change(
            &db,
            state.credentials.as_ref(),
            OtpParty::Provider,
            &provider_id,
            provider.password_hash.as_deref(),
            &body.current_password,
            &body.new_password,
        )?;
        (provider.email, code)
    };

    notify::password_change_code(&state, &email, &code);
    Ok(Json(serde_json::json!({"ok": true})))
}

// PUT /api/provider/:provider_id/verify-otp-and-change-password
#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub otp: String,
    pub new_password: String,
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    {
        let db = state.db.lock().unwrap();
        if providers::get_provider(&db, &provider_id)?.is_none() {
            return Err(ApiError::NotFound(format!("provider {provider_id}")));
        }
        otp::complete_password_change(
            &db,
            state.credentials.as_ref(),
            OtpParty::Provider,
            &provider_id,
            &body.otp,
            &body.new_password,
        )?;
    }
    Ok(Json(serde_json::json!({"ok": true})))
}
