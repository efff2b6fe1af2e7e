use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rusqlite::Connection;

use crate::db::providers;
use crate::errors::ApiError;
use crate::models::{Provider, ProviderStatus, ServiceKind};
use crate::services::catalog::{self, ServicePayload, ServiceRecord};
use crate::services::uploads;
use crate::state::AppState;

fn parse_kind(segment: &str) -> Result<ServiceKind, ApiError> {
    ServiceKind::parse(segment)
        .ok_or_else(|| ApiError::NotFound(format!("no such collection {segment}")))
}

/// Catalog CRUD is open only to approved providers working in their own
/// service category.
fn authorize_provider(
    conn: &Connection,
    provider_id: &str,
    kind: ServiceKind,
) -> Result<Provider, ApiError> {
    let provider = providers::get_provider(conn, provider_id)?
        .ok_or_else(|| ApiError::NotFound(format!("provider {provider_id}")))?;
    if provider.status != ProviderStatus::Approved {
        return Err(ApiError::Forbidden(
            "provider account is not approved".to_string(),
        ));
    }
    if provider.service_type != kind {
        return Err(ApiError::Forbidden(
            "provider is not registered for this service type".to_string(),
        ));
    }
    Ok(provider)
}

// GET /api/:kind
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<ServiceRecord>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let records = {
        let db = state.db.lock().unwrap();
        catalog::list_services(&db, kind, None)?
    };
    Ok(Json(records))
}

// GET /api/:kind/:service_id
pub async fn get_public(
    State(state): State<Arc<AppState>>,
    Path((kind, service_id)): Path<(String, String)>,
) -> Result<Json<ServiceRecord>, ApiError> {
    let kind = parse_kind(&kind)?;
    let record = {
        let db = state.db.lock().unwrap();
        catalog::get_service(&db, kind, &service_id)?
    }
    .ok_or_else(|| ApiError::NotFound(format!("{} {service_id}", kind.as_str())))?;
    Ok(Json(record))
}

// GET /api/provider/:provider_id/:kind
pub async fn list_for_provider(
    State(state): State<Arc<AppState>>,
    Path((provider_id, kind)): Path<(String, String)>,
) -> Result<Json<Vec<ServiceRecord>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let records = {
        let db = state.db.lock().unwrap();
        authorize_provider(&db, &provider_id, kind)?;
        catalog::list_services(&db, kind, Some(&provider_id))?
    };
    Ok(Json(records))
}

// POST /api/provider/:provider_id/:kind
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Path((provider_id, kind)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<ServiceRecord>), ApiError> {
    let kind = parse_kind(&kind)?;
    let payload = ServicePayload::parse(kind, body)?;

    let record = {
        let mut db = state.db.lock().unwrap();
        authorize_provider(&db, &provider_id, kind)?;
        catalog::create_service(&mut db, state.ids.as_ref(), &provider_id, payload)?
    };

    tracing::info!(service = record.id(), provider = %provider_id, "service created");
    Ok((StatusCode::CREATED, Json(record)))
}

// PUT /api/provider/:provider_id/:kind/:service_id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path((provider_id, kind, service_id)): Path<(String, String, String)>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ServiceRecord>, ApiError> {
    let kind = parse_kind(&kind)?;
    let payload = ServicePayload::parse(kind, body)?;

    let (record, orphans) = {
        let mut db = state.db.lock().unwrap();
        authorize_provider(&db, &provider_id, kind)?;
        catalog::update_service(&mut db, &provider_id, &service_id, payload)?
    };

    uploads::remove_all(&state.config.upload_dir, &orphans).await;
    Ok(Json(record))
}

// DELETE /api/provider/:provider_id/:kind/:service_id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path((provider_id, kind, service_id)): Path<(String, String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let kind = parse_kind(&kind)?;

    let orphans = {
        let mut db = state.db.lock().unwrap();
        authorize_provider(&db, &provider_id, kind)?;
        catalog::delete_service(&mut db, &provider_id, kind, &service_id)?
    };

    uploads::remove_all(&state.config.upload_dir, &orphans).await;
    tracing::info!(service = %service_id, provider = %provider_id, "service deleted");
    Ok(Json(serde_json::json!({"ok": true})))
}
