pub mod admin;
pub mod bookings;
pub mod catalog;
pub mod health;
pub mod providers;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/become-provider", post(providers::apply))
        .route("/api/service-provider-applications", post(providers::apply))
        .route("/api/provider/login", post(providers::login))
        .route(
            "/api/provider/:provider_id/bookings",
            get(providers::list_bookings),
        )
        .route(
            "/api/provider/:provider_id/send-otp-password-change",
            post(providers::send_otp),
        )
        .route(
            "/api/provider/:provider_id/verify-otp-and-change-password",
            put(providers::verify_otp),
        )
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/providers", get(admin::list_providers))
        .route(
            "/api/admin/providers/:id/approve",
            post(admin::approve_provider),
        )
        .route(
            "/api/admin/providers/:id/reject",
            post(admin::reject_provider),
        )
        .route(
            "/api/admin/:admin_id/send-otp-password-change",
            post(admin::send_otp),
        )
        .route(
            "/api/admin/:admin_id/verify-otp-and-change-password",
            put(admin::verify_otp),
        )
        .route(
            "/api/bookings/accommodation",
            post(bookings::create_accommodation_booking),
        )
        .route(
            "/api/bookings/transportation",
            post(bookings::create_transportation_booking),
        )
        .route(
            "/api/bookings/sport-adventure",
            post(bookings::create_sport_adventure_booking),
        )
        .route("/api/bookings/:id/status", put(bookings::update_status))
        .route(
            "/api/accommodation-bookings/:id/status",
            put(bookings::update_status),
        )
        .route("/api/:kind", get(catalog::list_public))
        .route("/api/:kind/:service_id", get(catalog::get_public))
        .route(
            "/api/provider/:provider_id/:kind",
            get(catalog::list_for_provider).post(catalog::create_service),
        )
        .route(
            "/api/provider/:provider_id/:kind/:service_id",
            put(catalog::update_service).delete(catalog::delete_service),
        )
        .with_state(state)
}
