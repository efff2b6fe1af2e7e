use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::db::{bookings, catalog};
use crate::errors::ApiError;
use crate::models::{
    AccommodationBooking, Booking, BookingStatus, SportAdventureBooking, TransportationBooking,
};
use crate::services::{booking_status, notify};
use crate::state::AppState;

fn validate_guest(name: &str, email: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("guest_name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("guest_email is not valid".to_string()));
    }
    Ok(())
}

// POST /api/bookings/accommodation
#[derive(Deserialize)]
pub struct AccommodationBookingRequest {
    pub accommodation_id: String,
    pub room_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_guests: i64,
    pub total_price: f64,
}

pub async fn create_accommodation_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AccommodationBookingRequest>,
) -> Result<(StatusCode, Json<AccommodationBooking>), ApiError> {
    validate_guest(&body.guest_name, &body.guest_email)?;
    if body.check_in >= body.check_out {
        return Err(ApiError::Validation(
            "check_out must be after check_in".to_string(),
        ));
    }
    if body.total_guests < 1 {
        return Err(ApiError::Validation(
            "total_guests must be at least 1".to_string(),
        ));
    }
    if body.total_price < 0.0 {
        return Err(ApiError::Validation(
            "total_price must not be negative".to_string(),
        ));
    }

    let booking = {
        let db = state.db.lock().unwrap();

        if catalog::get_accommodation(&db, &body.accommodation_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "accommodation {}",
                body.accommodation_id
            )));
        }
        let room = catalog::get_room(&db, &body.room_id)?
            .ok_or_else(|| ApiError::NotFound(format!("room {}", body.room_id)))?;
        if room.accommodation_id != body.accommodation_id {
            return Err(ApiError::Validation(
                "room does not belong to this accommodation".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        let booking = AccommodationBooking {
            id: uuid::Uuid::new_v4().to_string(),
            accommodation_id: body.accommodation_id,
            room_id: body.room_id,
            guest_name: body.guest_name,
            guest_email: body.guest_email,
            check_in: body.check_in,
            check_out: body.check_out,
            total_guests: body.total_guests,
            total_price: body.total_price,
            status: BookingStatus::Pending,
            approved_at: None,
            rejected_at: None,
            created_at: now,
            updated_at: now,
        };
        bookings::create_accommodation_booking(&db, &booking)?;
        booking
    };

    tracing::info!(booking = %booking.id, accommodation = %booking.accommodation_id, "booking created");
    Ok((StatusCode::CREATED, Json(booking)))
}

// POST /api/bookings/transportation
#[derive(Deserialize)]
pub struct TransportationBookingRequest {
    pub transportation_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub travel_date: NaiveDate,
    pub seats: i64,
    pub total_price: f64,
}

pub async fn create_transportation_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TransportationBookingRequest>,
) -> Result<(StatusCode, Json<TransportationBooking>), ApiError> {
    validate_guest(&body.guest_name, &body.guest_email)?;
    if body.seats < 1 {
        return Err(ApiError::Validation("seats must be at least 1".to_string()));
    }
    if body.total_price < 0.0 {
        return Err(ApiError::Validation(
            "total_price must not be negative".to_string(),
        ));
    }

    let booking = {
        let db = state.db.lock().unwrap();

        if catalog::get_transportation(&db, &body.transportation_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "transportation {}",
                body.transportation_id
            )));
        }

        let now = Utc::now().naive_utc();
        let booking = TransportationBooking {
            id: uuid::Uuid::new_v4().to_string(),
            transportation_id: body.transportation_id,
            guest_name: body.guest_name,
            guest_email: body.guest_email,
            travel_date: body.travel_date,
            seats: body.seats,
            total_price: body.total_price,
            status: BookingStatus::Pending,
            approved_at: None,
            rejected_at: None,
            created_at: now,
            updated_at: now,
        };
        bookings::create_transportation_booking(&db, &booking)?;
        booking
    };

    tracing::info!(booking = %booking.id, transportation = %booking.transportation_id, "booking created");
    Ok((StatusCode::CREATED, Json(booking)))
}

// POST /api/bookings/sport-adventure
#[derive(Deserialize)]
pub struct SportAdventureBookingRequest {
    pub sport_adventure_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub activity_date: NaiveDate,
    pub participants: i64,
    pub total_price: f64,
}

pub async fn create_sport_adventure_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SportAdventureBookingRequest>,
) -> Result<(StatusCode, Json<SportAdventureBooking>), ApiError> {
    validate_guest(&body.guest_name, &body.guest_email)?;
    if body.participants < 1 {
        return Err(ApiError::Validation(
            "participants must be at least 1".to_string(),
        ));
    }
    if body.total_price < 0.0 {
        return Err(ApiError::Validation(
            "total_price must not be negative".to_string(),
        ));
    }

    let booking = {
        let db = state.db.lock().unwrap();

        if catalog::get_sport_adventure(&db, &body.sport_adventure_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "sport adventure {}",
                body.sport_adventure_id
            )));
        }

        let now = Utc::now().naive_utc();
        let booking = SportAdventureBooking {
            id: uuid::Uuid::new_v4().to_string(),
            sport_adventure_id: body.sport_adventure_id,
            guest_name: body.guest_name,
            guest_email: body.guest_email,
            activity_date: body.activity_date,
            participants: body.participants,
            total_price: body.total_price,
            status: BookingStatus::Pending,
            approved_at: None,
            rejected_at: None,
            created_at: now,
            updated_at: now,
        };
        bookings::create_sport_adventure_booking(&db, &booking)?;
        booking
    };

    tracing::info!(booking = %booking.id, sport_adventure = %booking.sport_adventure_id, "booking created");
    Ok((StatusCode::CREATED, Json(booking)))
}

// PUT /api/bookings/:id/status (also /api/accommodation-bookings/:id/status)
#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
    pub provider_id: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<Booking>, ApiError> {
    let new_status = match body.status.as_str() {
        "Approved" => BookingStatus::Approved,
        "Rejected" => BookingStatus::Rejected,
        other => {
            return Err(ApiError::Validation(format!(
                "status must be Approved or Rejected, got {other}"
            )))
        }
    };

    let (booking, service_name) = {
        let db = state.db.lock().unwrap();
        let booking = booking_status::decide_booking(
            &db,
            state.config.status_policy,
            &id,
            new_status,
            &body.provider_id,
        )?;
        let service_name = catalog::service_name(&db, booking.kind(), booking.service_id())?
            .unwrap_or_else(|| "your booking".to_string());
        (booking, service_name)
    };

    notify::booking_decision(&state, &booking, &service_name);
    Ok(Json(booking))
}
