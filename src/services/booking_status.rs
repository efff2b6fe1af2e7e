use chrono::Utc;
use rusqlite::Connection;

use crate::config::TerminalPolicy;
use crate::db::{bookings, catalog, providers};
use crate::errors::ApiError;
use crate::models::{Booking, BookingStatus, ProviderStatus};

/// Apply a provider's decision to a pending booking.
///
/// The booking id is resolved across the three booking collections. The
/// acting provider must be approved and must own the booked service. On
/// success the status and its timestamp are written in one statement, so
/// approved_at/rejected_at can never both be set. Notification dispatch
/// is the caller's concern and never feeds back into the transition.
pub fn decide_booking(
    conn: &Connection,
    policy: TerminalPolicy,
    booking_id: &str,
    new_status: BookingStatus,
    acting_provider_id: &str,
) -> Result<Booking, ApiError> {
    if !new_status.is_terminal() {
        return Err(ApiError::Validation(
            "status must be Approved or Rejected".to_string(),
        ));
    }

    let booking = bookings::find_booking(conn, booking_id)?
        .ok_or_else(|| ApiError::NotFound(format!("booking {booking_id}")))?;

    let provider = providers::get_provider(conn, acting_provider_id)?
        .ok_or_else(|| ApiError::NotFound(format!("provider {acting_provider_id}")))?;
    if provider.status != ProviderStatus::Approved {
        return Err(ApiError::Forbidden(
            "provider account is not approved".to_string(),
        ));
    }

    let owner = catalog::service_provider_id(conn, booking.kind(), booking.service_id())?
        .ok_or_else(|| ApiError::NotFound(format!("service {}", booking.service_id())))?;
    if owner != provider.id {
        return Err(ApiError::Forbidden(
            "booking belongs to another provider's service".to_string(),
        ));
    }

    if booking.status().is_terminal() {
        return match policy {
            TerminalPolicy::Idempotent if booking.status() == new_status => Ok(booking),
            _ => Err(ApiError::Conflict(format!(
                "booking already {}",
                booking.status().as_str()
            ))),
        };
    }

    let now = Utc::now().naive_utc();
    bookings::apply_decision(conn, booking.kind(), booking_id, new_status, &now)?;

    tracing::info!(
        booking = booking_id,
        provider = acting_provider_id,
        status = new_status.as_str(),
        "booking decided"
    );

    bookings::find_booking(conn, booking_id)?
        .ok_or_else(|| ApiError::NotFound(format!("booking {booking_id}")))
}
