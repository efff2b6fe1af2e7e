use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::service::ServiceKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Approved => "Approved",
            BookingStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Approved" => BookingStatus::Approved,
            "Rejected" => BookingStatus::Rejected,
            _ => BookingStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccommodationBooking {
    pub id: String,
    pub accommodation_id: String,
    pub room_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_guests: i64,
    pub total_price: f64,
    pub status: BookingStatus,
    pub approved_at: Option<NaiveDateTime>,
    pub rejected_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportationBooking {
    pub id: String,
    pub transportation_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub travel_date: NaiveDate,
    pub seats: i64,
    pub total_price: f64,
    pub status: BookingStatus,
    pub approved_at: Option<NaiveDateTime>,
    pub rejected_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportAdventureBooking {
    pub id: String,
    pub sport_adventure_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub activity_date: NaiveDate,
    pub participants: i64,
    pub total_price: f64,
    pub status: BookingStatus,
    pub approved_at: Option<NaiveDateTime>,
    pub rejected_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A booking from any of the three collections. A booking id resolves to
/// at most one variant; lookups scan the tables in a fixed order.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Booking {
    Accommodation(AccommodationBooking),
    Transportation(TransportationBooking),
    SportAdventure(SportAdventureBooking),
}

impl Booking {
    pub fn kind(&self) -> ServiceKind {
        match self {
            Booking::Accommodation(_) => ServiceKind::Accommodation,
            Booking::Transportation(_) => ServiceKind::Transportation,
            Booking::SportAdventure(_) => ServiceKind::SportAdventure,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Booking::Accommodation(b) => &b.id,
            Booking::Transportation(b) => &b.id,
            Booking::SportAdventure(b) => &b.id,
        }
    }

    /// Id of the booked service, whichever variant it is.
    pub fn service_id(&self) -> &str {
        match self {
            Booking::Accommodation(b) => &b.accommodation_id,
            Booking::Transportation(b) => &b.transportation_id,
            Booking::SportAdventure(b) => &b.sport_adventure_id,
        }
    }

    pub fn guest_name(&self) -> &str {
        match self {
            Booking::Accommodation(b) => &b.guest_name,
            Booking::Transportation(b) => &b.guest_name,
            Booking::SportAdventure(b) => &b.guest_name,
        }
    }

    pub fn guest_email(&self) -> &str {
        match self {
            Booking::Accommodation(b) => &b.guest_email,
            Booking::Transportation(b) => &b.guest_email,
            Booking::SportAdventure(b) => &b.guest_email,
        }
    }

    pub fn status(&self) -> BookingStatus {
        match self {
            Booking::Accommodation(b) => b.status,
            Booking::Transportation(b) => b.status,
            Booking::SportAdventure(b) => b.status,
        }
    }

    pub fn total_price(&self) -> f64 {
        match self {
            Booking::Accommodation(b) => b.total_price,
            Booking::Transportation(b) => b.total_price,
            Booking::SportAdventure(b) => b.total_price,
        }
    }
}
