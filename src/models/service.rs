use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The three bookable service categories. Carries the per-category id
/// prefix and table mapping so type dispatch happens in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Accommodation,
    Transportation,
    SportAdventure,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Accommodation => "accommodation",
            ServiceKind::Transportation => "transportation",
            ServiceKind::SportAdventure => "sport-adventure",
        }
    }

    /// Accepts both the singular form stored on providers and the plural
    /// path segments used in routes.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accommodation" | "accommodations" => Some(ServiceKind::Accommodation),
            "transportation" | "transportations" => Some(ServiceKind::Transportation),
            "sport-adventure" | "sports-adventures" => Some(ServiceKind::SportAdventure),
            _ => None,
        }
    }

    pub fn id_prefix(&self) -> &'static str {
        match self {
            ServiceKind::Accommodation => "ACC",
            ServiceKind::Transportation => "TRN",
            ServiceKind::SportAdventure => "SPT",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ServiceKind::Accommodation => "accommodations",
            ServiceKind::Transportation => "transportations",
            ServiceKind::SportAdventure => "sport_adventures",
        }
    }

    pub fn booking_table(&self) -> &'static str {
        match self {
            ServiceKind::Accommodation => "accommodation_bookings",
            ServiceKind::Transportation => "transportation_bookings",
            ServiceKind::SportAdventure => "sport_adventure_bookings",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accommodation {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub description: Option<String>,
    pub amenities: Option<String>,
    pub image_file: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub accommodation_id: String,
    pub room_type: String,
    pub capacity: i64,
    pub price_per_night: f64,
    pub image_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transportation {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    pub vehicle_type: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: Option<String>,
    pub seats: i64,
    pub price: f64,
    pub image_file: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportAdventure {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    pub activity: String,
    pub location: String,
    pub difficulty: Option<String>,
    pub duration_hours: Option<f64>,
    pub price: f64,
    pub image_file: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
