pub mod admin;
pub mod booking;
pub mod provider;
pub mod service;

pub use admin::Admin;
pub use booking::{
    AccommodationBooking, Booking, BookingStatus, SportAdventureBooking, TransportationBooking,
};
pub use provider::{Provider, ProviderStatus};
pub use service::{Accommodation, Room, ServiceKind, SportAdventure, Transportation};
