use std::collections::HashSet;

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::catalog as q;
use crate::errors::ApiError;
use crate::models::{Accommodation, Room, ServiceKind, SportAdventure, Transportation};
use crate::services::ids::{IdError, SequenceAllocator};

// ── Payloads ──

#[derive(Debug, Deserialize)]
pub struct RoomInput {
    pub id: Option<String>,
    pub room_type: String,
    pub capacity: i64,
    pub price_per_night: f64,
    #[serde(default)]
    pub image_file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccommodationInput {
    pub name: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
    #[serde(default)]
    pub rooms: Vec<RoomInput>,
}

#[derive(Debug, Deserialize)]
pub struct TransportationInput {
    pub name: String,
    pub vehicle_type: String,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub departure_time: Option<String>,
    pub seats: i64,
    pub price: f64,
    #[serde(default)]
    pub image_file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SportAdventureInput {
    pub name: String,
    pub activity: String,
    pub location: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub duration_hours: Option<f64>,
    pub price: f64,
    #[serde(default)]
    pub image_file: Option<String>,
}

/// A request body interpreted according to the service kind in the URL.
/// Parsing is the single place where kind meets shape.
pub enum ServicePayload {
    Accommodation(AccommodationInput),
    Transportation(TransportationInput),
    SportAdventure(SportAdventureInput),
}

impl ServicePayload {
    pub fn parse(kind: ServiceKind, value: serde_json::Value) -> Result<Self, ApiError> {
        let invalid = |e: serde_json::Error| ApiError::Validation(e.to_string());
        match kind {
            ServiceKind::Accommodation => serde_json::from_value(value)
                .map(ServicePayload::Accommodation)
                .map_err(invalid),
            ServiceKind::Transportation => serde_json::from_value(value)
                .map(ServicePayload::Transportation)
                .map_err(invalid),
            ServiceKind::SportAdventure => serde_json::from_value(value)
                .map(ServicePayload::SportAdventure)
                .map_err(invalid),
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        let bad = |msg: &str| Err(ApiError::Validation(msg.to_string()));
        match self {
            ServicePayload::Accommodation(input) => {
                if input.name.trim().is_empty()
                    || input.address.trim().is_empty()
                    || input.city.trim().is_empty()
                {
                    return bad("name, address and city are required");
                }
                for room in &input.rooms {
                    if room.room_type.trim().is_empty() {
                        return bad("room_type is required");
                    }
                    if room.capacity < 1 {
                        return bad("room capacity must be at least 1");
                    }
                    if room.price_per_night < 0.0 {
                        return bad("price_per_night must not be negative");
                    }
                }
            }
            ServicePayload::Transportation(input) => {
                if input.name.trim().is_empty()
                    || input.vehicle_type.trim().is_empty()
                    || input.origin.trim().is_empty()
                    || input.destination.trim().is_empty()
                {
                    return bad("name, vehicle_type, origin and destination are required");
                }
                if input.seats < 1 {
                    return bad("seats must be at least 1");
                }
                if input.price < 0.0 {
                    return bad("price must not be negative");
                }
            }
            ServicePayload::SportAdventure(input) => {
                if input.name.trim().is_empty()
                    || input.activity.trim().is_empty()
                    || input.location.trim().is_empty()
                {
                    return bad("name, activity and location are required");
                }
                if input.price < 0.0 {
                    return bad("price must not be negative");
                }
                if input.duration_hours.is_some_and(|h| h <= 0.0) {
                    return bad("duration_hours must be positive");
                }
            }
        }
        Ok(())
    }
}

// ── Views ──

#[derive(Debug, Serialize)]
pub struct AccommodationView {
    #[serde(flatten)]
    pub accommodation: Accommodation,
    pub rooms: Vec<Room>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ServiceRecord {
    Accommodation(AccommodationView),
    Transportation(Transportation),
    SportAdventure(SportAdventure),
}

impl ServiceRecord {
    pub fn id(&self) -> &str {
        match self {
            ServiceRecord::Accommodation(v) => &v.accommodation.id,
            ServiceRecord::Transportation(t) => &t.id,
            ServiceRecord::SportAdventure(s) => &s.id,
        }
    }
}

// ── Operations ──

pub fn create_service(
    conn: &mut Connection,
    ids: &dyn SequenceAllocator,
    provider_id: &str,
    payload: ServicePayload,
) -> Result<ServiceRecord, ApiError> {
    payload.validate()?;
    let now = Utc::now().naive_utc();

    match payload {
        ServicePayload::Accommodation(input) => {
            let id = ids
                .next_id(conn, ServiceKind::Accommodation)
                .map_err(map_id_error)?;
            let acc = Accommodation {
                id: id.clone(),
                provider_id: provider_id.to_string(),
                name: input.name,
                address: input.address,
                city: input.city,
                description: input.description,
                amenities: input.amenities,
                image_file: input.image_file,
                created_at: now,
                updated_at: now,
            };

            let tx = conn.transaction()?;
            q::create_accommodation(&tx, &acc)?;
            let mut rooms = vec![];
            for room_input in input.rooms {
                let room = Room {
                    id: uuid::Uuid::new_v4().to_string(),
                    accommodation_id: id.clone(),
                    room_type: room_input.room_type,
                    capacity: room_input.capacity,
                    price_per_night: room_input.price_per_night,
                    image_file: room_input.image_file,
                };
                q::create_room(&tx, &room)?;
                rooms.push(room);
            }
            tx.commit()?;

            Ok(ServiceRecord::Accommodation(AccommodationView {
                accommodation: acc,
                rooms,
            }))
        }
        ServicePayload::Transportation(input) => {
            let id = ids
                .next_id(conn, ServiceKind::Transportation)
                .map_err(map_id_error)?;
            let trn = Transportation {
                id,
                provider_id: provider_id.to_string(),
                name: input.name,
                vehicle_type: input.vehicle_type,
                origin: input.origin,
                destination: input.destination,
                departure_time: input.departure_time,
                seats: input.seats,
                price: input.price,
                image_file: input.image_file,
                created_at: now,
                updated_at: now,
            };
            q::create_transportation(conn, &trn)?;
            Ok(ServiceRecord::Transportation(trn))
        }
        ServicePayload::SportAdventure(input) => {
            let id = ids
                .next_id(conn, ServiceKind::SportAdventure)
                .map_err(map_id_error)?;
            let spt = SportAdventure {
                id,
                provider_id: provider_id.to_string(),
                name: input.name,
                activity: input.activity,
                location: input.location,
                difficulty: input.difficulty,
                duration_hours: input.duration_hours,
                price: input.price,
                image_file: input.image_file,
                created_at: now,
                updated_at: now,
            };
            q::create_sport_adventure(conn, &spt)?;
            Ok(ServiceRecord::SportAdventure(spt))
        }
    }
}

/// Update a service. Returns the fresh record plus any image filenames
/// that the update orphaned (replaced images, images of deleted rooms);
/// the caller removes those from disk after the write is committed.
pub fn update_service(
    conn: &mut Connection,
    provider_id: &str,
    service_id: &str,
    payload: ServicePayload,
) -> Result<(ServiceRecord, Vec<String>), ApiError> {
    payload.validate()?;
    let now = Utc::now().naive_utc();
    let mut orphans = vec![];

    match payload {
        ServicePayload::Accommodation(input) => {
            let existing = q::get_accommodation(conn, service_id)?
                .ok_or_else(|| ApiError::NotFound(format!("accommodation {service_id}")))?;
            check_owner(&existing.provider_id, provider_id)?;

            let image_file =
                replace_image(existing.image_file, input.image_file, &mut orphans);
            let updated = Accommodation {
                id: existing.id.clone(),
                provider_id: existing.provider_id.clone(),
                name: input.name,
                address: input.address,
                city: input.city,
                description: input.description,
                amenities: input.amenities,
                image_file,
                created_at: existing.created_at,
                updated_at: now,
            };

            let tx = conn.transaction()?;
            q::update_accommodation(&tx, &updated)?;
            let rooms = reconcile_rooms(&tx, &existing.id, input.rooms, &mut orphans)?;
            tx.commit()?;

            Ok((
                ServiceRecord::Accommodation(AccommodationView {
                    accommodation: updated,
                    rooms,
                }),
                orphans,
            ))
        }
        ServicePayload::Transportation(input) => {
            let existing = q::get_transportation(conn, service_id)?
                .ok_or_else(|| ApiError::NotFound(format!("transportation {service_id}")))?;
            check_owner(&existing.provider_id, provider_id)?;

            let image_file =
                replace_image(existing.image_file, input.image_file, &mut orphans);
            let updated = Transportation {
                id: existing.id.clone(),
                provider_id: existing.provider_id.clone(),
                name: input.name,
                vehicle_type: input.vehicle_type,
                origin: input.origin,
                destination: input.destination,
                departure_time: input.departure_time,
                seats: input.seats,
                price: input.price,
                image_file,
                created_at: existing.created_at,
                updated_at: now,
            };
            q::update_transportation(conn, &updated)?;
            Ok((ServiceRecord::Transportation(updated), orphans))
        }
        ServicePayload::SportAdventure(input) => {
            let existing = q::get_sport_adventure(conn, service_id)?
                .ok_or_else(|| ApiError::NotFound(format!("sport adventure {service_id}")))?;
            check_owner(&existing.provider_id, provider_id)?;

            let image_file =
                replace_image(existing.image_file, input.image_file, &mut orphans);
            let updated = SportAdventure {
                id: existing.id.clone(),
                provider_id: existing.provider_id.clone(),
                name: input.name,
                activity: input.activity,
                location: input.location,
                difficulty: input.difficulty,
                duration_hours: input.duration_hours,
                price: input.price,
                image_file,
                created_at: existing.created_at,
                updated_at: now,
            };
            q::update_sport_adventure(conn, &updated)?;
            Ok((ServiceRecord::SportAdventure(updated), orphans))
        }
    }
}

/// Delete a service. Returns the image filenames the deletion orphaned.
pub fn delete_service(
    conn: &mut Connection,
    provider_id: &str,
    kind: ServiceKind,
    service_id: &str,
) -> Result<Vec<String>, ApiError> {
    let mut orphans = vec![];

    match kind {
        ServiceKind::Accommodation => {
            let existing = q::get_accommodation(conn, service_id)?
                .ok_or_else(|| ApiError::NotFound(format!("accommodation {service_id}")))?;
            check_owner(&existing.provider_id, provider_id)?;

            orphans.extend(existing.image_file);
            for room in q::list_rooms(conn, service_id)? {
                orphans.extend(room.image_file);
            }
            // rooms go with the parent via ON DELETE CASCADE
            q::delete_accommodation(conn, service_id)?;
        }
        ServiceKind::Transportation => {
            let existing = q::get_transportation(conn, service_id)?
                .ok_or_else(|| ApiError::NotFound(format!("transportation {service_id}")))?;
            check_owner(&existing.provider_id, provider_id)?;
            orphans.extend(existing.image_file);
            q::delete_transportation(conn, service_id)?;
        }
        ServiceKind::SportAdventure => {
            let existing = q::get_sport_adventure(conn, service_id)?
                .ok_or_else(|| ApiError::NotFound(format!("sport adventure {service_id}")))?;
            check_owner(&existing.provider_id, provider_id)?;
            orphans.extend(existing.image_file);
            q::delete_sport_adventure(conn, service_id)?;
        }
    }

    Ok(orphans)
}

pub fn get_service(
    conn: &Connection,
    kind: ServiceKind,
    service_id: &str,
) -> Result<Option<ServiceRecord>, ApiError> {
    let record = match kind {
        ServiceKind::Accommodation => q::get_accommodation(conn, service_id)?.map(|acc| {
            let rooms = q::list_rooms(conn, &acc.id).unwrap_or_default();
            ServiceRecord::Accommodation(AccommodationView {
                accommodation: acc,
                rooms,
            })
        }),
        ServiceKind::Transportation => {
            q::get_transportation(conn, service_id)?.map(ServiceRecord::Transportation)
        }
        ServiceKind::SportAdventure => {
            q::get_sport_adventure(conn, service_id)?.map(ServiceRecord::SportAdventure)
        }
    };
    Ok(record)
}

pub fn list_services(
    conn: &Connection,
    kind: ServiceKind,
    provider_id: Option<&str>,
) -> Result<Vec<ServiceRecord>, ApiError> {
    let records = match kind {
        ServiceKind::Accommodation => {
            let mut out = vec![];
            for acc in q::list_accommodations(conn, provider_id)? {
                let rooms = q::list_rooms(conn, &acc.id)?;
                out.push(ServiceRecord::Accommodation(AccommodationView {
                    accommodation: acc,
                    rooms,
                }));
            }
            out
        }
        ServiceKind::Transportation => q::list_transportations(conn, provider_id)?
            .into_iter()
            .map(ServiceRecord::Transportation)
            .collect(),
        ServiceKind::SportAdventure => q::list_sport_adventures(conn, provider_id)?
            .into_iter()
            .map(ServiceRecord::SportAdventure)
            .collect(),
    };
    Ok(records)
}

// ── Internals ──

/// Bring the stored room set in line with the submitted list: ids are
/// updated, id-less entries are inserted, anything omitted is deleted.
fn reconcile_rooms(
    conn: &Connection,
    accommodation_id: &str,
    submitted: Vec<RoomInput>,
    orphans: &mut Vec<String>,
) -> Result<Vec<Room>, ApiError> {
    let existing = q::list_rooms(conn, accommodation_id)?;
    let mut kept = HashSet::new();
    let mut result = vec![];

    for input in submitted {
        match input.id {
            Some(id) => {
                let old = existing
                    .iter()
                    .find(|r| r.id == id)
                    .ok_or_else(|| ApiError::Validation(format!("unknown room id {id}")))?;

                let image_file =
                    replace_image(old.image_file.clone(), input.image_file, orphans);
                let room = Room {
                    id: id.clone(),
                    accommodation_id: accommodation_id.to_string(),
                    room_type: input.room_type,
                    capacity: input.capacity,
                    price_per_night: input.price_per_night,
                    image_file,
                };
                q::update_room(conn, &room)?;
                kept.insert(id);
                result.push(room);
            }
            None => {
                let room = Room {
                    id: uuid::Uuid::new_v4().to_string(),
                    accommodation_id: accommodation_id.to_string(),
                    room_type: input.room_type,
                    capacity: input.capacity,
                    price_per_night: input.price_per_night,
                    image_file: input.image_file,
                };
                q::create_room(conn, &room)?;
                result.push(room);
            }
        }
    }

    for old in existing {
        if !kept.contains(&old.id) {
            q::delete_room(conn, &old.id)?;
            orphans.extend(old.image_file);
        }
    }

    Ok(result)
}

fn replace_image(
    current: Option<String>,
    submitted: Option<String>,
    orphans: &mut Vec<String>,
) -> Option<String> {
    match submitted {
        None => current,
        Some(new) => {
            if let Some(old) = current {
                if old != new {
                    orphans.push(old);
                }
            }
            Some(new)
        }
    }
}

fn check_owner(owner: &str, provider_id: &str) -> Result<(), ApiError> {
    if owner != provider_id {
        return Err(ApiError::Forbidden(
            "service belongs to another provider".to_string(),
        ));
    }
    Ok(())
}

fn map_id_error(e: IdError) -> ApiError {
    match e {
        IdError::Exhausted(table) => ApiError::IdGeneration(table),
        IdError::Database(e) => ApiError::Database(e),
    }
}
