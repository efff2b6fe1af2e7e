use rusqlite::{params, Connection};

use crate::db::{fmt_dt, parse_dt};
use crate::models::{Accommodation, Room, ServiceKind, SportAdventure, Transportation};

// ── Generic (kind-dispatched) lookups ──

pub fn service_id_exists(conn: &Connection, kind: ServiceKind, id: &str) -> anyhow::Result<bool> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?1", kind.table());
    let count: i64 = conn.query_row(&sql, params![id], |row| row.get(0))?;
    Ok(count > 0)
}

/// Provider owning the given service, whichever table it lives in.
pub fn service_provider_id(
    conn: &Connection,
    kind: ServiceKind,
    id: &str,
) -> anyhow::Result<Option<String>> {
    let sql = format!("SELECT provider_id FROM {} WHERE id = ?1", kind.table());
    let result = conn.query_row(&sql, params![id], |row| row.get::<_, String>(0));

    match result {
        Ok(provider_id) => Ok(Some(provider_id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn service_name(
    conn: &Connection,
    kind: ServiceKind,
    id: &str,
) -> anyhow::Result<Option<String>> {
    let sql = format!("SELECT name FROM {} WHERE id = ?1", kind.table());
    let result = conn.query_row(&sql, params![id], |row| row.get::<_, String>(0));

    match result {
        Ok(name) => Ok(Some(name)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Accommodations ──

pub fn create_accommodation(conn: &Connection, acc: &Accommodation) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO accommodations (id, provider_id, name, address, city, description,
             amenities, image_file, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            acc.id,
            acc.provider_id,
            acc.name,
            acc.address,
            acc.city,
            acc.description,
            acc.amenities,
            acc.image_file,
            fmt_dt(&acc.created_at),
            fmt_dt(&acc.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_accommodation(conn: &Connection, id: &str) -> anyhow::Result<Option<Accommodation>> {
    let result = conn.query_row(
        "SELECT id, provider_id, name, address, city, description, amenities, image_file,
                created_at, updated_at
         FROM accommodations WHERE id = ?1",
        params![id],
        |row| Ok(parse_accommodation_row(row)),
    );

    match result {
        Ok(acc) => Ok(Some(acc?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_accommodations(
    conn: &Connection,
    provider_id: Option<&str>,
) -> anyhow::Result<Vec<Accommodation>> {
    let (sql, bind): (&str, Vec<String>) = match provider_id {
        Some(p) => (
            "SELECT id, provider_id, name, address, city, description, amenities, image_file,
                    created_at, updated_at
             FROM accommodations WHERE provider_id = ?1 ORDER BY created_at DESC",
            vec![p.to_string()],
        ),
        None => (
            "SELECT id, provider_id, name, address, city, description, amenities, image_file,
                    created_at, updated_at
             FROM accommodations ORDER BY created_at DESC",
            vec![],
        ),
    };

    let mut stmt = conn.prepare(sql)?;
    let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
        bind.iter().map(|s| s as &dyn rusqlite::types::ToSql).collect();
    let rows = stmt.query_map(bind_refs.as_slice(), |row| Ok(parse_accommodation_row(row)))?;

    let mut items = vec![];
    for row in rows {
        items.push(row??);
    }
    Ok(items)
}

pub fn update_accommodation(conn: &Connection, acc: &Accommodation) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE accommodations SET name = ?1, address = ?2, city = ?3, description = ?4,
             amenities = ?5, image_file = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            acc.name,
            acc.address,
            acc.city,
            acc.description,
            acc.amenities,
            acc.image_file,
            fmt_dt(&acc.updated_at),
            acc.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_accommodation(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM accommodations WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Rooms ──

pub fn create_room(conn: &Connection, room: &Room) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO rooms (id, accommodation_id, room_type, capacity, price_per_night, image_file)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            room.id,
            room.accommodation_id,
            room.room_type,
            room.capacity,
            room.price_per_night,
            room.image_file,
        ],
    )?;
    Ok(())
}

pub fn get_room(conn: &Connection, id: &str) -> anyhow::Result<Option<Room>> {
    let result = conn.query_row(
        "SELECT id, accommodation_id, room_type, capacity, price_per_night, image_file
         FROM rooms WHERE id = ?1",
        params![id],
        |row| parse_room_row(row),
    );

    match result {
        Ok(room) => Ok(Some(room)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_rooms(conn: &Connection, accommodation_id: &str) -> anyhow::Result<Vec<Room>> {
    let mut stmt = conn.prepare(
        "SELECT id, accommodation_id, room_type, capacity, price_per_night, image_file
         FROM rooms WHERE accommodation_id = ?1 ORDER BY room_type ASC",
    )?;
    let rows = stmt.query_map(params![accommodation_id], |row| parse_room_row(row))?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row?);
    }
    Ok(rooms)
}

pub fn update_room(conn: &Connection, room: &Room) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE rooms SET room_type = ?1, capacity = ?2, price_per_night = ?3, image_file = ?4
         WHERE id = ?5 AND accommodation_id = ?6",
        params![
            room.room_type,
            room.capacity,
            room.price_per_night,
            room.image_file,
            room.id,
            room.accommodation_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_room(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM rooms WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Transportations ──

pub fn create_transportation(conn: &Connection, trn: &Transportation) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO transportations (id, provider_id, name, vehicle_type, origin, destination,
             departure_time, seats, price, image_file, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            trn.id,
            trn.provider_id,
            trn.name,
            trn.vehicle_type,
            trn.origin,
            trn.destination,
            trn.departure_time,
            trn.seats,
            trn.price,
            trn.image_file,
            fmt_dt(&trn.created_at),
            fmt_dt(&trn.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_transportation(conn: &Connection, id: &str) -> anyhow::Result<Option<Transportation>> {
    let result = conn.query_row(
        "SELECT id, provider_id, name, vehicle_type, origin, destination, departure_time,
                seats, price, image_file, created_at, updated_at
         FROM transportations WHERE id = ?1",
        params![id],
        |row| Ok(parse_transportation_row(row)),
    );

    match result {
        Ok(trn) => Ok(Some(trn?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_transportations(
    conn: &Connection,
    provider_id: Option<&str>,
) -> anyhow::Result<Vec<Transportation>> {
    let (sql, bind): (&str, Vec<String>) = match provider_id {
        Some(p) => (
            "SELECT id, provider_id, name, vehicle_type, origin, destination, departure_time,
                    seats, price, image_file, created_at, updated_at
             FROM transportations WHERE provider_id = ?1 ORDER BY created_at DESC",
            vec![p.to_string()],
        ),
        None => (
            "SELECT id, provider_id, name, vehicle_type, origin, destination, departure_time,
                    seats, price, image_file, created_at, updated_at
             FROM transportations ORDER BY created_at DESC",
            vec![],
        ),
    };

    let mut stmt = conn.prepare(sql)?;
    let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
        bind.iter().map(|s| s as &dyn rusqlite::types::ToSql).collect();
    let rows = stmt.query_map(bind_refs.as_slice(), |row| Ok(parse_transportation_row(row)))?;

    let mut items = vec![];
    for row in rows {
        items.push(row??);
    }
    Ok(items)
}

pub fn update_transportation(conn: &Connection, trn: &Transportation) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE transportations SET name = ?1, vehicle_type = ?2, origin = ?3, destination = ?4,
             departure_time = ?5, seats = ?6, price = ?7, image_file = ?8, updated_at = ?9
         WHERE id = ?10",
        params![
            trn.name,
            trn.vehicle_type,
            trn.origin,
            trn.destination,
            trn.departure_time,
            trn.seats,
            trn.price,
            trn.image_file,
            fmt_dt(&trn.updated_at),
            trn.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_transportation(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM transportations WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Sport adventures ──

pub fn create_sport_adventure(conn: &Connection, spt: &SportAdventure) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO sport_adventures (id, provider_id, name, activity, location, difficulty,
             duration_hours, price, image_file, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            spt.id,
            spt.provider_id,
            spt.name,
            spt.activity,
            spt.location,
            spt.difficulty,
            spt.duration_hours,
            spt.price,
            spt.image_file,
            fmt_dt(&spt.created_at),
            fmt_dt(&spt.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_sport_adventure(conn: &Connection, id: &str) -> anyhow::Result<Option<SportAdventure>> {
    let result = conn.query_row(
        "SELECT id, provider_id, name, activity, location, difficulty, duration_hours,
                price, image_file, created_at, updated_at
         FROM sport_adventures WHERE id = ?1",
        params![id],
        |row| Ok(parse_sport_adventure_row(row)),
    );

    match result {
        Ok(spt) => Ok(Some(spt?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_sport_adventures(
    conn: &Connection,
    provider_id: Option<&str>,
) -> anyhow::Result<Vec<SportAdventure>> {
    let (sql, bind): (&str, Vec<String>) = match provider_id {
        Some(p) => (
            "SELECT id, provider_id, name, activity, location, difficulty, duration_hours,
                    price, image_file, created_at, updated_at
             FROM sport_adventures WHERE provider_id = ?1 ORDER BY created_at DESC",
            vec![p.to_string()],
        ),
        None => (
            "SELECT id, provider_id, name, activity, location, difficulty, duration_hours,
                    price, image_file, created_at, updated_at
             FROM sport_adventures ORDER BY created_at DESC",
            vec![],
        ),
    };

    let mut stmt = conn.prepare(sql)?;
    let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
        bind.iter().map(|s| s as &dyn rusqlite::types::ToSql).collect();
    let rows = stmt.query_map(bind_refs.as_slice(), |row| Ok(parse_sport_adventure_row(row)))?;

    let mut items = vec![];
    for row in rows {
        items.push(row??);
    }
    Ok(items)
}

pub fn update_sport_adventure(conn: &Connection, spt: &SportAdventure) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE sport_adventures SET name = ?1, activity = ?2, location = ?3, difficulty = ?4,
             duration_hours = ?5, price = ?6, image_file = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            spt.name,
            spt.activity,
            spt.location,
            spt.difficulty,
            spt.duration_hours,
            spt.price,
            spt.image_file,
            fmt_dt(&spt.updated_at),
            spt.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_sport_adventure(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM sport_adventures WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Row parsers ──

fn parse_accommodation_row(row: &rusqlite::Row) -> anyhow::Result<Accommodation> {
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    Ok(Accommodation {
        id: row.get(0)?,
        provider_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        city: row.get(4)?,
        description: row.get(5)?,
        amenities: row.get(6)?,
        image_file: row.get(7)?,
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}

fn parse_room_row(row: &rusqlite::Row) -> Result<Room, rusqlite::Error> {
    Ok(Room {
        id: row.get(0)?,
        accommodation_id: row.get(1)?,
        room_type: row.get(2)?,
        capacity: row.get(3)?,
        price_per_night: row.get(4)?,
        image_file: row.get(5)?,
    })
}

fn parse_transportation_row(row: &rusqlite::Row) -> anyhow::Result<Transportation> {
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    Ok(Transportation {
        id: row.get(0)?,
        provider_id: row.get(1)?,
        name: row.get(2)?,
        vehicle_type: row.get(3)?,
        origin: row.get(4)?,
        destination: row.get(5)?,
        departure_time: row.get(6)?,
        seats: row.get(7)?,
        price: row.get(8)?,
        image_file: row.get(9)?,
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}

fn parse_sport_adventure_row(row: &rusqlite::Row) -> anyhow::Result<SportAdventure> {
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    Ok(SportAdventure {
        id: row.get(0)?,
        provider_id: row.get(1)?,
        name: row.get(2)?,
        activity: row.get(3)?,
        location: row.get(4)?,
        difficulty: row.get(5)?,
        duration_hours: row.get(6)?,
        price: row.get(7)?,
        image_file: row.get(8)?,
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}
