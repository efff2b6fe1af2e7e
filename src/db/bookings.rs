use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::db::{fmt_date, fmt_dt, parse_date, parse_dt, parse_opt_dt};
use crate::models::{
    AccommodationBooking, Booking, BookingStatus, ServiceKind, SportAdventureBooking,
    TransportationBooking,
};

pub fn create_accommodation_booking(
    conn: &Connection,
    booking: &AccommodationBooking,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO accommodation_bookings (id, accommodation_id, room_id, guest_name,
             guest_email, check_in, check_out, total_guests, total_price, status,
             approved_at, rejected_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, NULL, ?11, ?12)",
        params![
            booking.id,
            booking.accommodation_id,
            booking.room_id,
            booking.guest_name,
            booking.guest_email,
            fmt_date(&booking.check_in),
            fmt_date(&booking.check_out),
            booking.total_guests,
            booking.total_price,
            booking.status.as_str(),
            fmt_dt(&booking.created_at),
            fmt_dt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn create_transportation_booking(
    conn: &Connection,
    booking: &TransportationBooking,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO transportation_bookings (id, transportation_id, guest_name, guest_email,
             travel_date, seats, total_price, status, approved_at, rejected_at,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, NULL, ?9, ?10)",
        params![
            booking.id,
            booking.transportation_id,
            booking.guest_name,
            booking.guest_email,
            fmt_date(&booking.travel_date),
            booking.seats,
            booking.total_price,
            booking.status.as_str(),
            fmt_dt(&booking.created_at),
            fmt_dt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn create_sport_adventure_booking(
    conn: &Connection,
    booking: &SportAdventureBooking,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO sport_adventure_bookings (id, sport_adventure_id, guest_name, guest_email,
             activity_date, participants, total_price, status, approved_at, rejected_at,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, NULL, ?9, ?10)",
        params![
            booking.id,
            booking.sport_adventure_id,
            booking.guest_name,
            booking.guest_email,
            fmt_date(&booking.activity_date),
            booking.participants,
            booking.total_price,
            booking.status.as_str(),
            fmt_dt(&booking.created_at),
            fmt_dt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

/// Resolve a booking id against the three booking tables in a fixed
/// order. Ids are uuids, so at most one table can hold a match.
pub fn find_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    if let Some(b) = get_accommodation_booking(conn, id)? {
        return Ok(Some(Booking::Accommodation(b)));
    }
    if let Some(b) = get_transportation_booking(conn, id)? {
        return Ok(Some(Booking::Transportation(b)));
    }
    if let Some(b) = get_sport_adventure_booking(conn, id)? {
        return Ok(Some(Booking::SportAdventure(b)));
    }
    Ok(None)
}

pub fn get_accommodation_booking(
    conn: &Connection,
    id: &str,
) -> anyhow::Result<Option<AccommodationBooking>> {
    let result = conn.query_row(
        "SELECT id, accommodation_id, room_id, guest_name, guest_email, check_in, check_out,
                total_guests, total_price, status, approved_at, rejected_at, created_at, updated_at
         FROM accommodation_bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_accommodation_booking_row(row)),
    );

    match result {
        Ok(b) => Ok(Some(b?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_transportation_booking(
    conn: &Connection,
    id: &str,
) -> anyhow::Result<Option<TransportationBooking>> {
    let result = conn.query_row(
        "SELECT id, transportation_id, guest_name, guest_email, travel_date, seats,
                total_price, status, approved_at, rejected_at, created_at, updated_at
         FROM transportation_bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_transportation_booking_row(row)),
    );

    match result {
        Ok(b) => Ok(Some(b?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_sport_adventure_booking(
    conn: &Connection,
    id: &str,
) -> anyhow::Result<Option<SportAdventureBooking>> {
    let result = conn.query_row(
        "SELECT id, sport_adventure_id, guest_name, guest_email, activity_date, participants,
                total_price, status, approved_at, rejected_at, created_at, updated_at
         FROM sport_adventure_bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_sport_adventure_booking_row(row)),
    );

    match result {
        Ok(b) => Ok(Some(b?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Record a decision: set status plus the matching timestamp, clearing the
/// opposite one in the same statement so the two can never coexist.
pub fn apply_decision(
    conn: &Connection,
    kind: ServiceKind,
    id: &str,
    status: BookingStatus,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let sql = match status {
        BookingStatus::Approved => format!(
            "UPDATE {} SET status = ?1, approved_at = ?2, rejected_at = NULL, updated_at = ?2
             WHERE id = ?3",
            kind.booking_table()
        ),
        BookingStatus::Rejected => format!(
            "UPDATE {} SET status = ?1, rejected_at = ?2, approved_at = NULL, updated_at = ?2
             WHERE id = ?3",
            kind.booking_table()
        ),
        BookingStatus::Pending => anyhow::bail!("cannot transition a booking back to Pending"),
    };

    let count = conn.execute(&sql, params![status.as_str(), fmt_dt(now), id])?;
    Ok(count > 0)
}

/// Every booking, across the three variants, whose service belongs to the
/// given provider. Newest first within each variant.
pub fn list_bookings_for_provider(
    conn: &Connection,
    provider_id: &str,
) -> anyhow::Result<Vec<Booking>> {
    let mut bookings = vec![];

    let mut stmt = conn.prepare(
        "SELECT b.id, b.accommodation_id, b.room_id, b.guest_name, b.guest_email, b.check_in,
                b.check_out, b.total_guests, b.total_price, b.status, b.approved_at,
                b.rejected_at, b.created_at, b.updated_at
         FROM accommodation_bookings b
         INNER JOIN accommodations a ON a.id = b.accommodation_id
         WHERE a.provider_id = ?1 ORDER BY b.created_at DESC",
    )?;
    let rows = stmt.query_map(params![provider_id], |row| {
        Ok(parse_accommodation_booking_row(row))
    })?;
    for row in rows {
        bookings.push(Booking::Accommodation(row??));
    }

    let mut stmt = conn.prepare(
        "SELECT b.id, b.transportation_id, b.guest_name, b.guest_email, b.travel_date, b.seats,
                b.total_price, b.status, b.approved_at, b.rejected_at, b.created_at, b.updated_at
         FROM transportation_bookings b
         INNER JOIN transportations t ON t.id = b.transportation_id
         WHERE t.provider_id = ?1 ORDER BY b.created_at DESC",
    )?;
    let rows = stmt.query_map(params![provider_id], |row| {
        Ok(parse_transportation_booking_row(row))
    })?;
    for row in rows {
        bookings.push(Booking::Transportation(row??));
    }

    let mut stmt = conn.prepare(
        "SELECT b.id, b.sport_adventure_id, b.guest_name, b.guest_email, b.activity_date,
                b.participants, b.total_price, b.status, b.approved_at, b.rejected_at,
                b.created_at, b.updated_at
         FROM sport_adventure_bookings b
         INNER JOIN sport_adventures s ON s.id = b.sport_adventure_id
         WHERE s.provider_id = ?1 ORDER BY b.created_at DESC",
    )?;
    let rows = stmt.query_map(params![provider_id], |row| {
        Ok(parse_sport_adventure_booking_row(row))
    })?;
    for row in rows {
        bookings.push(Booking::SportAdventure(row??));
    }

    Ok(bookings)
}

// ── Row parsers ──

fn parse_accommodation_booking_row(row: &rusqlite::Row) -> anyhow::Result<AccommodationBooking> {
    let check_in_str: String = row.get(5)?;
    let check_out_str: String = row.get(6)?;
    let status_str: String = row.get(9)?;
    let approved_at: Option<String> = row.get(10)?;
    let rejected_at: Option<String> = row.get(11)?;
    let created_at_str: String = row.get(12)?;
    let updated_at_str: String = row.get(13)?;

    Ok(AccommodationBooking {
        id: row.get(0)?,
        accommodation_id: row.get(1)?,
        room_id: row.get(2)?,
        guest_name: row.get(3)?,
        guest_email: row.get(4)?,
        check_in: parse_date(&check_in_str),
        check_out: parse_date(&check_out_str),
        total_guests: row.get(7)?,
        total_price: row.get(8)?,
        status: BookingStatus::parse(&status_str),
        approved_at: parse_opt_dt(approved_at),
        rejected_at: parse_opt_dt(rejected_at),
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}

fn parse_transportation_booking_row(
    row: &rusqlite::Row,
) -> anyhow::Result<TransportationBooking> {
    let travel_date_str: String = row.get(4)?;
    let status_str: String = row.get(7)?;
    let approved_at: Option<String> = row.get(8)?;
    let rejected_at: Option<String> = row.get(9)?;
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    Ok(TransportationBooking {
        id: row.get(0)?,
        transportation_id: row.get(1)?,
        guest_name: row.get(2)?,
        guest_email: row.get(3)?,
        travel_date: parse_date(&travel_date_str),
        seats: row.get(5)?,
        total_price: row.get(6)?,
        status: BookingStatus::parse(&status_str),
        approved_at: parse_opt_dt(approved_at),
        rejected_at: parse_opt_dt(rejected_at),
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}

fn parse_sport_adventure_booking_row(
    row: &rusqlite::Row,
) -> anyhow::Result<SportAdventureBooking> {
    let activity_date_str: String = row.get(4)?;
    let status_str: String = row.get(7)?;
    let approved_at: Option<String> = row.get(8)?;
    let rejected_at: Option<String> = row.get(9)?;
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    Ok(SportAdventureBooking {
        id: row.get(0)?,
        sport_adventure_id: row.get(1)?,
        guest_name: row.get(2)?,
        guest_email: row.get(3)?,
        activity_date: parse_date(&activity_date_str),
        participants: row.get(5)?,
        total_price: row.get(6)?,
        status: BookingStatus::parse(&status_str),
        approved_at: parse_opt_dt(approved_at),
        rejected_at: parse_opt_dt(rejected_at),
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}
