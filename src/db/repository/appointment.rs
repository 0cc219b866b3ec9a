use std::str::FromStr;

use chrono::Local;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{AppointmentStatus, SessionModality};
use crate::models::{Appointment, AppointmentFilter};

use super::{format_ts, parse_ts, parse_uuid};

const APPOINTMENT_COLUMNS: &str =
    "id, provider_id, requester_id, start_at, end_at, status, modality,
     video_link, price_cents, notes, status_reason, created_at, updated_at";

/// Fields written alongside a status change.
#[derive(Debug)]
pub struct StatusChange<'a> {
    pub to: AppointmentStatus,
    pub status_reason: Option<&'a str>,
    pub notes: Option<&'a str>,
}

impl<'a> StatusChange<'a> {
    pub fn to(to: AppointmentStatus) -> Self {
        Self {
            to,
            status_reason: None,
            notes: None,
        }
    }
}

type RawAppointment = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<i64>,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawAppointment> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
    ))
}

fn parse_row(raw: RawAppointment) -> Result<Appointment, DatabaseError> {
    let (
        id,
        provider_id,
        requester_id,
        start_at,
        end_at,
        status,
        modality,
        video_link,
        price_cents,
        notes,
        status_reason,
        created_at,
        updated_at,
    ) = raw;

    Ok(Appointment {
        id: parse_uuid(&id)?,
        provider_id: parse_uuid(&provider_id)?,
        requester_id: parse_uuid(&requester_id)?,
        start_at: parse_ts(&start_at)?,
        end_at: parse_ts(&end_at)?,
        status: AppointmentStatus::from_str(&status)?,
        modality: SessionModality::from_str(&modality)?,
        video_link,
        price_cents,
        notes,
        status_reason,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, provider_id, requester_id, start_at, end_at,
         status, modality, video_link, price_cents, notes, status_reason,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            appt.id.to_string(),
            appt.provider_id.to_string(),
            appt.requester_id.to_string(),
            format_ts(appt.start_at),
            format_ts(appt.end_at),
            appt.status.as_str(),
            appt.modality.as_str(),
            appt.video_link,
            appt.price_cents,
            appt.notes,
            appt.status_reason,
            format_ts(appt.created_at),
            format_ts(appt.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1");
    let result = conn.query_row(&sql, params![id.to_string()], read_row);

    match result {
        Ok(raw) => parse_row(raw),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Fetches appointments matching the filter, earliest start first.
pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut sql =
        format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE 1=1");

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut param_idx = 1u32;

    if let Some(provider_id) = filter.provider_id {
        sql.push_str(&format!(" AND provider_id = ?{param_idx}"));
        params_vec.push(Box::new(provider_id.to_string()));
        param_idx += 1;
    }
    if let Some(requester_id) = filter.requester_id {
        sql.push_str(&format!(" AND requester_id = ?{param_idx}"));
        params_vec.push(Box::new(requester_id.to_string()));
        param_idx += 1;
    }
    if let Some(status) = filter.status {
        sql.push_str(&format!(" AND status = ?{param_idx}"));
        params_vec.push(Box::new(status.as_str()));
        param_idx += 1;
    }
    if let Some(from) = filter.date_from {
        sql.push_str(&format!(" AND start_at >= ?{param_idx}"));
        params_vec.push(Box::new(format!("{from} 00:00:00")));
        param_idx += 1;
    }
    if let Some(to) = filter.date_to {
        sql.push_str(&format!(" AND start_at <= ?{param_idx}"));
        params_vec.push(Box::new(format!("{to} 23:59:59")));
        param_idx += 1;
    }
    let _ = param_idx;

    sql.push_str(" ORDER BY start_at ASC");

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), read_row)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(parse_row(row?)?);
    }
    Ok(appointments)
}

/// Applies a status change conditioned on the status the caller observed.
///
/// The UPDATE is a compare-and-swap: of two racing transitions exactly one
/// matches the expected status and wins. The loser gets `Conflict` with the
/// actual persisted status, or `NotFound` if the row never existed.
pub fn update_status_checked(
    conn: &Connection,
    id: &Uuid,
    expected: AppointmentStatus,
    change: &StatusChange,
) -> Result<Appointment, DatabaseError> {
    let now = format_ts(Local::now().naive_local());
    let updated = conn.execute(
        "UPDATE appointments
         SET status = ?1,
             status_reason = COALESCE(?2, status_reason),
             notes = COALESCE(?3, notes),
             updated_at = ?4
         WHERE id = ?5 AND status = ?6",
        params![
            change.to.as_str(),
            change.status_reason,
            change.notes,
            now,
            id.to_string(),
            expected.as_str(),
        ],
    )?;

    if updated == 0 {
        let result = conn.query_row(
            "SELECT status FROM appointments WHERE id = ?1",
            params![id.to_string()],
            |row| row.get::<_, String>(0),
        );
        return match result {
            Ok(actual) => Err(DatabaseError::Conflict {
                entity_type: "Appointment".into(),
                id: id.to_string(),
                expected: expected.as_str().into(),
                actual,
            }),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(DatabaseError::NotFound {
                entity_type: "Appointment".into(),
                id: id.to_string(),
            }),
            Err(e) => Err(e.into()),
        };
    }

    get_appointment(conn, id)
}

/// True if an active appointment for the provider overlaps [start, end).
pub fn overlapping_exists(
    conn: &Connection,
    provider_id: &Uuid,
    start_at: chrono::NaiveDateTime,
    end_at: chrono::NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE provider_id = ?1
           AND status IN ('scheduled', 'confirmed', 'in_progress')
           AND start_at < ?2 AND end_at > ?3",
        params![
            provider_id.to_string(),
            format_ts(end_at),
            format_ts(start_at),
        ],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
