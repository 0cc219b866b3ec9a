use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{DeliveryStatus, ReminderKind};
use crate::models::Reminder;

use super::{format_ts, parse_ts, parse_uuid};

const REMINDER_COLUMNS: &str =
    "id, appointment_id, kind, recipient_id, scheduled_for, custom_message,
     delivery_status, sent_at, created_at";

type RawReminder = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    Option<String>,
    String,
);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawReminder> {
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
    ))
}

fn parse_row(raw: RawReminder) -> Result<Reminder, DatabaseError> {
    let (
        id,
        appointment_id,
        kind,
        recipient_id,
        scheduled_for,
        custom_message,
        delivery_status,
        sent_at,
        created_at,
    ) = raw;

    Ok(Reminder {
        id: parse_uuid(&id)?,
        appointment_id: parse_uuid(&appointment_id)?,
        kind: ReminderKind::from_str(&kind)?,
        recipient_id: parse_uuid(&recipient_id)?,
        scheduled_for: parse_ts(&scheduled_for)?,
        custom_message,
        delivery_status: DeliveryStatus::from_str(&delivery_status)?,
        sent_at: sent_at.as_deref().map(parse_ts).transpose()?,
        created_at: parse_ts(&created_at)?,
    })
}

pub fn insert_reminder(conn: &Connection, reminder: &Reminder) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reminders (id, appointment_id, kind, recipient_id, scheduled_for,
         custom_message, delivery_status, sent_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            reminder.id.to_string(),
            reminder.appointment_id.to_string(),
            reminder.kind.as_str(),
            reminder.recipient_id.to_string(),
            format_ts(reminder.scheduled_for),
            reminder.custom_message,
            reminder.delivery_status.as_str(),
            reminder.sent_at.map(format_ts),
            format_ts(reminder.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_reminder(conn: &Connection, id: &Uuid) -> Result<Reminder, DatabaseError> {
    let sql = format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1");
    let result = conn.query_row(&sql, params![id.to_string()], read_row);

    match result {
        Ok(raw) => parse_row(raw),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(DatabaseError::NotFound {
            entity_type: "Reminder".into(),
            id: id.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

pub fn list_reminders_for_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
) -> Result<Vec<Reminder>, DatabaseError> {
    let sql = format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders
         WHERE appointment_id = ?1 ORDER BY scheduled_for ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![appointment_id.to_string()], read_row)?;

    let mut reminders = Vec::new();
    for row in rows {
        reminders.push(parse_row(row?)?);
    }
    Ok(reminders)
}

/// Due rows for the external periodic sweep: pending or previously failed,
/// with `scheduled_for` at or before `now`.
pub fn list_due_reminders(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<Vec<Reminder>, DatabaseError> {
    let sql = format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders
         WHERE delivery_status IN ('pending', 'failed') AND scheduled_for <= ?1
         ORDER BY scheduled_for ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![format_ts(now)], read_row)?;

    let mut reminders = Vec::new();
    for row in rows {
        reminders.push(parse_row(row?)?);
    }
    Ok(reminders)
}

fn mark_delivery(
    conn: &Connection,
    id: &Uuid,
    status: DeliveryStatus,
    sent_at: Option<NaiveDateTime>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE reminders SET delivery_status = ?1, sent_at = ?2 WHERE id = ?3",
        params![status.as_str(), sent_at.map(format_ts), id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Reminder".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn mark_reminder_sent(
    conn: &Connection,
    id: &Uuid,
    sent_at: NaiveDateTime,
) -> Result<(), DatabaseError> {
    mark_delivery(conn, id, DeliveryStatus::Sent, Some(sent_at))
}

pub fn mark_reminder_failed(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    mark_delivery(conn, id, DeliveryStatus::Failed, None)
}

pub fn mark_reminder_skipped(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    mark_delivery(conn, id, DeliveryStatus::Skipped, None)
}
