use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{AvailabilityWindow, ScheduleBlock};

use super::{parse_time, parse_uuid, TIME_FORMAT};

pub fn insert_availability_window(
    conn: &Connection,
    window: &AvailabilityWindow,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO provider_hours (id, provider_id, weekday, start_time, end_time, slot_minutes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            window.id.to_string(),
            window.provider_id.to_string(),
            window.weekday as i32,
            window.start_time.format(TIME_FORMAT).to_string(),
            window.end_time.format(TIME_FORMAT).to_string(),
            window.slot_minutes as i32,
        ],
    )?;
    Ok(())
}

/// Windows for one provider on one weekday (0 = Monday), earliest first.
pub fn list_windows_for_weekday(
    conn: &Connection,
    provider_id: &Uuid,
    weekday: u8,
) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, provider_id, weekday, start_time, end_time, slot_minutes
         FROM provider_hours
         WHERE provider_id = ?1 AND weekday = ?2
         ORDER BY start_time ASC",
    )?;

    let rows = stmt.query_map(params![provider_id.to_string(), weekday as i32], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i32>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i32>(5)?,
        ))
    })?;

    let mut windows = Vec::new();
    for row in rows {
        let (id, provider_id, weekday, start_time, end_time, slot_minutes) = row?;
        windows.push(AvailabilityWindow {
            id: parse_uuid(&id)?,
            provider_id: parse_uuid(&provider_id)?,
            weekday: weekday as u8,
            start_time: parse_time(&start_time)?,
            end_time: parse_time(&end_time)?,
            slot_minutes: slot_minutes as u32,
        });
    }
    Ok(windows)
}

pub fn insert_schedule_block(
    conn: &Connection,
    block: &ScheduleBlock,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO schedule_blocks (id, provider_id, date, start_time, end_time, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            block.id.to_string(),
            block.provider_id.to_string(),
            block.date.to_string(),
            block.start_time.format(TIME_FORMAT).to_string(),
            block.end_time.format(TIME_FORMAT).to_string(),
            block.reason,
        ],
    )?;
    Ok(())
}

pub fn list_blocks_on_date(
    conn: &Connection,
    provider_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<ScheduleBlock>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, provider_id, date, start_time, end_time, reason
         FROM schedule_blocks
         WHERE provider_id = ?1 AND date = ?2
         ORDER BY start_time ASC",
    )?;

    let rows = stmt.query_map(params![provider_id.to_string(), date.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut blocks = Vec::new();
    for row in rows {
        let (id, provider_id, date, start_time, end_time, reason) = row?;
        blocks.push(ScheduleBlock {
            id: parse_uuid(&id)?,
            provider_id: parse_uuid(&provider_id)?,
            date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                DatabaseError::ConstraintViolation(format!("Invalid date {date}: {e}"))
            })?,
            start_time: parse_time(&start_time)?,
            end_time: parse_time(&end_time)?,
            reason,
        });
    }
    Ok(blocks)
}
