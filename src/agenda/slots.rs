//! Free-slot computation.
//!
//! Free slots on a date are the provider's configured weekly windows,
//! discretized to each window's slot length, minus slots overlapping an
//! active appointment, minus slots overlapping an explicit block.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{list_appointments, list_blocks_on_date, list_windows_for_weekday};
use crate::db::DatabaseError;
use crate::models::AppointmentFilter;

/// A bookable interval within a provider's configured hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreeSlot {
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
}

fn overlaps(ranges: &[(NaiveDateTime, NaiveDateTime)], start: NaiveDateTime, end: NaiveDateTime) -> bool {
    ranges.iter().any(|(s, e)| start < *e && end > *s)
}

pub fn free_slots_on_date(
    conn: &Connection,
    provider_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<FreeSlot>, DatabaseError> {
    let weekday = chrono::Datelike::weekday(&date).num_days_from_monday() as u8;
    let windows = list_windows_for_weekday(conn, provider_id, weekday)?;
    if windows.is_empty() {
        return Ok(Vec::new());
    }

    let appointments = list_appointments(
        conn,
        &AppointmentFilter {
            provider_id: Some(*provider_id),
            date_from: Some(date),
            date_to: Some(date),
            ..Default::default()
        },
    )?;
    let busy: Vec<(NaiveDateTime, NaiveDateTime)> = appointments
        .iter()
        .filter(|a| !a.status.is_terminal())
        .map(|a| (a.start_at, a.end_at))
        .collect();

    let blocked: Vec<(NaiveDateTime, NaiveDateTime)> = list_blocks_on_date(conn, provider_id, date)?
        .iter()
        .map(|b| (date.and_time(b.start_time), date.and_time(b.end_time)))
        .collect();

    let mut slots = Vec::new();
    for window in windows {
        let step = Duration::minutes(window.slot_minutes as i64);
        let window_end = date.and_time(window.end_time);
        let mut cursor = date.and_time(window.start_time);

        while cursor + step <= window_end {
            let slot_end = cursor + step;
            if !overlaps(&busy, cursor, slot_end) && !overlaps(&blocked, cursor, slot_end) {
                slots.push(FreeSlot {
                    start_at: cursor,
                    end_at: slot_end,
                });
            }
            cursor = slot_end;
        }
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Weekday};

    use super::*;
    use crate::db::repository::{
        insert_appointment, insert_availability_window, insert_schedule_block,
    };
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::{AppointmentStatus, SessionModality};
    use crate::models::{Appointment, AvailabilityWindow, ScheduleBlock};

    // 2025-03-10 is a Monday; windows below use weekday 0.
    const DAY: &str = "2025-03-10";

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::parse_from_str(DAY, "%Y-%m-%d").unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_time(time(h, m))
    }

    fn seed_provider(conn: &Connection) -> Uuid {
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO providers (id, display_name, email, created_at)
             VALUES (?1, 'Dr. Vega', 'vega@example.com', '2025-01-01 09:00:00')",
            rusqlite::params![id.to_string()],
        )
        .unwrap();
        id
    }

    fn seed_window(conn: &Connection, provider_id: Uuid, start: NaiveTime, end: NaiveTime) {
        insert_availability_window(
            conn,
            &AvailabilityWindow {
                id: Uuid::new_v4(),
                provider_id,
                weekday: 0,
                start_time: start,
                end_time: end,
                slot_minutes: 50,
            },
        )
        .unwrap();
    }

    fn seed_booking(
        conn: &Connection,
        provider_id: Uuid,
        start: NaiveDateTime,
        status: AppointmentStatus,
    ) {
        let requester_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO requesters (id, display_name, email, created_at)
             VALUES (?1, 'Ana Sousa', 'ana@example.com', '2025-01-01 09:00:00')",
            rusqlite::params![requester_id.to_string()],
        )
        .unwrap();
        insert_appointment(
            conn,
            &Appointment {
                id: Uuid::new_v4(),
                provider_id,
                requester_id,
                start_at: start,
                end_at: start + Duration::minutes(50),
                status,
                modality: SessionModality::InPerson,
                video_link: None,
                price_cents: None,
                notes: None,
                status_reason: None,
                created_at: at(8, 0),
                updated_at: at(8, 0),
            },
        )
        .unwrap();
    }

    #[test]
    fn day_is_monday() {
        assert_eq!(chrono::Datelike::weekday(&day()), Weekday::Mon);
    }

    #[test]
    fn open_window_discretizes_into_slots() {
        let conn = test_db();
        let provider_id = seed_provider(&conn);
        seed_window(&conn, provider_id, time(9, 0), time(13, 0));

        let slots = free_slots_on_date(&conn, &provider_id, day()).unwrap();
        // 9:00, 9:50, 10:40, 11:30; 12:20 + 50min would overrun the window.
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].start_at, at(9, 0));
        assert_eq!(slots[3].start_at, at(11, 30));
        assert_eq!(slots[3].end_at, at(12, 20));
    }

    #[test]
    fn no_window_means_no_slots() {
        let conn = test_db();
        let provider_id = seed_provider(&conn);
        let slots = free_slots_on_date(&conn, &provider_id, day()).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn active_booking_removes_its_slot() {
        let conn = test_db();
        let provider_id = seed_provider(&conn);
        seed_window(&conn, provider_id, time(9, 0), time(13, 0));
        seed_booking(&conn, provider_id, at(9, 50), AppointmentStatus::Confirmed);

        let slots = free_slots_on_date(&conn, &provider_id, day()).unwrap();
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|s| s.start_at != at(9, 50)));
    }

    #[test]
    fn cancelled_booking_frees_its_slot() {
        let conn = test_db();
        let provider_id = seed_provider(&conn);
        seed_window(&conn, provider_id, time(9, 0), time(13, 0));
        seed_booking(&conn, provider_id, at(9, 50), AppointmentStatus::Cancelled);

        let slots = free_slots_on_date(&conn, &provider_id, day()).unwrap();
        assert_eq!(slots.len(), 4);
    }

    #[test]
    fn misaligned_booking_removes_both_touched_slots() {
        let conn = test_db();
        let provider_id = seed_provider(&conn);
        seed_window(&conn, provider_id, time(9, 0), time(13, 0));
        seed_booking(&conn, provider_id, at(10, 0), AppointmentStatus::Scheduled);

        // 10:00-10:50 touches both the 9:50-10:40 and 10:40-11:30 slots.
        let slots = free_slots_on_date(&conn, &provider_id, day()).unwrap();
        assert_eq!(slots.len(), 2);
        let starts: Vec<NaiveDateTime> = slots.iter().map(|s| s.start_at).collect();
        assert_eq!(starts, vec![at(9, 0), at(11, 30)]);
    }

    #[test]
    fn block_removes_overlapping_slots() {
        let conn = test_db();
        let provider_id = seed_provider(&conn);
        seed_window(&conn, provider_id, time(9, 0), time(13, 0));
        insert_schedule_block(
            &conn,
            &ScheduleBlock {
                id: Uuid::new_v4(),
                provider_id,
                date: day(),
                start_time: time(11, 30),
                end_time: time(13, 0),
                reason: Some("supervision".into()),
            },
        )
        .unwrap();

        let slots = free_slots_on_date(&conn, &provider_id, day()).unwrap();
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|s| s.start_at < at(11, 30)));
    }

    #[test]
    fn multiple_windows_contribute_independently() {
        let conn = test_db();
        let provider_id = seed_provider(&conn);
        seed_window(&conn, provider_id, time(9, 0), time(10, 40));
        seed_window(&conn, provider_id, time(14, 0), time(15, 40));

        let slots = free_slots_on_date(&conn, &provider_id, day()).unwrap();
        let starts: Vec<NaiveDateTime> = slots.iter().map(|s| s.start_at).collect();
        assert_eq!(starts, vec![at(9, 0), at(9, 50), at(14, 0), at(14, 50)]);
    }
}
