//! Reminder scheduler: computes and persists the reminder set for a new
//! booking, then settles the immediately-due pieces synchronously.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{get_provider, get_requester, insert_reminder};
use crate::db::DatabaseError;
use crate::models::enums::{DeliveryStatus, ParticipantRole, ReminderKind};
use crate::models::{Appointment, ContactCard, Reminder};
use crate::notify::{NotificationChannel, ReminderPayload};

use super::dispatcher::{self, DispatchReport};

/// Lead times for offset reminders, minutes before the session start.
const REMINDER_LEAD_TIMES: &[(ReminderKind, i64)] = &[
    (ReminderKind::Reminder24h, 24 * 60),
    (ReminderKind::Reminder1h, 60),
];

/// What scheduling produced for one booking.
#[derive(Debug)]
pub struct ScheduleSummary {
    /// Persisted reminder rows, the immediate acknowledgement first.
    pub created: Vec<Reminder>,
    /// Outcome of dispatching the acknowledgement.
    pub booking_ack: DispatchReport,
    /// Whether the provider's immediate new-booking notice went out.
    pub provider_notified: bool,
}

/// Computes and persists the reminder set for a newly created appointment.
///
/// An offset reminder whose due time already passed is never created. The
/// requester's acknowledgement is due immediately and dispatched before
/// returning; the provider gets a direct notice that is not a stored row.
pub fn schedule_for_booking(
    conn: &Connection,
    channel: &dyn NotificationChannel,
    appointment: &Appointment,
    now: NaiveDateTime,
) -> Result<ScheduleSummary, DatabaseError> {
    let mut created = Vec::new();

    let ack = make_reminder(appointment, ReminderKind::BookingReceived, now, now);
    insert_reminder(conn, &ack)?;
    created.push(ack.clone());

    for (kind, minutes_before) in REMINDER_LEAD_TIMES {
        let due = appointment.start_at - Duration::minutes(*minutes_before);
        if due > now {
            let reminder = make_reminder(appointment, *kind, due, now);
            insert_reminder(conn, &reminder)?;
            created.push(reminder);
        }
    }

    let booking_ack = dispatcher::process(conn, channel, &ack.id);
    let provider_notified = notify_provider(conn, channel, appointment);

    tracing::info!(
        "Scheduled {} reminder(s) for appointment {}",
        created.len(),
        appointment.id
    );

    Ok(ScheduleSummary {
        created,
        booking_ack,
        provider_notified,
    })
}

fn make_reminder(
    appointment: &Appointment,
    kind: ReminderKind,
    scheduled_for: NaiveDateTime,
    now: NaiveDateTime,
) -> Reminder {
    Reminder {
        id: Uuid::new_v4(),
        appointment_id: appointment.id,
        kind,
        recipient_id: appointment.requester_id,
        scheduled_for,
        custom_message: None,
        delivery_status: DeliveryStatus::Pending,
        sent_at: None,
        created_at: now,
    }
}

/// The provider learns about a new booking right away. Best effort: a
/// refused notice is logged, never surfaced as a scheduling failure.
fn notify_provider(
    conn: &Connection,
    channel: &dyn NotificationChannel,
    appointment: &Appointment,
) -> bool {
    let result = (|| -> Result<(), String> {
        let provider = get_provider(conn, &appointment.provider_id).map_err(|e| e.to_string())?;
        let requester =
            get_requester(conn, &appointment.requester_id).map_err(|e| e.to_string())?;

        let recipient = ContactCard {
            email: provider.email,
            display_name: provider.display_name.clone(),
            role: ParticipantRole::Provider,
        };
        let payload = ReminderPayload {
            appointment_id: appointment.id,
            kind: ReminderKind::BookingReceived,
            start_at: appointment.start_at,
            end_at: appointment.end_at,
            modality: appointment.modality,
            video_link: appointment.video_link.clone(),
            provider_name: provider.display_name,
            requester_name: requester.display_name,
            custom_message: None,
        };
        channel
            .send(&recipient, ReminderKind::BookingReceived, &payload)
            .map_err(|e| e.to_string())?;
        Ok(())
    })();

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                "New-booking notice to provider {} failed: {e}",
                appointment.provider_id
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{
        get_reminder, insert_appointment, insert_provider, insert_requester,
        list_reminders_for_appointment,
    };
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::{AppointmentStatus, SessionModality};
    use crate::models::{Provider, Requester};
    use crate::notify::testing::{FailingChannel, RecordingChannel};
    use crate::reminders::dispatcher::DispatchOutcome;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn ts(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn seed_appointment(conn: &Connection, start_at: NaiveDateTime) -> Appointment {
        let provider = Provider {
            id: Uuid::new_v4(),
            display_name: "Dr. Vega".into(),
            email: "vega@example.com".into(),
            specialty: None,
            created_at: ts("2025-01-01 09:00:00"),
        };
        let requester = Requester {
            id: Uuid::new_v4(),
            display_name: "Ana Sousa".into(),
            email: "ana@example.com".into(),
            created_at: ts("2025-01-01 09:00:00"),
        };
        insert_provider(conn, &provider).unwrap();
        insert_requester(conn, &requester).unwrap();

        let appt = Appointment {
            id: Uuid::new_v4(),
            provider_id: provider.id,
            requester_id: requester.id,
            start_at,
            end_at: start_at + Duration::minutes(50),
            status: AppointmentStatus::Scheduled,
            modality: SessionModality::Online,
            video_link: None,
            price_cents: None,
            notes: None,
            status_reason: None,
            created_at: ts("2025-03-01 10:00:00"),
            updated_at: ts("2025-03-01 10:00:00"),
        };
        insert_appointment(conn, &appt).unwrap();
        appt
    }

    #[test]
    fn thirty_hours_out_creates_full_set() {
        let conn = test_db();
        let now = ts("2025-03-01 10:00:00");
        let appt = seed_appointment(&conn, now + Duration::hours(30));
        let channel = RecordingChannel::default();

        let summary = schedule_for_booking(&conn, &channel, &appt, now).unwrap();
        assert_eq!(summary.created.len(), 3);

        let rows = list_reminders_for_appointment(&conn, &appt.id).unwrap();
        assert_eq!(rows.len(), 3);
        // Ordered by due time: acknowledgement now, 24h at now+6h, 1h at now+29h.
        assert_eq!(rows[0].kind, ReminderKind::BookingReceived);
        assert_eq!(rows[0].scheduled_for, now);
        assert_eq!(rows[1].kind, ReminderKind::Reminder24h);
        assert_eq!(rows[1].scheduled_for, now + Duration::hours(6));
        assert_eq!(rows[2].kind, ReminderKind::Reminder1h);
        assert_eq!(rows[2].scheduled_for, now + Duration::hours(29));
    }

    #[test]
    fn short_notice_booking_creates_only_acknowledgement() {
        let conn = test_db();
        let now = ts("2025-03-01 10:00:00");
        let appt = seed_appointment(&conn, now + Duration::minutes(30));
        let channel = RecordingChannel::default();

        let summary = schedule_for_booking(&conn, &channel, &appt, now).unwrap();
        assert_eq!(summary.created.len(), 1);
        assert_eq!(summary.created[0].kind, ReminderKind::BookingReceived);

        let rows = list_reminders_for_appointment(&conn, &appt.id).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn twelve_hours_out_skips_only_daily_reminder() {
        let conn = test_db();
        let now = ts("2025-03-01 10:00:00");
        let appt = seed_appointment(&conn, now + Duration::hours(12));
        let channel = RecordingChannel::default();

        let summary = schedule_for_booking(&conn, &channel, &appt, now).unwrap();
        let kinds: Vec<ReminderKind> = summary.created.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![ReminderKind::BookingReceived, ReminderKind::Reminder1h]
        );
    }

    #[test]
    fn offset_reminders_never_due_after_start() {
        let conn = test_db();
        let now = ts("2025-03-01 10:00:00");
        let appt = seed_appointment(&conn, now + Duration::hours(30));
        let channel = RecordingChannel::default();

        let summary = schedule_for_booking(&conn, &channel, &appt, now).unwrap();
        for reminder in &summary.created {
            assert!(reminder.scheduled_for <= appt.start_at);
        }
    }

    #[test]
    fn acknowledgement_dispatches_synchronously() {
        let conn = test_db();
        let now = ts("2025-03-01 10:00:00");
        let appt = seed_appointment(&conn, now + Duration::hours(30));
        let channel = RecordingChannel::default();

        let summary = schedule_for_booking(&conn, &channel, &appt, now).unwrap();
        assert_eq!(summary.booking_ack.outcome, DispatchOutcome::Delivered);

        let ack = get_reminder(&conn, &summary.created[0].id).unwrap();
        assert_eq!(ack.delivery_status, DeliveryStatus::Sent);
    }

    #[test]
    fn provider_receives_direct_notice() {
        let conn = test_db();
        let now = ts("2025-03-01 10:00:00");
        let appt = seed_appointment(&conn, now + Duration::hours(30));
        let channel = RecordingChannel::default();

        let summary = schedule_for_booking(&conn, &channel, &appt, now).unwrap();
        assert!(summary.provider_notified);

        let recipients: Vec<String> = channel
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|(email, _)| email.clone())
            .collect();
        assert!(recipients.contains(&"ana@example.com".to_string()));
        assert!(recipients.contains(&"vega@example.com".to_string()));

        // The provider notice is direct; only requester reminders are stored.
        let rows = list_reminders_for_appointment(&conn, &appt.id).unwrap();
        assert!(rows.iter().all(|r| r.recipient_id == appt.requester_id));
    }

    #[test]
    fn channel_failure_still_persists_reminder_set() {
        let conn = test_db();
        let now = ts("2025-03-01 10:00:00");
        let appt = seed_appointment(&conn, now + Duration::hours(30));

        let summary = schedule_for_booking(&conn, &FailingChannel, &appt, now).unwrap();
        assert_eq!(summary.created.len(), 3);
        assert_eq!(summary.booking_ack.outcome, DispatchOutcome::Failed);
        assert!(!summary.provider_notified);

        // The acknowledgement row stays on file for the retry sweep.
        let ack = get_reminder(&conn, &summary.created[0].id).unwrap();
        assert_eq!(ack.delivery_status, DeliveryStatus::Failed);
    }
}
