//! Reminder dispatcher: delivers exactly one reminder and records the outcome.
//!
//! Retrying is not this module's job. An external periodic sweep re-invokes
//! `process` for rows returned by `list_due_reminders`; each call here settles
//! one row and never raises past the boundary.

use chrono::Local;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    get_appointment, get_contact, get_provider, get_reminder, get_requester,
    mark_reminder_failed, mark_reminder_sent, mark_reminder_skipped,
};
use crate::db::DatabaseError;
use crate::models::enums::{DeliveryStatus, ReminderKind};
use crate::models::{Appointment, Reminder};
use crate::notify::{NotificationChannel, ReminderPayload};

/// Outcome of a single dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Sent now, or found already sent (idempotent no-op).
    Delivered,
    /// Appointment no longer active; nothing sent, row recorded as skipped.
    Skipped,
    /// Lookup or channel failure; row recorded as failed where possible.
    Failed,
}

#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub outcome: DispatchOutcome,
    pub message: String,
}

impl DispatchReport {
    fn delivered(message: impl Into<String>) -> Self {
        Self {
            outcome: DispatchOutcome::Delivered,
            message: message.into(),
        }
    }

    fn skipped(message: impl Into<String>) -> Self {
        Self {
            outcome: DispatchOutcome::Skipped,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            outcome: DispatchOutcome::Failed,
            message: message.into(),
        }
    }
}

/// Attempts delivery of one reminder and records the outcome on the row.
/// Always returns a report; unexpected store errors are logged and folded
/// into a failure report.
pub fn process(
    conn: &Connection,
    channel: &dyn NotificationChannel,
    reminder_id: &Uuid,
) -> DispatchReport {
    match try_process(conn, channel, reminder_id) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!("Dispatch of reminder {reminder_id} errored: {e}");
            DispatchReport::failed(e.to_string())
        }
    }
}

fn try_process(
    conn: &Connection,
    channel: &dyn NotificationChannel,
    reminder_id: &Uuid,
) -> Result<DispatchReport, DatabaseError> {
    let reminder = get_reminder(conn, reminder_id)?;

    if reminder.delivery_status == DeliveryStatus::Sent {
        return Ok(DispatchReport::delivered("already sent"));
    }

    let appointment = match get_appointment(conn, &reminder.appointment_id) {
        Ok(appointment) => appointment,
        Err(DatabaseError::NotFound { .. }) => {
            mark_reminder_failed(conn, &reminder.id)?;
            tracing::warn!(
                "Reminder {} references missing appointment {}",
                reminder.id,
                reminder.appointment_id
            );
            return Ok(DispatchReport::failed("appointment not found"));
        }
        Err(e) => return Err(e),
    };

    // A reminder for a session that is no longer active is not sent.
    // Cancellation notices are about exactly such sessions, so they pass.
    if appointment.status.is_terminal() && reminder.kind != ReminderKind::Cancellation {
        mark_reminder_skipped(conn, &reminder.id)?;
        tracing::debug!(
            "Skipped reminder {} for {} appointment {}",
            reminder.id,
            appointment.status.as_str(),
            appointment.id
        );
        return Ok(DispatchReport::skipped(format!(
            "appointment is {}",
            appointment.status.as_str()
        )));
    }

    let recipient = match get_contact(conn, &reminder.recipient_id) {
        Ok(contact) => contact,
        Err(DatabaseError::NotFound { .. }) => {
            mark_reminder_failed(conn, &reminder.id)?;
            tracing::warn!(
                "Recipient {} of reminder {} not found under either role",
                reminder.recipient_id,
                reminder.id
            );
            return Ok(DispatchReport::failed("recipient not found"));
        }
        Err(e) => return Err(e),
    };

    let payload = match build_payload(conn, &appointment, &reminder) {
        Ok(payload) => payload,
        Err(DatabaseError::NotFound { entity_type, id }) => {
            mark_reminder_failed(conn, &reminder.id)?;
            tracing::warn!("Reminder {} payload missing {entity_type} {id}", reminder.id);
            return Ok(DispatchReport::failed("participant not found"));
        }
        Err(e) => return Err(e),
    };

    match channel.send(&recipient, reminder.kind, &payload) {
        Ok(receipt) => {
            mark_reminder_sent(conn, &reminder.id, Local::now().naive_local())?;
            tracing::debug!(
                "Delivered reminder {} ({}) as {}",
                reminder.id,
                reminder.kind.as_str(),
                receipt.channel_message_id
            );
            Ok(DispatchReport::delivered(format!(
                "delivered as {}",
                receipt.channel_message_id
            )))
        }
        Err(e) => {
            mark_reminder_failed(conn, &reminder.id)?;
            tracing::warn!("Channel refused reminder {}: {e}", reminder.id);
            Ok(DispatchReport::failed(format!("delivery failed: {e}")))
        }
    }
}

fn build_payload(
    conn: &Connection,
    appointment: &Appointment,
    reminder: &Reminder,
) -> Result<ReminderPayload, DatabaseError> {
    let provider = get_provider(conn, &appointment.provider_id)?;
    let requester = get_requester(conn, &appointment.requester_id)?;

    Ok(ReminderPayload {
        appointment_id: appointment.id,
        kind: reminder.kind,
        start_at: appointment.start_at,
        end_at: appointment.end_at,
        modality: appointment.modality,
        video_link: appointment.video_link.clone(),
        provider_name: provider.display_name,
        requester_name: requester.display_name,
        custom_message: reminder.custom_message.clone(),
    })
}
