//! Agenda controller: viewer-scoped reads and authorized lifecycle
//! transitions over the appointment store.
//!
//! The caller's scope (owner vs participant) is resolved once at
//! construction and every read and write dispatches on it. Transitions
//! validate role and current status against the lifecycle graph, then apply
//! a compare-and-swap conditioned on the observed status, so racing
//! conflicting calls settle with exactly one winner.

pub mod navigation;
pub mod slots;

use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{
    get_appointment, insert_appointment, insert_reminder, list_appointments,
    overlapping_exists, update_status_checked, StatusChange,
};
use crate::db::DatabaseError;
use crate::models::enums::{AppointmentStatus, DeliveryStatus, ReminderKind, SessionModality};
use crate::models::{Appointment, AppointmentFilter, Reminder};
use crate::notify::NotificationChannel;
use crate::reminders::{self, DispatchOutcome};

pub use navigation::AgendaCursor;
pub use slots::FreeSlot;

// ═══════════════════════════════════════════
// Scope and errors
// ═══════════════════════════════════════════

/// Who is looking at the agenda. Resolved once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewScope {
    /// The provider viewing their own full agenda.
    Owner { provider_id: Uuid },
    /// A requester viewing one provider's calendar. Sees only their own
    /// appointments with that provider, plus the provider's open slots.
    Participant {
        requester_id: Uuid,
        provider_id: Uuid,
    },
}

impl ViewScope {
    fn provider_id(&self) -> Uuid {
        match self {
            ViewScope::Owner { provider_id } => *provider_id,
            ViewScope::Participant { provider_id, .. } => *provider_id,
        }
    }

    /// The read predicate applied at the store boundary.
    fn read_filter(&self) -> AppointmentFilter {
        match self {
            ViewScope::Owner { provider_id } => AppointmentFilter {
                provider_id: Some(*provider_id),
                ..Default::default()
            },
            ViewScope::Participant {
                requester_id,
                provider_id,
            } => AppointmentFilter {
                provider_id: Some(*provider_id),
                requester_id: Some(*requester_id),
                ..Default::default()
            },
        }
    }

    fn can_see(&self, appointment: &Appointment) -> bool {
        match self {
            ViewScope::Owner { provider_id } => appointment.provider_id == *provider_id,
            ViewScope::Participant {
                requester_id,
                provider_id,
            } => {
                appointment.provider_id == *provider_id
                    && appointment.requester_id == *requester_id
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Not authorized: {0}")]
    Forbidden(String),

    #[error("Cannot {operation} an appointment that is {actual}; requires {required}")]
    InvalidTransition {
        operation: &'static str,
        required: &'static str,
        actual: &'static str,
    },

    #[error("Appointment {0} not found")]
    NotFound(Uuid),

    #[error("Invalid booking: {0}")]
    InvalidBooking(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Uniform result surface. Callers read `success` and `message`; they never
/// match on error types and nothing escapes this boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    pub appointment: Option<Appointment>,
}

impl ActionOutcome {
    fn ok(message: impl Into<String>, appointment: Appointment) -> Self {
        Self {
            success: true,
            message: message.into(),
            appointment: Some(appointment),
        }
    }

    fn failure(error: AgendaError) -> Self {
        let message = match &error {
            AgendaError::Database(DatabaseError::Conflict { .. }) => {
                "The appointment was changed by someone else; reload and try again".into()
            }
            _ => error.to_string(),
        };
        Self {
            success: false,
            message,
            appointment: None,
        }
    }
}

// ═══════════════════════════════════════════
// Booking request
// ═══════════════════════════════════════════

/// Input for creating an appointment.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub modality: SessionModality,
    pub video_link: Option<String>,
    pub price_cents: Option<i64>,
    pub notes: Option<String>,
    /// Required in owner scope (manual entry); ignored in participant scope.
    pub requester_id: Option<Uuid>,
}

// ═══════════════════════════════════════════
// Transitions
// ═══════════════════════════════════════════

enum Transition<'a> {
    Confirm,
    Reject { reason: Option<&'a str> },
    Start,
    Finish { notes: Option<&'a str> },
    MarkNoShow,
    Cancel { reason: Option<&'a str> },
}

impl Transition<'_> {
    fn operation(&self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::Reject { .. } => "reject",
            Transition::Start => "start",
            Transition::Finish { .. } => "finish",
            Transition::MarkNoShow => "mark as no-show",
            Transition::Cancel { .. } => "cancel",
        }
    }

    fn target(&self) -> AppointmentStatus {
        match self {
            Transition::Confirm => AppointmentStatus::Confirmed,
            Transition::Reject { .. } => AppointmentStatus::Rejected,
            Transition::Start => AppointmentStatus::InProgress,
            Transition::Finish { .. } => AppointmentStatus::Completed,
            Transition::MarkNoShow => AppointmentStatus::NoShow,
            Transition::Cancel { .. } => AppointmentStatus::Cancelled,
        }
    }

    /// Statuses the appointment must currently hold. `start` deliberately
    /// requires a confirmed appointment rather than any active one.
    fn required(&self) -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;
        match self {
            Transition::Confirm | Transition::Reject { .. } => &[Scheduled],
            Transition::Start => &[Confirmed],
            Transition::Finish { .. } => &[InProgress],
            Transition::MarkNoShow => &[Scheduled, Confirmed],
            Transition::Cancel { .. } => &[Scheduled, Confirmed, InProgress],
        }
    }

    fn required_label(&self) -> &'static str {
        match self {
            Transition::Confirm | Transition::Reject { .. } => "a scheduled appointment",
            Transition::Start => "a confirmed appointment",
            Transition::Finish { .. } => "a session in progress",
            Transition::MarkNoShow => "a scheduled or confirmed appointment",
            Transition::Cancel { .. } => "an active appointment",
        }
    }

    /// Everything except cancellation is reserved for the provider.
    fn owner_only(&self) -> bool {
        !matches!(self, Transition::Cancel { .. })
    }

    fn reason(&self) -> Option<&str> {
        match self {
            Transition::Reject { reason } | Transition::Cancel { reason } => *reason,
            _ => None,
        }
    }

    fn notes(&self) -> Option<&str> {
        match self {
            Transition::Finish { notes } => *notes,
            _ => None,
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            Transition::Confirm => "Appointment confirmed",
            Transition::Reject { .. } => "Appointment rejected",
            Transition::Start => "Session started",
            Transition::Finish { .. } => "Session completed",
            Transition::MarkNoShow => "Appointment marked as no-show",
            Transition::Cancel { .. } => "Appointment cancelled",
        }
    }
}

// ═══════════════════════════════════════════
// Controller
// ═══════════════════════════════════════════

pub struct AgendaController<'a> {
    conn: &'a Connection,
    channel: &'a dyn NotificationChannel,
    scope: ViewScope,
    cursor: AgendaCursor,
}

impl<'a> AgendaController<'a> {
    /// The provider's own full agenda.
    pub fn owner(
        conn: &'a Connection,
        channel: &'a dyn NotificationChannel,
        provider_id: Uuid,
    ) -> Self {
        Self {
            conn,
            channel,
            scope: ViewScope::Owner { provider_id },
            cursor: AgendaCursor::today(),
        }
    }

    /// A requester's view onto one provider's calendar.
    pub fn participant(
        conn: &'a Connection,
        channel: &'a dyn NotificationChannel,
        requester_id: Uuid,
        provider_id: Uuid,
    ) -> Self {
        Self {
            conn,
            channel,
            scope: ViewScope::Participant {
                requester_id,
                provider_id,
            },
            cursor: AgendaCursor::today(),
        }
    }

    pub fn scope(&self) -> ViewScope {
        self.scope
    }

    pub fn cursor(&self) -> &AgendaCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut AgendaCursor {
        &mut self.cursor
    }

    // ─── Lifecycle operations ───────────────────────

    pub fn confirm(&self, appointment_id: &Uuid) -> ActionOutcome {
        self.transition(appointment_id, Transition::Confirm)
    }

    pub fn reject(&self, appointment_id: &Uuid, reason: Option<&str>) -> ActionOutcome {
        self.transition(appointment_id, Transition::Reject { reason })
    }

    pub fn start(&self, appointment_id: &Uuid) -> ActionOutcome {
        self.transition(appointment_id, Transition::Start)
    }

    pub fn finish(&self, appointment_id: &Uuid, notes: Option<&str>) -> ActionOutcome {
        self.transition(appointment_id, Transition::Finish { notes })
    }

    pub fn mark_no_show(&self, appointment_id: &Uuid) -> ActionOutcome {
        self.transition(appointment_id, Transition::MarkNoShow)
    }

    pub fn cancel(&self, appointment_id: &Uuid, reason: Option<&str>) -> ActionOutcome {
        self.transition(appointment_id, Transition::Cancel { reason })
    }

    fn transition(&self, appointment_id: &Uuid, t: Transition) -> ActionOutcome {
        match self.apply_transition(appointment_id, &t) {
            Ok(appointment) => ActionOutcome::ok(t.success_message(), appointment),
            Err(e) => {
                tracing::debug!(
                    "Refused to {} appointment {appointment_id}: {e}",
                    t.operation()
                );
                ActionOutcome::failure(e)
            }
        }
    }

    fn apply_transition(
        &self,
        appointment_id: &Uuid,
        t: &Transition,
    ) -> Result<Appointment, AgendaError> {
        let appointment = self.load_scoped(appointment_id)?;

        if t.owner_only() && matches!(self.scope, ViewScope::Participant { .. }) {
            return Err(AgendaError::Forbidden(format!(
                "only the provider may {}",
                t.operation()
            )));
        }

        if !t.required().contains(&appointment.status) {
            return Err(AgendaError::InvalidTransition {
                operation: t.operation(),
                required: t.required_label(),
                actual: appointment.status.as_str(),
            });
        }

        // Conditioned on the status we just observed: a racing writer that
        // gets there first leaves us with a Conflict, not a silent overwrite.
        let change = StatusChange {
            to: t.target(),
            status_reason: t.reason(),
            notes: t.notes(),
        };
        let updated = update_status_checked(self.conn, appointment_id, appointment.status, &change)?;

        self.notify_transition(&updated, t);
        Ok(updated)
    }

    /// Scoped read. Rows outside the caller's view read as missing so a
    /// participant can never probe other requesters' bookings.
    fn load_scoped(&self, appointment_id: &Uuid) -> Result<Appointment, AgendaError> {
        let appointment = match get_appointment(self.conn, appointment_id) {
            Ok(appointment) => appointment,
            Err(DatabaseError::NotFound { .. }) => {
                return Err(AgendaError::NotFound(*appointment_id))
            }
            Err(e) => return Err(e.into()),
        };
        if !self.scope.can_see(&appointment) {
            return Err(AgendaError::NotFound(*appointment_id));
        }
        Ok(appointment)
    }

    /// Confirmation and cancellation carry a counterpart notice. Best
    /// effort: a refused notice never fails the transition.
    fn notify_transition(&self, appointment: &Appointment, t: &Transition) {
        let (kind, recipient_id) = match t {
            Transition::Confirm => (ReminderKind::Confirmation, appointment.requester_id),
            Transition::Cancel { .. } => {
                let recipient = match self.scope {
                    ViewScope::Owner { .. } => appointment.requester_id,
                    ViewScope::Participant { .. } => appointment.provider_id,
                };
                (ReminderKind::Cancellation, recipient)
            }
            _ => return,
        };

        let now = Local::now().naive_local();
        let reminder = Reminder {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            kind,
            recipient_id,
            scheduled_for: now,
            custom_message: t.reason().map(str::to_string),
            delivery_status: DeliveryStatus::Pending,
            sent_at: None,
            created_at: now,
        };
        if let Err(e) = insert_reminder(self.conn, &reminder) {
            tracing::warn!(
                "Could not record {} notice for appointment {}: {e}",
                kind.as_str(),
                appointment.id
            );
            return;
        }

        let report = reminders::process(self.conn, self.channel, &reminder.id);
        if report.outcome != DispatchOutcome::Delivered {
            tracing::warn!(
                "{} notice for appointment {} not delivered: {}",
                kind.as_str(),
                appointment.id,
                report.message
            );
        }
    }

    // ─── Booking ───────────────────────

    /// Creates an appointment in `Scheduled` and schedules its reminder set.
    /// Reminder scheduling is a separate failure domain: the booking still
    /// succeeds when it fails, with a warning in the message.
    pub fn book(&self, request: &BookingRequest) -> ActionOutcome {
        match self.apply_booking(request) {
            Ok((appointment, warning)) => ActionOutcome {
                success: true,
                message: warning.unwrap_or_else(|| "Appointment requested".into()),
                appointment: Some(appointment),
            },
            Err(e) => {
                tracing::debug!("Refused booking: {e}");
                ActionOutcome::failure(e)
            }
        }
    }

    fn apply_booking(
        &self,
        request: &BookingRequest,
    ) -> Result<(Appointment, Option<String>), AgendaError> {
        let requester_id = match self.scope {
            ViewScope::Participant { requester_id, .. } => requester_id,
            ViewScope::Owner { .. } => request.requester_id.ok_or_else(|| {
                AgendaError::InvalidBooking("a requester is required".into())
            })?,
        };

        let now = Local::now().naive_local();
        if request.start_at >= request.end_at {
            return Err(AgendaError::InvalidBooking(
                "the session must end after it starts".into(),
            ));
        }
        if request.start_at <= now {
            return Err(AgendaError::InvalidBooking(
                "the session must start in the future".into(),
            ));
        }

        let provider_id = self.scope.provider_id();
        if overlapping_exists(self.conn, &provider_id, request.start_at, request.end_at)? {
            return Err(AgendaError::InvalidBooking(
                "the requested time overlaps an existing session".into(),
            ));
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            provider_id,
            requester_id,
            start_at: request.start_at,
            end_at: request.end_at,
            status: AppointmentStatus::Scheduled,
            modality: request.modality,
            video_link: request.video_link.clone(),
            price_cents: request.price_cents,
            notes: request.notes.clone(),
            status_reason: None,
            created_at: now,
            updated_at: now,
        };
        insert_appointment(self.conn, &appointment)?;
        tracing::info!(
            "Booked appointment {} with provider {provider_id}",
            appointment.id
        );

        let warning =
            match reminders::schedule_for_booking(self.conn, self.channel, &appointment, now) {
                Ok(summary) if summary.booking_ack.outcome == DispatchOutcome::Failed => Some(
                    "Appointment requested; the acknowledgement could not be delivered yet"
                        .to_string(),
                ),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(
                        "Reminder scheduling failed for appointment {}: {e}",
                        appointment.id
                    );
                    Some("Appointment requested; reminders could not be scheduled".to_string())
                }
            };

        Ok((appointment, warning))
    }

    // ─── Derived queries ───────────────────────

    /// Every appointment visible in this scope, earliest start first.
    pub fn list(&self) -> Result<Vec<Appointment>, DatabaseError> {
        list_appointments(self.conn, &self.scope.read_filter())
    }

    /// Appointments whose start falls on the given local calendar day.
    pub fn appointments_on_date(&self, date: NaiveDate) -> Result<Vec<Appointment>, DatabaseError> {
        let mut filter = self.scope.read_filter();
        filter.date_from = Some(date);
        filter.date_to = Some(date);
        list_appointments(self.conn, &filter)
    }

    /// Appointments on the cursor's current date.
    pub fn appointments_on_current_date(&self) -> Result<Vec<Appointment>, DatabaseError> {
        self.appointments_on_date(self.cursor.current())
    }

    /// The earliest future session that is still active.
    pub fn next_appointment(&self) -> Result<Option<Appointment>, DatabaseError> {
        let now = Local::now().naive_local();
        let all = list_appointments(self.conn, &self.scope.read_filter())?;
        Ok(all
            .into_iter()
            .find(|a| a.start_at > now && !a.status.is_terminal()))
    }

    /// Open availability for the scoped provider on a date.
    pub fn free_slots_on_date(&self, date: NaiveDate) -> Result<Vec<FreeSlot>, DatabaseError> {
        slots::free_slots_on_date(self.conn, &self.scope.provider_id(), date)
    }
}
