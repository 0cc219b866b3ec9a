use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DeliveryStatus, ReminderKind};

/// A scheduled notification event tied to one appointment and one recipient.
///
/// Rows are an audit trail: delivery outcome is recorded in place and rows
/// are never deleted. For offset kinds `scheduled_for` never exceeds the
/// appointment start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub kind: ReminderKind,
    pub recipient_id: Uuid,
    pub scheduled_for: NaiveDateTime,
    pub custom_message: Option<String>,
    pub delivery_status: DeliveryStatus,
    pub sent_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}
