use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AppointmentStatus, SessionModality};

/// A scheduled session between a provider and a requester.
///
/// Created in `Scheduled` by a booking action, mutated only through agenda
/// transitions, never deleted. Terminal statuses end the lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub requester_id: Uuid,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub modality: SessionModality,
    pub video_link: Option<String>,
    pub price_cents: Option<i64>,
    pub notes: Option<String>,
    /// Free-text reason recorded by reject/cancel.
    pub status_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
