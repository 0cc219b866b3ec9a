use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ParticipantRole;

/// The service-delivering participant; owns their agenda view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub specialty: Option<String>,
    pub created_at: NaiveDateTime,
}

/// The participant who books time with a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requester {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

/// Contact info resolved for notification delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactCard {
    pub email: String,
    pub display_name: String,
    pub role: ParticipantRole,
}
