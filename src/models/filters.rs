use chrono::NaiveDate;
use uuid::Uuid;

use super::enums::AppointmentStatus;

#[derive(Debug, Default)]
pub struct AppointmentFilter {
    pub provider_id: Option<Uuid>,
    pub requester_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}
