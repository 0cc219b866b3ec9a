//! Repository layer: entity-scoped database operations.
//!
//! Plain functions over `&Connection`, one sub-module per entity. All public
//! functions are re-exported here.

mod appointment;
mod availability;
mod participant;
mod reminder;

use chrono::{NaiveDateTime, NaiveTime};
use uuid::Uuid;

use super::DatabaseError;

pub use appointment::*;
pub use availability::*;
pub use participant::*;
pub use reminder::*;

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const TIME_FORMAT: &str = "%H:%M";

pub(crate) fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_ts(value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid timestamp {value}: {e}")))
}

pub(crate) fn parse_time(value: &str) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid time {value}: {e}")))
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
