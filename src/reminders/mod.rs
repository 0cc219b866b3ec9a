//! Reminder scheduling and dispatch.

pub mod dispatcher;
pub mod scheduler;

pub use dispatcher::{process, DispatchOutcome, DispatchReport};
pub use scheduler::{schedule_for_booking, ScheduleSummary};
