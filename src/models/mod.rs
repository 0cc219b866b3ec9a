pub mod appointment;
pub mod availability;
pub mod enums;
pub mod filters;
pub mod participant;
pub mod reminder;

pub use appointment::Appointment;
pub use availability::{AvailabilityWindow, ScheduleBlock};
pub use filters::AppointmentFilter;
pub use participant::{ContactCard, Provider, Requester};
pub use reminder::Reminder;
