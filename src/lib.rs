pub mod agenda;
pub mod config;
pub mod db;
pub mod models;
pub mod notify;
pub mod reminders;

pub use agenda::{ActionOutcome, AgendaController, AgendaCursor, BookingRequest, ViewScope};
pub use db::{open_database, open_memory_database, DatabaseError};
pub use notify::{ConsoleChannel, NotificationChannel};
pub use reminders::{DispatchOutcome, DispatchReport};

use tracing_subscriber::EnvFilter;

/// Initialize tracing with RUST_LOG, falling back to the crate default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
