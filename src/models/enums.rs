use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Confirmed => "confirmed",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
    Rejected => "rejected",
    NoShow => "no_show",
});

str_enum!(SessionModality {
    Online => "online",
    InPerson => "in_person",
    Phone => "phone",
});

str_enum!(ReminderKind {
    BookingReceived => "booking_received",
    Confirmation => "confirmation",
    Reminder24h => "reminder_24h",
    Reminder1h => "reminder_1h",
    Cancellation => "cancellation",
});

str_enum!(DeliveryStatus {
    Pending => "pending",
    Sent => "sent",
    Failed => "failed",
    Skipped => "skipped",
});

str_enum!(ParticipantRole {
    Provider => "provider",
    Requester => "requester",
});

impl AppointmentStatus {
    /// Legal outgoing edges from this status. Every write path consults
    /// this table; there is no other encoding of the lifecycle graph.
    pub fn allowed_next(&self) -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;
        match self {
            Scheduled => &[Confirmed, Rejected, Cancelled, NoShow],
            Confirmed => &[InProgress, Cancelled, NoShow],
            InProgress => &[Completed, Cancelled],
            Completed | Cancelled | Rejected | NoShow => &[],
        }
    }

    /// A terminal status has no outgoing edges.
    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.allowed_next().contains(&next)
    }
}
