//! Notification channel seam.
//!
//! Delivery itself is a black box behind `NotificationChannel`; this module
//! owns the payload shape (data only, no markup) and a console-backed
//! implementation for installs with no delivery backend configured.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::{ReminderKind, SessionModality};
use crate::models::ContactCard;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Everything a channel needs to render a notification. Markup and
/// templating live on the channel's side of the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub appointment_id: Uuid,
    pub kind: ReminderKind,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub modality: SessionModality,
    pub video_link: Option<String>,
    pub provider_name: String,
    pub requester_name: String,
    pub custom_message: Option<String>,
}

/// Returned by a channel on successful delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelReceipt {
    pub channel_message_id: String,
}

/// One per delivery backend. Self-contained, independently testable.
pub trait NotificationChannel: Send + Sync {
    fn send(
        &self,
        recipient: &ContactCard,
        kind: ReminderKind,
        payload: &ReminderPayload,
    ) -> Result<ChannelReceipt, NotifyError>;
}

/// Logs deliveries instead of sending them. Default for local-first
/// installs where no mail or push backend is configured.
pub struct ConsoleChannel;

impl NotificationChannel for ConsoleChannel {
    fn send(
        &self,
        recipient: &ContactCard,
        kind: ReminderKind,
        payload: &ReminderPayload,
    ) -> Result<ChannelReceipt, NotifyError> {
        let body = serde_json::to_string(payload)
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        tracing::info!(
            recipient = %recipient.email,
            kind = kind.as_str(),
            %body,
            "Console notification"
        );
        Ok(ChannelReceipt {
            channel_message_id: format!("console-{}", Uuid::new_v4()),
        })
    }
}
