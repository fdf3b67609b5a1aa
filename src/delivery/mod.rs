//! Attachment delivery: posting rendered images to chat platforms.
//!
//! Each chat client library gets one adapter implementing
//! [`AttachmentDelivery`]. The render path never calls these; application
//! code does after a successful render.

pub mod directory;

use std::sync::{Mutex, PoisonError};

use futures::future::{self, BoxFuture};

use crate::{Error, Result};

pub use directory::DirectoryDelivery;

pub const DEFAULT_FILENAME: &str = "image.png";

/// Image bytes plus the filename shown in the chat client.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Attachment {
    /// Attachment named `image.png`.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            data: data.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

/// A received message, as much of it as adapters need.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageHandle {
    pub id: String,
    pub channel_id: Option<String>,
    /// Whether the platform lets us reply to this message
    pub can_reply: bool,
}

impl MessageHandle {
    pub fn new(id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel_id: Some(channel_id.into()),
            can_reply: true,
        }
    }

    pub(crate) fn reply_channel(&self) -> Result<&str> {
        if !self.can_reply {
            return Err(Error::DeliveryError("Message does not support reply".into()));
        }
        self.channel_id
            .as_deref()
            .ok_or_else(|| Error::DeliveryError("Unable to determine channel ID from message".into()))
    }
}

/// A slash-command style interaction awaiting a response.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionHandle {
    pub id: String,
    pub channel_id: String,
    pub can_reply: bool,
}

impl InteractionHandle {
    pub fn new(id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            can_reply: true,
        }
    }

    pub(crate) fn ensure_reply(&self) -> Result<()> {
        if self.can_reply {
            Ok(())
        } else {
            Err(Error::DeliveryError("Interaction does not support reply".into()))
        }
    }
}

/// Uniform capability interface over chat-platform clients.
pub trait AttachmentDelivery: Send + Sync {
    fn send_image_to_channel<'a>(
        &'a self,
        channel_id: &'a str,
        attachment: Attachment,
    ) -> BoxFuture<'a, Result<()>>;

    fn reply_with_image<'a>(
        &'a self,
        message: &'a MessageHandle,
        attachment: Attachment,
    ) -> BoxFuture<'a, Result<()>>;

    fn send_image_as_attachment<'a>(
        &'a self,
        interaction: &'a InteractionHandle,
        attachment: Attachment,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Where a [`MemoryDelivery`] delivery went.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryTarget {
    Channel(String),
    Reply { channel_id: String, message_id: String },
    Interaction(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub target: DeliveryTarget,
    pub attachment: Attachment,
}

/// Records deliveries in memory; a dry-run adapter and a test double.
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    sent: Mutex<Vec<Delivery>>,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, target: DeliveryTarget, attachment: Attachment) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Delivery { target, attachment });
    }
}

impl AttachmentDelivery for MemoryDelivery {
    fn send_image_to_channel<'a>(
        &'a self,
        channel_id: &'a str,
        attachment: Attachment,
    ) -> BoxFuture<'a, Result<()>> {
        self.record(DeliveryTarget::Channel(channel_id.to_string()), attachment);
        Box::pin(future::ready(Ok(())))
    }

    fn reply_with_image<'a>(
        &'a self,
        message: &'a MessageHandle,
        attachment: Attachment,
    ) -> BoxFuture<'a, Result<()>> {
        let res = message.reply_channel().map(|channel_id| {
            self.record(
                DeliveryTarget::Reply {
                    channel_id: channel_id.to_string(),
                    message_id: message.id.clone(),
                },
                attachment,
            );
        });
        Box::pin(future::ready(res))
    }

    fn send_image_as_attachment<'a>(
        &'a self,
        interaction: &'a InteractionHandle,
        attachment: Attachment,
    ) -> BoxFuture<'a, Result<()>> {
        let res = interaction.ensure_reply().map(|()| {
            self.record(DeliveryTarget::Interaction(interaction.id.clone()), attachment);
        });
        Box::pin(future::ready(res))
    }
}
