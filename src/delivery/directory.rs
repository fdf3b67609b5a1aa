//! Filesystem adapter: each channel is a directory under a root.
//!
//! Layout: `<root>/<channel>/<filename>` for channel posts,
//! `<root>/<channel>/replies/<message>-<filename>` for replies and
//! `<root>/<channel>/interactions/<interaction>-<filename>` for interaction
//! responses. Useful for previews and for bots that hand files to another
//! process.

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use log::debug;

use super::{Attachment, AttachmentDelivery, InteractionHandle, MessageHandle};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    root: PathBuf,
}

impl DirectoryDelivery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write(&self, channel_id: &str, sub: Option<&str>, filename: String, data: &[u8]) -> Result<()> {
        let mut dir = self.root.join(path_component(channel_id)?);
        if let Some(sub) = sub {
            dir.push(sub);
        }
        let path = dir.join(path_component(&filename)?);

        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(&path, data).await?;
        debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

/// Ids and filenames become single path components; reject anything that
/// could escape the root.
fn path_component(name: &str) -> Result<&str> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(Error::DeliveryError(format!("invalid path component '{}'", name)));
    }
    Ok(name)
}

impl AttachmentDelivery for DirectoryDelivery {
    fn send_image_to_channel<'a>(
        &'a self,
        channel_id: &'a str,
        attachment: Attachment,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.write(channel_id, None, attachment.filename, &attachment.data).await
        })
    }

    fn reply_with_image<'a>(
        &'a self,
        message: &'a MessageHandle,
        attachment: Attachment,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let channel_id = message.reply_channel()?;
            let name = format!("{}-{}", message.id, attachment.filename);
            self.write(channel_id, Some("replies"), name, &attachment.data).await
        })
    }

    fn send_image_as_attachment<'a>(
        &'a self,
        interaction: &'a InteractionHandle,
        attachment: Attachment,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            interaction.ensure_reply()?;
            let name = format!("{}-{}", interaction.id, attachment.filename);
            self.write(&interaction.channel_id, Some("interactions"), name, &attachment.data)
                .await
        })
    }
}
