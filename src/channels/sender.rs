//! The narrow outbound interface the engine consumes.

use async_trait::async_trait;

use crate::error::ChannelError;

/// Delivers a text message to a user identity.
///
/// The engine treats a failed send as a reportable failure and abandons the
/// in-flight multi-step action at the point of failure.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Channel name for logs and error reports.
    fn name(&self) -> &str;

    /// Send `text` to `user`. `Ok(())` means the channel accepted delivery.
    async fn send(&self, text: &str, user: &str) -> Result<(), ChannelError>;
}
