//! Outbound delivery to the end user.

pub mod sender;
pub mod whatsapp;

pub use sender::MessageSender;
pub use whatsapp::{WhatsAppChannel, WhatsAppConfig};
