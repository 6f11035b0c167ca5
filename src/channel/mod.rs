pub mod console;
pub mod discord;

use async_trait::async_trait;

use crate::error::Result;

pub use console::ConsoleChannel;
pub use discord::DiscordChannel;

pub const COLOR_OK: u32 = 0x2ecc71;
pub const COLOR_WARNING: u32 = 0xf1c40f;
pub const COLOR_ERROR: u32 = 0xe74c3c;

/// A message ready for the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
    Text(String),
    Embed {
        title: String,
        body: String,
        color: u32,
    },
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        OutgoingMessage::Text(content.into())
    }

    pub fn embed(title: impl Into<String>, body: impl Into<String>, color: u32) -> Self {
        OutgoingMessage::Embed {
            title: title.into(),
            body: body.into(),
            color,
        }
    }

    /// Error reply in the platform's error color
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::embed(title, body, COLOR_ERROR)
    }

    /// Main text: the content of a text message, the body of an embed
    pub fn body(&self) -> &str {
        match self {
            OutgoingMessage::Text(content) => content,
            OutgoingMessage::Embed { body, .. } => body,
        }
    }
}

/// Destination of every bot message (match reports, warnings, replies)
#[async_trait]
pub trait ChatChannel: Send + Sync {
    async fn send(&self, message: OutgoingMessage) -> Result<()>;

    /// Get channel name
    fn name(&self) -> &str;
}
