use async_trait::async_trait;

use crate::channel::{ChatChannel, OutgoingMessage};
use crate::error::Result;

/// Prints messages to stdout; used for dry runs without a chat token
#[derive(Debug, Default)]
pub struct ConsoleChannel;

impl ConsoleChannel {
    pub fn new() -> Self {
        Self
    }

    pub fn render(message: &OutgoingMessage) -> String {
        match message {
            OutgoingMessage::Text(content) => content.clone(),
            OutgoingMessage::Embed { title, body, .. } => format!("[{}]\n{}", title, body),
        }
    }
}

#[async_trait]
impl ChatChannel for ConsoleChannel {
    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        println!("{}", Self::render(&message));
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
