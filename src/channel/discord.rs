use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::channel::{ChatChannel, OutgoingMessage};
use crate::error::{BotError, Result};
use crate::packer::text_len;

const DISCORD_API: &str = "https://discord.com/api/v10";

/// Discord caps embed descriptions separately from message content
const EMBED_BODY_LIMIT: usize = 4096;
const EMBED_TITLE_LIMIT: usize = 256;

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<Embed<'a>>,
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: &'a str,
    color: u32,
}

/// Posts messages to one Discord text channel through the REST API
pub struct DiscordChannel {
    client: Client,
    token: String,
    channel_id: String,
    api_base: String,
    max_message_length: usize,
}

impl DiscordChannel {
    pub fn new(
        token: impl Into<String>,
        channel_id: impl Into<String>,
        max_message_length: usize,
    ) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            token: token.into(),
            channel_id: channel_id.into(),
            api_base: DISCORD_API.to_string(),
            max_message_length,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/channels/{}/messages", self.api_base, self.channel_id)
    }

    /// Reject payloads Discord would refuse anyway
    fn check_limits(&self, message: &OutgoingMessage) -> Result<()> {
        let (len, limit) = match message {
            OutgoingMessage::Text(content) => (text_len(content), self.max_message_length),
            OutgoingMessage::Embed { title, body, .. } => {
                if text_len(title) > EMBED_TITLE_LIMIT {
                    return Err(BotError::Channel(format!(
                        "embed title of {} chars exceeds {}",
                        text_len(title),
                        EMBED_TITLE_LIMIT
                    )));
                }
                (text_len(body), EMBED_BODY_LIMIT)
            }
        };

        if len > limit {
            return Err(BotError::Channel(format!(
                "message of {} chars exceeds the {} char limit",
                len, limit
            )));
        }
        Ok(())
    }

    fn payload(message: &OutgoingMessage) -> CreateMessage<'_> {
        match message {
            OutgoingMessage::Text(content) => CreateMessage {
                content: Some(content.as_str()),
                embeds: Vec::new(),
            },
            OutgoingMessage::Embed { title, body, color } => CreateMessage {
                content: None,
                embeds: vec![Embed {
                    title,
                    description: body,
                    color: *color,
                }],
            },
        }
    }
}

#[async_trait]
impl ChatChannel for DiscordChannel {
    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        self.check_limits(&message)?;

        let response = self
            .client
            .post(self.messages_url())
            .header("Authorization", format!("Bot {}", self.token))
            .json(&Self::payload(&message))
            .send()
            .await
            .map_err(|e| BotError::Channel(format!("Send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(BotError::Channel(format!("HTTP {}: {}", status, detail)));
        }

        tracing::debug!("Sent {} chars to channel {}", text_len(message.body()), self.channel_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "discord"
    }
}
