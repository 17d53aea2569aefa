use std::fmt;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use super::Actor;
use crate::domain::traits::Channel;

/// A chat message delivered by the gateway
#[derive(Clone)]
pub struct MessageReceived {
    pub id: String,
    pub actor: Actor,
    pub text: String,
    pub channel: Arc<dyn Channel>,
    pub timestamp: DateTime<Utc>,
    pub platform: String,
}

impl MessageReceived {
    pub fn new(actor: Actor, text: impl Into<String>, channel: Arc<dyn Channel>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            actor,
            text: text.into(),
            channel,
            timestamp: Utc::now(),
            platform: "unknown".to_string(),
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn reply(&self, text: &str) -> Result<(), crate::application::errors::BotError> {
        self.channel.send(text)
    }
}

impl fmt::Debug for MessageReceived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageReceived")
            .field("id", &self.id)
            .field("actor", &self.actor)
            .field("text", &self.text)
            .field("channel", &self.channel.id())
            .field("timestamp", &self.timestamp)
            .field("platform", &self.platform)
            .finish()
    }
}
