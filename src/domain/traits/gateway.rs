use async_trait::async_trait;
use crate::application::errors::BotError;
use crate::domain::entities::Event;

/// Gateway trait - abstraction for the chat platform connection
///
/// The connection itself (auth, reconnects, rate limits) lives behind this
/// trait. The host only pulls decoded events from it.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Connect and begin delivering events
    async fn start(&self) -> Result<(), BotError>;

    /// Next decoded event, or `None` once the gateway is closed
    async fn next_event(&self) -> Option<Box<dyn Event>>;

    /// Get gateway info
    fn info(&self) -> GatewayInfo;
}

/// Outbound side of a conversation; handed to command hooks for replies
pub trait Channel: Send + Sync {
    fn id(&self) -> &str;

    fn send(&self, text: &str) -> Result<(), BotError>;
}

/// Gateway information
#[derive(Debug, Clone)]
pub struct GatewayInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
