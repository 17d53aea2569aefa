//! Console adapter for development/testing

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use crate::application::errors::BotError;
use crate::domain::entities::{Actor, Event, MessageReceived};
use crate::domain::traits::{Channel, Gateway, GatewayInfo};

/// Id of the actor typing into the console
pub const CONSOLE_ACTOR: &str = "console";

/// Prints replies to stdout
#[derive(Debug, Default)]
pub struct ConsoleChannel;

impl Channel for ConsoleChannel {
    fn id(&self) -> &str {
        "console"
    }

    fn send(&self, text: &str) -> Result<(), BotError> {
        println!("[BOT] {}", text);
        Ok(())
    }
}

/// Console gateway for local development
///
/// Every non-empty input line becomes a [`MessageReceived`] from the console
/// actor, which holds the `admin` role.
pub struct ConsoleGateway<R = BufReader<Stdin>> {
    info: GatewayInfo,
    lines: Mutex<Lines<R>>,
    channel: Arc<dyn Channel>,
    actor: Actor,
}

impl ConsoleGateway {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_reader(name, BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> ConsoleGateway<R> {
    pub fn from_reader(name: impl Into<String>, reader: R) -> Self {
        Self {
            info: GatewayInfo {
                id: "console".to_string(),
                name: name.into(),
                username: "console".to_string(),
            },
            lines: Mutex::new(reader.lines()),
            channel: Arc::new(ConsoleChannel),
            actor: Actor::new(CONSOLE_ACTOR).with_username("console").with_role("admin"),
        }
    }

    pub fn with_channel(mut self, channel: Arc<dyn Channel>) -> Self {
        self.channel = channel;
        self
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Gateway for ConsoleGateway<R> {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console gateway (dev mode)");
        Ok(())
    }

    async fn next_event(&self) -> Option<Box<dyn Event>> {
        let mut lines = self.lines.lock().await;
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let text = line.trim_end_matches('\r');
                    if text.trim().is_empty() {
                        continue;
                    }
                    let msg = MessageReceived::new(self.actor.clone(), text, self.channel.clone())
                        .with_platform("console");
                    return Some(Box::new(msg));
                }
                Ok(None) => return None,
                Err(e) => {
                    tracing::error!("Failed to read console input: {}", e);
                    return None;
                }
            }
        }
    }

    fn info(&self) -> GatewayInfo {
        self.info.clone()
    }
}
