//! Outbound transport.

use async_trait::async_trait;

use crate::dialogue::prompts::Reply;
use crate::error::{BotError, Result};

use super::send::to_send_request;

/// Delivers replies to a user.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, recipient: &str, reply: &Reply) -> Result<()>;
}

/// Messenger Platform Send API client.
pub struct GraphMessenger {
    client: reqwest::Client,
    messages_url: String,
    page_access_token: String,
}

impl GraphMessenger {
    pub fn new(graph_api_url: &str, page_access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            messages_url: format!("{}/me/messages", graph_api_url.trim_end_matches('/')),
            page_access_token: page_access_token.into(),
        }
    }
}

#[async_trait]
impl Messenger for GraphMessenger {
    async fn send(&self, recipient: &str, reply: &Reply) -> Result<()> {
        let request = to_send_request(recipient, reply);

        let response = self
            .client
            .post(&self.messages_url)
            .query(&[("access_token", self.page_access_token.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::SendApi { status, body });
        }

        tracing::debug!("Delivered message to {}", recipient);
        Ok(())
    }
}
