use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Message, UpdateListener};

/// The capabilities the scrape engine needs from a Telegram session client.
///
/// Implementations wrap a real TDLib session in the hosting process;
/// `StubTelegramClient` in `sirenwatch-scraper` scripts both operations for
/// tests.
#[async_trait]
pub trait TelegramClient: Send + Sync {
    /// Fetch one page of channel history, walking backward in time from
    /// `from_message_id` (0 means "start at the most recent message").
    /// Returns newest-first within the page. May return fewer messages than
    /// `limit`; an empty page means the history is exhausted.
    async fn chat_history(
        &self,
        chat_id: i64,
        from_message_id: i64,
        limit: u32,
    ) -> Result<Vec<Message>>;

    /// Subscribe to the live update feed. Called once per engine run.
    fn listener(&self) -> UpdateListener;
}
