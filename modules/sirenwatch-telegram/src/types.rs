use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// One channel message as delivered by the session client.
#[derive(Debug, Clone)]
pub struct Message {
    /// Message id within the channel; also the paging cursor for history.
    pub id: i64,
    /// Delivery timestamp reported by the channel.
    pub date: DateTime<Utc>,
    /// Message text. `None` for non-text content (photos, stickers, ...).
    pub text: Option<String>,
    /// True for posts forwarded from another channel.
    pub forwarded: bool,
}

/// A live update event from the client session.
#[derive(Debug, Clone)]
pub enum Update {
    /// A message newly posted to the channel.
    NewMessage(Message),
    /// Any other protocol event. Consumers interested in messages skip these.
    Other,
}

/// Handle to the live update subscription: an inbound queue of events.
///
/// The queue stays open for the lifetime of the session. Closure while a
/// consumer is still listening is an upstream protocol violation, not a
/// normal end-of-stream.
#[derive(Debug)]
pub struct UpdateListener {
    pub updates: mpsc::Receiver<Update>,
}
