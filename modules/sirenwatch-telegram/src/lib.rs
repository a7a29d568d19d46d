//! The external-client boundary: wire types for channel messages and live
//! update events, plus the narrow async trait the scrape engine consumes.
//! The real network/session client lives outside this workspace; tests use
//! the scripted stub in `sirenwatch-scraper`.

pub mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::{Message, Update, UpdateListener};
