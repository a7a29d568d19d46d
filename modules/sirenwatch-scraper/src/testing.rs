// Test support for the scrape engine.
//
// StubTelegramClient scripts both client operations:
// - history pages are served newest-first, one per call, from a preloaded
//   queue; a call past the end fails loudly so a test notices a missing
//   horizon message;
// - the live queue is preloaded with updates and stays open afterwards, so
//   cancellation paths behave like a real session. `close_live()` simulates
//   the upstream dropping the stream.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tokio::sync::mpsc;

use sirenwatch_telegram::{Message, TelegramClient, Update, UpdateListener};

// ---------------------------------------------------------------------------
// StubTelegramClient
// ---------------------------------------------------------------------------

pub struct StubTelegramClient {
    history: Mutex<VecDeque<Message>>,
    listener: Mutex<Option<UpdateListener>>,
    live_tx: Mutex<Option<mpsc::Sender<Update>>>,
}

impl StubTelegramClient {
    /// `history` newest-first, as the channel serves it; `live` in delivery
    /// order.
    pub fn new(history: Vec<Message>, live: Vec<Update>) -> Self {
        let (tx, rx) = mpsc::channel(live.len().max(1));
        for update in live {
            tx.try_send(update).expect("live updates fit the buffer");
        }
        Self {
            history: Mutex::new(history.into()),
            listener: Mutex::new(Some(UpdateListener { updates: rx })),
            live_tx: Mutex::new(Some(tx)),
        }
    }

    /// Close the live queue, simulating an upstream protocol violation.
    pub fn close_live(&self) {
        self.live_tx.lock().unwrap().take();
    }
}

#[async_trait]
impl TelegramClient for StubTelegramClient {
    async fn chat_history(
        &self,
        _chat_id: i64,
        _from_message_id: i64,
        _limit: u32,
    ) -> Result<Vec<Message>> {
        match self.history.lock().unwrap().pop_front() {
            Some(message) => Ok(vec![message]),
            None => bail!("unexpected history call: script the oldest message before the horizon"),
        }
    }

    fn listener(&self) -> UpdateListener {
        self.listener
            .lock()
            .unwrap()
            .take()
            .expect("listener already taken")
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Text message with a given id and delivery time.
pub fn text_message(id: i64, text: &str, date: DateTime<Utc>) -> Message {
    Message {
        id,
        date,
        text: Some(text.to_string()),
        forwarded: false,
    }
}

/// Parse "YYYY-MM-DD HH:MM:SS" in the Kyiv channel timezone.
pub fn kyiv_date(datetime: &str) -> DateTime<Utc> {
    let naive = NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|e| panic!("failed to parse date '{datetime}': {e}"));
    chrono_tz::Europe::Kyiv
        .from_local_datetime(&naive)
        .single()
        .unwrap_or_else(|| panic!("date '{datetime}' is ambiguous in Europe/Kyiv"))
        .with_timezone(&Utc)
}
