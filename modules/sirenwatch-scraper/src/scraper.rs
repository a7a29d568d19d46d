use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use sirenwatch_common::config::AIR_ALERT_UA_CHANNEL_ID;
use sirenwatch_common::{Config, SirenwatchError, Status};
use sirenwatch_telegram::{Message, TelegramClient, Update};

use crate::alert_data::AlertData;
use crate::parser::StatusParser;

/// TDLib serves one message per history call no matter the requested limit.
const HISTORY_PAGE_LIMIT: u32 = 1;

/// Named options for [`Scraper`] construction.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ScraperOptions {
    /// Channel to scrape.
    #[builder(default = AIR_ALERT_UA_CHANNEL_ID)]
    pub channel_id: i64,
    /// How far back the history backfill reaches. Default: 48 hours ago.
    #[builder(default = Utc::now() - chrono::Duration::hours(48))]
    pub history_from: DateTime<Utc>,
    /// How long a send on the outbound feed may block before the update is
    /// dropped. Zero means block indefinitely; the whole live path then
    /// stalls if the consumer is too slow.
    #[builder(default = Duration::ZERO)]
    pub update_discard_timeout: Duration,
    /// Timezone the channel reports times in.
    #[builder(default = chrono_tz::Europe::Kyiv)]
    pub timezone: Tz,
}

impl ScraperOptions {
    pub fn from_config(config: &Config) -> Self {
        ScraperOptions::builder()
            .channel_id(config.channel_id)
            .history_from(
                Utc::now()
                    - chrono::Duration::from_std(config.history_window)
                        .expect("history window fits a chrono duration"),
            )
            .update_discard_timeout(config.update_discard_timeout)
            .timezone(config.timezone)
            .build()
    }
}

impl Default for ScraperOptions {
    fn default() -> Self {
        ScraperOptions::builder().build()
    }
}

/// State of the lazily-materialized outbound feed.
enum UpdateFeed {
    /// No consumer has asked for the feed; the run sends nothing.
    Untapped,
    /// A consumer holds the receiver; the run forwards accepted statuses.
    Open(mpsc::Sender<Status>),
    /// The run terminated (or the feed was handed out and then closed).
    Closed,
}

/// Scrapes alert status updates from the channel: one bounded history
/// backfill and an indefinite live listener run concurrently, both merging
/// into a shared [`AlertData`] snapshot. Accepted live changes are
/// republished on the outbound feed from [`update_stream`].
///
/// Each instance performs at most one run; see [`run`].
///
/// [`run`]: Scraper::run
/// [`update_stream`]: Scraper::update_stream
pub struct Scraper {
    client: Arc<dyn TelegramClient>,
    options: ScraperOptions,
    parser: StatusParser,

    started: AtomicBool,
    history_done: watch::Sender<bool>,
    alert_data: Arc<AlertData>,
    feed: Mutex<UpdateFeed>,
}

impl Scraper {
    pub fn new(client: Arc<dyn TelegramClient>, options: ScraperOptions) -> Self {
        let (history_done, _) = watch::channel(false);
        Self {
            client,
            parser: StatusParser::new(options.timezone),
            alert_data: Arc::new(AlertData::new(options.timezone)),
            options,
            started: AtomicBool::new(false),
            history_done,
            feed: Mutex::new(UpdateFeed::Untapped),
        }
    }

    /// Run the scraper until `shutdown` is cancelled or a fatal error occurs.
    ///
    /// The first call performs the full run and blocks for its duration,
    /// returning the terminal outcome: `Err(Cancelled)` after a clean
    /// shutdown, another error if a sub-task failed. Every later call,
    /// concurrent or sequential, returns `Ok(())` immediately without
    /// repeating the run.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), SirenwatchError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.run_inner(&shutdown).await
    }

    /// Block until the history backfill has completed (successfully or not)
    /// or `shutdown` is cancelled, whichever comes first.
    pub async fn wait_for_history(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<(), SirenwatchError> {
        let mut done = self.history_done.subscribe();
        tokio::select! {
            _ = shutdown.cancelled() => Err(SirenwatchError::Cancelled),
            result = done.wait_for(|done| *done) => {
                result.expect("scraper owns the history latch");
                Ok(())
            }
        }
    }

    /// The live snapshot. Available from construction on; entries reflect
    /// whatever has been merged so far.
    pub fn alert_data(&self) -> Arc<AlertData> {
        Arc::clone(&self.alert_data)
    }

    /// The outbound feed of accepted live status changes, capacity 1.
    ///
    /// Take it before calling [`run`], or at least before the live listener
    /// produces its first item, to avoid missing updates. The stream closes
    /// permanently when the run terminates. If nobody takes the feed, the
    /// run still does all other work and sends nothing.
    ///
    /// # Panics
    ///
    /// When called a second time, or after the run has already closed the
    /// feed; both are caller bugs.
    ///
    /// [`run`]: Scraper::run
    pub fn update_stream(&self) -> mpsc::Receiver<Status> {
        let mut feed = self.feed.lock().expect("update feed lock poisoned");
        match &*feed {
            UpdateFeed::Untapped => {
                let (tx, rx) = mpsc::channel(1);
                *feed = UpdateFeed::Open(tx);
                rx
            }
            _ => panic!("scraper: update_stream() may be called once, before the run ends"),
        }
    }

    async fn run_inner(&self, shutdown: &CancellationToken) -> Result<(), SirenwatchError> {
        info!(channel_id = self.options.channel_id, "Starting air alert scraper");
        let token = shutdown.child_token();

        let history = async {
            let result = self.scrape_history(&token).await;
            // Signal completion unconditionally: wait_for_history callers
            // must never block on a failed backfill.
            self.history_done.send_replace(true);
            if result.is_err() {
                token.cancel();
            }
            result
        };
        let live = async {
            let result = self.listen_updates(&token).await;
            if result.is_err() {
                token.cancel();
            }
            result
        };

        let (history_result, live_result) = tokio::join!(history, live);
        self.close_update_stream();

        // First real error wins over a mere cancellation outcome.
        match (history_result, live_result) {
            (Err(err), _) if !err.is_cancelled() => Err(err),
            (_, Err(err)) if !err.is_cancelled() => Err(err),
            (Err(err), _) | (_, Err(err)) => Err(err),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    async fn scrape_history(&self, token: &CancellationToken) -> Result<(), SirenwatchError> {
        let mut messages = self.messages_for_period(token).await?;
        // The channel serves newest-first; merge oldest-first so later
        // updates supersede earlier ones.
        messages.reverse();
        let scraped = messages.len();
        for message in messages {
            let Some(text) = message.text.as_deref() else {
                continue;
            };
            let Some(mut status) = self.parser.parse(text, message.date)? else {
                continue;
            };
            status.is_history = true;
            debug!(region = %status.region, enabled = status.enabled, "History status");
            self.alert_data.set(status);
        }
        info!(messages = scraped, "History backfill complete");
        Ok(())
    }

    /// Page backward from the most recent message until the history is
    /// exhausted or a message falls behind the configured horizon.
    async fn messages_for_period(
        &self,
        token: &CancellationToken,
    ) -> Result<Vec<Message>, SirenwatchError> {
        let mut messages = Vec::with_capacity(200);
        let mut from_message_id = 0;
        loop {
            if token.is_cancelled() {
                return Err(SirenwatchError::Cancelled);
            }
            let page = self
                .client
                .chat_history(self.options.channel_id, from_message_id, HISTORY_PAGE_LIMIT)
                .await
                .map_err(|e| SirenwatchError::Telegram(format!("{e:#}")))?;
            let Some(message) = page.into_iter().next() else {
                break; // history exhausted; unreachable on a live channel
            };
            if message.date < self.options.history_from {
                break; // past the horizon
            }
            from_message_id = message.id;

            if message.forwarded {
                continue;
            }
            if message.text.is_none() {
                continue;
            }
            messages.push(message);
        }
        Ok(messages)
    }

    async fn listen_updates(&self, token: &CancellationToken) -> Result<(), SirenwatchError> {
        let mut listener = self.client.listener();
        loop {
            tokio::select! {
                _ = token.cancelled() => return Err(SirenwatchError::Cancelled),
                update = listener.updates.recv() => {
                    let update = update.ok_or_else(|| {
                        SirenwatchError::Protocol("live update stream closed by upstream".to_string())
                    })?;
                    // TODO: filter events to the configured channel once Message carries a chat id.
                    let Update::NewMessage(message) = update else {
                        continue;
                    };
                    let Some(text) = message.text.as_deref() else {
                        continue;
                    };
                    let Some(status) = self.parser.parse(text, message.date)? else {
                        continue;
                    };
                    debug!(region = %status.region, enabled = status.enabled, "Live status update");
                    self.alert_data.set(status.clone());
                    self.send_update(token, status).await;
                }
            }
        }
    }

    /// Forward an accepted live status on the outbound feed, honouring the
    /// discard-timeout policy. A send abandoned by cancellation or timeout
    /// drops the update without failing the run.
    async fn send_update(&self, token: &CancellationToken, status: Status) {
        let Some(sender) = self.update_sender() else {
            return;
        };
        let send = sender.send(status);
        if self.options.update_discard_timeout.is_zero() {
            tokio::select! {
                _ = token.cancelled() => {}
                result = send => {
                    if result.is_err() {
                        debug!("Update receiver dropped");
                    }
                }
            }
        } else {
            tokio::select! {
                _ = token.cancelled() => {}
                result = tokio::time::timeout(self.options.update_discard_timeout, send) => match result {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => debug!("Update receiver dropped"),
                    Err(_) => warn!("Outbound feed consumer too slow, update discarded"),
                }
            }
        }
    }

    fn update_sender(&self) -> Option<mpsc::Sender<Status>> {
        match &*self.feed.lock().expect("update feed lock poisoned") {
            UpdateFeed::Open(sender) => Some(sender.clone()),
            _ => None,
        }
    }

    /// Close the outbound feed. Runs exactly once, on the run's final
    /// unwind; dropping the sender signals end-of-stream to the consumer.
    fn close_update_stream(&self) {
        let mut feed = self.feed.lock().expect("update feed lock poisoned");
        *feed = UpdateFeed::Closed;
    }
}
