use std::env;
use std::time::Duration;

use chrono_tz::Tz;

/// The public channel that posts air alert status messages.
pub const AIR_ALERT_UA_CHANNEL_ID: i64 = -1001766138888;

/// Default history lookback window, in hours.
pub const DEFAULT_HISTORY_WINDOW_HOURS: u64 = 48;

/// Scraper configuration loaded from environment variables.
/// Every variable has a default; deployments only override what they need.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram channel to scrape.
    pub channel_id: i64,
    /// How far back the history backfill reaches.
    pub history_window: Duration,
    /// How long a send to a slow outbound-feed consumer may block before the
    /// update is dropped. Zero means block indefinitely.
    pub update_discard_timeout: Duration,
    /// Timezone the channel reports times in.
    pub timezone: Tz,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if a variable is present but malformed.
    pub fn from_env() -> Self {
        Self {
            channel_id: env_parsed("ALERT_CHANNEL_ID", AIR_ALERT_UA_CHANNEL_ID),
            history_window: Duration::from_secs(
                env_parsed("HISTORY_WINDOW_HOURS", DEFAULT_HISTORY_WINDOW_HOURS) * 3600,
            ),
            update_discard_timeout: Duration::from_millis(env_parsed(
                "UPDATE_DISCARD_TIMEOUT_MS",
                0,
            )),
            timezone: env::var("ALERT_CHANNEL_TIMEZONE")
                .map(|tz| {
                    tz.parse()
                        .unwrap_or_else(|_| panic!("ALERT_CHANNEL_TIMEZONE is not a valid IANA timezone: {tz}"))
                })
                .unwrap_or(chrono_tz::Europe::Kyiv),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{key} is malformed: {value}")),
        Err(_) => default,
    }
}
