use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

use sirenwatch_common::{Region, SirenwatchError, Status};

/// Parser for the fixed status-line grammar the channel posts:
/// a marker glyph, a time of day, one of the two status phrases, and the
/// region name, optionally followed by a period and more lines of text.
/// Only the first matching line of a message is used.
pub(crate) struct StatusParser {
    line: Regex,
    timezone: Tz,
}

impl StatusParser {
    pub(crate) fn new(timezone: Tz) -> Self {
        let line = Regex::new(
            r"(?m)^[🔴🟢🟡] (\d\d:\d\d) (Відбій тривоги|Повітряна тривога) в (.*?)\.?$",
        )
        .expect("valid alert status regex");
        Self { line, timezone }
    }

    /// Parse one message into a status update.
    ///
    /// `Ok(None)` marks a benign non-match: text that is not a status line,
    /// or a region name the registry does not know. The message timestamp
    /// only supplies the calendar date; the time of day comes from the
    /// status line itself, in the channel's timezone.
    pub(crate) fn parse(
        &self,
        text: &str,
        delivered_at: DateTime<Utc>,
    ) -> Result<Option<Status>, SirenwatchError> {
        let Some(caps) = self.line.captures(text) else {
            return Ok(None);
        };

        let time = NaiveTime::parse_from_str(&caps[1], "%H:%M").map_err(|e| {
            SirenwatchError::Parse(format!("bad time of day '{}': {e}", &caps[1]))
        })?;

        let enabled = match &caps[2] {
            "Повітряна тривога" => true,
            "Відбій тривоги" => false,
            _ => return Ok(None),
        };

        let region = match Region::from_name(&caps[3]) {
            Ok(region) => region,
            Err(_) => return Ok(None),
        };

        let delivered_local = delivered_at.with_timezone(&self.timezone);
        let naive = delivered_local.date_naive().and_time(time);
        // `earliest` resolves the ambiguous fall-back hour; only a time
        // inside the spring-forward gap has no instant at all.
        let mut updated_at = self
            .timezone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| {
                SirenwatchError::Parse(format!(
                    "local time {naive} does not exist in {}",
                    self.timezone
                ))
            })?
            .with_timezone(&Utc);

        // A message delivered at 00:01 can carry a 23:59 status line; the
        // parsed time then belongs to the previous calendar day.
        if updated_at > delivered_at {
            updated_at = updated_at - chrono::Duration::days(1);
        }

        Ok(Some(Status {
            region,
            enabled,
            updated_at,
            is_history: false,
        }))
    }
}
