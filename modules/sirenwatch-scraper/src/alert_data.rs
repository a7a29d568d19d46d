use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use sirenwatch_common::{Region, SirenwatchError, Status};

/// The authoritative map of region → latest known alert status.
///
/// Shared between the backfill task, the live-listen task and any number of
/// external readers. Writes go through the monotonic merge in [`set`]:
/// concurrent producers converge on whichever status carries the latest
/// `updated_at`, regardless of arrival order.
///
/// [`set`]: AlertData::set
pub struct AlertData {
    data: RwLock<HashMap<Region, Status>>,
}

impl AlertData {
    pub(crate) fn new(timezone: Tz) -> Self {
        let mut data = HashMap::with_capacity(Region::ALL.len());
        // Until a message says otherwise, assume the alert is cleared.
        for region in Region::ALL {
            data.insert(
                region,
                Status {
                    region,
                    enabled: false,
                    updated_at: DateTime::<Utc>::MIN_UTC,
                    is_history: true,
                },
            );
        }
        let alert_data = Self {
            data: RwLock::new(data),
        };

        // The Crimea and Luhansk alerts have been running since 2022; paging
        // the channel that far back is pointless, so they are seeded.
        alert_data.set(Status {
            region: Region::Crimea,
            enabled: true,
            updated_at: seed_timestamp(timezone, 2022, 12, 11, 0, 22),
            is_history: true,
        });
        alert_data.set(Status {
            region: Region::Luhansk,
            enabled: true,
            updated_at: seed_timestamp(timezone, 2022, 4, 4, 19, 45),
            is_history: true,
        });
        alert_data
    }

    /// Current snapshot for a region.
    pub fn get(&self, region: Region) -> Result<Status, SirenwatchError> {
        let data = self.data.read().expect("alert data lock poisoned");
        data.get(&region)
            .cloned()
            .ok_or_else(|| SirenwatchError::UnknownRegion(region.name().to_string()))
    }

    /// Merge a status into the map. A status older than the one on file is
    /// silently skipped; a tie overwrites.
    pub(crate) fn set(&self, status: Status) {
        let mut data = self.data.write().expect("alert data lock poisoned");
        match data.get(&status.region) {
            Some(current) if status.updated_at < current.updated_at => {}
            _ => {
                data.insert(status.region, status);
            }
        }
    }
}

fn seed_timestamp(timezone: Tz, year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    timezone
        .with_ymd_and_hms(year, month, day, hour, min, 0)
        .single()
        .expect("seed timestamp is unambiguous")
        .with_timezone(&Utc)
}
