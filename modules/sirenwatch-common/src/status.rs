use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::region::Region;

/// The alert condition known for one region as of a given moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub region: Region,
    /// True while the alert is raised, false once it has been cleared.
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
    /// Set on entries that came from the history backfill or a hardcoded
    /// seed. For those, `updated_at` may be a placeholder rather than a
    /// real observation time.
    pub is_history: bool,
}
