//! Scrapes the air alert channel: a bounded history backfill plus an
//! indefinite live listener, merged into one authoritative per-region
//! snapshot and republished as a live change feed.

pub mod alert_data;
mod parser;
pub mod scraper;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use alert_data::AlertData;
pub use scraper::{Scraper, ScraperOptions};
