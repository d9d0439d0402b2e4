//! News publisher adapters.
//!
//! Most publishers have no API, so their front pages are scraped
//! ([`HtmlNewsProvider`]); CryptoPanic publishes an RSS feed
//! ([`RssNewsProvider`]). [`DEFAULT_TARGETS`] fixes the publisher set and the
//! order feeds appear in every `NewsDigest`.

mod html;
mod rss;

pub use html::HtmlNewsProvider;
pub use rss::RssNewsProvider;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// How a publisher is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedFormat {
    Html,
    Rss,
}

/// One news source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub name: &'static str,
    pub url: &'static str,
    pub format: FeedFormat,
    /// Hard cap on items taken from this source, below any caller limit
    pub max_items: Option<usize>,
}

impl ScrapeTarget {
    pub const fn html(name: &'static str, url: &'static str) -> Self {
        Self {
            name,
            url,
            format: FeedFormat::Html,
            max_items: None,
        }
    }

    pub const fn rss(name: &'static str, url: &'static str) -> Self {
        Self {
            name,
            url,
            format: FeedFormat::Rss,
            max_items: None,
        }
    }

    /// Effective item budget for a caller-requested limit.
    pub fn effective_limit(&self, requested: usize) -> usize {
        self.max_items.map_or(requested, |cap| requested.min(cap))
    }
}

pub const DEFAULT_TARGETS: &[ScrapeTarget] = &[
    ScrapeTarget::html("CoinDesk", "https://www.coindesk.com/"),
    ScrapeTarget::html("The Block", "https://www.theblock.co/latest"),
    ScrapeTarget::html("Blockworks", "https://blockworks.co/news"),
    ScrapeTarget::html("Cointelegraph", "https://cointelegraph.com/"),
    ScrapeTarget::html("The Defiant", "https://thedefiant.io/latest"),
    ScrapeTarget::html("DL News", "https://www.dlnews.com/"),
    ScrapeTarget::html("Protos", "https://protos.com/"),
    ScrapeTarget::html("Decrypt", "https://decrypt.co/"),
    ScrapeTarget::html("Messari", "https://messari.io/news"),
    ScrapeTarget::html("Glassnode Insights", "https://insights.glassnode.com/"),
    ScrapeTarget::rss("CryptoPanic", "https://cryptopanic.com/news/rss/"),
];

/// Naive layouts seen in `<time>` text and feed dates; read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d, %Y, %I:%M %p",
    "%d %B %Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%d %B %Y"];

/// Best-effort publication date parsing.
///
/// Accepts RFC 3339, RFC 2822 and a few human layouts. Anything else is
/// `None`; a bad date never fails the headline.
pub(crate) fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = raw
        .trim_end_matches(" UTC")
        .trim_end_matches(" GMT")
        .trim_end_matches('Z')
        .trim();

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(naive, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc())
}
