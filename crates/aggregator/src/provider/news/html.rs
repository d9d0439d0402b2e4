//! Front-page scraper for publishers without a feed.
//!
//! Headlines come from `<article>` blocks first; when a page has too few of
//! those, plain headline anchors (`h2 a`, `h3 a`, `.headline a`) fill the
//! rest. Links are resolved against the page URL and de-duplicated.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{parse_published, ScrapeTarget};
use crate::errors::EngineError;
use crate::models::{Headline, ProviderFailure, ProviderId};
use crate::provider::response::fetch_text;
use crate::provider::NewsProvider;
use crate::transport::{HttpRequest, HttpTransport};

/// Shorter anchor texts are navigation ("More", "Live"), not headlines.
const MIN_TITLE_LEN: usize = 5;

static ARTICLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article").expect("Invalid selector"));
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("Invalid selector"));
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("Invalid selector"));
static TIME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("time").expect("Invalid selector"));
static FALLBACK_ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2 a[href], h3 a[href], .headline a[href]").expect("Invalid selector")
});

pub struct HtmlNewsProvider {
    transport: Arc<dyn HttpTransport>,
    publisher: ProviderId,
    page_url: Url,
    target: ScrapeTarget,
}

impl HtmlNewsProvider {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        target: &ScrapeTarget,
    ) -> Result<Self, EngineError> {
        let page_url = Url::parse(target.url).map_err(|e| {
            EngineError::Configuration(format!("Invalid URL for {}: {}", target.name, e))
        })?;
        Ok(Self {
            transport,
            publisher: target.name.into(),
            page_url,
            target: target.clone(),
        })
    }
}

#[async_trait]
impl NewsProvider for HtmlNewsProvider {
    fn id(&self) -> ProviderId {
        self.publisher.clone()
    }

    async fn fetch_headlines(&self, limit: usize) -> Result<Vec<Headline>, ProviderFailure> {
        let limit = self.target.effective_limit(limit);
        let request = HttpRequest::get(self.page_url.as_str());
        let body = fetch_text(self.transport.as_ref(), &self.publisher, request).await?;

        let headlines = extract_headlines(&body, &self.page_url, &self.publisher, limit);
        debug!("{}: extracted {} headlines", self.publisher, headlines.len());
        Ok(headlines)
    }
}

/// Pull up to `limit` headlines out of a page, in document order.
fn extract_headlines(
    html: &str,
    page_url: &Url,
    publisher: &ProviderId,
    limit: usize,
) -> Vec<Headline> {
    let document = Html::parse_document(html);
    let mut headlines: Vec<Headline> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for article in document.select(&ARTICLE) {
        if headlines.len() >= limit {
            break;
        }
        if let Some(headline) = headline_from_article(article, page_url, publisher) {
            if seen.insert(headline.url.clone()) {
                headlines.push(headline);
            }
        }
    }

    for anchor in document.select(&FALLBACK_ANCHOR) {
        if headlines.len() >= limit {
            break;
        }
        let Some((title, url)) = anchor_link(anchor, page_url) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }
        headlines.push(Headline {
            publisher: publisher.clone(),
            title,
            url,
            published_at: None,
            summary: None,
        });
    }

    headlines
}

fn headline_from_article(
    article: ElementRef<'_>,
    page_url: &Url,
    publisher: &ProviderId,
) -> Option<Headline> {
    let anchor = article.select(&LINK).next()?;
    let (title, url) = anchor_link(anchor, page_url)?;

    let summary = article
        .select(&PARAGRAPH)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty());

    let published_at = article.select(&TIME).next().and_then(|time| {
        let el = time.value();
        let raw = el
            .attr("datetime")
            .or_else(|| el.attr("data-datetime"))
            .map(str::to_string)
            .unwrap_or_else(|| element_text(time));
        parse_published(&raw)
    });

    Some(Headline {
        publisher: publisher.clone(),
        title,
        url,
        published_at,
        summary,
    })
}

/// Title and absolute http(s) URL of an anchor, if it looks like a headline.
fn anchor_link(anchor: ElementRef<'_>, page_url: &Url) -> Option<(String, String)> {
    let href = anchor.value().attr("href")?;
    let title = element_text(anchor);
    if title.chars().count() < MIN_TITLE_LEN {
        return None;
    }
    let url = page_url.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    Some((title, url.to_string()))
}

/// Element text with whitespace runs collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
