//! RSS 2.0 feed reader (CryptoPanic).

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::{parse_published, ScrapeTarget};
use crate::models::{Headline, ProviderFailure, ProviderId};
use crate::provider::response::fetch_text;
use crate::provider::NewsProvider;
use crate::transport::{HttpRequest, HttpTransport};

const ACCEPT_FEED: &str = "application/rss+xml, application/xml";

pub struct RssNewsProvider {
    transport: Arc<dyn HttpTransport>,
    publisher: ProviderId,
    target: ScrapeTarget,
}

impl RssNewsProvider {
    pub fn new(transport: Arc<dyn HttpTransport>, target: &ScrapeTarget) -> Self {
        Self {
            transport,
            publisher: target.name.into(),
            target: target.clone(),
        }
    }
}

#[async_trait]
impl NewsProvider for RssNewsProvider {
    fn id(&self) -> ProviderId {
        self.publisher.clone()
    }

    async fn fetch_headlines(&self, limit: usize) -> Result<Vec<Headline>, ProviderFailure> {
        let limit = self.target.effective_limit(limit);
        let request = HttpRequest::get(self.target.url).header("Accept", ACCEPT_FEED);
        let body = fetch_text(self.transport.as_ref(), &self.publisher, request).await?;

        let headlines = extract_items(&body, &self.publisher, limit).map_err(|e| {
            ProviderFailure::malformed(self.publisher.clone(), format!("Invalid feed: {}", e))
        })?;
        debug!("{}: read {} feed items", self.publisher, headlines.len());
        Ok(headlines)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    DcDate,
    Description,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"pubDate" => Some(Self::PubDate),
            b"dc:date" => Some(Self::DcDate),
            b"description" => Some(Self::Description),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct RawItem {
    title: String,
    link: String,
    pub_date: String,
    dc_date: String,
    description: String,
}

impl RawItem {
    fn push(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::DcDate => &mut self.dc_date,
            Field::Description => &mut self.description,
        };
        slot.push_str(text);
    }

    fn into_headline(self, publisher: &ProviderId) -> Option<Headline> {
        let title = self.title.trim();
        let link = self.link.trim();
        if title.is_empty() || link.is_empty() {
            return None;
        }
        let date = if self.pub_date.trim().is_empty() {
            &self.dc_date
        } else {
            &self.pub_date
        };
        let description = self.description.trim();
        Some(Headline {
            publisher: publisher.clone(),
            title: title.to_string(),
            url: link.to_string(),
            published_at: parse_published(date),
            summary: (!description.is_empty()).then(|| description.to_string()),
        })
    }
}

/// Read `<item>`s in feed order, skipping incomplete and duplicate entries.
fn extract_items(
    xml: &str,
    publisher: &ProviderId,
    limit: usize,
) -> Result<Vec<Headline>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut headlines = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut is_feed = false;
    let mut item: Option<RawItem> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => match e.name().as_ref() {
                b"rss" | b"channel" | b"rdf:RDF" => is_feed = true,
                b"item" => {
                    item = Some(RawItem::default());
                    field = None;
                }
                tag if item.is_some() => field = Field::from_tag(tag),
                _ => {}
            },
            Event::Text(e) => {
                if let (Some(current), Some(f)) = (item.as_mut(), field) {
                    current.push(f, &e.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::CData(e) => {
                if let (Some(current), Some(f)) = (item.as_mut(), field) {
                    current.push(f, &String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"item" {
                    field = None;
                    if let Some(headline) = item.take().and_then(|i| i.into_headline(publisher)) {
                        if seen.insert(headline.url.clone()) {
                            headlines.push(headline);
                        }
                    }
                    if headlines.len() >= limit {
                        break;
                    }
                } else {
                    field = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !is_feed {
        return Err("document is not an RSS feed".to_string());
    }
    Ok(headlines)
}
