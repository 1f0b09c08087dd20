use cookbook_core::{RawRecord, Source};
use cookbook_logging::{cookbook_debug, cookbook_info, cookbook_warn};
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use url::Url;

use super::{AdapterFailure, Clock, Listing, SourceAdapter};
use crate::decode::decode_body;
use crate::retry::RetryingFetcher;
use crate::FetchRequest;

const LISTING_PATH: &str = "/apps";
const MAX_PAGES: usize = 50;

/// One parsed listing page.
struct ZapierPage {
    cards: Vec<Result<RawRecord, String>>,
    has_next: bool,
}

/// Scrapes the Zapier template listing (`div.zap-template` cards).
pub struct ZapierAdapter {
    fetcher: RetryingFetcher,
    base_url: String,
    clock: Clock,
}

impl ZapierAdapter {
    pub fn new(fetcher: RetryingFetcher, base_url: impl Into<String>, clock: Clock) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            clock,
        }
    }

    fn failure(reason: impl Into<String>) -> AdapterFailure {
        AdapterFailure::Shape {
            platform: Source::Zapier,
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for ZapierAdapter {
    fn source(&self) -> Source {
        Source::Zapier
    }

    async fn list_templates(&self, limit: usize) -> Result<Listing, AdapterFailure> {
        let mut listing = Listing::default();
        let mut page = 1;

        while listing.records.len() < limit && page <= MAX_PAGES {
            let request = FetchRequest::get(format!("{}{}", self.base_url, LISTING_PATH))
                .query("page", page)
                .header("Accept", "text/html");
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|failure| AdapterFailure::Fetch {
                    platform: Source::Zapier,
                    failure,
                })?;

            if let Some(ct) = response.content_type.as_deref() {
                if !is_html(ct) {
                    return Err(Self::failure(format!(
                        "page {page}: expected html, got {ct}"
                    )));
                }
            }
            let html = decode_body(&response.body, response.content_type.as_deref()).map_err(
                |error| AdapterFailure::Decode {
                    platform: Source::Zapier,
                    error,
                },
            )?;
            let base = Url::parse(&response.final_url)
                .map_err(|err| Self::failure(format!("page {page}: bad final url: {err}")))?;

            let parsed = parse_page(&html, &base);
            listing.pages += 1;
            cookbook_debug!("page {} returned {} cards", page, parsed.cards.len());
            if parsed.cards.is_empty() {
                break;
            }

            let fetched_utc = (self.clock)();
            for (idx, card) in parsed.cards.into_iter().enumerate() {
                if listing.records.len() >= limit {
                    break;
                }
                match card {
                    Ok(record) => listing.records.push(record.fetched_at(fetched_utc.clone())),
                    Err(reason) => {
                        listing.skipped += 1;
                        cookbook_warn!("skipping card {} on page {}: {}", idx + 1, page, reason);
                    }
                }
            }

            if !parsed.has_next {
                break;
            }
            page += 1;
        }

        cookbook_info!(
            "listed {} zapier templates ({} skipped, {} pages)",
            listing.records.len(),
            listing.skipped,
            listing.pages
        );
        Ok(listing)
    }
}

fn is_html(content_type: &str) -> bool {
    let ct = content_type.split(';').next().unwrap_or(content_type).trim();
    ct.eq_ignore_ascii_case("text/html") || ct.eq_ignore_ascii_case("application/xhtml+xml")
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn parse_page(html: &str, base: &Url) -> ZapierPage {
    let doc = Html::parse_document(html);
    let (Some(card_sel), Some(next_sel)) = (selector("div.zap-template"), selector(r#"a[rel="next"]"#))
    else {
        return ZapierPage {
            cards: Vec::new(),
            has_next: false,
        };
    };

    let cards = doc.select(&card_sel).map(|card| parse_card(card, base)).collect();
    let has_next = doc.select(&next_sel).next().is_some();
    ZapierPage { cards, has_next }
}

fn parse_card(card: ElementRef<'_>, base: &Url) -> Result<RawRecord, String> {
    let href = first_match(card, "a[href]")
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or_else(|| "card has no link".to_string())?;
    let url = base
        .join(href)
        .map_err(|err| format!("bad link '{href}': {err}"))?;
    let slug = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| format!("link '{href}' has no path"))?;

    let mut record = RawRecord::new(Source::Zapier, format!("zapier:{slug}")).with_url(url.as_str());
    record.title = first_match(card, "h3").map(element_text);
    record.description = first_match(card, "p").map(element_text);
    record.category = card.value().attr("data-category").map(str::to_string);
    record.raw_metadata = data_attributes(card);
    Ok(record)
}

fn first_match<'a>(card: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    card.select(&sel).next()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn data_attributes(card: ElementRef<'_>) -> Map<String, Value> {
    card.value()
        .attrs()
        .filter_map(|(name, value)| {
            let key = name.strip_prefix("data-")?;
            (key != "category").then(|| (key.replace('-', "_"), Value::String(value.to_string())))
        })
        .collect()
}
