use cookbook_core::{RawRecord, Source};
use cookbook_logging::{cookbook_debug, cookbook_info, cookbook_warn};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{AdapterFailure, Clock, Listing, SourceAdapter};
use crate::decode::decode_body;
use crate::retry::RetryingFetcher;
use crate::FetchRequest;

const SEARCH_PATH: &str = "/api/templates/search";
const WORKFLOW_PAGE: &str = "https://n8n.io/workflows";
const PAGE_SIZE: usize = 50;
const MAX_PAGES: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(rename = "totalWorkflows")]
    total: Option<u64>,
    workflows: Vec<Value>,
}

/// Pages through the public n8n template search API.
pub struct N8nAdapter {
    fetcher: RetryingFetcher,
    base_url: String,
    clock: Clock,
    page_size: usize,
}

impl N8nAdapter {
    pub fn new(fetcher: RetryingFetcher, base_url: impl Into<String>, clock: Clock) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            clock,
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn failure(reason: impl Into<String>) -> AdapterFailure {
        AdapterFailure::Shape {
            platform: Source::N8n,
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for N8nAdapter {
    fn source(&self) -> Source {
        Source::N8n
    }

    async fn list_templates(&self, limit: usize) -> Result<Listing, AdapterFailure> {
        let mut listing = Listing::default();
        let mut seen: u64 = 0;
        let mut page = 1;
        // Constant page size, otherwise page numbers stop lining up with offsets.
        let rows = self.page_size.min(limit);

        while listing.records.len() < limit {
            if page > MAX_PAGES {
                cookbook_warn!("stopping after {} pages", MAX_PAGES);
                break;
            }
            let request = FetchRequest::get(format!("{}{}", self.base_url, SEARCH_PATH))
                .query("page", page)
                .query("rows", rows)
                .header("Accept", "application/json");
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|failure| AdapterFailure::Fetch {
                    platform: Source::N8n,
                    failure,
                })?;
            let text = decode_body(&response.body, response.content_type.as_deref()).map_err(
                |error| AdapterFailure::Decode {
                    platform: Source::N8n,
                    error,
                },
            )?;
            let parsed: SearchPage = serde_json::from_str(&text)
                .map_err(|err| Self::failure(format!("page {page}: {err}")))?;
            listing.pages += 1;

            let count = parsed.workflows.len();
            cookbook_debug!("page {} returned {} workflows", page, count);
            if count == 0 {
                break;
            }
            seen += count as u64;

            let fetched_utc = (self.clock)();
            let before = listing.records.len();
            for (idx, item) in parsed.workflows.into_iter().enumerate() {
                if listing.records.len() >= limit {
                    break;
                }
                match parse_workflow(item) {
                    Ok(record) => listing.records.push(record.fetched_at(fetched_utc.clone())),
                    Err(reason) => {
                        listing.skipped += 1;
                        cookbook_warn!("skipping workflow {} on page {}: {}", idx + 1, page, reason);
                    }
                }
            }

            let exhausted = parsed.total.is_some_and(|total| seen >= total);
            if exhausted || count < rows {
                break;
            }
            if listing.records.len() == before && parsed.total.is_none() {
                cookbook_warn!("page {} had no usable workflows and no total, stopping", page);
                break;
            }
            page += 1;
        }

        cookbook_info!(
            "listed {} n8n templates ({} skipped, {} pages)",
            listing.records.len(),
            listing.skipped,
            listing.pages
        );
        Ok(listing)
    }
}

fn parse_workflow(item: Value) -> Result<RawRecord, String> {
    let Value::Object(item) = item else {
        return Err("item is not an object".to_string());
    };
    let id = match item.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return Err("missing id".to_string()),
    };

    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
    let mut record = RawRecord::new(Source::N8n, format!("n8n:{id}"))
        .with_url(format!("{WORKFLOW_PAGE}/{id}"));
    record.title = text("name");
    record.description = text("description");
    record.category = item
        .get("categories")
        .and_then(Value::as_array)
        .and_then(|cats| cats.iter().find_map(|c| c.get("name")?.as_str()))
        .map(str::to_string);
    record.raw_metadata = stable_metadata(&item);
    Ok(record)
}

/// Keeps fields that identify a workflow, not counters that change on every fetch.
fn stable_metadata(item: &Map<String, Value>) -> Map<String, Value> {
    let mut meta = Map::new();
    if let Some(created) = item.get("createdAt") {
        meta.insert("created_at".into(), created.clone());
    }
    if let Some(author) = item
        .get("user")
        .and_then(|user| user.get("username"))
        .filter(|name| name.is_string())
    {
        meta.insert("author".into(), author.clone());
    }
    if let Some(nodes) = item.get("nodes").and_then(Value::as_array) {
        let names: Vec<Value> = nodes
            .iter()
            .filter_map(|node| node.get("displayName")?.as_str())
            .map(|name| Value::String(name.to_string()))
            .collect();
        if !names.is_empty() {
            meta.insert("nodes".into(), Value::Array(names));
        }
    }
    meta
}
