use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Platform a template was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    N8n,
    Zapier,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::N8n, Source::Zapier];

    pub fn as_str(self) -> &'static str {
        match self {
            Source::N8n => "n8n",
            Source::Zapier => "zapier",
        }
    }

    /// Case-insensitive lookup; unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Category used when the listing itself carries none.
    pub fn default_category(self) -> &'static str {
        match self {
            Source::N8n => "n8n Workflows",
            Source::Zapier => "Zapier Integrations",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::parse(s).ok_or_else(|| format!("unknown source '{s}'"))
    }
}

/// One catalog entry, as persisted in `templates.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: String,
    pub source: Source,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub raw_metadata: Map<String, Value>,
    #[serde(default)]
    pub first_seen_utc: String,
}

/// A listing item as an adapter extracted it, before validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    pub id: Option<String>,
    pub source: Option<Source>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub raw_metadata: Map<String, Value>,
    pub fetched_utc: String,
}

impl RawRecord {
    pub fn new(source: Source, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            source: Some(source),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn fetched_at(mut self, fetched_utc: impl Into<String>) -> Self {
        self.fetched_utc = fetched_utc.into();
        self
    }

    /// Trimmed, non-empty id, if any.
    pub(crate) fn valid_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Builds the catalog form. `None` when the id or source is missing.
    pub fn into_template(self) -> Option<TemplateRecord> {
        let id = self.valid_id()?.to_string();
        let source = self.source?;
        Some(TemplateRecord {
            id,
            source,
            title: non_empty(self.title).unwrap_or_else(|| "Untitled".to_string()),
            description: self.description.unwrap_or_default().trim().to_string(),
            url: self.url.unwrap_or_default().trim().to_string(),
            category: non_empty(self.category)
                .unwrap_or_else(|| source.default_category().to_string()),
            raw_metadata: self.raw_metadata,
            first_seen_utc: self.fetched_utc,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
