use std::collections::BTreeSet;

use serde::Serialize;

use crate::tutorial::is_section_heading;
use crate::{Source, TemplateRecord};

/// Search snippets are cut to this many characters.
pub const DESCRIPTION_LIMIT: usize = 160;

const AUTHOR: &str = "Automations Cookbook";
const BASE_KEYWORDS: [&str; 3] = ["automation", "workflow", "integration"];
const MAX_KEYWORDS: usize = 10;
const MAX_TITLE_KEYWORDS: usize = 5;
const INTEGRATION_TAGS: [&str; 11] = [
    "slack",
    "email",
    "gmail",
    "github",
    "trello",
    "asana",
    "salesforce",
    "hubspot",
    "mailchimp",
    "dropbox",
    "google",
];
const ACTION_TAGS: [&str; 5] = ["notification", "sync", "backup", "reminder", "analytics"];

/// SEO front matter for one template page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub date: String,
    pub category: String,
    pub tags: Vec<String>,
    pub source: String,
    pub url: String,
    pub seo: SeoBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoBlock {
    pub og_title: String,
    pub og_description: String,
    pub og_type: String,
    pub twitter_card: String,
}

impl SeoMetadata {
    /// Derives page metadata from a template and, when available, its tutorial text.
    pub fn for_template(record: &TemplateRecord, tutorial: Option<&str>, date: &str) -> Self {
        let description = describe(record, tutorial);
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: description.clone(),
            keywords: keywords(record),
            author: AUTHOR.to_string(),
            date: date.to_string(),
            category: category_for(record.source).to_string(),
            tags: tags(record),
            source: record.source.to_string(),
            url: record.url.clone(),
            seo: SeoBlock {
                og_title: record.title.clone(),
                og_description: description,
                og_type: "article".to_string(),
                twitter_card: "summary_large_image".to_string(),
            },
        }
    }
}

fn category_for(source: Source) -> &'static str {
    source.default_category()
}

fn describe(record: &TemplateRecord, tutorial: Option<&str>) -> String {
    if !record.description.trim().is_empty() {
        return truncate(record.description.trim());
    }
    let first_paragraph = tutorial.and_then(|content| {
        content
            .split("\n\n")
            .map(|paragraph| {
                paragraph
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !is_section_heading(line))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .find(|paragraph| !paragraph.is_empty())
    });
    match first_paragraph {
        Some(paragraph) => truncate(&paragraph),
        None => format!("Learn how to set up and use {}", record.title),
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text.to_string();
    }
    let cut: String = text.chars().take(DESCRIPTION_LIMIT - 3).collect();
    format!("{cut}...")
}

fn keywords(record: &TemplateRecord) -> Vec<String> {
    let mut set: BTreeSet<String> = BASE_KEYWORDS.iter().map(|k| k.to_string()).collect();
    set.insert(record.source.as_str().to_string());
    let title = record.title.to_lowercase();
    set.extend(
        title
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|word| word.len() >= 4)
            .take(MAX_TITLE_KEYWORDS)
            .map(str::to_string),
    );
    set.into_iter().take(MAX_KEYWORDS).collect()
}

fn tags(record: &TemplateRecord) -> Vec<String> {
    let title = record.title.to_lowercase();
    let mut set = BTreeSet::new();
    set.insert(record.source.as_str().to_string());
    for tag in INTEGRATION_TAGS.iter().chain(ACTION_TAGS.iter()) {
        if title.contains(tag) {
            set.insert(tag.to_string());
        }
    }
    set.into_iter().collect()
}
