use cookbook_core::{
    build_prompt, merge, parse_sections, query_templates, Catalog, RawRecord, SeoMetadata, Source,
    TemplateQuery, TemplateRecord,
};
use pretty_assertions::assert_eq;

fn catalog() -> Catalog {
    let records = vec![
        RawRecord::new(Source::N8n, "n8n:1").with_title("One"),
        RawRecord::new(Source::Zapier, "zapier:a").with_title("Zap A"),
        RawRecord::new(Source::N8n, "n8n:2").with_title("Two"),
        RawRecord::new(Source::N8n, "n8n:3").with_title("Three"),
    ];
    merge(Catalog::new(), records).0
}

fn query(source: Option<&str>, limit: Option<usize>) -> TemplateQuery {
    TemplateQuery {
        source: source.map(str::to_string),
        limit,
    }
}

fn ids(found: Vec<&TemplateRecord>) -> Vec<String> {
    found.into_iter().map(|r| r.id.clone()).collect()
}

#[test]
fn filters_by_source_in_catalog_order() {
    let catalog = catalog();
    let found = query_templates(catalog.records(), &query(Some("n8n"), Some(2)));
    assert_eq!(ids(found), vec!["n8n:1", "n8n:2"]);

    let found = query_templates(catalog.records(), &query(Some("ZAPIER"), None));
    assert_eq!(ids(found), vec!["zapier:a"]);
}

#[test]
fn unknown_source_is_empty_and_missing_limit_returns_all() {
    let catalog = catalog();
    assert!(query_templates(catalog.records(), &query(Some("make"), None)).is_empty());
    assert_eq!(query_templates(catalog.records(), &query(None, None)).len(), 4);
    assert_eq!(query_templates(catalog.records(), &query(Some(""), Some(3))).len(), 3);
    assert!(query_templates(catalog.records(), &query(None, Some(0))).is_empty());
}

fn record(title: &str, description: &str) -> TemplateRecord {
    let raw = RawRecord::new(Source::Zapier, "zapier:slack-gmail")
        .with_title(title)
        .with_description(description)
        .with_url("https://zapier.com/apps/slack/integrations/gmail");
    merge(Catalog::new(), vec![raw]).0.into_records().remove(0)
}

#[test]
fn seo_metadata_uses_title_words_and_known_tags() {
    let meta = SeoMetadata::for_template(
        &record("Slack to Gmail Notification", "Send mail when Slack pings"),
        None,
        "2024-05-01",
    );
    assert_eq!(meta.category, "Zapier Integrations");
    assert_eq!(meta.author, "Automations Cookbook");
    assert_eq!(meta.description, "Send mail when Slack pings");
    assert_eq!(
        meta.keywords,
        vec![
            "automation",
            "gmail",
            "integration",
            "notification",
            "slack",
            "workflow",
            "zapier"
        ]
    );
    assert_eq!(meta.tags, vec!["gmail", "notification", "slack", "zapier"]);
    assert_eq!(meta.seo.og_type, "article");
    assert_eq!(meta.seo.og_description, meta.description);
}

#[test]
fn seo_description_falls_back_and_truncates() {
    let from_tutorial = SeoMetadata::for_template(
        &record("Backup", ""),
        Some("\n\nFirst paragraph here.\n\nSecond."),
        "2024-05-01",
    );
    assert_eq!(from_tutorial.description, "First paragraph here.");

    let under_heading = SeoMetadata::for_template(
        &record("Backup", ""),
        Some("## Overview\n\n1. Overview\nKeeps a copy\nof every file.\n\n2. Prerequisites"),
        "2024-05-01",
    );
    assert_eq!(under_heading.description, "Keeps a copy of every file.");

    let fallback = SeoMetadata::for_template(&record("Backup", ""), None, "2024-05-01");
    assert_eq!(fallback.description, "Learn how to set up and use Backup");

    let long = "x".repeat(200);
    let truncated = SeoMetadata::for_template(&record("Backup", &long), None, "2024-05-01");
    assert_eq!(truncated.description.chars().count(), 160);
    assert!(truncated.description.ends_with("..."));
}

#[test]
fn prompt_names_template_and_sections() {
    let prompt = build_prompt(&record("Slack to Gmail", ""));
    assert!(prompt.contains("following zapier automation template"));
    assert!(prompt.contains("Title: Slack to Gmail"));
    assert!(prompt.contains("Description: No description available"));
    assert!(prompt.contains("7. Best Practices"));
}

#[test]
fn sections_split_on_numbered_and_hash_headings() {
    let content = "Intro text\n1. Overview\nDoes things.\n\n## Prerequisites\n- account\n2. Setup Steps\nStep one";
    let sections = parse_sections(content);
    let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["1. Overview", "## Prerequisites", "2. Setup Steps"]);
    assert_eq!(sections[0].content, "Does things.");
    assert_eq!(sections[1].content, "- account");
    assert_eq!(sections[2].content, "Step one");
}
