use cookbook_core::{parse_sections, SeoMetadata, Source, TemplateRecord};
use serde::Serialize;

#[derive(Serialize)]
struct MetadataIndex<'a> {
    templates: &'a [SeoMetadata],
}

#[derive(Serialize)]
struct TutorialHeader<'a> {
    id: &'a str,
    title: &'a str,
    source: Source,
    template_url: &'a str,
    generated_utc: &'a str,
    sections: Vec<String>,
}

/// Page document: SEO front matter followed by the page body.
pub fn build_page_document(metadata: &SeoMetadata, body: &str) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(metadata)?;
    Ok(format!("---\n{yaml}---\n\n{body}"))
}

/// Combined `all_metadata.yaml` content: a `templates:` list of every entry.
pub fn build_metadata_index(entries: &[SeoMetadata]) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&MetadataIndex { templates: entries })
}

/// Tutorial document as written by the tutorial step.
pub fn build_tutorial_document(
    record: &TemplateRecord,
    content: &str,
    generated_utc: &str,
) -> Result<String, serde_yaml::Error> {
    let header = TutorialHeader {
        id: &record.id,
        title: &record.title,
        source: record.source,
        template_url: &record.url,
        generated_utc,
        sections: parse_sections(content)
            .into_iter()
            .map(|section| section.title)
            .collect(),
    };
    let yaml = serde_yaml::to_string(&header)?;
    Ok(format!("---\n{yaml}---\n\n{}\n", content.trim_end()))
}

/// Strips a leading `---` block, returning the body.
pub fn strip_front_matter(document: &str) -> &str {
    let Some(rest) = document.strip_prefix("---\n") else {
        return document;
    };
    match rest.find("\n---\n") {
        Some(end) => rest[end + 5..].trim_start_matches('\n'),
        None => document,
    }
}
