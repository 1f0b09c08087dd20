use crate::TemplateRecord;

pub const SYSTEM_PROMPT: &str =
    "You are a technical writer creating clear, concise tutorials for automation workflows.";

const SECTION_MARKERS: [&str; 8] = ["1.", "2.", "3.", "4.", "5.", "6.", "7.", "##"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorialSection {
    pub title: String,
    pub content: String,
}

/// User prompt asking for a seven-section tutorial about `record`.
pub fn build_prompt(record: &TemplateRecord) -> String {
    let description = if record.description.trim().is_empty() {
        "No description available"
    } else {
        record.description.trim()
    };
    format!(
        "Create a comprehensive tutorial for the following {source} automation template:\n\n\
         Title: {title}\n\
         Description: {description}\n\n\
         Please structure the tutorial with the following sections:\n\
         1. Overview - Brief introduction to what this automation does\n\
         2. Prerequisites - What users need before setting up\n\
         3. Setup Steps - Step-by-step instructions\n\
         4. Configuration - How to configure the automation\n\
         5. Testing - How to test the automation\n\
         6. Troubleshooting - Common issues and solutions\n\
         7. Best Practices - Tips for optimization\n\n\
         Keep the tutorial clear, concise, and beginner-friendly.",
        source = record.source,
        title = record.title,
    )
}

/// Splits tutorial markdown on numbered (`1.`..`7.`) or `##` heading lines.
///
/// Text before the first heading is dropped.
pub fn parse_sections(content: &str) -> Vec<TutorialSection> {
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if is_section_heading(trimmed) {
            if let Some((title, body)) = current.take() {
                sections.push(section(title, &body));
            }
            current = Some((trimmed.to_string(), Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    if let Some((title, body)) = current {
        sections.push(section(title, &body));
    }
    sections
}

pub(crate) fn is_section_heading(line: &str) -> bool {
    let line = line.trim_start();
    SECTION_MARKERS.iter().any(|m| line.starts_with(m))
}

fn section(title: String, body: &[&str]) -> TutorialSection {
    TutorialSection {
        title,
        content: body.join("\n").trim().to_string(),
    }
}
