use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use cookbook_logging::{cookbook_debug, cookbook_info, cookbook_warn};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::persist::{AtomicFileWriter, PersistError};

const VOTE_TEXT: &str = "Votar neste Template";
const DRAFT_TEXT: &str = "Template em Desenvolvimento";

/// Outcome of fixing a directory of generated pages.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FixReport {
    pub fixed: Vec<PathBuf>,
    pub unchanged: usize,
    pub errors: Vec<(PathBuf, String)>,
}

/// Removes leftover voting and "in development" widgets from HTML pages.
pub struct PageFixer {
    vote_buttons: Selector,
    blocks: Selector,
    alerts: Selector,
}

impl PageFixer {
    pub fn new() -> Self {
        Self {
            vote_buttons: css("button"),
            blocks: css("div, section"),
            alerts: css(r#"div[class*="alert"]"#),
        }
    }

    /// Returns the cleaned document and how many elements were removed.
    pub fn fix_html(&self, html: &str) -> (String, usize) {
        let mut doc = Html::parse_document(html);
        let doomed = self.doomed_nodes(&doc);
        if doomed.is_empty() {
            return (html.to_string(), 0);
        }
        for id in &doomed {
            if let Some(mut node) = doc.tree.get_mut(*id) {
                node.detach();
            }
        }
        (doc.html(), doomed.len())
    }

    fn doomed_nodes(&self, doc: &Html) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for button in doc.select(&self.vote_buttons) {
            let onclick = button.value().attr("onclick").unwrap_or_default();
            if onclick.contains("voteTemplate") || text_of(button).contains(VOTE_TEXT) {
                ids.push(button.id());
            }
        }
        // Innermost block carrying the warning, not every ancestor of it.
        for block in doc.select(&self.blocks) {
            if text_of(block).contains(DRAFT_TEXT)
                && !block
                    .select(&self.blocks)
                    .any(|inner| inner.id() != block.id() && text_of(inner).contains(DRAFT_TEXT))
            {
                ids.push(block.id());
            }
        }
        ids.extend(doc.select(&self.alerts).map(|alert| alert.id()));
        let mut seen = HashSet::new();
        ids.retain(|id| seen.insert(*id));
        ids
    }

    /// Fixes every `*.html` file below `dir`, rewriting only files that changed.
    pub fn fix_dir(&self, dir: &Path) -> Result<FixReport, PersistError> {
        if !dir.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        let mut files = Vec::new();
        collect_html(dir, &mut files)?;
        files.sort();
        cookbook_info!("found {} html files under {}", files.len(), dir.display());

        let mut report = FixReport::default();
        for path in files {
            match self.fix_file(&path) {
                Ok(0) => {
                    report.unchanged += 1;
                    cookbook_debug!("unchanged {}", path.display());
                }
                Ok(removed) => {
                    cookbook_info!("fixed {} ({} elements removed)", path.display(), removed);
                    report.fixed.push(path);
                }
                Err(err) => {
                    cookbook_warn!("could not fix {}: {}", path.display(), err);
                    report.errors.push((path, err.to_string()));
                }
            }
        }
        Ok(report)
    }

    fn fix_file(&self, path: &Path) -> Result<usize, PersistError> {
        let original = fs::read_to_string(path)?;
        let (fixed, removed) = self.fix_html(&original);
        if removed == 0 {
            return Ok(0);
        }
        let (Some(parent), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str()))
        else {
            return Err(PersistError::OutputDir(format!("bad path {}", path.display())));
        };
        AtomicFileWriter::new(parent.to_path_buf()).write(name, &fixed)?;
        Ok(removed)
    }
}

impl Default for PageFixer {
    fn default() -> Self {
        Self::new()
    }
}

fn css(selector: &'static str) -> Selector {
    match Selector::parse(selector) {
        Ok(sel) => sel,
        Err(err) => unreachable!("static selector {selector} is invalid: {err:?}"),
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn collect_html(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), PersistError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_html(&path, out)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
        {
            out.push(path);
        }
    }
    Ok(())
}
