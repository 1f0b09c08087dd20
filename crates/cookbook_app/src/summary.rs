use std::fmt::Write;

use cookbook_engine::{FixReport, RunSummary, StepReport};

/// Human-readable end-of-run report.
pub fn render_run(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Run {}{}", summary.phase, if summary.cancelled { " (cancelled)" } else { "" });
    for source in &summary.sources {
        match &source.failure {
            Some(failure) => {
                let _ = writeln!(out, "  {:<7} FAILED: {}", source.source.as_str(), failure);
            }
            None => {
                let _ = writeln!(
                    out,
                    "  {:<7} fetched {}, inserted {}, updated {}, unchanged {}, skipped {}",
                    source.source.as_str(),
                    source.fetched,
                    source.merge.inserted,
                    source.merge.updated,
                    source.merge.unchanged,
                    source.skipped_items + source.merge.skipped_malformed
                );
            }
        }
    }
    if let Some(path) = &summary.snapshot {
        let _ = writeln!(out, "  catalog  {} templates in {}", summary.catalog_len, path.display());
    }
    step_line(&mut out, "tutorials", summary.tutorials.as_ref());
    step_line(&mut out, "metadata", summary.metadata.as_ref());
    out
}

fn step_line(out: &mut String, name: &str, report: Option<&StepReport>) {
    if let Some(report) = report {
        let _ = writeln!(
            out,
            "  {:<9}{} ok, {} failed, {} skipped",
            name, report.succeeded, report.failed, report.skipped
        );
    }
}

pub fn render_fix(report: &FixReport) -> String {
    let mut out = String::new();
    for path in &report.fixed {
        let _ = writeln!(out, "fixed      {}", path.display());
    }
    for (path, err) in &report.errors {
        let _ = writeln!(out, "error      {}: {}", path.display(), err);
    }
    let _ = writeln!(
        out,
        "{} fixed, {} unchanged, {} errors",
        report.fixed.len(),
        report.unchanged,
        report.errors.len()
    );
    out
}
