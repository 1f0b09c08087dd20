//! Run orchestration: scrape every source, merge, persist, then the optional
//! tutorial and metadata steps.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cookbook_core::{
    advance, merge, Catalog, InvalidTransition, MergeStats, RunEvent, RunPhase, SeoMetadata,
    Source, TemplateRecord,
};
use cookbook_logging::{
    clear_scope, cookbook_debug, cookbook_error, cookbook_info, cookbook_warn, set_scope,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::adapters::{utc_clock, Clock, Listing, N8nAdapter, SourceAdapter, ZapierAdapter};
use crate::fetch::{ReqwestTransport, Transport};
use crate::filename::{deterministic_filename, id_suffix};
use crate::frontmatter::{
    build_metadata_index, build_page_document, build_tutorial_document, strip_front_matter,
};
use crate::persist::{AtomicFileWriter, CatalogStore, PersistError};
use crate::retry::RetryingFetcher;
use crate::settings::{ConfigError, EngineSettings};
use crate::tutorial::{GenerationFailure, OpenAiTutorialWriter, TutorialWriter};
use crate::FetchError;

pub const TUTORIALS_DIR: &str = "tutorials";
pub const PAGES_DIR: &str = "pages";
pub const METADATA_INDEX: &str = "all_metadata.yaml";

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("could not build http client: {0}")]
    Transport(FetchError),
    #[error("could not load catalog: {0}")]
    Load(PersistError),
    #[error("could not persist catalog: {0}")]
    Persist(PersistError),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// A run stopped by a fatal error, with everything recorded up to that point.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    /// Phase is always `Failed`.
    pub summary: RunSummary,
    pub error: PipelineError,
}

/// Per-run switches from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub n8n_limit: usize,
    pub zapier_limit: usize,
    /// Stop after the catalog snapshot is written.
    pub scrape_only: bool,
    pub tutorials: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            n8n_limit: DEFAULT_LIMIT,
            zapier_limit: DEFAULT_LIMIT,
            scrape_only: false,
            tutorials: true,
        }
    }
}

impl RunOptions {
    pub fn limit_for(&self, source: Source) -> usize {
        match source {
            Source::N8n => self.n8n_limit,
            Source::Zapier => self.zapier_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: Source,
    pub fetched: usize,
    /// Items the adapter could not parse.
    pub skipped_items: usize,
    pub merge: MergeStats,
    pub failure: Option<String>,
}

impl SourceReport {
    fn new(source: Source) -> Self {
        Self {
            source,
            fetched: 0,
            skipped_items: 0,
            merge: MergeStats::default(),
            failure: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub phase: RunPhase,
    pub sources: Vec<SourceReport>,
    pub merge: MergeStats,
    pub catalog_len: usize,
    pub snapshot: Option<PathBuf>,
    pub tutorials: Option<StepReport>,
    pub metadata: Option<StepReport>,
    pub cancelled: bool,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
            sources: Vec::new(),
            merge: MergeStats::default(),
            catalog_len: 0,
            snapshot: None,
            tutorials: None,
            metadata: None,
            cancelled: false,
        }
    }

    /// The catalog snapshot of this run is on disk.
    pub fn is_success(&self) -> bool {
        self.phase.reached_persisted()
    }
}

/// Drives one run through its phases. Single writer of the catalog.
pub struct Orchestrator {
    adapters: Vec<Box<dyn SourceAdapter>>,
    store: CatalogStore,
    output_dir: PathBuf,
    writer: Option<Box<dyn TutorialWriter>>,
    clock: Clock,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>, output_dir: PathBuf) -> Self {
        Self {
            adapters,
            store: CatalogStore::new(output_dir.clone()),
            output_dir,
            writer: None,
            clock: utc_clock(),
            cancel: CancellationToken::new(),
        }
    }

    /// Production wiring: one shared HTTP transport, and a rate limiter per
    /// remote host (each adapter and the LLM client own a fetcher).
    pub fn from_settings(settings: &EngineSettings) -> Result<Self, PipelineError> {
        settings.validate()?;
        let transport: Arc<dyn Transport> = Arc::new(
            ReqwestTransport::new(settings.fetch.clone()).map_err(PipelineError::Transport)?,
        );
        let fetcher = || {
            RetryingFetcher::new(transport.clone(), settings.rate_limit, settings.retry)
        };
        let clock = utc_clock();

        let adapters: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(N8nAdapter::new(
                fetcher()?,
                &settings.endpoints.n8n_base,
                clock.clone(),
            )),
            Box::new(ZapierAdapter::new(
                fetcher()?,
                &settings.endpoints.zapier_base,
                clock.clone(),
            )),
        ];

        let mut orchestrator = Self::new(adapters, settings.output_dir.clone()).with_clock(clock);
        if let Some(key) = settings.llm.api_key.as_deref() {
            orchestrator = orchestrator.with_tutorial_writer(Box::new(OpenAiTutorialWriter::new(
                fetcher()?,
                key,
                &settings.llm,
            )));
        }
        Ok(orchestrator)
    }

    pub fn with_tutorial_writer(mut self, writer: Box<dyn TutorialWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Token checked between steps; cancelling it stops the run at the next check.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary, RunFailure> {
        let mut summary = RunSummary::new();
        let result = self.drive(options, &mut summary).await;
        clear_scope();
        match result {
            Ok(()) => {
                cookbook_info!("run finished in phase {}", summary.phase);
                Ok(summary)
            }
            Err(error) => {
                cookbook_error!("run failed during {}: {}", summary.phase, error);
                if let Err(err) = step(&mut summary, RunEvent::Fatal) {
                    cookbook_warn!("{}", err);
                    summary.phase = RunPhase::Failed;
                }
                Err(RunFailure { summary, error })
            }
        }
    }

    async fn drive(
        &self,
        options: &RunOptions,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        set_scope("load");
        let catalog = self.store.load().map_err(PipelineError::Load)?;
        cookbook_info!("loaded {} templates", catalog.len());

        let mut listings: Vec<(Source, Listing)> = Vec::new();
        for adapter in &self.adapters {
            if self.cancel.is_cancelled() {
                return self.stop(summary);
            }
            let source = adapter.source();
            step(summary, RunEvent::ScrapeStarted(source))?;
            set_scope(source.as_str());

            let mut report = SourceReport::new(source);
            match adapter.list_templates(options.limit_for(source)).await {
                Ok(listing) => {
                    report.fetched = listing.records.len();
                    report.skipped_items = listing.skipped;
                    listings.push((source, listing));
                }
                Err(failure) => {
                    cookbook_error!("scrape failed: {}", failure);
                    report.failure = Some(failure.to_string());
                }
            }
            summary.sources.push(report);
        }
        if self.cancel.is_cancelled() {
            return self.stop(summary);
        }

        step(summary, RunEvent::ScrapesFinished)?;
        set_scope("merge");
        let mut catalog = catalog;
        for (source, listing) in listings {
            let (merged, stats) = merge(catalog, listing.records);
            catalog = merged;
            cookbook_info!(
                "{}: {} inserted, {} updated, {} unchanged, {} skipped",
                source,
                stats.inserted,
                stats.updated,
                stats.unchanged,
                stats.skipped_malformed
            );
            if let Some(report) = summary.sources.iter_mut().find(|r| r.source == source) {
                report.merge = stats.clone();
            }
            summary.merge.absorb(stats);
        }

        set_scope("persist");
        let path = self.store.save(&catalog).map_err(PipelineError::Persist)?;
        summary.snapshot = Some(path);
        summary.catalog_len = catalog.len();
        step(summary, RunEvent::SnapshotWritten)?;

        if options.scrape_only {
            cookbook_info!("scrape-only run, skipping tutorials and metadata");
            return step(summary, RunEvent::Finished);
        }

        set_scope("files");
        self.reconcile_files(&catalog);

        if options.tutorials {
            if self.cancel.is_cancelled() {
                return self.stop(summary);
            }
            step(summary, RunEvent::TutorialsStarted)?;
            set_scope("tutorials");
            summary.tutorials = Some(self.generate_tutorials(&catalog, &summary.merge).await);
        }

        if self.cancel.is_cancelled() {
            return self.stop(summary);
        }
        step(summary, RunEvent::MetadataStarted)?;
        set_scope("metadata");
        summary.metadata = Some(self.generate_metadata(&catalog));

        step(summary, RunEvent::Finished)
    }

    fn stop(&self, summary: &mut RunSummary) -> Result<(), PipelineError> {
        cookbook_warn!("run cancelled in phase {}", summary.phase);
        summary.cancelled = true;
        step(summary, RunEvent::Cancelled)
    }

    fn reconcile_files(&self, catalog: &Catalog) {
        for sub in [TUTORIALS_DIR, PAGES_DIR] {
            let dir = self.output_dir.join(sub);
            match reconcile_renamed(&dir, catalog) {
                Ok(0) => {}
                Ok(count) => {
                    cookbook_info!("{}: moved or removed {} files of renamed templates", sub, count)
                }
                Err(err) => cookbook_warn!("could not reconcile {}: {}", dir.display(), err),
            }
        }
    }

    async fn generate_tutorials(&self, catalog: &Catalog, stats: &MergeStats) -> StepReport {
        let dir = self.output_dir.join(TUTORIALS_DIR);
        let changed: HashSet<&str> = stats.changed_ids.iter().map(String::as_str).collect();
        let targets: Vec<&TemplateRecord> = catalog
            .iter()
            .filter(|r| changed.contains(r.id.as_str()) || !dir.join(tutorial_filename(r)).exists())
            .collect();
        let mut report = StepReport::default();

        let Some(writer) = self.writer.as_deref() else {
            cookbook_warn!("no LLM API key configured, skipping {} tutorials", targets.len());
            report.skipped = targets.len();
            return report;
        };

        cookbook_info!("generating {} tutorials", targets.len());
        let files = AtomicFileWriter::new(dir);
        for (idx, record) in targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.skipped += targets.len() - idx;
                break;
            }
            match self.write_tutorial(writer, &files, record).await {
                Ok(()) => report.succeeded += 1,
                Err(err) => {
                    cookbook_warn!("tutorial for {} failed: {}", record.id, err);
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn write_tutorial(
        &self,
        writer: &dyn TutorialWriter,
        files: &AtomicFileWriter,
        record: &TemplateRecord,
    ) -> Result<(), GenerationFailure> {
        let content = writer.write(record).await?;
        let document = build_tutorial_document(record, &content, &(self.clock)())
            .map_err(|err| GenerationFailure::Write(err.to_string()))?;
        files
            .write(&tutorial_filename(record), &document)
            .map_err(|err| GenerationFailure::Write(err.to_string()))?;
        cookbook_debug!("tutorial written for {}", record.id);
        Ok(())
    }

    fn generate_metadata(&self, catalog: &Catalog) -> StepReport {
        let stamp = (self.clock)();
        let date = stamp.split('T').next().unwrap_or(&stamp);
        let tutorials = self.output_dir.join(TUTORIALS_DIR);
        let pages = AtomicFileWriter::new(self.output_dir.join(PAGES_DIR));
        let mut report = StepReport::default();
        let mut entries = Vec::with_capacity(catalog.len());

        for record in catalog.iter() {
            let tutorial = match read_tutorial(&tutorials, record) {
                Ok(text) => text,
                Err(err) => {
                    cookbook_warn!("unreadable tutorial for {}: {}", record.id, err);
                    None
                }
            };
            let body = tutorial.as_deref().map(strip_front_matter);
            let metadata = SeoMetadata::for_template(record, body, date);
            let written = build_page_document(&metadata, &page_body(record, body))
                .map_err(|err| err.to_string())
                .and_then(|page| {
                    pages
                        .write(&tutorial_filename(record), &page)
                        .map_err(|err| err.to_string())
                });
            match written {
                Ok(_) => report.succeeded += 1,
                Err(err) => {
                    cookbook_warn!("page for {} failed: {}", record.id, err);
                    report.failed += 1;
                }
            }
            entries.push(metadata);
        }

        let index = AtomicFileWriter::new(self.output_dir.clone());
        let written = build_metadata_index(&entries)
            .map_err(|err| err.to_string())
            .and_then(|yaml| {
                index
                    .write(METADATA_INDEX, &yaml)
                    .map_err(|err| err.to_string())
            });
        if let Err(err) = written {
            cookbook_error!("could not write {}: {}", METADATA_INDEX, err);
            report.failed += 1;
        }
        cookbook_info!(
            "metadata: {} pages written, {} failed",
            report.succeeded,
            report.failed
        );
        report
    }
}

fn step(summary: &mut RunSummary, event: RunEvent) -> Result<(), PipelineError> {
    let next = advance(summary.phase, event)?;
    cookbook_debug!("phase {} -> {}", summary.phase, next);
    summary.phase = next;
    Ok(())
}

pub fn tutorial_filename(record: &TemplateRecord) -> String {
    deterministic_filename(&record.title, &record.id)
}

/// Files are named after the title, so a renamed template leaves its old
/// files behind. Moves one of them to the current name when that is missing
/// and removes the rest. Returns how many files were moved or removed.
fn reconcile_renamed(dir: &Path, catalog: &Catalog) -> io::Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };
    let current: HashSet<String> = catalog.iter().map(tutorial_filename).collect();
    let mut stale: HashMap<String, Vec<String>> = HashMap::new();
    for entry in entries {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if current.contains(&name) {
            continue;
        }
        if let Some(pos) = name.rfind("--") {
            stale.entry(name[pos..].to_string()).or_default().push(name);
        }
    }

    let mut touched = 0;
    for record in catalog.iter() {
        let Some(mut names) = stale.remove(&id_suffix(&record.id)) else {
            continue;
        };
        names.sort();
        let target = dir.join(tutorial_filename(record));
        for name in names {
            let path = dir.join(&name);
            if target.exists() {
                fs::remove_file(&path)?;
            } else {
                fs::rename(&path, &target)?;
            }
            cookbook_debug!("{} -> {}", name, target.display());
            touched += 1;
        }
    }
    Ok(touched)
}

fn read_tutorial(dir: &Path, record: &TemplateRecord) -> io::Result<Option<String>> {
    match fs::read_to_string(dir.join(tutorial_filename(record))) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn page_body(record: &TemplateRecord, tutorial: Option<&str>) -> String {
    match tutorial {
        Some(text) => format!("# {}\n\n{}\n", record.title, text.trim_end()),
        None if record.description.is_empty() => {
            format!("# {}\n\n[View template]({})\n", record.title, record.url)
        }
        None => format!(
            "# {}\n\n{}\n\n[View template]({})\n",
            record.title, record.description, record.url
        ),
    }
}
