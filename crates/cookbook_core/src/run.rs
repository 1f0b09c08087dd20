use std::fmt;

use thiserror::Error;

use crate::Source;

/// Phase of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Scraping(Source),
    Merging,
    Persisted,
    GeneratingTutorials,
    GeneratingMetadata,
    Done,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed)
    }

    /// True once the catalog snapshot has been written by this run.
    pub fn reached_persisted(self) -> bool {
        matches!(
            self,
            RunPhase::Persisted
                | RunPhase::GeneratingTutorials
                | RunPhase::GeneratingMetadata
                | RunPhase::Done
        )
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Scraping(source) => write!(f, "scraping {source}"),
            RunPhase::Merging => write!(f, "merging"),
            RunPhase::Persisted => write!(f, "persisted"),
            RunPhase::GeneratingTutorials => write!(f, "generating tutorials"),
            RunPhase::GeneratingMetadata => write!(f, "generating metadata"),
            RunPhase::Done => write!(f, "done"),
            RunPhase::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// Orchestrator starts scraping the given source.
    ScrapeStarted(Source),
    /// All sources were attempted; merging begins.
    ScrapesFinished,
    /// Catalog snapshot written.
    SnapshotWritten,
    TutorialsStarted,
    MetadataStarted,
    Finished,
    /// Run aborted between steps. Keeps persisted progress.
    Cancelled,
    /// Fatal error (load or persist).
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition from {from} on {event:?}")]
pub struct InvalidTransition {
    pub from: RunPhase,
    pub event: RunEvent,
}

/// Pure transition function for a run.
pub fn advance(phase: RunPhase, event: RunEvent) -> Result<RunPhase, InvalidTransition> {
    use RunEvent as E;
    use RunPhase as P;

    let next = match (phase, event) {
        (P::Done | P::Failed, _) => None,
        (_, E::Fatal) => Some(P::Failed),
        (current, E::Cancelled) => Some(if current.reached_persisted() {
            P::Done
        } else {
            P::Failed
        }),
        (P::Idle | P::Scraping(_), E::ScrapeStarted(source)) => Some(P::Scraping(source)),
        (P::Idle | P::Scraping(_), E::ScrapesFinished) => Some(P::Merging),
        (P::Merging, E::SnapshotWritten) => Some(P::Persisted),
        (P::Persisted, E::TutorialsStarted) => Some(P::GeneratingTutorials),
        (P::Persisted | P::GeneratingTutorials, E::MetadataStarted) => {
            Some(P::GeneratingMetadata)
        }
        (P::Persisted | P::GeneratingTutorials | P::GeneratingMetadata, E::Finished) => {
            Some(P::Done)
        }
        _ => None,
    };

    next.ok_or(InvalidTransition { from: phase, event })
}
