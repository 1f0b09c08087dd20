//! Source adapters: turn remote listings into raw template records.
mod n8n;
mod zapier;

use std::sync::Arc;

use cookbook_core::{RawRecord, Source};
use thiserror::Error;

use crate::decode::DecodeError;
use crate::retry::FetchFailure;

pub use n8n::N8nAdapter;
pub use zapier::ZapierAdapter;

/// Produces the RFC 3339 timestamp stamped on fetched records.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

pub fn utc_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().to_rfc3339())
}

/// Records gathered by one `list_templates` call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Listing {
    pub records: Vec<RawRecord>,
    /// Items that could not be parsed and were dropped.
    pub skipped: usize,
    pub pages: usize,
}

/// A failure that makes a whole listing call unusable.
#[derive(Debug, Error)]
pub enum AdapterFailure {
    #[error("{platform}: {failure}")]
    Fetch {
        platform: Source,
        failure: FetchFailure,
    },
    #[error("{platform}: {error}")]
    Decode {
        platform: Source,
        error: DecodeError,
    },
    #[error("{platform}: unexpected response: {reason}")]
    Shape { platform: Source, reason: String },
}

impl AdapterFailure {
    pub fn platform(&self) -> Source {
        match self {
            AdapterFailure::Fetch { platform, .. }
            | AdapterFailure::Decode { platform, .. }
            | AdapterFailure::Shape { platform, .. } => *platform,
        }
    }
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    /// Lists at most `limit` templates, stopping early when the source runs out.
    async fn list_templates(&self, limit: usize) -> Result<Listing, AdapterFailure>;
}
