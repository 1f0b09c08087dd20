//! Cookbook engine: network, persistence and the run pipeline.
mod adapters;
mod decode;
mod fetch;
mod filename;
mod frontmatter;
mod html_fix;
mod persist;
mod pipeline;
mod rate_limit;
mod retry;
mod settings;
mod tutorial;
mod types;

pub use adapters::{
    utc_clock, AdapterFailure, Clock, Listing, N8nAdapter, SourceAdapter, ZapierAdapter,
};
pub use decode::{decode_body, DecodeError};
pub use fetch::{ReqwestTransport, Transport};
pub use filename::deterministic_filename;
pub use frontmatter::{
    build_metadata_index, build_page_document, build_tutorial_document, strip_front_matter,
};
pub use html_fix::{FixReport, PageFixer};
pub use persist::{
    ensure_output_dir, load_catalog_str, AtomicFileWriter, CatalogStore, PersistError,
    CATALOG_FILENAME,
};
pub use pipeline::{
    tutorial_filename, Orchestrator, PipelineError, RunFailure, RunOptions, RunSummary, SourceReport,
    StepReport, METADATA_INDEX, PAGES_DIR, TUTORIALS_DIR,
};
pub use rate_limit::RateLimiter;
pub use retry::{FetchFailure, RetryingFetcher};
pub use settings::{
    ConfigError, EngineSettings, FetchSettings, LlmSettings, RateLimitSettings, RetryPolicy,
    SourceEndpoints,
};
pub use tutorial::{parse_completion, GenerationFailure, OpenAiTutorialWriter, TutorialWriter};
pub use types::{
    AttemptOutcome, FailureKind, FetchAttempt, FetchError, FetchRequest, FetchResponse, Method,
};
