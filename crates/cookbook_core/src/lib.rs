//! Cookbook core: pure catalog model, merge rules and run state machine.
mod catalog;
mod query;
mod record;
mod run;
mod seo;
mod tutorial;

pub use catalog::{merge, Catalog, CatalogError, MergeStats};
pub use query::{query_templates, TemplateQuery};
pub use record::{RawRecord, Source, TemplateRecord};
pub use run::{advance, InvalidTransition, RunEvent, RunPhase};
pub use seo::{SeoBlock, SeoMetadata, DESCRIPTION_LIMIT};
pub use tutorial::{build_prompt, parse_sections, TutorialSection, SYSTEM_PROMPT};
