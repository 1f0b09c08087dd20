use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{RawRecord, TemplateRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate template id '{0}'")]
    DuplicateId(String),
    #[error("template with empty id at position {0}")]
    EmptyId(usize),
}

/// Insertion-ordered set of templates keyed by id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    records: Vec<TemplateRecord>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a catalog from a persisted snapshot, rejecting duplicate or empty ids.
    pub fn from_records(records: Vec<TemplateRecord>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if record.id.trim().is_empty() {
                return Err(CatalogError::EmptyId(pos));
            }
            if index.insert(record.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(record.id.clone()));
            }
        }
        Ok(Self { records, index })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TemplateRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn records(&self) -> &[TemplateRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<TemplateRecord> {
        self.records
    }

    fn push(&mut self, record: TemplateRecord) {
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
    }
}

/// Outcome counters of one [`merge`] call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped_malformed: usize,
    /// Ids inserted or updated by this merge, in first-touched order.
    pub changed_ids: Vec<String>,
}

impl MergeStats {
    pub fn absorb(&mut self, other: MergeStats) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.skipped_malformed += other.skipped_malformed;
        for id in other.changed_ids {
            if !self.changed_ids.contains(&id) {
                self.changed_ids.push(id);
            }
        }
    }
}

/// Merges freshly scraped records into `catalog`.
///
/// Unknown ids are appended in the order first seen. Known ids keep their
/// position, id, source and `first_seen_utc`; every other field is replaced.
/// Records without an id, or whose source disagrees with the stored one, are
/// skipped.
pub fn merge(
    mut catalog: Catalog,
    records: impl IntoIterator<Item = RawRecord>,
) -> (Catalog, MergeStats) {
    let mut stats = MergeStats::default();
    let mut touched: HashSet<String> = HashSet::new();

    for raw in records {
        let Some(incoming) = raw.into_template() else {
            stats.skipped_malformed += 1;
            continue;
        };

        match catalog.index.get(&incoming.id).copied() {
            None => {
                stats.inserted += 1;
                if touched.insert(incoming.id.clone()) {
                    stats.changed_ids.push(incoming.id.clone());
                }
                catalog.push(incoming);
            }
            Some(pos) => {
                let existing = &mut catalog.records[pos];
                if existing.source != incoming.source {
                    stats.skipped_malformed += 1;
                    continue;
                }
                if same_content(existing, &incoming) {
                    stats.unchanged += 1;
                    continue;
                }
                existing.title = incoming.title;
                existing.description = incoming.description;
                existing.url = incoming.url;
                existing.category = incoming.category;
                existing.raw_metadata = incoming.raw_metadata;
                if existing.first_seen_utc.is_empty() {
                    existing.first_seen_utc = incoming.first_seen_utc;
                }
                stats.updated += 1;
                if touched.insert(existing.id.clone()) {
                    stats.changed_ids.push(existing.id.clone());
                }
            }
        }
    }

    (catalog, stats)
}

fn same_content(a: &TemplateRecord, b: &TemplateRecord) -> bool {
    a.title == b.title
        && a.description == b.description
        && a.url == b.url
        && a.category == b.category
        && a.raw_metadata == b.raw_metadata
}
