use crate::{Source, TemplateRecord};

/// Read-side filter over a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateQuery {
    /// Source name as given by the caller. Empty means no filter.
    pub source: Option<String>,
    /// Maximum number of results. `None` returns all matches.
    pub limit: Option<usize>,
}

/// Filters `records` by source and truncates to `limit`, keeping catalog order.
///
/// An unrecognised source name matches nothing.
pub fn query_templates<'a>(
    records: &'a [TemplateRecord],
    query: &TemplateQuery,
) -> Vec<&'a TemplateRecord> {
    let wanted = match query.source.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => match Source::parse(name) {
            Some(source) => Some(source),
            None => return Vec::new(),
        },
    };

    let matches = records
        .iter()
        .filter(|record| wanted.is_none_or(|source| record.source == source));
    match query.limit {
        Some(limit) => matches.take(limit).collect(),
        None => matches.collect(),
    }
}
