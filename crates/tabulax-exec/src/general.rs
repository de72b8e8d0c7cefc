//! General transformations: example lookup, then the external resolver.
//!
//! Each row's trimmed input is matched against the stored examples, first
//! exactly and then ignoring case. Values left over are sent to the resolver
//! once per distinct value, in parallel, and the answers are shared by every
//! row carrying that value.

use std::collections::{HashMap, HashSet};

use tabulax_common::{CancellationToken, parallel_map};
use tabulax_model::{FailureKind, Provenance, Table, TransformationExample};
use tabulax_resolve::{ResolveError, ResolveRequest, ValueResolver};
use tracing::debug;

use crate::row::{RowResult, input_text};

/// Example pairs indexed by trimmed source value.
#[derive(Debug, Default)]
pub(crate) struct ExampleLookup {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
}

impl ExampleLookup {
    /// Indexes the examples. When a source repeats, its first target wins.
    pub(crate) fn new(examples: &[TransformationExample]) -> Self {
        let mut lookup = Self::default();
        for example in examples {
            let source = example.source.trim();
            let target = example.target.trim();
            if source.is_empty() || target.is_empty() {
                continue;
            }
            lookup
                .exact
                .entry(source.to_string())
                .or_insert_with(|| target.to_string());
            lookup
                .folded
                .entry(source.to_lowercase())
                .or_insert_with(|| target.to_string());
        }
        lookup
    }

    pub(crate) fn find(&self, value: &str) -> Option<(&str, Provenance)> {
        if let Some(target) = self.exact.get(value) {
            return Some((target, Provenance::ExampleExact));
        }
        self.folded
            .get(&value.to_lowercase())
            .map(|target| (target.as_str(), Provenance::ExampleCaseInsensitive))
    }
}

enum Pending {
    Ready(RowResult),
    Resolve(String),
}

pub(crate) struct GeneralRun<'a> {
    pub(crate) description: Option<&'a str>,
    pub(crate) examples: &'a [TransformationExample],
    pub(crate) resolver: &'a dyn ValueResolver,
}

impl GeneralRun<'_> {
    pub(crate) fn run(
        &self,
        table: &Table,
        input: &str,
        workers: usize,
        cancel: &CancellationToken,
    ) -> Vec<Option<RowResult>> {
        let lookup = ExampleLookup::new(self.examples);

        let pending: Vec<Option<Pending>> = table
            .rows()
            .iter()
            .map(|row| {
                if cancel.is_cancelled() {
                    return None;
                }
                let text = match input_text(row, input) {
                    Ok(text) => text,
                    Err(failed) => return Some(Pending::Ready(failed)),
                };
                let value = text.trim();
                if value.is_empty() {
                    return Some(Pending::Ready(RowResult::failed(
                        FailureKind::MissingInput,
                        format!("input column `{input}` is blank"),
                    )));
                }
                Some(match lookup.find(value) {
                    Some((target, provenance)) => {
                        Pending::Ready(RowResult::done(target.to_string(), provenance))
                    }
                    None => Pending::Resolve(value.to_string()),
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let distinct: Vec<&str> = pending
            .iter()
            .filter_map(|p| match p {
                Some(Pending::Resolve(value)) => Some(value.as_str()),
                _ => None,
            })
            .filter(|value| seen.insert(*value))
            .collect();
        debug!(
            rows = table.len(),
            distinct = distinct.len(),
            "resolving values not covered by examples"
        );

        let answers = parallel_map(&distinct, workers, cancel, |_, value| {
            self.resolver
                .resolve(&ResolveRequest::new(self.description, self.examples, *value))
        });
        let cache: HashMap<&str, Option<Result<String, ResolveError>>> =
            distinct.iter().copied().zip(answers).collect();

        pending
            .iter()
            .map(|pending| match pending {
                None => None,
                Some(Pending::Ready(result)) => Some(result.clone()),
                Some(Pending::Resolve(value)) => match cache.get(value.as_str()) {
                    Some(Some(Ok(resolved))) => {
                        Some(RowResult::done(resolved.clone(), Provenance::Resolver))
                    }
                    Some(Some(Err(err))) => {
                        Some(RowResult::failed(FailureKind::Resolver, err.to_string()))
                    }
                    _ => None,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_order() {
        let examples = [
            TransformationExample::new(" Japan ", "Tokyo"),
            TransformationExample::new("japan", "Kyoto"),
            TransformationExample::new("France", "Paris"),
        ];
        let lookup = ExampleLookup::new(&examples);
        assert_eq!(lookup.find("Japan"), Some(("Tokyo", Provenance::ExampleExact)));
        assert_eq!(lookup.find("japan"), Some(("Kyoto", Provenance::ExampleExact)));
        assert_eq!(
            lookup.find("FRANCE"),
            Some(("Paris", Provenance::ExampleCaseInsensitive))
        );
        assert_eq!(lookup.find("Peru"), None);
    }

    #[test]
    fn test_blank_examples_skipped() {
        let lookup = ExampleLookup::new(&[TransformationExample::new("  ", "x")]);
        assert_eq!(lookup.find(""), None);
    }
}
