//! Nearest-neighbour join on a transformed column.
//!
//! Every source row is matched to the single target row closest to it, as
//! long as the distance is within the threshold. Text categories compare by
//! bounded edit distance; the numeric category compares parsed values.
//! Candidates are pruned before any distance is computed: text targets are
//! bucketed by length and numeric targets are sorted by value, so only the
//! window that can still fall under the threshold is visited.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tabulax_common::{CancellationToken, effective_workers, parallel_map};
use tabulax_distance::{BoundedDistance, DistanceEngine};
use tabulax_model::{
    CellValue, JoinCandidate, JoinResult, Row, Table, TransformationCategory, parse_number,
};
use tracing::{debug, info, warn};

use crate::error::{JoinError, Result};
use crate::options::{JoinOptions, UnmatchedPolicy};

/// Column holding the distance of the chosen match.
pub const DISTANCE_COLUMN: &str = "join_distance";

/// Runs fuzzy joins with a fixed configuration.
///
/// `Numerical` joins compare parsed values by absolute difference. Every
/// other category, `General` included, compares text by edit distance, so a
/// `General` join still matches near-identical strings instead of leaving
/// every row unmatched.
#[derive(Debug, Clone, Default)]
pub struct FuzzyJoiner {
    options: JoinOptions,
    cancel: CancellationToken,
}

impl FuzzyJoiner {
    pub fn new(options: JoinOptions) -> Self {
        Self {
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Source rows not started once the token trips are listed as cancelled.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &JoinOptions {
        &self.options
    }

    /// Joins `source` against `target`.
    ///
    /// Fails before any matching if the threshold is invalid or a join
    /// column is absent from a non-empty table. Source rows without a match
    /// are never an error.
    pub fn join(
        &self,
        source: &Table,
        target: &Table,
        source_column: &str,
        target_column: &str,
        category: TransformationCategory,
    ) -> Result<JoinResult> {
        let max = self.options.max_distance;
        if max.is_nan() || max < 0.0 {
            return Err(JoinError::InvalidMaxDistance(max));
        }
        if self.options.target_prefix.is_empty() {
            return Err(JoinError::EmptyPrefix);
        }
        check_column(source, source_column, "source")?;
        check_column(target, target_column, "target")?;

        let started = Instant::now();
        let matcher = Matcher::build(&self.options, target, target_column, category);
        let workers = effective_workers(self.options.workers, source.len());
        let found = parallel_map(source.rows(), workers, &self.cancel, |_, row| {
            matcher.best(row.get(source_column))
        });

        let result = self.assemble(source, target, found);
        info!(
            %category,
            source_rows = source.len(),
            target_rows = target.len(),
            matched = result.matches.len(),
            unmatched = result.unmatched.len(),
            workers,
            elapsed = ?started.elapsed(),
            "fuzzy join finished"
        );
        if !result.cancelled.is_empty() {
            warn!(
                cancelled = result.cancelled.len(),
                "fuzzy join stopped before every source row ran"
            );
        }
        Ok(result)
    }

    fn assemble(
        &self,
        source: &Table,
        target: &Table,
        found: Vec<Option<Option<(usize, f64)>>>,
    ) -> JoinResult {
        let target_columns = target.columns();
        let prefix = self.options.target_prefix.as_str();

        let mut data = Vec::new();
        let mut matches = Vec::new();
        let mut unmatched = Vec::new();
        let mut cancelled = Vec::new();

        for (source_index, (row, found)) in source.rows().iter().zip(found).enumerate() {
            match found {
                Some(Some((target_index, distance))) => {
                    matches.push(JoinCandidate {
                        source_index,
                        target_index,
                        distance,
                    });
                    let matched = &target.rows()[target_index];
                    let value = |column: &str| matched.get(column).clone();
                    let distance = CellValue::Number(distance);
                    data.push(joined_row(row, &target_columns, prefix, value, distance));
                }
                Some(None) => {
                    unmatched.push(source_index);
                    if self.options.unmatched == UnmatchedPolicy::Flag {
                        data.push(joined_row(
                            row,
                            &target_columns,
                            prefix,
                            |_| CellValue::Null,
                            CellValue::Null,
                        ));
                    }
                }
                None => cancelled.push(source_index),
            }
        }

        JoinResult {
            success: cancelled.is_empty(),
            data: Table::new(data),
            matches,
            unmatched,
            cancelled,
        }
    }
}

/// Joins with default options and the given threshold.
pub fn fuzzy_join(
    source: &Table,
    target: &Table,
    source_column: &str,
    target_column: &str,
    category: TransformationCategory,
    max_distance: f64,
) -> Result<JoinResult> {
    FuzzyJoiner::new(JoinOptions::default().with_max_distance(max_distance)).join(
        source,
        target,
        source_column,
        target_column,
        category,
    )
}

fn check_column(table: &Table, column: &str, side: &'static str) -> Result<()> {
    if table.is_empty() || table.has_column(column) {
        Ok(())
    } else {
        Err(JoinError::MissingColumn {
            side,
            column: column.to_string(),
        })
    }
}

fn joined_row(
    source: &Row,
    target_columns: &BTreeSet<String>,
    prefix: &str,
    value: impl Fn(&str) -> CellValue,
    distance: CellValue,
) -> Row {
    let mut row = source.clone();
    for column in target_columns {
        row.insert(format!("{prefix}{column}"), value(column));
    }
    row.insert(DISTANCE_COLUMN, distance);
    row
}

/// Keeps the better of two candidates: smaller distance, then lower index.
fn improves<D: PartialOrd>(best: Option<&(D, usize)>, distance: &D, index: usize) -> bool {
    best.is_none_or(|(d, i)| distance < d || (distance == d && index < *i))
}

// =============================================================================
// Candidate indexes
// =============================================================================

enum Matcher {
    Text(TextIndex),
    Numeric(NumericIndex),
}

impl Matcher {
    fn build(
        options: &JoinOptions,
        target: &Table,
        column: &str,
        category: TransformationCategory,
    ) -> Self {
        if category.is_numeric() {
            Self::Numeric(NumericIndex::build(target, column, options.max_distance))
        } else {
            Self::Text(TextIndex::build(target, column, options))
        }
    }

    /// Best target for a source value as `(target_index, distance)`.
    fn best(&self, value: &CellValue) -> Option<(usize, f64)> {
        match self {
            Self::Text(index) => index.best(value),
            Self::Numeric(index) => index.best(value),
        }
    }
}

/// Normalized target values grouped by length in chars.
struct TextIndex {
    engine: DistanceEngine,
    buckets: BTreeMap<usize, Vec<(usize, Vec<char>)>>,
    longest: usize,
    bound: usize,
}

impl TextIndex {
    fn build(target: &Table, column: &str, options: &JoinOptions) -> Self {
        let engine = DistanceEngine::new(options.distance);
        let mut buckets: BTreeMap<usize, Vec<(usize, Vec<char>)>> = BTreeMap::new();
        for (index, row) in target.rows().iter().enumerate() {
            if let Some(text) = row.get(column).as_text() {
                let chars: Vec<char> = engine.normalize(&text).chars().collect();
                buckets.entry(chars.len()).or_default().push((index, chars));
            }
        }
        let longest = buckets.keys().next_back().copied().unwrap_or(0);
        debug!(
            values = buckets.values().map(Vec::len).sum::<usize>(),
            lengths = buckets.len(),
            "text join index built"
        );
        Self {
            engine,
            buckets,
            longest,
            // Saturating cast: an infinite threshold becomes usize::MAX.
            bound: options.max_distance.floor() as usize,
        }
    }

    fn best(&self, value: &CellValue) -> Option<(usize, f64)> {
        let text = value.as_text()?;
        let chars: Vec<char> = self.engine.normalize(&text).chars().collect();
        let len = chars.len();

        // No edit distance exceeds the longer of the two lengths.
        let mut bound = self.bound.min(len.max(self.longest));
        let window = len.saturating_sub(bound)..=len.saturating_add(bound);
        let mut best: Option<(usize, usize)> = None;

        for candidates in self.buckets.range(window).map(|(_, c)| c) {
            for (index, candidate) in candidates {
                if candidate.len().abs_diff(len) > bound {
                    continue;
                }
                if let BoundedDistance::Exact(distance) =
                    self.engine.distance_prepared(&chars, candidate, bound)
                    && improves(best.as_ref(), &distance, *index)
                {
                    best = Some((distance, *index));
                    bound = distance;
                }
            }
        }
        best.map(|(distance, index)| (index, distance as f64))
    }
}

/// Parsed target values sorted by value, then row index.
struct NumericIndex {
    sorted: Vec<(f64, usize)>,
    max: f64,
}

impl NumericIndex {
    fn build(target: &Table, column: &str, max: f64) -> Self {
        let mut sorted: Vec<(f64, usize)> = target
            .rows()
            .iter()
            .enumerate()
            .filter_map(|(index, row)| Some((numeric_value(row.get(column))?, index)))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        debug!(values = sorted.len(), "numeric join index built");
        Self { sorted, max }
    }

    fn best(&self, value: &CellValue) -> Option<(usize, f64)> {
        let x = numeric_value(value)?;
        let start = self.sorted.partition_point(|(v, _)| *v < x - self.max);
        let mut best: Option<(f64, usize)> = None;
        for &(v, index) in self.sorted[start..]
            .iter()
            .take_while(|(v, _)| *v <= x + self.max)
        {
            let distance = (v - x).abs();
            if distance <= self.max && improves(best.as_ref(), &distance, index) {
                best = Some((distance, index));
            }
        }
        best.map(|(distance, index)| (index, distance))
    }
}

fn numeric_value(value: &CellValue) -> Option<f64> {
    let number = match value {
        CellValue::Number(n) => *n,
        other => parse_number(&other.as_text()?)?,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improves_prefers_lower_index_on_tie() {
        assert!(improves(None, &3, 7));
        assert!(improves(Some(&(2, 5)), &1, 9));
        assert!(improves(Some(&(2, 5)), &2, 4));
        assert!(!improves(Some(&(2, 5)), &2, 6));
        assert!(!improves(Some(&(2, 5)), &3, 0));
    }

    #[test]
    fn test_text_bound_tightens_but_sees_ties() {
        let target = Table::from_column("k", ["abcx", "abcy", "abc"]);
        let index = TextIndex::build(&target, "k", &JoinOptions::default().with_max_distance(2.0));
        assert_eq!(index.best(&CellValue::text("abcz")), Some((0, 1.0)));
        assert_eq!(index.best(&CellValue::text("abc")), Some((2, 0.0)));
        assert_eq!(index.best(&CellValue::Null), None);
    }

    #[test]
    fn test_infinite_threshold_matches_anything() {
        let target = Table::from_column("k", ["completely different"]);
        let options = JoinOptions::default().with_max_distance(f64::INFINITY);
        let index = TextIndex::build(&target, "k", &options);
        assert!(index.best(&CellValue::text("x")).is_some());
    }

    #[test]
    fn test_numeric_window() {
        let target = Table::from_column(
            "k",
            [
                CellValue::text("10.5"),
                CellValue::Number(9.5),
                CellValue::text("n/a"),
                CellValue::Number(20.0),
            ],
        );
        let index = NumericIndex::build(&target, "k", 0.5);
        assert_eq!(index.best(&CellValue::text("10")), Some((0, 0.5)));
        assert_eq!(index.best(&CellValue::Number(19.75)), Some((3, 0.25)));
        assert_eq!(index.best(&CellValue::text("15")), None);
        assert_eq!(index.best(&CellValue::text("n/a")), None);
    }
}
