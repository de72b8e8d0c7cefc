use serde::{Deserialize, Serialize};

use crate::Table;

/// The chosen match for one source row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JoinCandidate {
    pub source_index: usize,
    pub target_index: usize,
    pub distance: f64,
}

/// Result of a fuzzy join.
///
/// `matches` holds at most one candidate per source row, in source order.
/// `unmatched` and `cancelled` list source row indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinResult {
    pub success: bool,
    pub data: Table,
    pub matches: Vec<JoinCandidate>,
    pub unmatched: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cancelled: Vec<usize>,
}

impl JoinResult {
    /// Returns the candidate chosen for a source row, if any.
    pub fn candidate_for(&self, source_index: usize) -> Option<&JoinCandidate> {
        self.matches
            .binary_search_by_key(&source_index, |c| c.source_index)
            .ok()
            .map(|i| &self.matches[i])
    }
}
