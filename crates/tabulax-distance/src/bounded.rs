//! Banded Levenshtein DP with early abandonment.

/// Result of a bounded distance computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundedDistance {
    /// The exact distance, which is at most the bound.
    Exact(usize),
    /// The distance is larger than the bound.
    Exceeds,
}

impl BoundedDistance {
    pub fn value(self) -> Option<usize> {
        match self {
            Self::Exact(d) => Some(d),
            Self::Exceeds => None,
        }
    }

    pub fn is_within(self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

/// Edit distance between `a` and `b`, or [`BoundedDistance::Exceeds`] once it
/// is known to be larger than `max`.
///
/// Only the diagonal band of width `2 * max + 1` is evaluated, pairs whose
/// lengths differ by more than `max` are rejected before any DP work, and the
/// scan stops as soon as a whole band row exceeds `max`. Cost is
/// `O(len(a) * max)`.
pub fn bounded_distance(a: &str, b: &str, max: usize) -> BoundedDistance {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    bounded_chars(&a, &b, max)
}

/// Unbounded edit distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max = a.len().max(b.len());
    bounded_chars(&a, &b, max).value().unwrap_or(max)
}

pub(crate) fn bounded_chars(a: &[char], b: &[char], max: usize) -> BoundedDistance {
    if a.len().abs_diff(b.len()) > max {
        return BoundedDistance::Exceeds;
    }

    // Shared prefix and suffix never contribute to the distance.
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    let (n, m) = (a.len(), b.len());
    if n == 0 {
        return BoundedDistance::Exact(m);
    }
    if m == 0 {
        return BoundedDistance::Exact(n);
    }

    // Cells are capped at `cap`; anything at the cap is "more than max".
    let cap = max + 1;
    let mut prev: Vec<usize> = (0..=m).map(|j| j.min(cap)).collect();
    let mut cur = vec![cap; m + 1];

    for i in 1..=n {
        let lo = i.saturating_sub(max).max(1);
        let hi = (i + max).min(m);

        cur[0] = i.min(cap);
        if lo > 1 {
            cur[lo - 1] = cap;
        }
        let mut row_min = cur[lo - 1];

        for j in lo..=hi {
            let substitution = prev[j - 1] + usize::from(a[i - 1] != b[j - 1]);
            let value = substitution.min(prev[j] + 1).min(cur[j - 1] + 1).min(cap);
            cur[j] = value;
            row_min = row_min.min(value);
        }
        if hi < m {
            cur[hi + 1] = cap;
        }

        if row_min > max {
            return BoundedDistance::Exceeds;
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    match prev[m] {
        d if d <= max => BoundedDistance::Exact(d),
        _ => BoundedDistance::Exceeds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_identity() {
        assert_eq!(bounded_distance("", "", 0), BoundedDistance::Exact(0));
        assert_eq!(bounded_distance("abc", "abc", 0), BoundedDistance::Exact(0));
        assert_eq!(bounded_distance("", "ab", 2), BoundedDistance::Exact(2));
        assert_eq!(bounded_distance("", "ab", 1), BoundedDistance::Exceeds);
    }

    #[test]
    fn test_known_distances() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("Jon", "John"), 1);
        assert_eq!(levenshtein("Mary-Ann", "MaryAnn"), 1);
        assert_eq!(bounded_distance("kitten", "sitting", 3), BoundedDistance::Exact(3));
        assert_eq!(bounded_distance("kitten", "sitting", 2), BoundedDistance::Exceeds);
    }

    #[test]
    fn test_length_precheck() {
        assert_eq!(bounded_distance("a", "abcdef", 2), BoundedDistance::Exceeds);
    }

    #[test]
    fn test_compares_chars_not_bytes() {
        assert_eq!(levenshtein("café", "cafe"), 1);
        assert_eq!(bounded_distance("日本語", "日本", 1), BoundedDistance::Exact(1));
    }

    #[test]
    fn test_zero_bound() {
        assert_eq!(bounded_distance("abc", "abd", 0), BoundedDistance::Exceeds);
        assert_eq!(bounded_distance("abc", "abc", 0), BoundedDistance::Exact(0));
    }
}
