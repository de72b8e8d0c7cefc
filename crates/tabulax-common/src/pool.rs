//! Scoped row-parallel worker pool.
//!
//! Workers claim item indexes from a shared atomic counter and send results
//! back over a channel; the caller receives them in original order. Items not
//! started before the cancellation token trips come back as `None`.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel::unbounded;
use tracing::trace;

use crate::CancellationToken;

/// Number of workers used when the caller does not pick one.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Resolves a requested worker count against the number of items.
///
/// `None` or `Some(0)` selects [`default_workers`]. The result is never larger
/// than `items` and never smaller than 1.
pub fn effective_workers(requested: Option<usize>, items: usize) -> usize {
    let requested = requested.filter(|&n| n > 0).unwrap_or_else(default_workers);
    requested.min(items).max(1)
}

/// Applies `f` to every item, in parallel, preserving item order.
///
/// `f` receives the item index and the item. With one worker the items run
/// inline on the calling thread.
pub fn parallel_map<T, R, F>(
    items: &[T],
    workers: usize,
    cancel: &CancellationToken,
    f: F,
) -> Vec<Option<R>>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync,
{
    let workers = workers.min(items.len()).max(1);
    if workers == 1 {
        return items
            .iter()
            .enumerate()
            .map(|(index, item)| (!cancel.is_cancelled()).then(|| f(index, item)))
            .collect();
    }

    trace!(workers, items = items.len(), "starting worker pool");
    let next = AtomicUsize::new(0);
    let (sender, receiver) = unbounded::<(usize, R)>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let sender = sender.clone();
            let next = &next;
            let f = &f;
            scope.spawn(move || {
                while !cancel.is_cancelled() {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(item) = items.get(index) else {
                        break;
                    };
                    if sender.send((index, f(index, item))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(sender);

    let mut results: Vec<Option<R>> = std::iter::repeat_with(|| None).take(items.len()).collect();
    for (index, value) in receiver {
        results[index] = Some(value);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_order() {
        let items: Vec<u64> = (0..500).collect();
        let out = parallel_map(&items, 4, &CancellationToken::new(), |i, v| {
            assert_eq!(i as u64, *v);
            v * 2
        });
        let out: Vec<u64> = out.into_iter().map(|v| v.unwrap()).collect();
        assert_eq!(out, items.iter().map(|v| v * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_inline_single_worker() {
        let items = ["a", "b"];
        let out = parallel_map(&items, 1, &CancellationToken::new(), |_, s| s.to_uppercase());
        assert_eq!(out, vec![Some("A".to_string()), Some("B".to_string())]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = AtomicUsize::new(0);
        let out = parallel_map(&[1, 2, 3], 2, &token, |_, v| {
            calls.fetch_add(1, Ordering::SeqCst);
            *v
        });
        assert_eq!(out, vec![None, None, None]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_midway_keeps_finished_rows() {
        let token = CancellationToken::new();
        let items: Vec<usize> = (0..20).collect();
        let out = parallel_map(&items, 1, &token, |i, v| {
            if i == 4 {
                token.cancel();
            }
            *v
        });
        assert!(out[..5].iter().all(Option::is_some));
        assert!(out[5..].iter().all(Option::is_none));
    }

    #[test]
    fn test_empty_input() {
        let empty: [i32; 0] = [];
        let out = parallel_map(&empty, 8, &CancellationToken::new(), |_, v| *v);
        assert!(out.is_empty());
    }

    #[test]
    fn test_effective_workers_bounds() {
        assert_eq!(effective_workers(Some(8), 3), 3);
        assert_eq!(effective_workers(Some(2), 100), 2);
        assert_eq!(effective_workers(Some(4), 0), 1);
        assert!(effective_workers(None, 1000) >= 1);
        assert!(effective_workers(Some(0), 1000) >= 1);
    }
}
