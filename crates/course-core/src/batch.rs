//! Bounded worker pool for independent sync items
//!
//! Items are handed out from a shared counter to at most `workers` scoped
//! threads. Completion order is arbitrary; results come back in input
//! order. One item's failure never stops the others, so callers encode
//! failures in `R` (usually a [`SyncOutcome`](crate::SyncOutcome)).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tracing::debug;

/// Run `f` over every item with up to `workers` threads and return the
/// results in input order.
///
/// A panicking item is re-raised on the calling thread once every worker
/// has stopped.
pub fn sync_all<T, R, F>(items: &[T], workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = workers.clamp(1, items.len().max(1));
    if workers == 1 {
        return items.iter().map(&f).collect();
    }

    debug!(items = items.len(), workers, "Starting batch");
    let next = AtomicUsize::new(0);
    let mut indexed: Vec<(usize, R)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(item) = items.get(index) else {
                            break;
                        };
                        done.push((index, f(item)));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(done) => done,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}
