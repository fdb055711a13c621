//! Resolve many targets concurrently.
//!
//! Keeps up to `max_concurrent` resolutions running at once; when one
//! finishes, the next queued target is started until the queue is empty.

use std::sync::Arc;

use crate::error::ResolveError;

use super::{ResolutionOutcome, Resolver, Target};

/// Resolves every target with at most `max_concurrent` in flight and returns
/// the outcomes in input order, one per target.
///
/// A resolution task that dies without an outcome is reported as a
/// `Browser` error for its target rather than dropped.
pub async fn resolve_all(
    resolver: Arc<Resolver>,
    targets: Vec<Target>,
    max_concurrent: usize,
) -> Vec<(Target, ResolutionOutcome)> {
    let max_concurrent = max_concurrent.max(1);
    let mut outcomes: Vec<Option<ResolutionOutcome>> = targets.iter().map(|_| None).collect();
    let mut queue = targets.iter().cloned().enumerate();
    let mut join_set = tokio::task::JoinSet::new();

    loop {
        while join_set.len() < max_concurrent {
            let Some((index, target)) = queue.next() else {
                break;
            };
            let resolver = Arc::clone(&resolver);
            join_set.spawn(async move {
                let outcome = resolver.resolve(&target).await;
                (index, outcome)
            });
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => tracing::error!("resolution task join: {}", e),
        }
    }

    targets
        .into_iter()
        .zip(outcomes)
        .map(|(target, outcome)| {
            let outcome = outcome.unwrap_or_else(|| {
                Err(ResolveError::Browser("resolution task ended without an outcome".to_string()))
            });
            (target, outcome)
        })
        .collect()
}
