//! Joining a stage of independent requests.

use crate::error::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;

/// Drive every future to completion and collect results in input order.
///
/// Siblings are never cancelled: a failure does not stop the others, but the
/// first error to complete becomes the stage's result and all successful
/// values are discarded.
pub(crate) async fn gather<I, F, T>(futures: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    let mut pending: FuturesUnordered<_> = futures
        .into_iter()
        .enumerate()
        .map(|(index, fut)| async move { (index, fut.await) })
        .collect();

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None)
        .take(pending.len())
        .collect();
    let mut first_error = None;

    while let Some((index, result)) = pending.next().await {
        match result {
            Ok(value) => slots[index] = Some(value),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => tracing::debug!(error = %e, "Additional failure in stage"),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(slots.into_iter().flatten().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_preserves_input_order() {
        let delays = [30u64, 10, 20];
        let results = gather(delays.iter().map(|&ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(ms)
        }))
        .await
        .unwrap();

        assert_eq!(results, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn test_empty_stage() {
        let results: Vec<u32> = gather(Vec::<std::future::Ready<Result<u32>>>::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_first_completed_error_wins_and_siblings_finish() {
        let finished = AtomicUsize::new(0);
        let finished = &finished;

        let result: Result<Vec<u64>> = gather((0..4u64).map(|i| async move {
            tokio::time::sleep(Duration::from_millis(10 * (4 - i))).await;
            finished.fetch_add(1, Ordering::SeqCst);
            if i >= 2 {
                Err(ClientError::Config(format!("failure {}", i)))
            } else {
                Ok(i)
            }
        }))
        .await;

        // i = 3 sleeps the least, so it fails first
        match result {
            Err(ClientError::Config(msg)) => assert_eq!(msg, "failure 3"),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(finished.load(Ordering::SeqCst), 4);
    }
}
