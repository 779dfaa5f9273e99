//! Bounded worker pool for the check phase
//!
//! A fixed number of workers share one job queue. The producer feeds it through
//! a single-slot channel, so it only gets ahead of the workers by one job. Results
//! flow back through a channel sized to the pool so workers rarely block on send.

use crate::check::Checker;
use crate::state::CheckResult;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Checks every URL with `concurrency` workers
///
/// `on_result` is called on the calling task for each result as it arrives.
/// Results are returned in completion order; callers sort them.
///
/// # Arguments
///
/// * `checker` - The probe each worker runs
/// * `urls` - The links to check, in dispatch order
/// * `concurrency` - Number of workers (at least one is always started)
/// * `cancel` - The run's cancellation token, handed to every probe
/// * `on_result` - Observer for progress reporting
pub async fn check_all<F>(
    checker: &Checker,
    urls: Vec<String>,
    concurrency: usize,
    cancel: &CancellationToken,
    mut on_result: F,
) -> Vec<CheckResult>
where
    F: FnMut(&CheckResult),
{
    let concurrency = concurrency.max(1);
    let total = urls.len();

    let (job_tx, job_rx) = mpsc::channel::<String>(1);
    let (result_tx, mut result_rx) = mpsc::channel::<CheckResult>(concurrency);
    let job_rx = Arc::new(Mutex::new(job_rx));

    let mut workers = JoinSet::new();
    for id in 0..concurrency {
        let jobs = Arc::clone(&job_rx);
        let results = result_tx.clone();
        let checker = checker.clone();
        let cancel = cancel.clone();

        workers.spawn(async move {
            loop {
                // Hold the lock only while waiting for the next job.
                let next = jobs.lock().await.recv().await;
                let Some(url) = next else {
                    break;
                };

                let result = checker.check(&cancel, &url).await;
                if results.send(result).await.is_err() {
                    break;
                }
            }
            tracing::trace!("Check worker {} finished", id);
        });
    }
    drop(result_tx);

    let producer = tokio::spawn(async move {
        for url in urls {
            if job_tx.send(url).await.is_err() {
                break;
            }
        }
    });

    let mut collected = Vec::with_capacity(total);
    while let Some(result) = result_rx.recv().await {
        on_result(&result);
        collected.push(result);
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            tracing::warn!("Check worker failed: {}", e);
        }
    }
    if let Err(e) = producer.await {
        tracing::warn!("Check producer failed: {}", e);
    }

    collected
}
