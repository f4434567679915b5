//! Batch orchestration
//!
//! Runs many plate checks strictly one after another. The query surface is a
//! single rate-limited origin, so there is no parallel fan-out; pacing comes
//! from a configurable inter-query delay. One failed query never aborts the
//! rest of the batch.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::info;

use crate::classify::Classifier;
use crate::error::{Error, Result};
use crate::query::{run_query, sleep_interruptible, RetryPolicy};
use crate::session::SessionProvider;
use crate::types::{BatchResult, QueryOutcome};

/// Read a newline-delimited plate list. Blank lines and lines whose first
/// non-whitespace character is `#` are skipped.
pub fn read_plate_file(path: &Path) -> Result<Vec<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Check every input in order and collect the outcomes.
///
/// `on_outcome` runs once per finalized outcome, before it is recorded; it is
/// where incremental CSV writing and progress reporting hook in, and its
/// error (a failed CSV write) aborts the run. Interrupt checkpoints sit
/// before each plate and inside the delay; a query in flight when the
/// interrupt arrives is discarded rather than recorded.
pub fn run_batch<P, F>(
    provider: &P,
    inputs: &[String],
    policy: &RetryPolicy,
    classifier: &Classifier,
    delay: Duration,
    interrupt: &AtomicBool,
    mut on_outcome: F,
) -> Result<BatchResult>
where
    P: SessionProvider,
    F: FnMut(&QueryOutcome) -> Result<()>,
{
    let mut result = BatchResult::default();
    let total = inputs.len();

    for (index, raw_plate) in inputs.iter().enumerate() {
        if interrupt.load(Ordering::Relaxed) {
            result.interrupted = true;
            break;
        }

        info!("checking plate {}/{}: {}", index + 1, total, raw_plate);
        let outcome = run_query(provider, raw_plate, policy, classifier, interrupt);

        if interrupt.load(Ordering::Relaxed) {
            result.interrupted = true;
            break;
        }

        on_outcome(&outcome)?;
        result.push(outcome);

        if index + 1 < total && !delay.is_zero() {
            if !sleep_interruptible(delay, interrupt) {
                result.interrupted = true;
                break;
            }
        }
    }

    Ok(result)
}
