//! Batch verification pipeline: normalize, consult cache, check, report.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::checker::cache::PresenceCache;
use crate::checker::normalize::normalize;
use crate::checker::report::{CheckedNumber, Verdict, render_report};

/// Lines normalizing to this length or shorter are discarded as noise.
const MIN_NUMBER_LEN: usize = 8;

/// Opaque per-number failure from the presence checker.
#[derive(Debug)]
pub struct CheckerError(pub String);

impl fmt::Display for CheckerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "presence check failed: {}", self.0)
    }
}

impl std::error::Error for CheckerError {}

/// Remote presence-check capability backed by the WhatsApp session.
#[async_trait]
pub trait PresenceChecker: Send + Sync {
    /// Whether the underlying session can serve checks right now.
    fn is_ready(&self) -> bool;

    /// Whether `number` is a registered account on the messaging service.
    async fn is_registered(&self, number: &str) -> Result<bool, CheckerError>;
}

/// Receives progress ticks and the final rendered report for one batch.
#[async_trait]
pub trait BatchSink: Send {
    /// Called once with `checked = 0` before the first check, then once per
    /// processed number. Each call is awaited before the pipeline moves on,
    /// so in-place message edits cannot race each other.
    async fn progress(&mut self, checked: usize, total: usize);

    /// Called once with the final rendered report.
    async fn report(&mut self, text: &str);
}

/// Why a batch was rejected before any number was checked.
#[derive(Debug, PartialEq, Eq)]
pub enum BatchError {
    /// No line in the message normalized to a usable number.
    NoValidNumbers,
    /// More numbers than the per-request limit; nothing was checked.
    BatchTooLarge(usize),
    /// Session not usable (booting or mid-login). Callers reply with
    /// silence on this variant.
    CheckerNotReady,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoValidNumbers => write!(f, "no valid numbers in message"),
            Self::BatchTooLarge(count) => {
                write!(f, "batch of {count} numbers exceeds the per-request limit")
            }
            Self::CheckerNotReady => write!(f, "presence checker is not ready"),
        }
    }
}

impl std::error::Error for BatchError {}

/// Orchestrates one batch: parse, validate, check each number in input
/// order, report.
pub struct BatchVerifier<C> {
    checker: Arc<C>,
    cache: Arc<PresenceCache>,
    max_batch_size: usize,
    check_delay: Duration,
}

impl<C: PresenceChecker> BatchVerifier<C> {
    pub fn new(
        checker: Arc<C>,
        cache: Arc<PresenceCache>,
        max_batch_size: usize,
        check_delay: Duration,
    ) -> Self {
        Self {
            checker,
            cache,
            max_batch_size,
            check_delay,
        }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Parse `raw` as a newline-delimited number list and run the pipeline.
    ///
    /// Numbers are not deduplicated: a repeated number is processed again
    /// and served from the cache the second time. Per-number checker
    /// failures never abort the batch; they classify that one number as an
    /// error and move on.
    pub async fn process_batch<S: BatchSink>(
        &self,
        raw: &str,
        sink: &mut S,
    ) -> Result<(), BatchError> {
        let numbers: Vec<String> = raw
            .lines()
            .map(normalize)
            .filter(|n| n.len() > MIN_NUMBER_LEN)
            .collect();

        if numbers.is_empty() {
            return Err(BatchError::NoValidNumbers);
        }
        if numbers.len() > self.max_batch_size {
            return Err(BatchError::BatchTooLarge(numbers.len()));
        }
        if !self.checker.is_ready() {
            return Err(BatchError::CheckerNotReady);
        }

        let total = numbers.len();
        info!("🔍 Checking {total} number(s)");
        sink.progress(0, total).await;

        let mut checked = Vec::with_capacity(total);
        for (i, number) in numbers.iter().enumerate() {
            checked.push(self.check_one(number).await);
            sink.progress(i + 1, total).await;
        }

        sink.report(&render_report(&checked)).await;
        Ok(())
    }

    async fn check_one(&self, number: &str) -> CheckedNumber {
        if let Some(registered) = self.cache.get(number) {
            debug!("✅ Cache hit for {number}");
            return CheckedNumber {
                number: number.to_string(),
                verdict: verdict_of(registered),
                cached: true,
            };
        }

        match self.checker.is_registered(number).await {
            Ok(registered) => {
                self.cache.put(number, registered);
                info!("🔍 Checked {number}: {registered}");
                // Fixed inter-check delay: the sole backpressure protecting
                // the shared upstream session. Cache hits and errors skip it.
                sleep(self.check_delay).await;
                CheckedNumber {
                    number: number.to_string(),
                    verdict: verdict_of(registered),
                    cached: false,
                }
            }
            Err(e) => {
                warn!("Error checking {number}: {e}");
                CheckedNumber {
                    number: number.to_string(),
                    verdict: Verdict::Error,
                    cached: false,
                }
            }
        }
    }
}

fn verdict_of(registered: bool) -> Verdict {
    if registered {
        Verdict::Registered
    } else {
        Verdict::Unregistered
    }
}
