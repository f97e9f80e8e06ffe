//! Parallel batched upload.
//!
//! The point stream is consumed on the calling thread and cut into batches.
//! Up to `parallel` batches are sent concurrently on a dedicated thread pool;
//! the next window is read only once the current one has been acknowledged.

use std::error::Error;
use std::fmt;
use std::thread;
use std::time::Duration;

use groundtruth_core::profile::{UPLOAD_BATCH_SIZE, UPLOAD_MAX_RETRIES, UPLOAD_PARALLEL};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::SdkError;
use crate::qdrant::PointStruct;

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub batch_size: usize,
    pub parallel: usize,
    /// Total attempts per batch, first one included.
    pub max_retries: usize,
    /// Sleep before retry `n` is `retry_backoff * n`.
    pub retry_backoff: Duration,
    pub wait: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            batch_size: UPLOAD_BATCH_SIZE,
            parallel: UPLOAD_PARALLEL,
            max_retries: UPLOAD_MAX_RETRIES,
            retry_backoff: Duration::from_millis(500),
            wait: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub points: u64,
    pub batches: u64,
}

#[derive(Debug)]
pub enum UploadError<E> {
    /// The point stream itself failed.
    Source(E),
    Request(SdkError),
}

impl<E: fmt::Display> fmt::Display for UploadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(error) => write!(f, "point source failed: {error}"),
            Self::Request(error) => write!(f, "batch upload failed: {error}"),
        }
    }
}

impl<E: Error + 'static> Error for UploadError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(error) => Some(error),
            Self::Request(error) => Some(error),
        }
    }
}

/// Cuts `points` into batches and hands each one to `send`, `parallel` at a
/// time. Stops at the first source error or failed batch; batches already sent
/// are not rolled back.
pub fn upload_batches<I, E, F>(
    points: I,
    options: &UploadOptions,
    send: F,
) -> Result<UploadSummary, UploadError<E>>
where
    I: IntoIterator<Item = Result<PointStruct, E>>,
    F: Fn(&[PointStruct]) -> Result<(), SdkError> + Sync,
{
    validate(options).map_err(UploadError::Request)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.parallel)
        .thread_name(|index| format!("upload-{index}"))
        .build()
        .map_err(|error| UploadError::Request(SdkError::InvalidOption(error.to_string())))?;

    let mut summary = UploadSummary::default();
    let mut window: Vec<Vec<PointStruct>> = Vec::with_capacity(options.parallel);
    let mut batch = Vec::with_capacity(options.batch_size);

    for point in points {
        batch.push(point.map_err(UploadError::Source)?);
        if batch.len() < options.batch_size {
            continue;
        }

        window.push(std::mem::replace(
            &mut batch,
            Vec::with_capacity(options.batch_size),
        ));
        if window.len() == options.parallel {
            flush_window(&pool, &mut window, options, &send, &mut summary)
                .map_err(UploadError::Request)?;
        }
    }

    if !batch.is_empty() {
        window.push(batch);
    }
    flush_window(&pool, &mut window, options, &send, &mut summary).map_err(UploadError::Request)?;

    Ok(summary)
}

fn validate(options: &UploadOptions) -> Result<(), SdkError> {
    if options.batch_size == 0 {
        return Err(SdkError::InvalidOption(
            "batch_size must be a positive integer".to_string(),
        ));
    }
    if options.parallel == 0 {
        return Err(SdkError::InvalidOption(
            "parallel must be a positive integer".to_string(),
        ));
    }
    if options.max_retries == 0 {
        return Err(SdkError::InvalidOption(
            "max_retries must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

fn flush_window<F>(
    pool: &ThreadPool,
    window: &mut Vec<Vec<PointStruct>>,
    options: &UploadOptions,
    send: &F,
    summary: &mut UploadSummary,
) -> Result<(), SdkError>
where
    F: Fn(&[PointStruct]) -> Result<(), SdkError> + Sync,
{
    if window.is_empty() {
        return Ok(());
    }

    pool.install(|| {
        window
            .par_iter()
            .try_for_each(|batch| send_with_retries(batch, options, send))
    })?;

    summary.batches += window.len() as u64;
    summary.points += window.iter().map(|batch| batch.len() as u64).sum::<u64>();
    window.clear();
    Ok(())
}

fn send_with_retries<F>(
    batch: &[PointStruct],
    options: &UploadOptions,
    send: &F,
) -> Result<(), SdkError>
where
    F: Fn(&[PointStruct]) -> Result<(), SdkError>,
{
    let mut attempt = 1usize;
    loop {
        match send(batch) {
            Ok(()) => return Ok(()),
            Err(error) if error.is_retryable() && attempt < options.max_retries => {
                tracing::warn!(
                    attempt,
                    max_retries = options.max_retries,
                    batch_size = batch.len(),
                    %error,
                    "batch upload failed, retrying"
                );
                let backoff = options.retry_backoff.saturating_mul(attempt as u32);
                if !backoff.is_zero() {
                    thread::sleep(backoff);
                }
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
