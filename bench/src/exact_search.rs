use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use groundtruth_core::profile::{EXACT_QUERY_COUNT, EXACT_SEARCH_TIMEOUT, SEARCH_LIMIT};
use groundtruth_core::{read_records, write_search_results, RowSource, SearchResultRecord};
use groundtruth_sdk::{QueryRequest, QueryResponse};

use crate::store::VectorStore;

/// Replays the reserved query prefix as exact searches and writes one JSON
/// line per query to `output`. Returns the number of lines written.
pub(crate) fn run_exact_search<S, R>(
    store: &S,
    source: R,
    datasets: &[&str],
    collection: &str,
    output: &Path,
) -> Result<usize>
where
    S: VectorStore + ?Sized,
    R: RowSource,
{
    let requests = read_records(source, datasets.iter().copied(), 0, EXACT_QUERY_COUNT)
        .map(|record| record.map(|record| QueryRequest::exact(record.vector, SEARCH_LIMIT)))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to read query vectors")?;

    tracing::info!(
        collection,
        queries = requests.len(),
        limit = SEARCH_LIMIT,
        output = %output.display(),
        "running exact search"
    );

    let started_at = Instant::now();
    let responses = store.query_batch(collection, &requests, EXACT_SEARCH_TIMEOUT)?;
    tracing::info!(
        responses = responses.len(),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "exact search finished"
    );

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        File::create(output).with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    let written = write_exact_results(&mut writer, requests, responses)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(lines = written, output = %output.display(), "results saved");
    Ok(written)
}

pub(crate) fn write_exact_results<W: Write>(
    writer: &mut W,
    requests: Vec<QueryRequest>,
    responses: Vec<QueryResponse>,
) -> Result<usize> {
    anyhow::ensure!(
        requests.len() == responses.len(),
        "sent {} queries but received {} responses",
        requests.len(),
        responses.len()
    );

    let records = requests
        .into_iter()
        .zip(responses)
        .map(|(request, response)| {
            SearchResultRecord::new(
                request.query,
                response.points.into_iter().map(|hit| (hit.id, hit.score)),
            )
        });
    Ok(write_search_results(writer, records)?)
}
