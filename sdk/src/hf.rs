//! Row-by-row reads of Hugging Face datasets through the datasets-server
//! `/rows` endpoint.

use std::time::Duration;

use groundtruth_core::profile::{DATASETS_SERVER_TIMEOUT, DATASET_CONFIG, DATASET_SPLIT};
use groundtruth_core::{Payload, RowPage, RowSource};
use serde::Deserialize;

use crate::error::{Result, SdkError};
use crate::transport::{escape_segment, HttpTransport};

pub const DEFAULT_DATASETS_SERVER_URL: &str = "https://datasets-server.huggingface.co";
/// Largest page the rows endpoint serves.
pub const MAX_PAGE_LENGTH: u32 = 100;

#[derive(Debug, Clone)]
pub struct HfOptions {
    pub timeout: Duration,
    pub token: Option<String>,
    pub config: String,
    pub split: String,
}

impl Default for HfOptions {
    fn default() -> Self {
        Self {
            timeout: DATASETS_SERVER_TIMEOUT,
            token: None,
            config: DATASET_CONFIG.to_string(),
            split: DATASET_SPLIT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RowsResponse {
    rows: Vec<RowEntry>,
    #[serde(default)]
    num_rows_total: Option<u64>,
    #[serde(default)]
    partial: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct RowEntry {
    row_idx: u64,
    row: Payload,
    #[serde(default)]
    truncated_cells: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct HfDatasetsClient {
    transport: HttpTransport,
    config: String,
    split: String,
}

impl HfDatasetsClient {
    pub fn with_options(base_url: impl AsRef<str>, options: HfOptions) -> Result<Self> {
        if options.config.trim().is_empty() || options.split.trim().is_empty() {
            return Err(SdkError::InvalidOption(
                "dataset config and split must not be empty".to_string(),
            ));
        }

        let mut headers = Vec::new();
        if let Some(token) = options.token.filter(|token| !token.is_empty()) {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        Ok(Self {
            transport: HttpTransport::new(base_url.as_ref(), options.timeout, headers)?,
            config: options.config,
            split: options.split,
        })
    }

    pub fn rows(&self, dataset: &str, offset: u64, length: u32) -> Result<RowPage> {
        if length == 0 || length > MAX_PAGE_LENGTH {
            return Err(SdkError::InvalidArgument(format!(
                "length must be between 1 and {MAX_PAGE_LENGTH}"
            )));
        }

        let path = rows_path(dataset, &self.config, &self.split, offset, length);
        let response: RowsResponse = self.transport.get_json(&path)?;
        into_page(dataset, response)
    }
}

impl RowSource for HfDatasetsClient {
    type Error = SdkError;

    fn fetch_page(&self, dataset: &str, offset: u64, length: u32) -> Result<RowPage> {
        self.rows(dataset, offset, length.min(MAX_PAGE_LENGTH))
    }
}

fn rows_path(dataset: &str, config: &str, split: &str, offset: u64, length: u32) -> String {
    format!(
        "/rows?dataset={}&config={}&split={}&offset={offset}&length={length}",
        escape_segment(dataset),
        escape_segment(config),
        escape_segment(split)
    )
}

fn into_page(dataset: &str, response: RowsResponse) -> Result<RowPage> {
    if response.partial {
        return Err(SdkError::PartialDataset {
            dataset: dataset.to_string(),
            reported_rows: response.num_rows_total,
        });
    }

    let mut rows = Vec::with_capacity(response.rows.len());
    for entry in response.rows {
        if !entry.truncated_cells.is_empty() {
            return Err(SdkError::TruncatedRow {
                dataset: dataset.to_string(),
                row_idx: entry.row_idx,
                cells: entry.truncated_cells,
            });
        }
        rows.push(entry.row);
    }

    Ok(RowPage {
        rows,
        total_rows: response.num_rows_total,
    })
}
