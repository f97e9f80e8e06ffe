use std::error::Error;
use std::fmt::{Display, Formatter};

pub type Result<T> = std::result::Result<T, SdkError>;

#[derive(Debug)]
pub enum SdkError {
    InvalidOption(String),
    InvalidArgument(String),
    Transport {
        method: String,
        path: String,
        source: Box<dyn Error + Send + Sync>,
    },
    Http {
        status: u16,
        method: String,
        path: String,
        body: String,
    },
    InvalidJson {
        method: String,
        path: String,
        body: String,
        source: serde_json::Error,
    },
    TruncatedRow {
        dataset: String,
        row_idx: u64,
        cells: Vec<String>,
    },
    /// The datasets-server only converted the first part of the split, so
    /// paging would end early.
    PartialDataset {
        dataset: String,
        reported_rows: Option<u64>,
    },
}

impl SdkError {
    /// Transport failures, throttling and server-side errors may succeed on a
    /// later attempt; everything else is deterministic.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::InvalidOption(_)
            | Self::InvalidArgument(_)
            | Self::InvalidJson { .. }
            | Self::TruncatedRow { .. }
            | Self::PartialDataset { .. } => false,
        }
    }
}

impl Display for SdkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOption(message) | Self::InvalidArgument(message) => write!(f, "{message}"),
            Self::Transport {
                method,
                path,
                source,
            } => write!(f, "request failed for {method} {path}: {source}"),
            Self::Http {
                status,
                method,
                path,
                body,
            } => write!(f, "HTTP {status} on {method} {path}: {body}"),
            Self::InvalidJson {
                method,
                path,
                source,
                ..
            } => write!(f, "invalid JSON response on {method} {path}: {source}"),
            Self::TruncatedRow {
                dataset,
                row_idx,
                cells,
            } => write!(
                f,
                "row {row_idx} of {dataset} has truncated cells: {}",
                cells.join(",")
            ),
            Self::PartialDataset {
                dataset,
                reported_rows: Some(rows),
            } => write!(
                f,
                "{dataset} is only partially exported by the datasets-server ({rows} rows)"
            ),
            Self::PartialDataset {
                dataset,
                reported_rows: None,
            } => write!(f, "{dataset} is only partially exported by the datasets-server"),
        }
    }
}

impl Error for SdkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport { source, .. } => Some(source.as_ref()),
            Self::InvalidJson { source, .. } => Some(source),
            Self::InvalidOption(_)
            | Self::InvalidArgument(_)
            | Self::Http { .. }
            | Self::TruncatedRow { .. }
            | Self::PartialDataset { .. } => None,
        }
    }
}
