//! Paged, lazy reader over one or more dataset sources.
//!
//! Rows are numbered from 1 across all sources in list order. The first
//! `skip_first` rows are dropped and the stream ends as soon as the running
//! count reaches `limit`, so at most `limit - 1 - skip_first` records are
//! produced.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;

use serde_json::Value;

use crate::profile::{EMBEDDING_FIELD, PAGE_LENGTH};
use crate::record::{Payload, Record};

/// One page of raw rows returned by a [`RowSource`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPage {
    pub rows: Vec<Payload>,
    /// Total rows in the dataset split, when the source reports it.
    pub total_rows: Option<u64>,
}

/// Anything that can serve rows of a named dataset by offset.
pub trait RowSource {
    type Error: Error + Send + Sync + 'static;

    fn fetch_page(&self, dataset: &str, offset: u64, length: u32)
        -> Result<RowPage, Self::Error>;
}

impl<T: RowSource + ?Sized> RowSource for &T {
    type Error = T::Error;

    fn fetch_page(
        &self,
        dataset: &str,
        offset: u64,
        length: u32,
    ) -> Result<RowPage, Self::Error> {
        (**self).fetch_page(dataset, offset, length)
    }
}

#[derive(Debug)]
pub enum DatasetError {
    Source {
        dataset: String,
        offset: u64,
        source: Box<dyn Error + Send + Sync>,
    },
    MissingEmbedding {
        id: u64,
        field: String,
    },
    InvalidEmbedding {
        id: u64,
        index: Option<usize>,
    },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source {
                dataset,
                offset,
                source,
            } => write!(f, "failed to read {dataset} at offset {offset}: {source}"),
            Self::MissingEmbedding { id, field } => {
                write!(f, "row {id} has no '{field}' field")
            }
            Self::InvalidEmbedding { id, index: None } => {
                write!(f, "row {id} embedding is not an array")
            }
            Self::InvalidEmbedding {
                id,
                index: Some(index),
            } => write!(f, "row {id} embedding has a non-numeric value at index {index}"),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source { source, .. } => Some(source.as_ref()),
            Self::MissingEmbedding { .. } | Self::InvalidEmbedding { .. } => None,
        }
    }
}

/// Starts a lazy read over `datasets` in order.
pub fn read_records<S, I, D>(source: S, datasets: I, skip_first: u64, limit: u64) -> DatasetStream<S>
where
    S: RowSource,
    I: IntoIterator<Item = D>,
    D: Into<String>,
{
    DatasetStream {
        source,
        datasets: datasets.into_iter().map(Into::into).collect(),
        dataset_index: 0,
        offset: 0,
        source_exhausted: false,
        buffered: VecDeque::new(),
        seen: 0,
        skip_first,
        limit,
        embedding_field: EMBEDDING_FIELD.to_string(),
        page_length: PAGE_LENGTH,
        finished: false,
    }
}

pub struct DatasetStream<S> {
    source: S,
    datasets: Vec<String>,
    dataset_index: usize,
    offset: u64,
    source_exhausted: bool,
    buffered: VecDeque<Payload>,
    seen: u64,
    skip_first: u64,
    limit: u64,
    embedding_field: String,
    page_length: u32,
    finished: bool,
}

impl<S: RowSource> DatasetStream<S> {
    pub fn with_embedding_field(mut self, field: impl Into<String>) -> Self {
        self.embedding_field = field.into();
        self
    }

    pub fn with_page_length(mut self, page_length: u32) -> Self {
        self.page_length = page_length.max(1);
        self
    }

    fn fill_buffer(&mut self) -> Result<bool, DatasetError> {
        while self.buffered.is_empty() {
            let Some(dataset) = self.datasets.get(self.dataset_index) else {
                return Ok(false);
            };

            if self.source_exhausted {
                self.dataset_index += 1;
                self.offset = 0;
                self.source_exhausted = false;
                continue;
            }

            let page = self
                .source
                .fetch_page(dataset, self.offset, self.page_length)
                .map_err(|source| DatasetError::Source {
                    dataset: dataset.clone(),
                    offset: self.offset,
                    source: Box::new(source),
                })?;

            let received = page.rows.len() as u64;
            self.offset += received;
            let reached_total = page
                .total_rows
                .is_some_and(|total| self.offset >= total);
            if received < u64::from(self.page_length) || reached_total {
                self.source_exhausted = true;
            }
            self.buffered.extend(page.rows);
        }
        Ok(true)
    }
}

impl<S: RowSource> Iterator for DatasetStream<S> {
    type Item = Result<Record, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if self.buffered.is_empty() {
                match self.fill_buffer() {
                    Ok(true) => {}
                    Ok(false) => {
                        self.finished = true;
                        return None;
                    }
                    Err(error) => {
                        self.finished = true;
                        return Some(Err(error));
                    }
                }
            }

            let Some(row) = self.buffered.pop_front() else {
                continue;
            };
            self.seen += 1;

            if self.seen <= self.skip_first {
                continue;
            }
            if self.seen >= self.limit {
                self.finished = true;
                self.buffered.clear();
                return None;
            }

            let record = record_from_row(self.seen, row, &self.embedding_field);
            if record.is_err() {
                self.finished = true;
            }
            return Some(record);
        }
    }
}

fn record_from_row(id: u64, mut row: Payload, field: &str) -> Result<Record, DatasetError> {
    let embedding = row
        .remove(field)
        .ok_or_else(|| DatasetError::MissingEmbedding {
            id,
            field: field.to_string(),
        })?;

    let Value::Array(values) = embedding else {
        return Err(DatasetError::InvalidEmbedding { id, index: None });
    };

    let vector = values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value
                .as_f64()
                .map(|number| number as f32)
                .ok_or(DatasetError::InvalidEmbedding {
                    id,
                    index: Some(index),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Record {
        id,
        vector,
        payload: row,
    })
}

#[cfg(test)]
mod tests;
