#![forbid(unsafe_code)]
//! Ground-truth generator for vector search benchmarks.
//!
//! Commands:
//! - `load`: (re)create the benchmark collection and upload every streamed
//!   record except the reserved query prefix
//! - `exact-search`: run the query prefix as exact searches and save the
//!   neighbors as JSONL
//! - `all`: `load` followed by `exact-search`

use std::env;
use std::process;

use anyhow::{Context, Result};
use groundtruth_core::profile::DATASETS;
use groundtruth_sdk::{HfDatasetsClient, HfOptions, QdrantClient, QdrantOptions, UploadOptions};
use tracing_subscriber::EnvFilter;

mod config;
mod env_utils;
mod exact_search;
mod loader;
mod provision;
mod store;

#[cfg(test)]
mod tests;

use crate::config::AppConfig;
use crate::exact_search::run_exact_search;
use crate::loader::load_all;
use crate::provision::ensure_collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Load,
    ExactSearch,
    All,
}

impl Command {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "load" => Some(Self::Load),
            "exact-search" => Some(Self::ExactSearch),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let raw_command = env::args().nth(1).unwrap_or_default();
    let Some(command) = Command::parse(&raw_command) else {
        eprintln!(
            "error=invalid_command command=\"{raw_command}\" allowed=\"load,exact-search,all\""
        );
        process::exit(2);
    };

    let config = AppConfig::from_env().context("invalid configuration")?;
    let qdrant = QdrantClient::with_options(
        &config.qdrant_url,
        QdrantOptions {
            timeout: config.qdrant_timeout,
            api_key: config.qdrant_api_key.clone(),
        },
    )
    .context("invalid Qdrant client options")?;
    let rows = HfDatasetsClient::with_options(
        &config.datasets_server_url,
        HfOptions {
            token: config.hf_token.clone(),
            ..HfOptions::default()
        },
    )
    .context("invalid datasets-server client options")?;

    tracing::info!(
        ?command,
        qdrant = qdrant.base_url(),
        collection = %config.collection,
        "groundtruth bench started"
    );

    if matches!(command, Command::Load | Command::All) {
        ensure_collection(&qdrant, &config.collection, config.force_recreate)?;
        let options = UploadOptions {
            max_retries: config.upload_max_retries,
            ..UploadOptions::default()
        };
        load_all(&qdrant, &rows, &DATASETS, &config.collection, &options)?;
    }

    if matches!(command, Command::ExactSearch | Command::All) {
        run_exact_search(
            &qdrant,
            &rows,
            &DATASETS,
            &config.collection,
            &config.output_path,
        )?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(error) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("failed to initialize tracing subscriber: {error}");
    }
}
