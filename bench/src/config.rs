use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use groundtruth_core::profile::{COLLECTION_NAME, DEFAULT_OUTPUT_FILE, UPLOAD_MAX_RETRIES};
use groundtruth_sdk::qdrant::DEFAULT_TIMEOUT;
use groundtruth_sdk::DEFAULT_DATASETS_SERVER_URL;

use crate::env_utils::{
    parse_bool_env, parse_optional_env, parse_path, parse_required_env, parse_string_env,
    parse_u64, parse_usize,
};

const FORCE_RECREATE_DEFAULT: bool = true;

#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub(crate) qdrant_url: String,
    pub(crate) qdrant_api_key: Option<String>,
    pub(crate) qdrant_timeout: Duration,
    pub(crate) collection: String,
    pub(crate) output_path: PathBuf,
    pub(crate) force_recreate: bool,
    pub(crate) upload_max_retries: usize,
    pub(crate) datasets_server_url: String,
    pub(crate) hf_token: Option<String>,
}

impl AppConfig {
    pub(crate) fn from_env() -> Result<Self> {
        let qdrant_url = parse_required_env("QDRANT_CLUSTER_URL")?;
        let qdrant_api_key = parse_optional_env("QDRANT_API_KEY");
        let qdrant_timeout_secs = parse_u64("QDRANT_TIMEOUT_SECS", DEFAULT_TIMEOUT.as_secs())?;
        let collection = parse_string_env("GROUNDTRUTH_COLLECTION", COLLECTION_NAME);
        let output_path = parse_path("GROUNDTRUTH_OUTPUT", DEFAULT_OUTPUT_FILE)?;
        let force_recreate =
            parse_bool_env("GROUNDTRUTH_FORCE_RECREATE", FORCE_RECREATE_DEFAULT)?;
        let upload_max_retries =
            parse_usize("GROUNDTRUTH_UPLOAD_MAX_RETRIES", UPLOAD_MAX_RETRIES)?;
        let datasets_server_url =
            parse_string_env("HF_DATASETS_SERVER_URL", DEFAULT_DATASETS_SERVER_URL);
        let hf_token = parse_optional_env("HF_TOKEN");

        if qdrant_timeout_secs == 0 {
            anyhow::bail!("QDRANT_TIMEOUT_SECS must be > 0");
        }
        if upload_max_retries == 0 {
            anyhow::bail!("GROUNDTRUTH_UPLOAD_MAX_RETRIES must be > 0");
        }

        Ok(Self {
            qdrant_url,
            qdrant_api_key,
            qdrant_timeout: Duration::from_secs(qdrant_timeout_secs),
            collection,
            output_path,
            force_recreate,
            upload_max_retries,
            datasets_server_url,
            hf_token,
        })
    }
}
