use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Payload = Map<String, Value>;

/// Point identifier as accepted by the vector store: an unsigned integer or a
/// UUID string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl From<u64> for PointId {
    fn from(value: u64) -> Self {
        Self::Num(value)
    }
}

/// One dataset row with its embedding split out of the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based position in the concatenated stream.
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Payload,
}
