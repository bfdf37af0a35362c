//! Configuration payload types shared by the server config and the
//! `/configuration` response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named queries assigned to a node, keyed by query name.
pub type Schedule = BTreeMap<String, ScheduledQuery>;

/// osquery `options` passed through to nodes untouched.
pub type AgentOptions = BTreeMap<String, serde_json::Value>;

/// A single scheduled query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledQuery {
    pub query: String,
    /// Execution interval in seconds. Accepts an integer or a numeric string,
    /// always served as a string.
    #[serde(with = "interval_seconds")]
    pub interval: u64,
    #[serde(default)]
    pub description: String,
}

impl ScheduledQuery {
    pub fn new(query: &str, interval: u64, description: &str) -> Self {
        Self {
            query: query.to_string(),
            interval,
            description: description.to_string(),
        }
    }
}

/// The configuration handed to every enrolled node.
///
/// Built once from the server config and shared read-only between requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeConfig {
    pub schedule: Schedule,
    pub options: AgentOptions,
}

mod interval_seconds {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(secs: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(secs)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Ok(secs),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid interval {text:?}, expected seconds"))),
        }
    }
}
