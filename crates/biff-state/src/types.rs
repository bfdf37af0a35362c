//! Domain types for the enrollment store.

use serde::{Deserialize, Serialize};

/// Store-assigned identity of an enrollment.
pub type EnrollmentId = u64;

/// A host's enrollment: its identifying metadata bound to the node key it
/// was issued.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub host_identifier: String,
    /// OS family code as reported by the agent.
    pub platform_type: i64,
    /// Serialized JSON exactly as the agent sent it. Never interpreted.
    pub host_details: String,
    pub node_key: String,
    /// Unix timestamp (seconds) when the record was created.
    pub enrolled_at: u64,
}

impl Enrollment {
    /// Deserialize the stored host details blob.
    pub fn host_details_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.host_details)
    }
}

/// Single-criterion lookup for [`crate::EnrollmentStore::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentLookup<'a> {
    ById(EnrollmentId),
    ByNodeKey(&'a str),
}
