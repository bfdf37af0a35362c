//! Enrollment: trade the shared secret for a node key.

use std::fmt;
use std::sync::Arc;

use biff_state::EnrollmentStore;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::error::ProtocolResult;
use crate::messages::{EnrollRequest, EnrollResponse};
use crate::node_key::{NodeKeyGenerator, RandomNodeKeys};

/// The process-wide enroll secret.
#[derive(Clone)]
pub struct EnrollSecret(String);

impl EnrollSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exact comparison in constant time. An empty configured secret never
    /// matches.
    pub fn matches(&self, presented: &str) -> bool {
        !self.0.is_empty() && bool::from(self.0.as_bytes().ct_eq(presented.as_bytes()))
    }
}

impl fmt::Debug for EnrollSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnrollSecret(<redacted>)")
    }
}

/// Handles `/enroll`. The only writer to the enrollment store.
#[derive(Clone)]
pub struct EnrollmentService {
    store: EnrollmentStore,
    secret: EnrollSecret,
    keys: Arc<dyn NodeKeyGenerator>,
}

impl EnrollmentService {
    pub fn new(store: EnrollmentStore, secret: EnrollSecret) -> Self {
        Self::with_key_generator(store, secret, Arc::new(RandomNodeKeys))
    }

    pub fn with_key_generator(
        store: EnrollmentStore,
        secret: EnrollSecret,
        keys: Arc<dyn NodeKeyGenerator>,
    ) -> Self {
        Self { store, secret, keys }
    }

    /// Enroll a host.
    ///
    /// A missing or wrong secret yields [`EnrollResponse::rejected`] and
    /// leaves the store untouched. A correct secret always creates a new
    /// record, even for a host identifier seen before.
    pub fn enroll(&self, request: EnrollRequest) -> ProtocolResult<EnrollResponse> {
        let authorized = request
            .enroll_secret
            .as_deref()
            .is_some_and(|presented| self.secret.matches(presented));
        if !authorized {
            warn!(
                host_identifier = %request.host_identifier,
                secret_present = request.enroll_secret.is_some(),
                "enrollment rejected: bad enroll secret"
            );
            return Ok(EnrollResponse::rejected());
        }

        let node_key = self.keys.generate();
        let enrollment = self.store.insert(
            request.platform_type,
            &request.host_identifier,
            &request.host_details,
            &node_key,
        )?;
        info!(
            id = enrollment.id,
            host_identifier = %enrollment.host_identifier,
            platform_type = enrollment.platform_type,
            "host enrolled"
        );
        Ok(EnrollResponse::accepted(enrollment.node_key))
    }
}
