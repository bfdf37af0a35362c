//! Node key generation.

use base64::prelude::*;
use rand::RngCore;
use rand::rngs::OsRng;

/// Number of random bytes behind each node key.
pub const NODE_KEY_BYTES: usize = 32;

/// Source of node keys for new enrollments.
pub trait NodeKeyGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// 256 bits from the OS CSPRNG, URL-safe base64 without padding.
///
/// Keys carry no information about the enroll secret, the enrollment id or
/// the time of issue.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNodeKeys;

impl NodeKeyGenerator for RandomNodeKeys {
    fn generate(&self) -> String {
        let mut bytes = [0u8; NODE_KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        BASE64_URL_SAFE_NO_PAD.encode(bytes)
    }
}
