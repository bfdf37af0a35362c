//! biff-protocol — the osquery-style enrollment and configuration protocol.
//!
//! Two operations sit on top of the enrollment store:
//!
//! - [`EnrollmentService::enroll`] checks the shared enroll secret and, on a
//!   match, records the host and issues it a fresh node key.
//! - [`ConfigurationDistributor::get_configuration`] resolves a presented
//!   node key and hands back the schedule, or tells the node to re-enroll.
//!
//! Rejections are ordinary responses (`node_invalid: true`). Only store
//! failures surface as [`ProtocolError`].

pub mod configuration;
pub mod enroll;
pub mod error;
pub mod messages;
pub mod node_key;

pub use configuration::ConfigurationDistributor;
pub use enroll::{EnrollSecret, EnrollmentService};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::*;
pub use node_key::{NodeKeyGenerator, RandomNodeKeys};
