//! biff-state — enrollment store for biff.
//!
//! Backed by [redb](https://docs.rs/redb). Holds one record per successful
//! enrollment plus a unique index from node key to record id.
//!
//! # Architecture
//!
//! Records are JSON-serialized into redb's `&[u8]` value column, keyed by a
//! store-assigned `u64` id. Every lookup is a typed key read, so client
//! input is never spliced into a query.
//!
//! The `EnrollmentStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::EnrollmentStore;
pub use types::*;
