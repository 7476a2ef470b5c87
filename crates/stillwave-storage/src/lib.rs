//! Local artifact storage for rendered audio.
//!
//! Generated chunks and finished sessions live on the local filesystem
//! under a configurable root. In-memory caches map content fingerprints
//! to files already on disk, and a janitor task evicts aged entries.

pub mod cache;
pub mod error;
pub mod janitor;
pub mod store;

pub use cache::{ArtifactCache, SweepStats};
pub use error::{StorageError, StorageResult};
pub use janitor::Janitor;
pub use store::{ArtifactStore, StorageConfig};
