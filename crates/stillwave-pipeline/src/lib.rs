//! Meditation audio generation pipeline.
//!
//! A script with embedded pause markers is segmented into speech and
//! silence units, synthesized concurrently in bounded batches with
//! fingerprint caching, then assembled in script order. Finished sessions
//! can additionally be mixed with a looping background music bed.

pub mod chunks;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod generate;
pub mod merge;
pub mod segment;

pub use chunks::{ChunkArtifact, ChunkSynthesizer, UnitSynthesizer};
pub use config::PipelineConfig;
pub use coordinator::process_units;
pub use error::{PipelineError, PipelineResult};
pub use generate::{AudioGenerator, GenerationOutcome};
pub use merge::{MixOutcome, MusicMixer};
pub use segment::segment_script;
