//! FFmpeg CLI wrapper for audio processing.
//!
//! This crate provides:
//! - Type-safe multi-input FFmpeg command building
//! - A runner with timeout handling and structured failures
//! - Audio metadata probing via ffprobe
//! - The pipeline's transcoding operations: silence rendering, ordered
//!   concatenation, and background-music mixing

pub mod command;
pub mod concat;
pub mod error;
pub mod fs_utils;
pub mod mix;
pub mod probe;
pub mod silence;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::concat_audio;
pub use error::{MediaError, MediaResult};
pub use fs_utils::move_file;
pub use mix::{mix_audio, MixParams};
pub use probe::{get_duration, probe_audio, AudioInfo};
pub use silence::render_silence;
