//! Silent clip rendering.

use std::path::Path;

use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Output sample rate for all pipeline audio.
pub const SAMPLE_RATE: u32 = 44_100;

/// Render a silent MP3 clip of exactly `seconds` duration.
///
/// Silence is generated from an `anullsrc` lavfi source at the pipeline's
/// fixed sample rate and channel layout, so silent chunks concatenate cleanly
/// with synthesized speech chunks.
pub async fn render_silence(seconds: f64, output: impl AsRef<Path>) -> MediaResult<()> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(MediaError::InvalidDuration(seconds));
    }

    let output = output.as_ref();
    debug!(seconds = seconds, output = %output.display(), "Rendering silence");

    let cmd = build_silence_command(seconds, output);
    FfmpegRunner::new().with_timeout(120).run(&cmd).await
}

fn build_silence_command(seconds: f64, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input_with_args(
            ["-f", "lavfi", "-t", &format!("{:.3}", seconds)],
            format!("anullsrc=r={}:cl=stereo", SAMPLE_RATE),
        )
        .audio_codec("libmp3lame")
        .audio_bitrate("128k")
}
