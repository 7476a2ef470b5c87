//! Background music mixing.

use std::path::Path;

use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::silence::SAMPLE_RATE;

/// Volume gains applied before mixing, as linear multipliers.
#[derive(Debug, Clone, Copy)]
pub struct MixParams {
    pub speech_volume: f64,
    pub music_volume: f64,
    /// Target output duration in seconds, taken from the speech track.
    pub duration: f64,
}

/// Overlay looping background music under a speech track.
///
/// The music input loops indefinitely and the output is cut to the speech
/// duration, so short music beds cover long sessions and long beds are
/// truncated rather than padding the result.
pub async fn mix_audio(
    speech: impl AsRef<Path>,
    music: impl AsRef<Path>,
    output: impl AsRef<Path>,
    params: MixParams,
) -> MediaResult<()> {
    let speech = speech.as_ref();
    let music = music.as_ref();

    if !speech.exists() {
        return Err(MediaError::FileNotFound(speech.to_path_buf()));
    }
    if !music.exists() {
        return Err(MediaError::FileNotFound(music.to_path_buf()));
    }
    if !params.duration.is_finite() || params.duration <= 0.0 {
        return Err(MediaError::InvalidDuration(params.duration));
    }

    debug!(
        speech = %speech.display(),
        music = %music.display(),
        duration = params.duration,
        "Mixing background music"
    );

    let cmd = build_mix_command(speech, music, output.as_ref(), params);
    FfmpegRunner::new().run(&cmd).await
}

fn build_mix_command(
    speech: &Path,
    music: &Path,
    output: &Path,
    params: MixParams,
) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(speech)
        .input_with_args(["-stream_loop", "-1"], music.to_string_lossy())
        .filter_complex(build_mix_filter(params.speech_volume, params.music_volume))
        .map("[mix]")
        .audio_codec("libmp3lame")
        .audio_bitrate("192k")
        .sample_rate(SAMPLE_RATE)
        .channels(2)
        .limit_duration(params.duration)
}

/// amix with `duration=first` keys the mix length to the speech stream;
/// the looped music input alone would otherwise never end.
fn build_mix_filter(speech_volume: f64, music_volume: f64) -> String {
    format!(
        "[0:a]volume={:.2}[spk];[1:a]volume={:.2}[bgm];\
         [spk][bgm]amix=inputs=2:duration=first:dropout_transition=0[mix]",
        speech_volume, music_volume
    )
}
