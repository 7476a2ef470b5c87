//! Ordered audio concatenation.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_audio;
use crate::silence::SAMPLE_RATE;

/// Concatenate audio files into `output`, preserving input order exactly.
///
/// - A single input is copied verbatim, avoiding a pointless re-encode.
/// - When every input shares one codec, the concat demuxer is used with
///   stream copy (lossless).
/// - Otherwise the inputs are decoded, joined with the `concat` filter and
///   re-encoded, which stays correct across chunks that historical code
///   paths produced at different codecs or bitrates.
///
/// The list file used by the demuxer path lives in a scoped temp directory
/// that is removed on success and failure alike.
pub async fn concat_audio(files: &[PathBuf], output: impl AsRef<Path>) -> MediaResult<()> {
    let output = output.as_ref();

    match files {
        [] => Err(MediaError::NoInputs),
        [single] => {
            debug!(input = %single.display(), "Single chunk, copying verbatim");
            if !single.exists() {
                return Err(MediaError::FileNotFound(single.clone()));
            }
            tokio::fs::copy(single, output).await?;
            Ok(())
        }
        many => {
            for file in many {
                if !file.exists() {
                    return Err(MediaError::FileNotFound(file.clone()));
                }
            }

            let uniform_codec = detect_uniform_codec(many).await?;
            match uniform_codec {
                Some(codec) => {
                    debug!(codec = %codec, inputs = many.len(), "Concatenating via stream copy");
                    concat_stream_copy(many, output).await
                }
                None => {
                    info!(inputs = many.len(), "Mixed codecs, re-encoding concat");
                    concat_reencode(many, output).await
                }
            }
        }
    }
}

/// Probe every input; returns the shared codec name, or None when they differ.
async fn detect_uniform_codec(files: &[PathBuf]) -> MediaResult<Option<String>> {
    let mut codec: Option<String> = None;
    for file in files {
        let info = probe_audio(file).await?;
        match &codec {
            None => codec = Some(info.codec),
            Some(seen) if *seen == info.codec => {}
            Some(_) => return Ok(None),
        }
    }
    Ok(codec)
}

async fn concat_stream_copy(files: &[PathBuf], output: &Path) -> MediaResult<()> {
    // List file must outlive the ffmpeg run; TempDir cleans up on drop
    let workdir = TempDir::new()?;
    let list_path = workdir.path().join("concat.txt");

    let mut list = String::new();
    for file in files {
        list.push_str(&concat_list_entry(file));
        list.push('\n');
    }
    tokio::fs::write(&list_path, list).await?;

    let cmd = FfmpegCommand::new(output)
        .input_with_args(["-f", "concat", "-safe", "0"], list_path.to_string_lossy())
        .output_args(["-c", "copy"]);

    FfmpegRunner::new().run(&cmd).await
}

async fn concat_reencode(files: &[PathBuf], output: &Path) -> MediaResult<()> {
    let mut cmd = FfmpegCommand::new(output);
    for file in files {
        cmd = cmd.input(file);
    }

    cmd = cmd
        .filter_complex(build_concat_filter(files.len()))
        .map("[joined]")
        .audio_codec("libmp3lame")
        .audio_bitrate("192k")
        .sample_rate(SAMPLE_RATE)
        .channels(2);

    FfmpegRunner::new().run(&cmd).await
}

/// Build the concat filter graph for `n` audio-only inputs.
fn build_concat_filter(n: usize) -> String {
    let mut filter = String::new();
    for i in 0..n {
        filter.push_str(&format!("[{}:a]", i));
    }
    filter.push_str(&format!("concat=n={}:v=0:a=1[joined]", n));
    filter
}

/// One line of a concat-demuxer list file, with single quotes escaped the
/// way the demuxer expects (`'` closes, `\'` emits, `'` reopens).
fn concat_list_entry(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', r"'\''");
    format!("file '{}'", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let err = concat_audio(&[], "out.mp3").await.unwrap_err();
        assert!(matches!(err, MediaError::NoInputs));
    }

    #[tokio::test]
    async fn test_missing_input_is_rejected() {
        let files = vec![
            PathBuf::from("/nope/a.mp3"),
            PathBuf::from("/nope/b.mp3"),
        ];
        let err = concat_audio(&files, "out.mp3").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[test]
    fn test_concat_filter_shape() {
        assert_eq!(build_concat_filter(2), "[0:a][1:a]concat=n=2:v=0:a=1[joined]");
        assert_eq!(
            build_concat_filter(4),
            "[0:a][1:a][2:a][3:a]concat=n=4:v=0:a=1[joined]"
        );
    }

    #[test]
    fn test_list_entry_escaping() {
        assert_eq!(
            concat_list_entry(Path::new("/tmp/chunk_01.mp3")),
            "file '/tmp/chunk_01.mp3'"
        );
        assert_eq!(
            concat_list_entry(Path::new("/tmp/it's.mp3")),
            r"file '/tmp/it'\''s.mp3'"
        );
    }
}
