//! Script segmentation.
//!
//! Splits a meditation script into ordered speech and silence units.
//! Pause markers use the surface syntax `{{PAUSE_<seconds>s}}`, for
//! example `{{PAUSE_5s}}`. Text between markers is whitespace-normalized
//! and, when it exceeds the per-unit character limit, split at the last
//! sentence or clause boundary before the limit.

use stillwave_models::ScriptUnit;

use crate::error::{PipelineError, PipelineResult};

const MARKER_OPEN: &str = "{{";
const MARKER_CLOSE: &str = "}}";
const MARKER_PREFIX: &str = "PAUSE_";

/// Segment a script into speech and silence units, preserving order.
///
/// An empty or whitespace-only script yields an empty vector; the caller
/// decides whether that is an error. A malformed or non-positive pause
/// marker fails the whole script, since silently dropping a pause would
/// change the session the author wrote.
pub fn segment_script(script: &str, max_chunk_chars: usize) -> PipelineResult<Vec<ScriptUnit>> {
    let mut units = Vec::new();
    let mut rest = script;

    while let Some(start) = rest.find(MARKER_OPEN) {
        push_speech_units(&rest[..start], max_chunk_chars, &mut units);

        let after_open = &rest[start + MARKER_OPEN.len()..];
        let close = after_open.find(MARKER_CLOSE).ok_or_else(|| {
            PipelineError::segmentation("unterminated pause marker".to_string())
        })?;

        let seconds = parse_marker(&after_open[..close])?;
        units.push(ScriptUnit::silence(seconds));

        rest = &after_open[close + MARKER_CLOSE.len()..];
    }

    push_speech_units(rest, max_chunk_chars, &mut units);
    Ok(units)
}

/// Parse the inside of a `{{...}}` marker into a pause duration.
fn parse_marker(inner: &str) -> PipelineResult<u32> {
    let body = inner
        .strip_prefix(MARKER_PREFIX)
        .and_then(|b| b.strip_suffix('s'))
        .ok_or_else(|| {
            PipelineError::segmentation(format!("invalid pause marker: {:?}", inner))
        })?;

    let seconds: u32 = body.parse().map_err(|_| {
        PipelineError::segmentation(format!("invalid pause duration: {:?}", body))
    })?;

    if seconds == 0 {
        return Err(PipelineError::segmentation(
            "pause duration must be positive",
        ));
    }
    Ok(seconds)
}

/// Normalize a stretch of prose and append it as one or more speech units.
fn push_speech_units(raw: &str, max_chunk_chars: usize, units: &mut Vec<ScriptUnit>) {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return;
    }

    let mut rest = normalized.as_str();
    while rest.len() > max_chunk_chars {
        let window_end = floor_char_boundary(rest, max_chunk_chars);
        let window = &rest[..window_end];

        // Prefer the last sentence or clause break inside the window
        let cut = window
            .rfind(['.', ','])
            .map(|i| i + 1)
            .unwrap_or(window_end);

        let (chunk, tail) = rest.split_at(cut);
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            units.push(ScriptUnit::speech(chunk));
        }
        rest = tail.trim_start();
    }

    if !rest.is_empty() {
        units.push(ScriptUnit::speech(rest));
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
