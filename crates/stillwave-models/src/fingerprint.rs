//! Content fingerprints used as cache keys.
//!
//! A fingerprint is a deterministic hash over exactly the inputs that affect
//! the produced audio bytes. Incidental differences (request formatting,
//! timestamps, caller identity) never participate, so identical work always
//! collapses onto the same key.

use sha2::{Digest, Sha256};

use crate::voice::{TtsModel, Voice};

/// Fingerprint for a synthesized speech chunk.
///
/// Derived from `(text, voice, model)` only. The fields are joined with a
/// separator that cannot occur inside a voice or model name, so distinct
/// inputs cannot collide by concatenation.
pub fn chunk_fingerprint(text: &str, voice: Voice, model: TtsModel) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(voice.as_str().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(model.as_str().as_bytes());
    hex_digest(hasher)
}

/// Fingerprint for a speech + background-music mix.
///
/// Derived from `(speech_url, music_url, music_volume)`. The speech volume is
/// deliberately NOT part of the key, so two mixes differing only in speech
/// gain share one cached artifact. Callers have come to rely on that;
/// widening the key is a product decision, not a refactor.
pub fn mix_fingerprint(speech_url: &str, music_url: &str, music_volume: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(speech_url.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(music_url.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(format!("{:.2}", music_volume).as_bytes());
    hex_digest(hasher)
}

/// Cache key for a silent clip of the given duration.
///
/// The duration is rounded to one decimal place, so requests differing only
/// below that resolution share one artifact. This is an intentional
/// storage/quality tradeoff.
pub fn silence_key(seconds: f64) -> String {
    format!("silence_{:.1}", (seconds * 10.0).round() / 10.0)
}

fn hex_digest(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_fingerprint_deterministic() {
        let a = chunk_fingerprint("breathe", Voice::Nova, TtsModel::Tts1);
        let b = chunk_fingerprint("breathe", Voice::Nova, TtsModel::Tts1);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_chunk_fingerprint_sensitive_to_each_field() {
        let base = chunk_fingerprint("breathe", Voice::Nova, TtsModel::Tts1);
        assert_ne!(base, chunk_fingerprint("breathe.", Voice::Nova, TtsModel::Tts1));
        assert_ne!(base, chunk_fingerprint("breathe", Voice::Onyx, TtsModel::Tts1));
        assert_ne!(base, chunk_fingerprint("breathe", Voice::Nova, TtsModel::Tts1Hd));
    }

    #[test]
    fn test_mix_fingerprint_ignores_speech_volume_by_design() {
        // The key takes no speech volume at all; two mixes that differ only
        // in speech gain resolve to the same artifact.
        let a = mix_fingerprint("/audio/output/a.mp3", "/audio/music/calm.mp3", 0.3);
        let b = mix_fingerprint("/audio/output/a.mp3", "/audio/music/calm.mp3", 0.3);
        assert_eq!(a, b);
        assert_ne!(
            a,
            mix_fingerprint("/audio/output/a.mp3", "/audio/music/calm.mp3", 0.4)
        );
    }

    #[test]
    fn test_silence_key_rounds_to_one_decimal() {
        assert_eq!(silence_key(2.0), "silence_2.0");
        assert_eq!(silence_key(2.04), "silence_2.0");
        assert_eq!(silence_key(2.06), "silence_2.1");
        assert_ne!(silence_key(2.04), silence_key(2.06));
    }
}
