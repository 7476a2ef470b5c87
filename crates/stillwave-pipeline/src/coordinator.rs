//! Batched concurrent synthesis.

use futures::future::join_all;
use tracing::{info, warn};

use stillwave_models::{ScriptUnit, TtsModel, Voice};

use crate::chunks::{ChunkArtifact, UnitSynthesizer};

/// Synthesize every unit, `batch_size` at a time.
///
/// The result has one slot per input unit, in input order. A unit whose
/// synthesis failed yields `None`; the rest of the batch and all later
/// batches still run, so one flaky API call costs one chunk rather than
/// the whole session. Batches run strictly one after another, which keeps
/// concurrent API pressure bounded without a semaphore.
pub async fn process_units(
    synth: &dyn UnitSynthesizer,
    units: &[ScriptUnit],
    voice: Voice,
    model: TtsModel,
    batch_size: usize,
) -> Vec<Option<ChunkArtifact>> {
    let batch_size = batch_size.max(1);
    let total = units.len();
    let mut artifacts: Vec<Option<ChunkArtifact>> = Vec::with_capacity(total);

    for (batch_idx, batch) in units.chunks(batch_size).enumerate() {
        let futures: Vec<_> = batch
            .iter()
            .map(|unit| synth.synthesize_unit(unit, voice, model))
            .collect();

        let results = join_all(futures).await;

        for (offset, result) in results.into_iter().enumerate() {
            match result {
                Ok(artifact) => artifacts.push(Some(artifact)),
                Err(e) => {
                    let index = batch_idx * batch_size + offset;
                    warn!(index, error = %e, "Unit synthesis failed, dropping chunk");
                    artifacts.push(None);
                }
            }
        }

        info!(
            batch = batch_idx + 1,
            completed = artifacts.len(),
            total,
            "Synthesis batch complete"
        );
    }

    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, PipelineResult};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fails for configured texts, records call order otherwise.
    struct MockSynthesizer {
        fail_on: Vec<String>,
        calls: Mutex<Vec<String>>,
        in_flight_peak: AtomicUsize,
        in_flight: AtomicUsize,
    }

    impl MockSynthesizer {
        fn new(fail_on: &[&str]) -> Self {
            Self {
                fail_on: fail_on.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
                in_flight_peak: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl UnitSynthesizer for MockSynthesizer {
        async fn synthesize_unit(
            &self,
            unit: &ScriptUnit,
            _voice: Voice,
            _model: TtsModel,
        ) -> PipelineResult<ChunkArtifact> {
            let label = match unit {
                ScriptUnit::Speech { text } => text.clone(),
                ScriptUnit::Silence { seconds } => format!("silence_{}", seconds),
            };

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.in_flight_peak.fetch_max(current, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.calls.lock().unwrap().push(label.clone());

            if self.fail_on.contains(&label) {
                return Err(PipelineError::synthesis(format!("boom: {}", label)));
            }
            Ok(ChunkArtifact {
                path: PathBuf::from(format!("/tmp/{}.mp3", label)),
                cached: false,
            })
        }
    }

    fn speech_units(n: usize) -> Vec<ScriptUnit> {
        (0..n).map(|i| ScriptUnit::speech(format!("u{}", i))).collect()
    }

    #[tokio::test]
    async fn test_output_matches_input_order_and_length() {
        let synth = MockSynthesizer::new(&[]);
        let units = speech_units(7);

        let out = process_units(&synth, &units, Voice::Nova, TtsModel::Tts1, 3).await;

        assert_eq!(out.len(), 7);
        for (i, slot) in out.iter().enumerate() {
            let artifact = slot.as_ref().unwrap();
            assert_eq!(artifact.path, PathBuf::from(format!("/tmp/u{}.mp3", i)));
        }
        assert!(synth.in_flight_peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_one_failure_drops_only_that_slot() {
        let synth = MockSynthesizer::new(&["u2"]);
        let units = speech_units(5);

        let out = process_units(&synth, &units, Voice::Nova, TtsModel::Tts1, 10).await;

        assert_eq!(out.len(), 5);
        assert!(out[2].is_none());
        assert_eq!(out.iter().filter(|s| s.is_some()).count(), 4);
    }

    #[tokio::test]
    async fn test_all_failures_yield_all_none() {
        let synth = MockSynthesizer::new(&["u0", "u1", "u2"]);
        let units = speech_units(3);

        let out = process_units(&synth, &units, Voice::Nova, TtsModel::Tts1, 2).await;
        assert!(out.iter().all(|s| s.is_none()));
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_output() {
        let synth = MockSynthesizer::new(&[]);
        let out = process_units(&synth, &[], Voice::Nova, TtsModel::Tts1, 10).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_mixed_unit_kinds_flow_through() {
        let synth = MockSynthesizer::new(&[]);
        let units = vec![
            ScriptUnit::speech("hello"),
            ScriptUnit::silence(3),
            ScriptUnit::speech("world"),
        ];

        let out = process_units(&synth, &units, Voice::Nova, TtsModel::Tts1, 2).await;
        assert_eq!(out.len(), 3);
        assert_eq!(
            out[1].as_ref().unwrap().path,
            PathBuf::from("/tmp/silence_3.mp3")
        );
    }
}
