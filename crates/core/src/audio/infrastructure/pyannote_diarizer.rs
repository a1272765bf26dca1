use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pyannote_rs::{EmbeddingExtractor, EmbeddingManager};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::diarizer::Diarizer;
use crate::audio::domain::transcript::SpeakerTurn;
use crate::shared::constants::UNKNOWN_SPEAKER;

/// Speaker cap when the user gives no expected count.
const DEFAULT_MAX_SPEAKERS: usize = 8;

/// Cosine-similarity threshold for matching an embedding to a known speaker.
const SPEAKER_MATCH_THRESHOLD: f32 = 0.5;

/// Turns shorter than this carry too little signal for a stable embedding.
const MIN_TURN_DURATION: f64 = 0.5;

/// Speaker diarization using the pyannote segmentation and speaker-embedding
/// ONNX models via pyannote-rs.
///
/// The segmentation model proposes speech turns; each turn's speaker
/// embedding is matched against previously seen speakers to assign a stable
/// `SPEAKER_NN` label. The embedding session is loaded once at construction
/// and retained for the diarizer's lifetime.
pub struct PyannoteDiarizer {
    segmentation_model: PathBuf,
    extractor: Mutex<EmbeddingExtractor>,
}

impl PyannoteDiarizer {
    pub fn new(
        segmentation_model: &Path,
        embedding_model: &Path,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        for path in [segmentation_model, embedding_model] {
            if !path.exists() {
                return Err(format!("Diarization model not found at: {}", path.display()).into());
            }
        }
        let extractor = EmbeddingExtractor::new(embedding_model)
            .map_err(|e| format!("Failed to load speaker embedding model: {e}"))?;
        Ok(Self {
            segmentation_model: segmentation_model.to_path_buf(),
            extractor: Mutex::new(extractor),
        })
    }
}

impl Diarizer for PyannoteDiarizer {
    fn diarize(
        &self,
        audio: &AudioSegment,
        expected_speakers: Option<usize>,
    ) -> Result<Vec<SpeakerTurn>, Box<dyn std::error::Error>> {
        let samples = audio.to_i16();
        let max_speakers = expected_speakers.unwrap_or(DEFAULT_MAX_SPEAKERS).max(1);

        let segments =
            pyannote_rs::get_segments(&samples, audio.sample_rate(), &self.segmentation_model)
                .map_err(|e| format!("Segmentation failed: {e}"))?;

        let mut extractor = self
            .extractor
            .lock()
            .map_err(|_| "Speaker embedding session poisoned")?;
        let mut manager = EmbeddingManager::new(max_speakers);

        let mut turns = Vec::new();
        for segment in segments {
            let segment = match segment {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("skipping unreadable diarization turn: {e}");
                    continue;
                }
            };
            if segment.end - segment.start < MIN_TURN_DURATION {
                continue;
            }

            let speaker = match extractor.compute(&segment.samples) {
                Ok(embedding) => {
                    let embedding: Vec<f32> = embedding.collect();
                    // Once every slot is taken, force the closest known
                    // speaker instead of minting new labels.
                    if manager.get_all_speakers().len() >= max_speakers {
                        manager
                            .get_best_speaker_match(embedding)
                            .map(speaker_label)
                            .unwrap_or_else(|_| UNKNOWN_SPEAKER.to_string())
                    } else {
                        manager
                            .search_speaker(embedding, SPEAKER_MATCH_THRESHOLD)
                            .map(speaker_label)
                            .unwrap_or_else(|| UNKNOWN_SPEAKER.to_string())
                    }
                }
                Err(e) => {
                    log::warn!("speaker embedding failed for turn: {e}");
                    UNKNOWN_SPEAKER.to_string()
                }
            };

            turns.push(SpeakerTurn {
                start: segment.start,
                end: segment.end,
                speaker,
            });
        }

        log::info!("diarization found {} speaker turns", turns.len());
        Ok(turns)
    }
}

fn speaker_label(index: usize) -> String {
    format!("SPEAKER_{index:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_nonexistent_models_return_error() {
        let result = PyannoteDiarizer::new(
            Path::new("/nonexistent/segmentation.onnx"),
            Path::new("/nonexistent/embedding.onnx"),
        );
        let err = result.err().unwrap().to_string();
        assert!(err.contains("not found"), "got: {err}");
    }

    #[test]
    fn test_speaker_label_formatting() {
        assert_eq!(speaker_label(0), "SPEAKER_00");
        assert_eq!(speaker_label(3), "SPEAKER_03");
        assert_eq!(speaker_label(12), "SPEAKER_12");
    }
}
