use std::path::Path;

use crate::audio::domain::diarizer::Diarizer;
use crate::audio::domain::speaker_aligner::align;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::audio::domain::transcript::AnnotatedSegment;
use crate::shared::constants::RECOGNITION_SAMPLE_RATE;
use crate::video::domain::audio_reader::AudioReader;

/// Progress split: transcription owns the first 80%, diarization the rest.
const TRANSCRIPTION_PROGRESS_SHARE: f64 = 80.0;

/// Full transcription run for one recording: decode the speech track,
/// transcribe it, diarize it, and fuse both into speaker-attributed
/// segments.
///
/// Diarization is optional and best-effort: a missing or failing diarizer
/// degrades the output to unattributed segments instead of failing the run.
/// This use case owns its engines for the duration of a run; afterwards the
/// caller reclaims them with [`Self::into_engines`] so model-backed
/// resources outlive every callback that may still reference the results.
pub struct TranscribeVideoUseCase {
    audio_reader: Box<dyn AudioReader>,
    recognizer: Box<dyn SpeechRecognizer>,
    diarizer: Option<Box<dyn Diarizer>>,
}

impl TranscribeVideoUseCase {
    pub fn new(
        audio_reader: Box<dyn AudioReader>,
        recognizer: Box<dyn SpeechRecognizer>,
        diarizer: Option<Box<dyn Diarizer>>,
    ) -> Self {
        Self {
            audio_reader,
            recognizer,
            diarizer,
        }
    }

    /// Runs the pipeline. `on_progress` receives percentages in `0..=100`.
    pub fn run(
        &self,
        video_path: &Path,
        expected_speakers: Option<usize>,
        on_progress: Option<&dyn Fn(u8)>,
    ) -> Result<Vec<AnnotatedSegment>, Box<dyn std::error::Error>> {
        let report = |pct: u8| {
            if let Some(cb) = on_progress {
                cb(pct.min(100));
            }
        };

        let audio = match self
            .audio_reader
            .read_audio(video_path, RECOGNITION_SAMPLE_RATE, 1)?
        {
            Some(audio) if !audio.is_empty() => audio,
            _ => {
                log::info!("{} has no audio track; nothing to transcribe", video_path.display());
                report(100);
                return Ok(Vec::new());
            }
        };

        let transcription_progress =
            |fraction: f64| report((fraction.clamp(0.0, 1.0) * TRANSCRIPTION_PROGRESS_SHARE) as u8);
        let segments = self
            .recognizer
            .transcribe(&audio, Some(&transcription_progress))?;
        report(TRANSCRIPTION_PROGRESS_SHARE as u8);
        log::info!("transcription produced {} segments", segments.len());

        let turns = match &self.diarizer {
            Some(diarizer) => match diarizer.diarize(&audio, expected_speakers) {
                Ok(turns) => turns,
                Err(e) => {
                    log::warn!("diarization failed, continuing without speakers: {e}");
                    Vec::new()
                }
            },
            None => {
                log::info!("no diarizer configured; speakers will be unattributed");
                Vec::new()
            }
        };

        let annotated = align(&segments, &turns);
        report(100);
        Ok(annotated)
    }

    /// Hands the engines back to the caller after a run. The receiving side
    /// must keep them alive for as long as any scheduled callback may still
    /// reference model-backed state.
    pub fn into_engines(self) -> (Box<dyn SpeechRecognizer>, Option<Box<dyn Diarizer>>) {
        (self.recognizer, self.diarizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_segment::AudioSegment;
    use crate::audio::domain::transcript::{SpeakerTurn, SpeechSegment};
    use crate::shared::constants::UNKNOWN_SPEAKER;
    use std::sync::{Arc, Mutex};

    // ─── Stubs ───

    struct StubAudioReader {
        segment: Option<AudioSegment>,
    }

    impl AudioReader for StubAudioReader {
        fn read_audio(
            &self,
            _: &Path,
            _: u32,
            _: u16,
        ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
            Ok(self.segment.clone())
        }
    }

    struct StubRecognizer {
        segments: Vec<SpeechSegment>,
    }

    impl SpeechRecognizer for StubRecognizer {
        fn transcribe(
            &self,
            _: &AudioSegment,
            on_progress: Option<&dyn Fn(f64)>,
        ) -> Result<Vec<SpeechSegment>, Box<dyn std::error::Error>> {
            if let Some(cb) = on_progress {
                cb(0.5);
                cb(1.0);
            }
            Ok(self.segments.clone())
        }
    }

    struct StubDiarizer {
        turns: Vec<SpeakerTurn>,
    }

    impl Diarizer for StubDiarizer {
        fn diarize(
            &self,
            _: &AudioSegment,
            _: Option<usize>,
        ) -> Result<Vec<SpeakerTurn>, Box<dyn std::error::Error>> {
            Ok(self.turns.clone())
        }
    }

    struct FailingDiarizer;

    impl Diarizer for FailingDiarizer {
        fn diarize(
            &self,
            _: &AudioSegment,
            _: Option<usize>,
        ) -> Result<Vec<SpeakerTurn>, Box<dyn std::error::Error>> {
            Err("diarization pipeline unavailable".into())
        }
    }

    fn tone_audio() -> AudioSegment {
        AudioSegment::new(vec![0.1; 48000], 16000, 1)
    }

    fn seg(start: f64, end: f64, text: &str) -> SpeechSegment {
        SpeechSegment {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_no_audio_track_yields_empty_transcript() {
        let uc = TranscribeVideoUseCase::new(
            Box::new(StubAudioReader { segment: None }),
            Box::new(StubRecognizer { segments: vec![] }),
            None,
        );
        let out = uc.run(Path::new("silent.mp4"), None, None).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_tone_only_recording_yields_empty_transcript() {
        // Recognizer finds no speech in a pure tone; the run must still
        // succeed with an empty, structurally valid result.
        let uc = TranscribeVideoUseCase::new(
            Box::new(StubAudioReader {
                segment: Some(tone_audio()),
            }),
            Box::new(StubRecognizer { segments: vec![] }),
            Some(Box::new(StubDiarizer { turns: vec![] })),
        );
        let out = uc.run(Path::new("tone.mp4"), None, None).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_speakers_are_assigned_from_turns() {
        let uc = TranscribeVideoUseCase::new(
            Box::new(StubAudioReader {
                segment: Some(tone_audio()),
            }),
            Box::new(StubRecognizer {
                segments: vec![seg(0.0, 2.0, "hello"), seg(2.0, 4.0, "hi there")],
            }),
            Some(Box::new(StubDiarizer {
                turns: vec![
                    SpeakerTurn {
                        start: 0.0,
                        end: 2.0,
                        speaker: "SPEAKER_00".to_string(),
                    },
                    SpeakerTurn {
                        start: 2.0,
                        end: 4.0,
                        speaker: "SPEAKER_01".to_string(),
                    },
                ],
            })),
        );
        let out = uc.run(Path::new("two.mp4"), None, None).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].speaker, "SPEAKER_00");
        assert_eq!(out[1].speaker, "SPEAKER_01");
    }

    #[test]
    fn test_diarizer_failure_degrades_to_unattributed() {
        let uc = TranscribeVideoUseCase::new(
            Box::new(StubAudioReader {
                segment: Some(tone_audio()),
            }),
            Box::new(StubRecognizer {
                segments: vec![seg(0.0, 2.0, "hello")],
            }),
            Some(Box::new(FailingDiarizer)),
        );
        let out = uc.run(Path::new("clip.mp4"), None, None).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].speaker, UNKNOWN_SPEAKER);
        assert_eq!(out[0].text, "hello");
    }

    #[test]
    fn test_missing_diarizer_degrades_to_unattributed() {
        let uc = TranscribeVideoUseCase::new(
            Box::new(StubAudioReader {
                segment: Some(tone_audio()),
            }),
            Box::new(StubRecognizer {
                segments: vec![seg(0.0, 2.0, "hello")],
            }),
            None,
        );
        let out = uc.run(Path::new("clip.mp4"), None, None).unwrap();
        assert_eq!(out[0].speaker, UNKNOWN_SPEAKER);
    }

    #[test]
    fn test_progress_reaches_100_and_is_monotonic() {
        let reported: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = reported.clone();
        let uc = TranscribeVideoUseCase::new(
            Box::new(StubAudioReader {
                segment: Some(tone_audio()),
            }),
            Box::new(StubRecognizer {
                segments: vec![seg(0.0, 2.0, "hello")],
            }),
            Some(Box::new(StubDiarizer { turns: vec![] })),
        );
        let cb = move |pct: u8| sink.lock().unwrap().push(pct);
        uc.run(Path::new("clip.mp4"), None, Some(&cb)).unwrap();

        let reported = reported.lock().unwrap();
        assert_eq!(*reported.last().unwrap(), 100);
        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
        assert!(reported.contains(&80));
    }

    #[test]
    fn test_into_engines_returns_ownership() {
        let uc = TranscribeVideoUseCase::new(
            Box::new(StubAudioReader { segment: None }),
            Box::new(StubRecognizer { segments: vec![] }),
            Some(Box::new(StubDiarizer { turns: vec![] })),
        );
        let (_recognizer, diarizer) = uc.into_engines();
        assert!(diarizer.is_some());
    }
}
