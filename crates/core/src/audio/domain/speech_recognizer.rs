use super::audio_segment::AudioSegment;
use super::transcript::SpeechSegment;

/// Domain interface for speech-to-text transcription.
///
/// Implementations run inference over decoded audio and yield utterance-level
/// timestamped segments. `on_progress` receives the fraction of the audio
/// consumed so far, in `[0.0, 1.0]`.
pub trait SpeechRecognizer: Send {
    fn transcribe(
        &self,
        audio: &AudioSegment,
        on_progress: Option<&dyn Fn(f64)>,
    ) -> Result<Vec<SpeechSegment>, Box<dyn std::error::Error>>;
}
