use super::audio_segment::AudioSegment;
use super::transcript::SpeakerTurn;

/// Domain interface for speaker diarization.
///
/// Implementations partition the audio into speaker-attributed turns.
/// `expected_speakers` caps the number of distinct labels when the user
/// knows how many voices the recording contains; `None` lets the engine
/// decide.
pub trait Diarizer: Send {
    fn diarize(
        &self,
        audio: &AudioSegment,
        expected_speakers: Option<usize>,
    ) -> Result<Vec<SpeakerTurn>, Box<dyn std::error::Error>>;
}
