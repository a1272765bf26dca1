use crate::shared::constants::UNKNOWN_SPEAKER;

/// One recognized utterance: a contiguous time span of speech text.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SpeechSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One diarization turn: a contiguous time span attributed to a speaker.
///
/// The label is opaque (typically `SPEAKER_00` style); turns carry no
/// ordering guarantee and one speaker may own non-contiguous turns.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeakerTurn {
    pub start: f64,
    pub end: f64,
    pub speaker: String,
}

/// A speech segment with its assigned speaker label.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub speaker: String,
}

impl AnnotatedSegment {
    pub fn new(segment: SpeechSegment, speaker: String) -> Self {
        Self {
            start: segment.start,
            end: segment.end,
            text: segment.text,
            speaker,
        }
    }

    /// A segment that no diarization turn could claim.
    pub fn unattributed(segment: SpeechSegment) -> Self {
        Self::new(segment, UNKNOWN_SPEAKER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_segment_duration() {
        let seg = SpeechSegment {
            start: 1.5,
            end: 4.0,
            text: "hello there".to_string(),
        };
        assert_relative_eq!(seg.duration(), 2.5);
    }

    #[test]
    fn test_unattributed_uses_sentinel() {
        let seg = SpeechSegment {
            start: 0.0,
            end: 1.0,
            text: "mystery voice".to_string(),
        };
        let annotated = AnnotatedSegment::unattributed(seg);
        assert_eq!(annotated.speaker, UNKNOWN_SPEAKER);
        assert_eq!(annotated.text, "mystery voice");
    }
}
