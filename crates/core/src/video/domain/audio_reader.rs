use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;

/// Decodes the audio track of a media file into PCM samples.
///
/// `sample_rate` and `channels` select the output format; the implementation
/// resamples as needed. Returns `Ok(None)` when the container carries no
/// audio stream — a silent video is not an error.
pub trait AudioReader: Send {
    fn read_audio(
        &self,
        path: &Path,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>>;
}
