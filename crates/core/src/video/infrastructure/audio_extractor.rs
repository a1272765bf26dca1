use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::shared::constants::{PLAYBACK_CHANNELS, PLAYBACK_SAMPLE_RATE};
use crate::video::domain::audio_reader::AudioReader;

/// Produces the playback audio track for a loaded recording: stereo
/// 44.1 kHz 16-bit PCM WAV in the OS temp directory, under a name derived
/// from the source path so each recording maps to one stable file.
///
/// Extraction is idempotent — an existing file for the same source is
/// overwritten. Uncompressed PCM keeps playback seeks sample-accurate,
/// which VBR formats cannot guarantee.
pub struct AudioExtractor {
    reader: Box<dyn AudioReader>,
}

impl AudioExtractor {
    pub fn new(reader: Box<dyn AudioReader>) -> Self {
        Self { reader }
    }

    /// Extracts the playback track, returning the WAV path, or `Ok(None)`
    /// when the recording has no audio stream.
    pub fn extract_playback_track(
        &self,
        video_path: &Path,
    ) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
        let audio = match self
            .reader
            .read_audio(video_path, PLAYBACK_SAMPLE_RATE, PLAYBACK_CHANNELS)?
        {
            Some(audio) if !audio.is_empty() => audio,
            _ => return Ok(None),
        };

        let out_path = playback_track_path(video_path);
        log::info!(
            "extracting playback audio for {} -> {}",
            video_path.display(),
            out_path.display()
        );

        let spec = hound::WavSpec {
            channels: audio.channels(),
            sample_rate: audio.sample_rate(),
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&out_path, spec)?;
        for sample in audio.to_i16() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        Ok(Some(out_path))
    }
}

/// Stable per-source temp path for the extracted playback track.
pub fn playback_track_path(video_path: &Path) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    video_path.hash(&mut hasher);
    std::env::temp_dir().join(format!("vidscribe_audio_{:08x}.wav", hasher.finish() as u32))
}
