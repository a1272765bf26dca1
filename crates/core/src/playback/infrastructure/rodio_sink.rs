use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::Source;

use crate::playback::domain::audio_sink::AudioSink;

/// Audio playback through the default output device via rodio.
///
/// `play_from` rebuilds the sink over a fresh WAV decoder with the leading
/// samples skipped — rodio, like most playback stacks, cannot resume a
/// stopped sink at an arbitrary offset. `elapsed` reads the sink's playback
/// position, which starts at zero on every `play_from`, giving the
/// synchronizer the fresh-epoch clock it expects.
pub struct RodioSink {
    // The stream must stay alive as long as the sink plays through it.
    _stream: Option<rodio::OutputStream>,
    handle: Option<rodio::OutputStreamHandle>,
    sink: Option<rodio::Sink>,
    track: Option<PathBuf>,
    volume: f32,
}

impl RodioSink {
    pub fn new() -> Self {
        Self {
            _stream: None,
            handle: None,
            sink: None,
            track: None,
            volume: 1.0,
        }
    }
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for RodioSink {
    fn load(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if self.handle.is_none() {
            let (stream, handle) = rodio::OutputStream::try_default()?;
            self._stream = Some(stream);
            self.handle = Some(handle);
        }
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.track = Some(path.to_path_buf());
        log::info!("playback track loaded: {}", path.display());
        Ok(())
    }

    fn play_from(&mut self, offset: f64) -> Result<(), Box<dyn std::error::Error>> {
        let handle = self.handle.as_ref().ok_or("audio output not initialized")?;
        let track = self.track.as_ref().ok_or("no playback track loaded")?;

        if let Some(old) = self.sink.take() {
            old.stop();
        }

        let file = BufReader::new(File::open(track)?);
        let source =
            rodio::Decoder::new(file)?.skip_duration(Duration::from_secs_f64(offset.max(0.0)));

        let sink = rodio::Sink::try_new(handle)?;
        sink.set_volume(self.volume);
        sink.append(source);
        sink.play();
        self.sink = Some(sink);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn elapsed(&self) -> Option<f64> {
        let sink = self.sink.as_ref()?;
        if sink.is_paused() || sink.empty() {
            return None;
        }
        Some(sink.get_pos().as_secs_f64())
    }

    fn is_loaded(&self) -> bool {
        self.track.is_some() && self.handle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_without_load_returns_error() {
        let mut sink = RodioSink::new();
        assert!(sink.play_from(0.0).is_err());
    }

    #[test]
    fn test_elapsed_is_none_before_playback() {
        let sink = RodioSink::new();
        assert!(sink.elapsed().is_none());
        assert!(!sink.is_loaded());
    }

    #[test]
    fn test_set_volume_clamps() {
        let mut sink = RodioSink::new();
        sink.set_volume(2.5);
        assert_eq!(sink.volume, 1.0);
        sink.set_volume(-1.0);
        assert_eq!(sink.volume, 0.0);
    }
}
