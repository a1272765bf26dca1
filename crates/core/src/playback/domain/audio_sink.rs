use std::path::Path;

/// The audio playback clock.
///
/// The sink's position clock has its own epoch: it resets every time
/// [`AudioSink::play_from`] is issued, and a paused sink cannot be resumed
/// from the clock's side — resuming playback means re-issuing `play_from`
/// with an explicit offset. The synchronizer is the only caller; no other
/// component touches the sink.
///
/// Playback lives on the interactive thread, so the trait carries no `Send`
/// bound.
pub trait AudioSink {
    /// Loads the extracted playback track.
    fn load(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>>;

    /// Starts (or restarts) playback at `offset` seconds into the track,
    /// resetting the clock epoch.
    fn play_from(&mut self, offset: f64) -> Result<(), Box<dyn std::error::Error>>;

    fn pause(&mut self);

    fn stop(&mut self);

    fn set_volume(&mut self, volume: f32);

    /// Seconds of audio actually played since the last `play_from`.
    /// `None` while stopped, paused, or after the track ran out.
    fn elapsed(&self) -> Option<f64>;

    /// Whether a track has been loaded and the sink can play.
    fn is_loaded(&self) -> bool;
}
