use std::time::Duration;

use crate::playback::domain::audio_sink::AudioSink;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Lag (in frames) beyond which a direct seek beats grabbing one frame at
/// a time.
pub const SEEK_THRESHOLD_FRAMES: u64 = 5;

/// Maximum decode-discards used to close a keyframe-snap gap after a seek.
/// Bounds worst-case stall to roughly ten seconds of material at 30 fps.
pub const SEEK_CATCHUP_CAP: u64 = 300;

/// Leads shorter than this are absorbed by the normal tick cadence.
pub const MIN_RESYNC_WAIT: Duration = Duration::from_millis(10);

/// Upper bound on a single video-ahead back-off, so the loop keeps
/// re-reading the audio clock instead of sleeping through a user seek.
pub const MAX_RESYNC_WAIT: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Outcome of one playback tick.
#[derive(Debug)]
pub enum Tick {
    /// Display `frame` and schedule the next tick after `next`.
    Frame { frame: Frame, next: Duration },
    /// Video is ahead of the audio clock: nothing was decoded; tick again
    /// after the delay.
    Wait(Duration),
    /// End of stream: playback transitioned to `Stopped` and audio stopped.
    Finished,
}

/// Keeps a frame-indexed video display locked to an independently clocked
/// audio stream.
///
/// The video side is driven by periodic ticks. Each tick reads the audio
/// clock, converts it to the frame the viewer should be seeing, and corrects
/// the decode position: short lags are closed by decode-discarding frames,
/// long lags by a container seek followed by a bounded catch-up (seeks land
/// on the prior keyframe, not the requested frame), and a video lead is
/// handled by backing off without decoding. When audio is unavailable the
/// loop degrades to fixed-interval video pacing — a recording without a
/// soundtrack still plays.
///
/// `current_frame` is the single source of truth for what the viewer sees.
/// It only moves forward, except through an explicit [`Self::seek_to_frame`].
pub struct PlaybackSynchronizer {
    source: Box<dyn FrameSource>,
    audio: Box<dyn AudioSink>,
    metadata: VideoMetadata,
    state: PlaybackState,
    current_frame: u64,
    audio_start_offset: f64,
    frame_interval: Duration,
}

impl PlaybackSynchronizer {
    /// Takes an already-opened frame source. The sink may be loaded later,
    /// once background extraction finishes.
    pub fn new(
        source: Box<dyn FrameSource>,
        audio: Box<dyn AudioSink>,
        metadata: VideoMetadata,
    ) -> Self {
        let frame_interval = if metadata.fps > 0.0 {
            Duration::from_secs_f64(1.0 / metadata.fps)
        } else {
            Duration::from_millis(33)
        };
        Self {
            source,
            audio,
            metadata,
            state: PlaybackState::Stopped,
            current_frame: 0,
            audio_start_offset: 0.0,
            frame_interval,
        }
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    pub fn current_time(&self) -> f64 {
        self.metadata.frame_time(self.current_frame)
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Hooks up the extracted playback track. If already playing, audio
    /// starts immediately from the current video position.
    pub fn attach_audio(&mut self, wav_path: &std::path::Path) {
        if let Err(e) = self.audio.load(wav_path) {
            log::warn!("audio track could not be loaded, continuing video-only: {e}");
            return;
        }
        if self.state == PlaybackState::Playing {
            self.restart_audio();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.audio.set_volume(volume);
    }

    /// Starts playback, or resumes it from `Paused`. Audio is always
    /// re-issued from the current frame's time — the sink clock cannot
    /// resume — and the clock offset resets with it.
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
        self.restart_audio();
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.audio.pause();
        }
    }

    /// Stops playback and rewinds to the first frame.
    pub fn stop(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.audio.stop();
        self.state = PlaybackState::Stopped;
        self.source.seek(0)?;
        self.current_frame = 0;
        Ok(())
    }

    /// Seeks to `target` (clamped to the recording), closing any
    /// keyframe-snap gap up to [`SEEK_CATCHUP_CAP`], and returns the frame
    /// to display synchronously. Valid in any state; while playing, audio
    /// restarts from the frame actually reached.
    pub fn seek_to_frame(
        &mut self,
        target: u64,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let target = if self.metadata.total_frames > 0 {
            target.min(self.metadata.total_frames - 1)
        } else {
            target
        };

        self.advance_to(target)?;
        let frame = self.source.next_frame()?;
        if let Some(ref frame) = frame {
            self.current_frame = frame.index();
        }

        if self.state == PlaybackState::Playing {
            self.restart_audio();
        }
        Ok(frame)
    }

    pub fn seek_to_time(&mut self, seconds: f64) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        self.seek_to_frame(self.metadata.frame_at_time(seconds))
    }

    /// One playback tick. Only meaningful while `Playing`; otherwise a
    /// plain wait comes back.
    pub fn tick(&mut self) -> Result<Tick, Box<dyn std::error::Error>> {
        if self.state != PlaybackState::Playing {
            return Ok(Tick::Wait(self.frame_interval));
        }

        if let Some(elapsed) = self.audio.elapsed() {
            let expected_time = self.audio_start_offset + elapsed;
            let expected = (expected_time * self.metadata.fps).floor().max(0.0) as u64;

            if expected > self.current_frame {
                if expected - self.current_frame > SEEK_THRESHOLD_FRAMES {
                    // Far behind: one container seek plus bounded catch-up is
                    // cheaper than decoding every skipped frame.
                    self.advance_to(expected)?;
                } else {
                    // Slightly behind: decode-discard up to the expected frame.
                    while self.source.position() < expected {
                        if !self.source.grab()? {
                            break;
                        }
                    }
                }
            } else if expected < self.current_frame {
                // Ahead of the audio clock: hold this frame and come back
                // once audio has caught up.
                let lead_secs =
                    (self.current_frame - expected) as f64 / self.metadata.fps.max(1.0);
                let wait = Duration::from_secs_f64(lead_secs);
                if wait > MIN_RESYNC_WAIT {
                    return Ok(Tick::Wait(wait.min(MAX_RESYNC_WAIT)));
                }
            }
        }

        match self.source.next_frame()? {
            Some(frame) => {
                self.current_frame = frame.index();
                Ok(Tick::Frame {
                    frame,
                    next: self.frame_interval,
                })
            }
            None => {
                self.state = PlaybackState::Stopped;
                self.audio.stop();
                Ok(Tick::Finished)
            }
        }
    }

    /// Seek + landing detection + bounded decode-discard toward `target`.
    /// Afterwards the source is positioned at `target`, or at
    /// `landed + SEEK_CATCHUP_CAP` when the keyframe gap exceeds the cap.
    fn advance_to(&mut self, target: u64) -> Result<(), Box<dyn std::error::Error>> {
        let landed = self.source.seek(target)?;
        if landed < target {
            let catchup = (target - landed).min(SEEK_CATCHUP_CAP);
            for _ in 0..catchup {
                if !self.source.grab()? {
                    break;
                }
            }
        }
        Ok(())
    }

    fn restart_audio(&mut self) {
        if !self.audio.is_loaded() {
            return;
        }
        let offset = self.current_time();
        match self.audio.play_from(offset) {
            Ok(()) => self.audio_start_offset = offset,
            Err(e) => log::warn!("audio restart failed, continuing video-only: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    // ─── Stubs ───

    /// Scripted frame source: `total` frames, keyframes every
    /// `keyframe_interval`, 1x1 RGB pixels.
    struct StubSource {
        total: u64,
        keyframe_interval: u64,
        position: u64,
        grabs: Arc<Mutex<u64>>,
        decodes: Arc<Mutex<u64>>,
    }

    impl StubSource {
        fn new(total: u64, keyframe_interval: u64) -> Self {
            Self {
                total,
                keyframe_interval,
                position: 0,
                grabs: Arc::new(Mutex::new(0)),
                decodes: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl FrameSource for StubSource {
        fn open(&mut self, _: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            unimplemented!("stub is constructed pre-opened")
        }

        fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            if self.position >= self.total {
                return Ok(None);
            }
            *self.decodes.lock().unwrap() += 1;
            let frame = Frame::new(vec![0, 0, 0], 1, 1, self.position);
            self.position += 1;
            Ok(Some(frame))
        }

        fn grab(&mut self) -> Result<bool, Box<dyn std::error::Error>> {
            if self.position >= self.total {
                return Ok(false);
            }
            *self.grabs.lock().unwrap() += 1;
            self.position += 1;
            Ok(true)
        }

        fn seek(&mut self, target: u64) -> Result<u64, Box<dyn std::error::Error>> {
            let clamped = target.min(self.total.saturating_sub(1));
            let landed = clamped - clamped % self.keyframe_interval;
            self.position = landed;
            Ok(landed)
        }

        fn position(&self) -> u64 {
            self.position
        }

        fn close(&mut self) {}
    }

    /// Scripted audio clock: `elapsed` is set by the test.
    struct StubSink {
        loaded: bool,
        elapsed: Arc<Mutex<Option<f64>>>,
        play_offsets: Arc<Mutex<Vec<f64>>>,
        stopped: Arc<Mutex<bool>>,
    }

    impl StubSink {
        fn new(loaded: bool) -> Self {
            Self {
                loaded,
                elapsed: Arc::new(Mutex::new(None)),
                play_offsets: Arc::new(Mutex::new(Vec::new())),
                stopped: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl AudioSink for StubSink {
        fn load(&mut self, _: &Path) -> Result<(), Box<dyn std::error::Error>> {
            self.loaded = true;
            Ok(())
        }

        fn play_from(&mut self, offset: f64) -> Result<(), Box<dyn std::error::Error>> {
            self.play_offsets.lock().unwrap().push(offset);
            *self.elapsed.lock().unwrap() = Some(0.0);
            Ok(())
        }

        fn pause(&mut self) {
            *self.elapsed.lock().unwrap() = None;
        }

        fn stop(&mut self) {
            *self.stopped.lock().unwrap() = true;
            *self.elapsed.lock().unwrap() = None;
        }

        fn set_volume(&mut self, _: f32) {}

        fn elapsed(&self) -> Option<f64> {
            *self.elapsed.lock().unwrap()
        }

        fn is_loaded(&self) -> bool {
            self.loaded
        }
    }

    fn meta(fps: f64, total_frames: u64) -> VideoMetadata {
        VideoMetadata {
            width: 1,
            height: 1,
            fps,
            total_frames,
            codec: "test".to_string(),
            source_path: Some(PathBuf::from("/tmp/clip.mp4")),
        }
    }

    fn build(
        total: u64,
        keyframe_interval: u64,
        audio_loaded: bool,
    ) -> (
        PlaybackSynchronizer,
        Arc<Mutex<Option<f64>>>,
        Arc<Mutex<Vec<f64>>>,
        Arc<Mutex<u64>>,
        Arc<Mutex<u64>>,
        Arc<Mutex<bool>>,
    ) {
        let source = StubSource::new(total, keyframe_interval);
        let sink = StubSink::new(audio_loaded);
        let elapsed = sink.elapsed.clone();
        let offsets = sink.play_offsets.clone();
        let grabs = source.grabs.clone();
        let decodes = source.decodes.clone();
        let stopped = sink.stopped.clone();
        let sync =
            PlaybackSynchronizer::new(Box::new(source), Box::new(sink), meta(30.0, total));
        (sync, elapsed, offsets, grabs, decodes, stopped)
    }

    #[test]
    fn test_tick_without_audio_paces_by_frame_interval() {
        let (mut sync, _, _, _, _, _) = build(100, 10, false);
        sync.play();
        match sync.tick().unwrap() {
            Tick::Frame { frame, next } => {
                assert_eq!(frame.index(), 0);
                assert_eq!(next, sync.frame_interval());
            }
            other => panic!("expected frame, got {other:?}"),
        }
        assert_eq!(sync.current_frame(), 0);
    }

    #[test]
    fn test_large_lag_seeks_and_catches_up() {
        let (mut sync, elapsed, _, grabs, _, _) = build(1000, 100, true);
        sync.play();
        // Audio says 5 seconds in: expected frame 150, keyframe lands at 100.
        *elapsed.lock().unwrap() = Some(5.0);
        match sync.tick().unwrap() {
            Tick::Frame { frame, .. } => assert_eq!(frame.index(), 150),
            other => panic!("expected frame, got {other:?}"),
        }
        assert_eq!(sync.current_frame(), 150);
        assert_eq!(*grabs.lock().unwrap(), 50);
    }

    #[test]
    fn test_catchup_is_capped_after_keyframe_snap() {
        // Keyframes every 400 frames: expected frame 350 lands at 0, and
        // the gap of 350 exceeds the 300-frame cap.
        let (mut sync, elapsed, _, _, _, _) = build(1000, 400, true);
        sync.play();
        *elapsed.lock().unwrap() = Some(350.0 / 30.0);
        match sync.tick().unwrap() {
            Tick::Frame { frame, .. } => assert_eq!(frame.index(), SEEK_CATCHUP_CAP),
            other => panic!("expected frame, got {other:?}"),
        }
        assert_eq!(sync.current_frame(), SEEK_CATCHUP_CAP);
    }

    #[test]
    fn test_small_lag_grabs_instead_of_seeking() {
        let (mut sync, elapsed, _, grabs, _, _) = build(1000, 100, true);
        sync.play();
        // Display frame 0 first so current_frame has a baseline.
        sync.tick().unwrap();
        // Audio midway through frame 4: gap of 4 is within the threshold.
        *elapsed.lock().unwrap() = Some(4.5 / 30.0);
        match sync.tick().unwrap() {
            Tick::Frame { frame, .. } => assert_eq!(frame.index(), 4),
            other => panic!("expected frame, got {other:?}"),
        }
        // Frames 1..=3 were grabbed, frame 4 decoded for display.
        assert_eq!(*grabs.lock().unwrap(), 3);
    }

    #[test]
    fn test_video_ahead_waits_without_decoding() {
        let (mut sync, elapsed, _, _, decodes, _) = build(1000, 100, true);
        sync.play();
        *elapsed.lock().unwrap() = Some(3.0);
        sync.tick().unwrap(); // jump to frame 90
        assert_eq!(sync.current_frame(), 90);

        let decoded_before = *decodes.lock().unwrap();
        // Audio rewound its clock (fresh epoch): video is now 60 frames ahead.
        *elapsed.lock().unwrap() = Some(1.0);
        match sync.tick().unwrap() {
            Tick::Wait(delay) => {
                assert!(delay > MIN_RESYNC_WAIT);
                assert!(delay <= MAX_RESYNC_WAIT);
            }
            other => panic!("expected wait, got {other:?}"),
        }
        assert_eq!(*decodes.lock().unwrap(), decoded_before, "no frame may be decoded");
        assert_eq!(sync.current_frame(), 90);
    }

    #[test]
    fn test_in_sync_tick_decodes_the_next_frame() {
        let (mut sync, elapsed, _, _, _, _) = build(1000, 100, true);
        sync.play();
        *elapsed.lock().unwrap() = Some(1.0);
        sync.tick().unwrap(); // at frame 30
        // Lead of a fraction of one frame: below the 10ms wait floor.
        *elapsed.lock().unwrap() = Some(30.2 / 30.0);
        match sync.tick().unwrap() {
            Tick::Frame { frame, .. } => assert_eq!(frame.index(), 31),
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn test_play_starts_audio_from_current_frame_time() {
        let (mut sync, _, offsets, _, _, _) = build(1000, 100, true);
        sync.seek_to_frame(300).unwrap();
        sync.play();
        let offsets = offsets.lock().unwrap();
        assert_eq!(offsets.len(), 1);
        assert!((offsets[0] - 10.0).abs() < 1e-9, "got {}", offsets[0]);
    }

    #[test]
    fn test_pause_then_resume_reissues_play_from_current_time() {
        let (mut sync, elapsed, offsets, _, _, _) = build(1000, 100, true);
        sync.play();
        *elapsed.lock().unwrap() = Some(2.0); // 60 frames
        sync.tick().unwrap();
        assert_eq!(sync.current_frame(), 60);

        sync.pause();
        assert_eq!(sync.state(), PlaybackState::Paused);

        sync.play();
        assert_eq!(sync.state(), PlaybackState::Playing);
        let offsets = offsets.lock().unwrap();
        // First play at 0.0, resume at frame 60's time — not the old epoch.
        assert_eq!(offsets.len(), 2);
        assert!((offsets[1] - 2.0).abs() < 1e-9, "got {}", offsets[1]);
    }

    #[test]
    fn test_seek_while_playing_restarts_audio_at_reached_frame() {
        let (mut sync, _, offsets, _, _, _) = build(1000, 100, true);
        sync.play();
        let frame = sync.seek_to_frame(450).unwrap().unwrap();
        assert_eq!(frame.index(), 450);
        let offsets = offsets.lock().unwrap();
        assert!((offsets.last().unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_seek_while_paused_does_not_start_audio() {
        let (mut sync, _, offsets, _, _, _) = build(1000, 100, true);
        sync.seek_to_frame(450).unwrap();
        assert!(offsets.lock().unwrap().is_empty());
        assert_eq!(sync.current_frame(), 450);
    }

    #[test]
    fn test_seek_clamps_to_last_frame() {
        let (mut sync, _, _, _, _, _) = build(100, 10, false);
        let frame = sync.seek_to_frame(5000).unwrap().unwrap();
        assert_eq!(frame.index(), 99);
    }

    #[test]
    fn test_end_of_stream_stops_playback_and_audio() {
        let (mut sync, _, _, _, _, stopped) = build(2, 1, false);
        sync.play();
        assert!(matches!(sync.tick().unwrap(), Tick::Frame { .. }));
        assert!(matches!(sync.tick().unwrap(), Tick::Frame { .. }));
        assert!(matches!(sync.tick().unwrap(), Tick::Finished));
        assert_eq!(sync.state(), PlaybackState::Stopped);
        assert!(*stopped.lock().unwrap());
    }

    #[test]
    fn test_tick_while_not_playing_is_a_noop_wait() {
        let (mut sync, _, _, _, decodes, _) = build(100, 10, false);
        assert!(matches!(sync.tick().unwrap(), Tick::Wait(_)));
        assert_eq!(*decodes.lock().unwrap(), 0);
    }

    #[test]
    fn test_stop_rewinds_to_first_frame() {
        let (mut sync, _, _, _, _, stopped) = build(1000, 100, true);
        sync.play();
        sync.seek_to_frame(500).unwrap();
        sync.stop().unwrap();
        assert_eq!(sync.state(), PlaybackState::Stopped);
        assert_eq!(sync.current_frame(), 0);
        assert!(*stopped.lock().unwrap());
    }

    #[test]
    fn test_attach_audio_while_playing_starts_it() {
        let (mut sync, _, offsets, _, _, _) = build(1000, 100, false);
        sync.play();
        assert!(offsets.lock().unwrap().is_empty());
        sync.attach_audio(Path::new("/tmp/track.wav"));
        assert_eq!(offsets.lock().unwrap().len(), 1);
    }
}
