use std::path::PathBuf;

/// Static properties of an opened recording.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: u64,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Total duration in seconds, or 0 when the frame rate is unknown.
    pub fn duration(&self) -> f64 {
        if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Time of a frame index in seconds.
    pub fn frame_time(&self, frame: u64) -> f64 {
        if self.fps > 0.0 {
            frame as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Frame index at a time in seconds, clamped to the valid range.
    pub fn frame_at_time(&self, seconds: f64) -> u64 {
        let frame = (seconds.max(0.0) * self.fps) as u64;
        if self.total_frames > 0 {
            frame.min(self.total_frames - 1)
        } else {
            frame
        }
    }
}
