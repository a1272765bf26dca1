use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Frame-indexed access to a video stream.
///
/// Implementations handle demuxing and decoding; playback works purely in
/// absolute frame indices. Seeking is best-effort: decoders typically land
/// on the nearest prior keyframe, so [`FrameSource::seek`] reports where it
/// actually ended up and callers close the remaining gap with
/// [`FrameSource::grab`].
pub trait FrameSource: Send {
    /// Opens a video file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Decodes and returns the frame at the current position, advancing by
    /// one. `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Advances one frame without materializing pixels (decode-discard).
    /// Returns `false` at end of stream.
    fn grab(&mut self) -> Result<bool, Box<dyn std::error::Error>>;

    /// Seeks toward `target`. The decoder may land on an earlier keyframe;
    /// the returned index (≤ `target`) is where the stream actually is.
    fn seek(&mut self, target: u64) -> Result<u64, Box<dyn std::error::Error>>;

    /// Index of the frame the next [`FrameSource::next_frame`] call returns.
    fn position(&self) -> u64;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
