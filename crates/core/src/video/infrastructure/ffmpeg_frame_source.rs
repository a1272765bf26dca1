use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Frame-indexed video decoding via ffmpeg-next (libavformat + libavcodec).
///
/// Frames are converted to RGB24 only when materialized through
/// [`FrameSource::next_frame`]; [`FrameSource::grab`] decodes and discards
/// without touching the scaler. Seeks go through the container layer with
/// backward flag semantics, so they land on the nearest prior keyframe; the
/// landing index is recovered from the first decoded frame's timestamp.
pub struct FfmpegFrameSource {
    ictx: Option<ffmpeg_next::format::context::Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    stream_index: usize,
    time_base: f64,
    start_time: i64,
    fps: f64,
    width: u32,
    height: u32,
    position: u64,
    pending: Option<ffmpeg_next::util::frame::video::Video>,
    eof_sent: bool,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn new() -> Self {
        Self {
            ictx: None,
            decoder: None,
            scaler: None,
            stream_index: 0,
            time_base: 0.0,
            start_time: 0,
            fps: 0.0,
            width: 0,
            height: 0,
            position: 0,
            pending: None,
            eof_sent: false,
        }
    }

    /// Decodes the next raw (unscaled) frame, feeding packets as needed.
    fn decode_next(
        &mut self,
    ) -> Result<Option<ffmpeg_next::util::frame::video::Video>, Box<dyn std::error::Error>> {
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }

        let ictx = self.ictx.as_mut().ok_or("frame source not opened")?;
        let decoder = self.decoder.as_mut().ok_or("frame source not opened")?;

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        loop {
            if decoder.receive_frame(&mut decoded).is_ok() {
                return Ok(Some(decoded));
            }
            if self.eof_sent {
                return Ok(None);
            }
            match ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() == self.stream_index {
                        // A corrupt packet is skipped, not fatal
                        let _ = decoder.send_packet(&packet);
                    }
                }
                None => {
                    let _ = decoder.send_eof();
                    self.eof_sent = true;
                }
            }
        }
    }

    /// Derives the absolute frame index of a decoded frame from its
    /// timestamp. `None` when the container provides no usable timestamp.
    fn frame_index_of(&self, frame: &ffmpeg_next::util::frame::video::Video) -> Option<u64> {
        let ts = frame.timestamp().or_else(|| frame.pts())?;
        let origin = if self.start_time > 0 { self.start_time } else { 0 };
        if self.fps <= 0.0 {
            return None;
        }
        let seconds = ((ts - origin).max(0)) as f64 * self.time_base;
        Some((seconds * self.fps).round() as u64)
    }
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let tb = stream.time_base();
        let time_base = if tb.denominator() != 0 {
            tb.numerator() as f64 / tb.denominator() as f64
        } else {
            0.0
        };

        // Containers are allowed to omit the frame count; fall back to
        // duration-derived estimates.
        let mut total_frames = stream.frames().max(0) as u64;
        if total_frames == 0 && stream.duration() > 0 {
            total_frames = (stream.duration() as f64 * time_base * fps).round() as u64;
        }
        if total_frames == 0 && ictx.duration() > 0 {
            let seconds = ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE);
            total_frames = (seconds * fps).round() as u64;
        }

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        self.stream_index = stream_index;
        self.time_base = time_base;
        self.start_time = stream.start_time();
        self.fps = fps;
        self.width = width;
        self.height = height;
        self.position = 0;
        self.pending = None;
        self.eof_sent = false;
        self.decoder = Some(decoder);
        self.scaler = Some(scaler);
        self.ictx = Some(ictx);

        Ok(metadata)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let raw = match self.decode_next()? {
            Some(f) => f,
            None => return Ok(None),
        };

        let scaler = self.scaler.as_mut().ok_or("frame source not opened")?;
        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&raw, &mut rgb)?;

        let pixels = extract_rgb_pixels(&rgb, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, self.position);
        self.position += 1;
        Ok(Some(frame))
    }

    fn grab(&mut self) -> Result<bool, Box<dyn std::error::Error>> {
        match self.decode_next()? {
            Some(_) => {
                self.position += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn seek(&mut self, target: u64) -> Result<u64, Box<dyn std::error::Error>> {
        {
            let ictx = self.ictx.as_mut().ok_or("frame source not opened")?;
            let seconds = if self.fps > 0.0 {
                target as f64 / self.fps
            } else {
                0.0
            };
            let ts = (seconds * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64;
            ictx.seek(ts, ..ts)?;
        }
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.flush();
        }
        self.pending = None;
        self.eof_sent = false;

        // Detect where the keyframe snap actually put us: decode one frame,
        // read its timestamp, and keep the frame for the next read.
        match self.decode_next()? {
            Some(frame) => {
                let landed = self.frame_index_of(&frame).unwrap_or(target);
                self.pending = Some(frame);
                self.position = landed;
                Ok(landed)
            }
            None => Ok(self.position),
        }
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn close(&mut self) {
        self.ictx = None;
        self.decoder = None;
        self.scaler = None;
        self.pending = None;
        self.position = 0;
        self.eof_sent = false;
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row
/// (stride > width*3); the padding is stripped.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
