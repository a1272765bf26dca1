//! Core library for VidScribe: speech transcription, speaker diarization,
//! speaker-segment alignment, audio-synchronized video playback, and
//! transcript export.
//!
//! Domain traits live in each area's `domain` module; the ffmpeg, whisper,
//! pyannote, and rodio glue lives in `infrastructure`.

pub mod audio;
pub mod export;
pub mod pipeline;
pub mod playback;
pub mod shared;
pub mod video;
