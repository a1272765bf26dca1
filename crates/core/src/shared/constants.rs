pub const WHISPER_MODEL_NAME: &str = "ggml-base.bin";
pub const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin";

pub const SEGMENTATION_MODEL_NAME: &str = "segmentation-3.0.onnx";
pub const SEGMENTATION_MODEL_URL: &str =
    "https://github.com/thewh1teagle/pyannote-rs/releases/download/v0.1.0/segmentation-3.0.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "wespeaker_en_voxceleb_CAM++.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/thewh1teagle/pyannote-rs/releases/download/v0.1.0/wespeaker_en_voxceleb_CAM++.onnx";

/// Sample rate the recognition and diarization models expect.
pub const RECOGNITION_SAMPLE_RATE: u32 = 16000;

/// Playback track format: stereo 44.1 kHz PCM.
pub const PLAYBACK_SAMPLE_RATE: u32 = 44100;
pub const PLAYBACK_CHANNELS: u16 = 2;

/// Speaker label assigned when no diarization turn overlaps a segment.
pub const UNKNOWN_SPEAKER: &str = "Unknown";

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov"];
