pub mod audio_segment;
pub mod diarizer;
pub mod speaker_aligner;
pub mod speech_recognizer;
pub mod transcript;
