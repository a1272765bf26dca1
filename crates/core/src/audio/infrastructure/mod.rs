pub mod pyannote_diarizer;
pub mod whisper_recognizer;
