pub mod audio_reader;
pub mod frame_source;
