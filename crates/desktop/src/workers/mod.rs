pub mod extract_worker;
pub mod model_cache;
pub mod transcribe_worker;
