use std::path::PathBuf;
use std::thread;

use crossbeam_channel::Receiver;

use vidscribe_core::video::infrastructure::audio_extractor::AudioExtractor;
use vidscribe_core::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;

/// Result of one playback-audio extraction. Every message carries the
/// source path so the UI can discard results from a recording that is no
/// longer loaded.
pub enum ExtractMessage {
    Ready { source: PathBuf, wav: PathBuf },
    NoAudio { source: PathBuf },
    Failed { source: PathBuf, error: String },
}

/// Spawns one background extraction for a freshly loaded recording.
pub fn spawn(video_path: PathBuf) -> Receiver<ExtractMessage> {
    let (tx, rx) = crossbeam_channel::bounded::<ExtractMessage>(4);

    thread::spawn(move || {
        let extractor = AudioExtractor::new(Box::new(FfmpegAudioReader));
        let message = match extractor.extract_playback_track(&video_path) {
            Ok(Some(wav)) => ExtractMessage::Ready {
                source: video_path,
                wav,
            },
            Ok(None) => ExtractMessage::NoAudio { source: video_path },
            Err(e) => ExtractMessage::Failed {
                source: video_path,
                error: e.to_string(),
            },
        };
        let _ = tx.send(message);
    });

    rx
}
