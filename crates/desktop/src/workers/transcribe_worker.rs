use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use vidscribe_core::audio::domain::diarizer::Diarizer;
use vidscribe_core::audio::domain::speech_recognizer::SpeechRecognizer;
use vidscribe_core::audio::domain::transcript::AnnotatedSegment;
use vidscribe_core::audio::infrastructure::pyannote_diarizer::PyannoteDiarizer;
use vidscribe_core::audio::infrastructure::whisper_recognizer::WhisperRecognizer;
use vidscribe_core::pipeline::transcribe_use_case::TranscribeVideoUseCase;
use vidscribe_core::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;

use super::model_cache::ModelCache;

/// Messages sent from the transcription worker to the UI. The UI only ever
/// talks to the worker through this channel.
pub enum WorkerMessage {
    DownloadProgress(u64, u64),
    Progress(u8),
    Finished(TranscriptionOutcome),
    Error(String),
}

/// The model-backed engines, handed to the UI thread on completion.
///
/// App state must retain these for the rest of the session: deallocating
/// model resources while any scheduled callback may still reference them is
/// a crash, not a recoverable error.
pub struct TranscriptionEngines {
    pub recognizer: Box<dyn SpeechRecognizer>,
    pub diarizer: Option<Box<dyn Diarizer>>,
}

pub struct TranscriptionOutcome {
    pub segments: Vec<AnnotatedSegment>,
    pub engines: TranscriptionEngines,
}

pub struct TranscribeParams {
    pub video_path: PathBuf,
    pub expected_speakers: Option<usize>,
    pub model_cache: Arc<ModelCache>,
}

/// Spawns the background transcription worker.
///
/// There is no mid-run cancellation; the only supported interruption is
/// process exit. Any failure funnels into a single `Error` message.
pub fn spawn(params: TranscribeParams) -> Receiver<WorkerMessage> {
    let (tx, rx) = crossbeam_channel::bounded::<WorkerMessage>(64);

    thread::spawn(move || {
        if let Err(e) = run(&tx, &params) {
            let _ = tx.send(WorkerMessage::Error(e.to_string()));
        }
    });

    rx
}

fn run(
    tx: &Sender<WorkerMessage>,
    params: &TranscribeParams,
) -> Result<(), Box<dyn std::error::Error>> {
    let tx_dl = tx.clone();
    let whisper_model = params.model_cache.wait_for_whisper(&move |dl, total| {
        let _ = tx_dl.send(WorkerMessage::DownloadProgress(dl, total));
    })?;

    let recognizer: Box<dyn SpeechRecognizer> = Box::new(WhisperRecognizer::new(&whisper_model)?);
    let diarizer = build_diarizer(params, tx);

    let use_case = TranscribeVideoUseCase::new(Box::new(FfmpegAudioReader), recognizer, diarizer);

    let progress = |pct: u8| {
        let _ = tx.send(WorkerMessage::Progress(pct));
    };
    let segments = use_case.run(
        &params.video_path,
        params.expected_speakers,
        Some(&progress),
    )?;

    let (recognizer, diarizer) = use_case.into_engines();
    let _ = tx.send(WorkerMessage::Finished(TranscriptionOutcome {
        segments,
        engines: TranscriptionEngines {
            recognizer,
            diarizer,
        },
    }));
    Ok(())
}

/// The diarizer is best-effort: missing models or a failed load mean the
/// transcript comes back without speaker labels, never a failed run.
fn build_diarizer(
    params: &TranscribeParams,
    tx: &Sender<WorkerMessage>,
) -> Option<Box<dyn Diarizer>> {
    let tx_dl = tx.clone();
    let on_progress = move |dl: u64, total: u64| {
        let _ = tx_dl.send(WorkerMessage::DownloadProgress(dl, total));
    };

    let segmentation = params.model_cache.wait_for_segmentation(&on_progress);
    let embedding = params.model_cache.wait_for_embedding(&on_progress);

    match (segmentation, embedding) {
        (Ok(segmentation), Ok(embedding)) => {
            match PyannoteDiarizer::new(&segmentation, &embedding) {
                Ok(diarizer) => Some(Box::new(diarizer)),
                Err(e) => {
                    log::warn!("diarizer unavailable, transcribing without speakers: {e}");
                    None
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("diarization models unavailable, transcribing without speakers: {e}");
            None
        }
    }
}
