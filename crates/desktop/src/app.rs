use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use iced::widget::scrollable::RelativeOffset;
use iced::widget::{
    button, center, column, container, mouse_area, opaque, pick_list, progress_bar, row,
    scrollable, stack, text, text_input, Space,
};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};

use vidscribe_core::audio::domain::transcript::AnnotatedSegment;
use vidscribe_core::export::pdf_exporter;
use vidscribe_core::shared::constants::VIDEO_EXTENSIONS;

use crate::player::Player;
use crate::settings::{Appearance, Settings};
use crate::transcript;
use crate::workers::extract_worker::{self, ExtractMessage};
use crate::workers::model_cache::ModelCache;
use crate::workers::transcribe_worker::{
    self, TranscribeParams, TranscriptionEngines, WorkerMessage,
};

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    SelectVideo,
    VideoSelected(Option<PathBuf>),
    StartTranscription,
    SpeakerCountChanged(String),
    PollWorkers,
    PlaybackTick,
    TogglePlayback,
    SeekSliderMoved(f64),
    VolumeChanged(u32),
    TimestampClicked(usize),
    ToggleFollowMode,
    TranscriptScrolled(f32),
    OpenRenameDialog,
    RenameSpeakerPicked(String),
    RenameNameChanged(String),
    ConfirmRename,
    CancelRename,
    ExportPdf,
    ExportTargetSelected(Option<PathBuf>),
    DismissLoadError,
    CloseRequested,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct RenameDialog {
    options: Vec<String>,
    raw_by_display: HashMap<String, String>,
    selected: Option<String>,
    new_name: String,
}

pub struct App {
    settings: Settings,
    model_cache: Arc<ModelCache>,

    video_path: Option<PathBuf>,
    player: Option<Player>,

    transcript: Vec<AnnotatedSegment>,
    speaker_names: HashMap<String, String>,
    speaker_count_input: String,

    status: String,
    transcribing: bool,
    progress: u8,
    worker_rx: Option<Receiver<WorkerMessage>>,
    extract_rx: Option<Receiver<ExtractMessage>>,
    // Model-backed engines from the last run. Held for the rest of the
    // session: callbacks may still reference model state, and dropping it
    // out from under them is a crash, not an error.
    _engines: Option<TranscriptionEngines>,

    render_limit: usize,
    follow_mode: bool,
    followed_entry: Option<usize>,
    suppress_scroll_disable: bool,
    transcript_notice: Option<String>,

    rename_dialog: Option<RenameDialog>,
    load_error: Option<String>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        (
            Self {
                settings: Settings::load(),
                model_cache: ModelCache::new(),
                video_path: None,
                player: None,
                transcript: Vec::new(),
                speaker_names: HashMap::new(),
                speaker_count_input: String::new(),
                status: "Ready".to_string(),
                transcribing: false,
                progress: 0,
                worker_rx: None,
                extract_rx: None,
                _engines: None,
                render_limit: transcript::BATCH_SIZE,
                follow_mode: false,
                followed_entry: None,
                suppress_scroll_disable: false,
                transcript_notice: None,
                rename_dialog: None,
                load_error: None,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectVideo => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Open video")
                            .add_filter("Video Files", VIDEO_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|handle| handle.path().to_path_buf())
                    },
                    Message::VideoSelected,
                );
            }
            Message::VideoSelected(Some(path)) => match Player::load(&path, self.settings.volume)
            {
                Ok(player) => {
                    self.player = Some(player);
                    self.video_path = Some(path.clone());
                    self.extract_rx = Some(extract_worker::spawn(path.clone()));
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    self.status = format!("Loaded: {name}");
                }
                Err(e) => {
                    // Previous session state stays untouched on a failed load.
                    log::error!("could not load {}: {e}", path.display());
                    self.load_error = Some(format!("Could not load video: {e}"));
                }
            },
            Message::VideoSelected(None) => {}
            Message::StartTranscription => {
                if let Some(path) = &self.video_path {
                    if !self.transcribing {
                        self.transcribing = true;
                        self.progress = 0;
                        self.status = "Processing\u{2026} this may take a minute".to_string();
                        self.transcript_notice =
                            Some("Transcribing\u{2026} please wait.".to_string());
                        self.worker_rx = Some(transcribe_worker::spawn(TranscribeParams {
                            video_path: path.clone(),
                            expected_speakers: self.speaker_count_input.trim().parse().ok(),
                            model_cache: self.model_cache.clone(),
                        }));
                    }
                }
            }
            Message::SpeakerCountChanged(value) => {
                self.speaker_count_input = value;
            }
            Message::PollWorkers => {
                self.poll_extraction();
                return self.poll_transcription();
            }
            Message::PlaybackTick => {
                return self.on_playback_tick();
            }
            Message::TogglePlayback => {
                if let Some(player) = &mut self.player {
                    player.toggle_playback();
                }
            }
            Message::SeekSliderMoved(value) => {
                if let Some(player) = &mut self.player {
                    player.seek_to_frame(value.max(0.0) as u64);
                }
            }
            Message::VolumeChanged(volume) => {
                self.settings.volume = volume;
                self.settings.save();
                if let Some(player) = &mut self.player {
                    player.set_volume(volume);
                }
            }
            Message::TimestampClicked(index) => {
                if let (Some(player), Some(segment)) =
                    (&mut self.player, self.transcript.get(index))
                {
                    player.seek_to_time(segment.start);
                }
            }
            Message::ToggleFollowMode => {
                self.follow_mode = !self.follow_mode;
                if !self.follow_mode {
                    self.followed_entry = None;
                }
            }
            Message::TranscriptScrolled(offset) => {
                if self.suppress_scroll_disable {
                    self.suppress_scroll_disable = false;
                } else if self.follow_mode {
                    // Manual scrolling takes back control.
                    self.follow_mode = false;
                    self.followed_entry = None;
                }
                if offset > transcript::LOAD_MORE_THRESHOLD
                    && self.render_limit < self.transcript.len()
                {
                    self.render_limit += transcript::BATCH_SIZE;
                }
            }
            Message::OpenRenameDialog => {
                if !self.transcript.is_empty() {
                    self.rename_dialog = Some(self.build_rename_dialog());
                }
            }
            Message::RenameSpeakerPicked(display) => {
                if let Some(dialog) = &mut self.rename_dialog {
                    dialog.selected = Some(display);
                }
            }
            Message::RenameNameChanged(value) => {
                if let Some(dialog) = &mut self.rename_dialog {
                    dialog.new_name = value;
                }
            }
            Message::ConfirmRename => {
                if let Some(dialog) = &self.rename_dialog {
                    let new_name = dialog.new_name.trim();
                    if let (Some(selected), false) = (&dialog.selected, new_name.is_empty()) {
                        if let Some(raw) = dialog.raw_by_display.get(selected) {
                            log::info!("renaming speaker {raw:?} to {new_name:?}");
                            self.speaker_names
                                .insert(raw.clone(), new_name.to_string());
                        }
                    }
                }
                self.rename_dialog = None;
            }
            Message::CancelRename => {
                self.rename_dialog = None;
            }
            Message::ExportPdf => {
                if self.transcript.is_empty() {
                    self.status = "No transcript data to export.".to_string();
                } else {
                    return Task::perform(
                        async {
                            rfd::AsyncFileDialog::new()
                                .set_title("Save PDF")
                                .add_filter("PDF Files", &["pdf"])
                                .set_file_name("transcript.pdf")
                                .save_file()
                                .await
                                .map(|handle| handle.path().to_path_buf())
                        },
                        Message::ExportTargetSelected,
                    );
                }
            }
            Message::ExportTargetSelected(Some(path)) => {
                match pdf_exporter::export_to_pdf(&path, &self.transcript, &self.speaker_names) {
                    Ok(()) => {
                        self.status = format!("Saved to {}", path.display());
                        let _ = open::that(&path);
                    }
                    Err(e) => {
                        log::error!("PDF export failed: {e}");
                        self.status = format!("Could not save PDF: {e}");
                    }
                }
            }
            Message::ExportTargetSelected(None) => {}
            Message::DismissLoadError => {
                self.load_error = None;
            }
            Message::CloseRequested => {
                self.settings.save();
                // Immediate termination: joining a stuck model thread can
                // hang the close forever.
                std::process::exit(0);
            }
        }
        Task::none()
    }

    fn poll_extraction(&mut self) {
        // Clone the handle so draining can borrow `self` mutably.
        let Some(rx) = self.extract_rx.clone() else {
            return;
        };

        let mut done = false;
        loop {
            match rx.try_recv() {
                Ok(message) => {
                    done = true;
                    self.apply_extract_message(message);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    done = true;
                    break;
                }
            }
        }
        if done {
            self.extract_rx = None;
        }
    }

    fn apply_extract_message(&mut self, message: ExtractMessage) {
        // Results for a recording that is no longer loaded are discarded:
        // stale audio must never reach the active player.
        let is_current = |source: &PathBuf| Some(source) == self.video_path.as_ref();
        match message {
            ExtractMessage::Ready { source, wav } => {
                if is_current(&source) {
                    if let Some(player) = &mut self.player {
                        player.attach_audio(&wav);
                    }
                } else {
                    log::info!("recording changed during extraction; discarding audio");
                }
            }
            ExtractMessage::NoAudio { source } => {
                if is_current(&source) {
                    if let Some(player) = &mut self.player {
                        player.mark_audio_unavailable();
                    }
                }
            }
            ExtractMessage::Failed { source, error } => {
                log::warn!("audio extraction failed: {error}");
                if is_current(&source) {
                    if let Some(player) = &mut self.player {
                        player.mark_audio_unavailable();
                    }
                }
            }
        }
    }

    fn poll_transcription(&mut self) -> Task<Message> {
        let Some(rx) = self.worker_rx.clone() else {
            return Task::none();
        };

        let mut finished = None;
        let mut error = None;
        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok(WorkerMessage::DownloadProgress(downloaded, total)) => {
                    if total > 0 {
                        self.status =
                            format!("Downloading models\u{2026} {}%", downloaded * 100 / total);
                    }
                }
                Ok(WorkerMessage::Progress(pct)) => self.progress = pct,
                Ok(WorkerMessage::Finished(outcome)) => {
                    finished = Some(outcome);
                    break;
                }
                Ok(WorkerMessage::Error(message)) => {
                    error = Some(message);
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if let Some(outcome) = finished {
            self.transcript = outcome.segments;
            self._engines = Some(outcome.engines);
            self.transcribing = false;
            self.worker_rx = None;
            self.progress = 100;
            self.status = "Done".to_string();
            self.render_limit = transcript::BATCH_SIZE;
            self.followed_entry = None;
            self.transcript_notice = if self.transcript.is_empty() {
                Some("No transcript data available.".to_string())
            } else {
                None
            };
            return scrollable::snap_to(transcript::scroll_id(), RelativeOffset::START);
        }
        if let Some(message) = error {
            self.transcribing = false;
            self.worker_rx = None;
            self.status = format!("Error: {message}");
            self.transcript_notice = Some(format!("\u{274C} Error: {message}"));
        } else if disconnected {
            self.transcribing = false;
            self.worker_rx = None;
            self.status = "Error: transcription worker stopped unexpectedly".to_string();
        }
        Task::none()
    }

    fn on_playback_tick(&mut self) -> Task<Message> {
        let Some(player) = &mut self.player else {
            return Task::none();
        };
        player.maybe_tick(Instant::now());

        if self.follow_mode && !self.transcript.is_empty() {
            let time = player.current_time();
            if let Some(index) = transcript::entry_at_time(&self.transcript, time) {
                if self.followed_entry != Some(index) {
                    self.followed_entry = Some(index);
                    if index >= self.render_limit {
                        self.render_limit = index + transcript::BATCH_SIZE;
                    }
                    let rendered = self.transcript.len().min(self.render_limit);
                    let fraction = if rendered > 1 {
                        index as f32 / (rendered - 1) as f32
                    } else {
                        0.0
                    };
                    self.suppress_scroll_disable = true;
                    return scrollable::snap_to(
                        transcript::scroll_id(),
                        RelativeOffset {
                            x: 0.0,
                            y: fraction.clamp(0.0, 1.0),
                        },
                    );
                }
            }
        }
        Task::none()
    }

    /// Builds the rename options: current display names, with the raw id
    /// appended whenever two speakers were renamed to the same thing.
    fn build_rename_dialog(&self) -> RenameDialog {
        let mut raw_speakers: Vec<String> = self
            .transcript
            .iter()
            .map(|segment| segment.speaker.clone())
            .collect();
        raw_speakers.sort();
        raw_speakers.dedup();

        let mut raw_by_display = HashMap::new();
        for raw in raw_speakers {
            let display = self.speaker_names.get(&raw).unwrap_or(&raw).clone();
            if raw_by_display.contains_key(&display) {
                raw_by_display.insert(format!("{display} ({raw})"), raw);
            } else {
                raw_by_display.insert(display, raw);
            }
        }

        let mut options: Vec<String> = raw_by_display.keys().cloned().collect();
        options.sort();
        let selected = options.first().cloned();

        RenameDialog {
            options,
            raw_by_display,
            selected,
            new_name: String::new(),
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let follow_button = {
            let base = button(text("Follow Mode").size(13)).on_press(Message::ToggleFollowMode);
            if self.follow_mode {
                base.style(button::primary)
            } else {
                base.style(button::secondary)
            }
        };

        let toolbar = row![
            button(text("Open Video").size(13)).on_press(Message::SelectVideo),
            button(text("Start Transcription").size(13)).on_press_maybe(
                (self.video_path.is_some() && !self.transcribing)
                    .then_some(Message::StartTranscription)
            ),
            text("Speaker count:").size(13),
            text_input("Auto", &self.speaker_count_input)
                .on_input(Message::SpeakerCountChanged)
                .width(60),
            button(text("Rename Speaker").size(13)).on_press_maybe(
                (!self.transcript.is_empty()).then_some(Message::OpenRenameDialog)
            ),
            button(text("Export PDF").size(13))
                .on_press_maybe((!self.transcript.is_empty()).then_some(Message::ExportPdf)),
            follow_button,
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let player_view: Element<'_, Message> = match &self.player {
            Some(player) => player.view(self.settings.volume),
            None => container(text("Load a video to begin").size(18))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        let transcript_view = transcript::view(
            &self.transcript,
            &self.speaker_names,
            self.render_limit,
            self.followed_entry,
            self.transcript_notice.as_deref(),
        );

        let content = row![
            container(player_view).width(Length::FillPortion(2)),
            container(transcript_view)
                .width(Length::FillPortion(1))
                .style(container::rounded_box),
        ]
        .spacing(10)
        .height(Length::Fill);

        let mut status_bar = row![text(&self.status).size(12)]
            .spacing(10)
            .align_y(Alignment::Center);
        if self.transcribing {
            status_bar = status_bar.push(Space::new().width(Length::Fill));
            status_bar =
                status_bar.push(progress_bar(0.0..=100.0, self.progress as f32).width(300));
        }

        let base: Element<'_, Message> = column![toolbar, content, status_bar]
            .spacing(8)
            .padding(10)
            .into();

        if let Some(error) = &self.load_error {
            return modal(base, error_card(error), Message::DismissLoadError);
        }
        if let Some(dialog) = &self.rename_dialog {
            return modal(base, rename_card(dialog), Message::CancelRename);
        }
        base
    }

    pub fn theme(&self) -> Theme {
        match self.settings.appearance {
            Appearance::Dark => Theme::Dark,
            Appearance::Light => Theme::Light,
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions =
            vec![iced::window::close_requests().map(|_| Message::CloseRequested)];

        if self.player.as_ref().is_some_and(Player::is_playing) {
            subscriptions
                .push(iced::time::every(Duration::from_millis(10)).map(|_| Message::PlaybackTick));
        }
        if self.transcribing || self.extract_rx.is_some() {
            subscriptions
                .push(iced::time::every(Duration::from_millis(100)).map(|_| Message::PollWorkers));
        }

        Subscription::batch(subscriptions)
    }
}

// ---------------------------------------------------------------------------
// Modal helpers
// ---------------------------------------------------------------------------

fn modal<'a>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_blur: Message,
) -> Element<'a, Message> {
    stack![
        base.into(),
        opaque(mouse_area(center(opaque(content))).on_press(on_blur))
    ]
    .into()
}

fn error_card(message: &str) -> Element<'_, Message> {
    container(
        column![
            text("Video Error").size(16),
            text(message).size(13),
            button(text("OK").size(13)).on_press(Message::DismissLoadError),
        ]
        .spacing(12)
        .align_x(Alignment::Center),
    )
    .width(360)
    .padding(20)
    .style(container::rounded_box)
    .into()
}

fn rename_card(dialog: &RenameDialog) -> Element<'_, Message> {
    container(
        column![
            text("Rename Speaker").size(16),
            text("Select speaker:").size(13),
            pick_list(
                dialog.options.clone(),
                dialog.selected.clone(),
                Message::RenameSpeakerPicked
            )
            .width(Length::Fill),
            text("New name:").size(13),
            text_input("Enter new speaker name\u{2026}", &dialog.new_name)
                .on_input(Message::RenameNameChanged)
                .on_submit(Message::ConfirmRename)
                .width(Length::Fill),
            row![
                button(text("Confirm Rename").size(13)).on_press(Message::ConfirmRename),
                button(text("Cancel").size(13))
                    .style(button::secondary)
                    .on_press(Message::CancelRename),
            ]
            .spacing(10),
        ]
        .spacing(10),
    )
    .width(380)
    .padding(20)
    .style(container::rounded_box)
    .into()
}
