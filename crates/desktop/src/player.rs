use std::path::Path;
use std::time::Instant;

use iced::widget::{button, column, container, row, slider, text};
use iced::{Alignment, Element, Length};

use vidscribe_core::playback::domain::synchronizer::{
    PlaybackState, PlaybackSynchronizer, Tick,
};
use vidscribe_core::playback::infrastructure::rodio_sink::RodioSink;
use vidscribe_core::shared::frame::Frame;
use vidscribe_core::shared::time_format::format_timestamp;
use vidscribe_core::video::domain::frame_source::FrameSource;
use vidscribe_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;

use crate::app::Message;

/// State of the extracted playback soundtrack for the loaded recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioStatus {
    Extracting,
    Ready,
    Unavailable,
}

/// The video player: a core synchronizer plus the iced-side display state.
///
/// Ticks arrive from the app's playback subscription; `next_tick_due` is the
/// single outstanding deadline, so pausing or seeking implicitly cancels
/// whatever tick was scheduled before it.
pub struct Player {
    sync: PlaybackSynchronizer,
    frame_handle: Option<iced::widget::image::Handle>,
    next_tick_due: Instant,
    audio_status: AudioStatus,
}

impl Player {
    /// Opens a recording and displays its first frame.
    pub fn load(path: &Path, volume: u32) -> Result<Self, Box<dyn std::error::Error>> {
        let mut source = FfmpegFrameSource::new();
        let metadata = source.open(path)?;
        log::info!(
            "video loaded: {} ({} frames at {:.2} fps)",
            path.display(),
            metadata.total_frames,
            metadata.fps
        );

        let mut sync =
            PlaybackSynchronizer::new(Box::new(source), Box::new(RodioSink::new()), metadata);
        sync.set_volume(volume as f32 / 100.0);

        let mut player = Self {
            sync,
            frame_handle: None,
            next_tick_due: Instant::now(),
            audio_status: AudioStatus::Extracting,
        };
        if let Some(frame) = player.sync.seek_to_frame(0)? {
            player.show(&frame);
        }
        Ok(player)
    }

    pub fn is_playing(&self) -> bool {
        self.sync.state() == PlaybackState::Playing
    }

    pub fn current_time(&self) -> f64 {
        self.sync.current_time()
    }

    pub fn toggle_playback(&mut self) {
        if self.is_playing() {
            self.sync.pause();
        } else {
            self.sync.play();
            self.next_tick_due = Instant::now();
        }
    }

    pub fn seek_to_frame(&mut self, frame: u64) {
        match self.sync.seek_to_frame(frame) {
            Ok(Some(frame)) => self.show(&frame),
            Ok(None) => {}
            Err(e) => log::error!("seek failed: {e}"),
        }
        self.next_tick_due = Instant::now();
    }

    pub fn seek_to_time(&mut self, seconds: f64) {
        match self.sync.seek_to_time(seconds) {
            Ok(Some(frame)) => self.show(&frame),
            Ok(None) => {}
            Err(e) => log::error!("seek failed: {e}"),
        }
        self.next_tick_due = Instant::now();
    }

    pub fn set_volume(&mut self, volume: u32) {
        self.sync.set_volume(volume as f32 / 100.0);
    }

    pub fn attach_audio(&mut self, wav_path: &Path) {
        self.sync.attach_audio(wav_path);
        self.audio_status = AudioStatus::Ready;
    }

    /// Extraction failed or the recording has no soundtrack: playback
    /// continues on the video clock alone.
    pub fn mark_audio_unavailable(&mut self) {
        self.audio_status = AudioStatus::Unavailable;
    }

    /// Runs one playback tick if its deadline has passed.
    pub fn maybe_tick(&mut self, now: Instant) {
        if !self.is_playing() || now < self.next_tick_due {
            return;
        }
        match self.sync.tick() {
            Ok(Tick::Frame { frame, next }) => {
                self.show(&frame);
                self.next_tick_due = now + next;
            }
            Ok(Tick::Wait(delay)) => {
                self.next_tick_due = now + delay;
            }
            Ok(Tick::Finished) => {}
            Err(e) => {
                log::error!("playback tick failed: {e}");
                self.sync.pause();
            }
        }
    }

    fn show(&mut self, frame: &Frame) {
        self.frame_handle = Some(iced::widget::image::Handle::from_rgba(
            frame.width(),
            frame.height(),
            frame.to_rgba(),
        ));
    }

    pub fn view(&self, volume: u32) -> Element<'_, Message> {
        let display: Element<'_, Message> = match &self.frame_handle {
            Some(handle) => iced::widget::image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => container(text("Load a video to begin").size(18))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        let play_label = if self.is_playing() { "\u{23F8}" } else { "\u{25B6}" };
        let play_button = button(text(play_label).size(14))
            .on_press(Message::TogglePlayback)
            .padding([4, 10]);

        let metadata = self.sync.metadata();
        let time_label = text(format!(
            "{} / {}",
            format_timestamp(self.sync.current_time()),
            format_timestamp(metadata.duration())
        ))
        .size(12);

        let seek_max = metadata.total_frames.saturating_sub(1) as f64;
        let seek = slider(
            0.0..=seek_max.max(1.0),
            self.sync.current_frame() as f64,
            Message::SeekSliderMoved,
        )
        .width(Length::Fill);

        let volume_controls: Element<'_, Message> = match self.audio_status {
            AudioStatus::Unavailable => text("no audio").size(12).into(),
            _ => {
                let volume_icon = match volume {
                    0 => "\u{1F507}",
                    1..=49 => "\u{1F509}",
                    _ => "\u{1F50A}",
                };
                row![
                    text(volume_icon).size(14),
                    slider(0..=100u32, volume, Message::VolumeChanged).width(80),
                ]
                .spacing(6)
                .align_y(Alignment::Center)
                .into()
            }
        };

        let controls = row![play_button, time_label, seek, volume_controls]
            .spacing(10)
            .align_y(Alignment::Center);

        column![display, controls].spacing(8).padding(10).into()
    }
}
