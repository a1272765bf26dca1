use std::collections::HashMap;

use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Alignment, Color, Element, Length};

use vidscribe_core::audio::domain::transcript::AnnotatedSegment;
use vidscribe_core::shared::time_format::format_timestamp;

use crate::app::Message;

/// Entries rendered per batch; more load in as the user scrolls down.
pub const BATCH_SIZE: usize = 50;

/// Scroll position (0..1) past which the next batch loads.
pub const LOAD_MORE_THRESHOLD: f32 = 0.9;

const TIMESTAMP_COLOR: Color = Color::from_rgb(0.31, 0.76, 0.97);

pub fn scroll_id() -> scrollable::Id {
    scrollable::Id::new("transcript")
}

/// Per-speaker text colors, cycled by the trailing number of the raw label.
fn speaker_color(raw_speaker: &str) -> Color {
    let index: usize = raw_speaker
        .rsplit(['_', ' '])
        .next()
        .and_then(|suffix| suffix.parse().ok())
        .unwrap_or(0);
    match index % 6 {
        0 => Color::from_rgb8(0xd3, 0x2f, 0x2f),
        1 => Color::from_rgb8(0x19, 0x76, 0xd2),
        2 => Color::from_rgb8(0x38, 0x8e, 0x3c),
        3 => Color::from_rgb8(0xfb, 0xc0, 0x2d),
        4 => Color::from_rgb8(0x8e, 0x24, 0xaa),
        _ => Color::from_rgb8(0xf5, 0x7c, 0x00),
    }
}

/// The transcript panel: batched entries with clickable timestamps,
/// colored speaker names, and an optional follow-mode highlight.
pub fn view<'a>(
    segments: &'a [AnnotatedSegment],
    speaker_names: &HashMap<String, String>,
    render_limit: usize,
    highlighted: Option<usize>,
    notice: Option<&'a str>,
) -> Element<'a, Message> {
    if let Some(notice) = notice {
        return container(text(notice).size(14))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
    }

    let entries: Vec<Element<'a, Message>> = segments
        .iter()
        .take(render_limit)
        .enumerate()
        .map(|(index, segment)| entry_view(index, segment, speaker_names, highlighted))
        .collect();

    scrollable(column(entries).spacing(4).padding(8))
        .id(scroll_id())
        .on_scroll(|viewport| Message::TranscriptScrolled(viewport.relative_offset().y))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn entry_view<'a>(
    index: usize,
    segment: &'a AnnotatedSegment,
    speaker_names: &HashMap<String, String>,
    highlighted: Option<usize>,
) -> Element<'a, Message> {
    let display_name = speaker_names
        .get(&segment.speaker)
        .unwrap_or(&segment.speaker)
        .clone();

    let timestamp = button(
        text(format!("[{}]", format_timestamp(segment.start)))
            .size(13)
            .color(TIMESTAMP_COLOR),
    )
    .style(button::text)
    .padding(0)
    .on_press(Message::TimestampClicked(index));

    let speaker = text(format!("{display_name}:"))
        .size(13)
        .color(speaker_color(&segment.speaker));

    let body = text(&segment.text).size(13);

    let block = column![
        row![timestamp, speaker].spacing(6).align_y(Alignment::Center),
        body,
    ]
    .spacing(2);

    let is_highlighted = highlighted == Some(index);
    container(block)
        .width(Length::Fill)
        .padding([4, 8])
        .style(move |theme: &iced::Theme| {
            if is_highlighted {
                let palette = theme.extended_palette();
                container::Style {
                    background: Some(iced::Background::Color(Color {
                        a: 0.35,
                        ..palette.primary.weak.color
                    })),
                    ..container::Style::default()
                }
            } else {
                container::Style::default()
            }
        })
        .into()
}

/// Index of the entry covering `time`, for follow-mode highlighting.
/// Open-ended segments fall back to a ten-second window, matching how the
/// transcript reads when an engine omits an end timestamp.
pub fn entry_at_time(segments: &[AnnotatedSegment], time: f64) -> Option<usize> {
    segments.iter().position(|segment| {
        let end = if segment.end > segment.start {
            segment.end
        } else {
            segment.start + 10.0
        };
        segment.start <= time && time < end
    })
}
