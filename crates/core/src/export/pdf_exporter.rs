use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{
    BuiltinFont, Color, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Rgb,
};

use crate::audio::domain::transcript::AnnotatedSegment;
use crate::shared::time_format::format_timestamp;

// US Letter, 1-inch margins.
const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 25.4;

const PT_TO_MM: f32 = 0.352_778;
/// Vertical advance between wrapped text lines: 14 pt.
const LINE_PITCH: f32 = 14.0 * PT_TO_MM;
/// Extra gap between transcript entries: 20 pt.
const ENTRY_GAP: f32 = 20.0 * PT_TO_MM;

/// Character-count word-wrap width. Deliberately a heuristic rather than
/// font-metric measurement; Helvetica 10 pt keeps 80 columns inside the
/// text column on Letter paper.
const WRAP_COLUMNS: usize = 80;

/// Writes the transcript as a PDF: a title page header, then one block per
/// entry rendered as `[timestamp] Speaker: text`, word-wrapped and broken
/// across pages whenever the cursor crosses the bottom margin — including
/// mid-block for long entries.
pub fn export_to_pdf(
    output_path: &Path,
    segments: &[AnnotatedSegment],
    speaker_names: &HashMap<String, String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (doc, page, layer) =
        PdfDocument::new("Video Transcript", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");

    let body_font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold_font = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let oblique_font = doc.add_builtin_font(BuiltinFont::HelveticaOblique)?;

    let mut layer = doc.get_page(page).get_layer(layer);

    // Title + rule
    layer.set_fill_color(black());
    layer.use_text(
        "Video Transcript",
        16.0,
        Mm(MARGIN),
        Mm(PAGE_HEIGHT - 0.7 * MARGIN),
        &bold_font,
    );
    layer.set_outline_thickness(0.5);
    layer.add_line(Line {
        points: vec![
            (
                Point::new(Mm(MARGIN), Mm(PAGE_HEIGHT - 0.75 * MARGIN)),
                false,
            ),
            (
                Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(PAGE_HEIGHT - 0.75 * MARGIN)),
                false,
            ),
        ],
        is_closed: false,
    });

    let mut y = PAGE_HEIGHT - 1.2 * MARGIN;

    for entry in segments {
        if y < MARGIN {
            layer = new_page(&doc);
            y = PAGE_HEIGHT - MARGIN;
        }

        let timestamp = format!("[{}]", format_timestamp(entry.start));
        let display_name = speaker_names
            .get(&entry.speaker)
            .unwrap_or(&entry.speaker);

        layer.set_fill_color(gray());
        layer.use_text(timestamp, 8.0, Mm(MARGIN), Mm(y), &oblique_font);

        layer.set_fill_color(black());
        layer.use_text(
            format!("{display_name}:"),
            10.0,
            Mm(MARGIN + 0.6 * MARGIN),
            Mm(y),
            &bold_font,
        );

        let text_x = MARGIN + 1.5 * MARGIN;
        let mut line_y = y;
        for line in wrap_text(&entry.text, WRAP_COLUMNS) {
            if line_y < MARGIN {
                layer = new_page(&doc);
                line_y = PAGE_HEIGHT - MARGIN;
            }
            layer.set_fill_color(black());
            layer.use_text(line, 10.0, Mm(text_x), Mm(line_y), &body_font);
            line_y -= LINE_PITCH;
        }

        y = line_y - ENTRY_GAP;
    }

    doc.save(&mut BufWriter::new(File::create(output_path)?))?;
    log::info!(
        "exported {} transcript entries to {}",
        segments.len(),
        output_path.display()
    );
    Ok(())
}

fn new_page(doc: &PdfDocumentReference) -> PdfLayerReference {
    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    doc.get_page(page).get_layer(layer)
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn gray() -> Color {
    Color::Rgb(Rgb::new(0.5, 0.5, 0.5, None))
}

/// Greedy word-wrap by character count. A single word longer than the
/// column width stays on its own line rather than being split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 >= max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: f64, speaker: &str, text: &str) -> AnnotatedSegment {
        AnnotatedSegment {
            start,
            end: start + 2.0,
            text: text.to_string(),
            speaker: speaker.to_string(),
        }
    }

    #[test]
    fn test_wrap_short_text_is_one_line() {
        assert_eq!(wrap_text("hello world", 80), vec!["hello world"]);
    }

    #[test]
    fn test_wrap_empty_text_has_no_lines() {
        assert!(wrap_text("", 80).is_empty());
        assert!(wrap_text("   ", 80).is_empty());
    }

    #[test]
    fn test_wrap_respects_column_budget() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let lines = wrap_text(text, 20);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.len() < 20 + 10, "line too long: {line:?}");
        }
        // No words lost in the wrap
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_wrap_keeps_overlong_word_whole() {
        let word = "a".repeat(100);
        let lines = wrap_text(&word, 80);
        assert_eq!(lines, vec![word]);
    }

    #[test]
    fn test_export_writes_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.pdf");

        let segments = vec![
            entry(0.0, "SPEAKER_00", "Good morning everyone."),
            entry(3.5, "SPEAKER_01", "Morning! Shall we get started?"),
        ];
        let mut names = HashMap::new();
        names.insert("SPEAKER_00".to_string(), "Alice".to_string());

        export_to_pdf(&path, &segments, &names).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_export_many_entries_spans_pages_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.pdf");

        let long_text = "word ".repeat(120);
        let segments: Vec<_> = (0..60)
            .map(|i| entry(i as f64 * 5.0, "SPEAKER_00", long_text.trim()))
            .collect();

        export_to_pdf(&path, &segments, &HashMap::new()).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_export_empty_transcript_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        export_to_pdf(&path, &[], &HashMap::new()).unwrap();
        assert!(path.exists());
    }
}
