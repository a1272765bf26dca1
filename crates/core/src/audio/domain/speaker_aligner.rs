use crate::audio::domain::transcript::{AnnotatedSegment, SpeakerTurn, SpeechSegment};

/// Assigns exactly one speaker to each speech segment by maximal temporal
/// overlap with the diarization turns.
///
/// For every segment, the overlap with each turn is
/// `max(0, min(ends) - max(starts))`; overlaps are summed per speaker, since
/// one speaker may own several turns inside a single segment. The speaker
/// with the greatest accumulated overlap wins. Ties are broken
/// deterministically: candidates are ordered by overlap descending, then
/// speaker label ascending, and the first is taken — repeated calls with the
/// same inputs always agree.
///
/// Segments with zero or negative duration cannot overlap anything and fall
/// through to [`AnnotatedSegment::unattributed`], as do segments no turn
/// touches. An empty turn list therefore yields an all-unattributed result
/// of the same length and order as the input, which is how the pipeline
/// degrades when diarization is unavailable.
pub fn align(segments: &[SpeechSegment], turns: &[SpeakerTurn]) -> Vec<AnnotatedSegment> {
    segments
        .iter()
        .map(|segment| match best_speaker(segment, turns) {
            Some(speaker) => AnnotatedSegment::new(segment.clone(), speaker),
            None => AnnotatedSegment::unattributed(segment.clone()),
        })
        .collect()
}

fn best_speaker(segment: &SpeechSegment, turns: &[SpeakerTurn]) -> Option<String> {
    if segment.duration() <= 0.0 {
        return None;
    }

    // Accumulate per-speaker overlap; Vec keeps this allocation-light for
    // the handful of speakers a recording realistically has.
    let mut totals: Vec<(&str, f64)> = Vec::new();
    for turn in turns {
        let overlap = overlap_duration(segment, turn);
        if overlap <= 0.0 {
            continue;
        }
        match totals.iter_mut().find(|(s, _)| *s == turn.speaker) {
            Some((_, total)) => *total += overlap,
            None => totals.push((&turn.speaker, overlap)),
        }
    }

    totals.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    totals.first().map(|(speaker, _)| (*speaker).to_string())
}

fn overlap_duration(segment: &SpeechSegment, turn: &SpeakerTurn) -> f64 {
    let start = segment.start.max(turn.start);
    let end = segment.end.min(turn.end);
    (end - start).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::UNKNOWN_SPEAKER;

    fn seg(start: f64, end: f64, text: &str) -> SpeechSegment {
        SpeechSegment {
            start,
            end,
            text: text.to_string(),
        }
    }

    fn turn(start: f64, end: f64, speaker: &str) -> SpeakerTurn {
        SpeakerTurn {
            start,
            end,
            speaker: speaker.to_string(),
        }
    }

    #[test]
    fn test_output_preserves_length_and_order() {
        let segments = vec![seg(0.0, 1.0, "a"), seg(1.0, 2.0, "b"), seg(2.0, 3.0, "c")];
        let turns = vec![turn(0.0, 3.0, "SPEAKER_00")];
        let out = align(&segments, &turns);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].text, "a");
        assert_eq!(out[1].text, "b");
        assert_eq!(out[2].text, "c");
    }

    #[test]
    fn test_dominant_overlap_wins() {
        let segments = vec![seg(0.0, 10.0, "x")];
        let turns = vec![turn(0.0, 7.0, "SPEAKER_00"), turn(7.0, 10.0, "SPEAKER_01")];
        let out = align(&segments, &turns);
        assert_eq!(out[0].speaker, "SPEAKER_00");
    }

    #[test]
    fn test_overlaps_for_one_speaker_are_summed() {
        // A owns 3 + 3 = 6 seconds against B's single 4: summing must win.
        let segments = vec![seg(0.0, 10.0, "x")];
        let turns = vec![
            turn(0.0, 3.0, "A"),
            turn(3.0, 7.0, "B"),
            turn(7.0, 10.0, "A"),
        ];
        let out = align(&segments, &turns);
        assert_eq!(out[0].speaker, "A");
    }

    #[test]
    fn test_tie_breaks_to_smallest_label_consistently() {
        let segments = vec![seg(10.0, 20.0, "x")];
        let turns = vec![turn(15.0, 20.0, "B"), turn(10.0, 15.0, "A")];
        for _ in 0..10 {
            let out = align(&segments, &turns);
            assert_eq!(out[0].speaker, "A");
        }
    }

    #[test]
    fn test_no_overlapping_turn_is_unknown() {
        let segments = vec![seg(0.0, 1.0, "x")];
        let turns = vec![turn(5.0, 6.0, "SPEAKER_00")];
        let out = align(&segments, &turns);
        assert_eq!(out[0].speaker, UNKNOWN_SPEAKER);
    }

    #[test]
    fn test_empty_turns_all_unknown() {
        let segments = vec![seg(0.0, 1.0, "x"), seg(1.0, 2.0, "y")];
        let out = align(&segments, &[]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.speaker == UNKNOWN_SPEAKER));
    }

    #[test]
    fn test_zero_duration_segment_is_unknown_even_inside_a_turn() {
        let segments = vec![seg(5.0, 5.0, "x")];
        let turns = vec![turn(0.0, 10.0, "SPEAKER_00")];
        let out = align(&segments, &turns);
        assert_eq!(out[0].speaker, UNKNOWN_SPEAKER);
    }

    #[test]
    fn test_touching_but_not_overlapping_turn_is_unknown() {
        let segments = vec![seg(0.0, 1.0, "x")];
        let turns = vec![turn(1.0, 2.0, "SPEAKER_00")];
        let out = align(&segments, &turns);
        assert_eq!(out[0].speaker, UNKNOWN_SPEAKER);
    }

    #[test]
    fn test_empty_segments_yield_empty_output() {
        let turns = vec![turn(0.0, 1.0, "SPEAKER_00")];
        assert!(align(&[], &turns).is_empty());
    }
}
