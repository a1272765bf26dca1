/// Formats a time in seconds as `MM:SS`, or `HH:MM:SS` once it reaches an
/// hour. Fractional seconds are truncated.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (h, rem) = (total / 3600, total % 3600);
    let (m, s) = (rem / 60, rem % 60);
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, "00:00")]
    #[case(7.9, "00:07")]
    #[case(65.0, "01:05")]
    #[case(600.0, "10:00")]
    #[case(3599.0, "59:59")]
    #[case(3600.0, "01:00:00")]
    #[case(3725.0, "01:02:05")]
    fn test_format_timestamp(#[case] seconds: f64, #[case] expected: &str) {
        assert_eq!(format_timestamp(seconds), expected);
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(format_timestamp(-5.0), "00:00");
    }
}
