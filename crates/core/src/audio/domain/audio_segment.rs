/// Decoded PCM audio: interleaved samples normalized to [-1.0, 1.0].
#[derive(Clone, Debug)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Converts to 16-bit integer samples for models that consume raw PCM.
    pub fn to_i16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_accessors() {
        let seg = AudioSegment::new(vec![0.0; 320], 16000, 1);
        assert_eq!(seg.sample_rate(), 16000);
        assert_eq!(seg.channels(), 1);
        assert_eq!(seg.samples().len(), 320);
        assert!(!seg.is_empty());
    }

    #[test]
    fn test_duration_mono_and_stereo() {
        assert_relative_eq!(AudioSegment::new(vec![0.0; 48000], 16000, 1).duration(), 3.0);
        assert_relative_eq!(AudioSegment::new(vec![0.0; 88200], 44100, 2).duration(), 1.0);
    }

    #[test]
    fn test_duration_degenerate_rates() {
        assert_eq!(AudioSegment::new(vec![0.0; 100], 0, 1).duration(), 0.0);
        assert_eq!(AudioSegment::new(vec![0.0; 100], 16000, 0).duration(), 0.0);
    }

    #[test]
    fn test_to_i16_scales_and_clamps() {
        let seg = AudioSegment::new(vec![0.0, 1.0, -1.0, 2.0], 16000, 1);
        let ints = seg.to_i16();
        assert_eq!(ints[0], 0);
        assert_eq!(ints[1], i16::MAX);
        assert_eq!(ints[3], i16::MAX); // clamped
        assert!(ints[2] <= -i16::MAX);
    }
}
