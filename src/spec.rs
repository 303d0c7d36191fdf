//! Canonical description of an audio file, produced by one header parse.

use crate::sample::SampleFormat;

/// Immutable value describing an audio file's layout.
///
/// Produced once by a container header parser and consumed by codec
/// construction and buffer-size computations. `num_frames` is exact for
/// read-only consumers; for a freshly opened write target it is authoritative
/// only at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFileSpec {
    /// Identifier of the container format, if known.
    pub container: Option<String>,
    /// On-disk sample encoding.
    pub sample_format: SampleFormat,
    /// Number of interleaved channels. Never zero for a parsed file.
    pub num_channels: u32,
    /// Sample rate in Hertz.
    pub sample_rate: f64,
    /// Number of sample frames in the data chunk, truncating any partial
    /// trailing frame.
    pub num_frames: u64,
}

impl AudioFileSpec {
    /// Create a spec with no container attribution.
    pub fn new(
        sample_format: SampleFormat,
        num_channels: u32,
        sample_rate: f64,
        num_frames: u64,
    ) -> Self {
        Self {
            container: None,
            sample_format,
            num_channels,
            sample_rate,
            num_frames,
        }
    }

    /// Bytes per frame: bytes-per-sample times channel count.
    pub fn frame_size(&self) -> usize {
        self.sample_format.bytes_per_sample() * self.num_channels as usize
    }

    /// Total sample data length in bytes.
    pub fn data_len(&self) -> u64 {
        self.num_frames * self.frame_size() as u64
    }

    /// Duration in seconds, `None` when the sample rate is zero.
    pub fn duration(&self) -> Option<f64> {
        if self.sample_rate > 0.0 {
            Some(self.num_frames as f64 / self.sample_rate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size() {
        let spec = AudioFileSpec::new(SampleFormat::Int16, 2, 44100.0, 8);
        assert_eq!(spec.frame_size(), 4);
        assert_eq!(spec.data_len(), 32);
    }

    #[test]
    fn test_duration() {
        let spec = AudioFileSpec::new(SampleFormat::Int16, 1, 22050.0, 441);
        let dur = spec.duration().unwrap();
        assert!((dur - 0.02).abs() < 1e-9);

        let silent = AudioFileSpec::new(SampleFormat::Int16, 1, 0.0, 0);
        assert!(silent.duration().is_none());
    }
}
