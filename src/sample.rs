//! On-disk sample encodings.

use std::fmt;

/// Supported on-disk sample encodings.
///
/// Every variant pairs a byte layout with a buffer codec; constructing a
/// codec for any member of this set always succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Unsigned 8-bit PCM (offset-128), a WAVE-specific convention.
    UInt8,
    /// Signed 8-bit PCM.
    Int8,
    /// Signed 16-bit PCM.
    Int16,
    /// Signed 24-bit PCM, three bytes per sample.
    Int24,
    /// Signed 32-bit PCM.
    Int32,
    /// 32-bit IEEE-754 float.
    Float32,
    /// 64-bit IEEE-754 float.
    Float64,
}

impl SampleFormat {
    /// Get all supported sample formats.
    pub fn all() -> &'static [SampleFormat] {
        &[
            SampleFormat::UInt8,
            SampleFormat::Int8,
            SampleFormat::Int16,
            SampleFormat::Int24,
            SampleFormat::Int32,
            SampleFormat::Float32,
            SampleFormat::Float64,
        ]
    }

    /// Bits per sample. Always a multiple of 8.
    pub const fn bits_per_sample(&self) -> u32 {
        match self {
            SampleFormat::UInt8 | SampleFormat::Int8 => 8,
            SampleFormat::Int16 => 16,
            SampleFormat::Int24 => 24,
            SampleFormat::Int32 | SampleFormat::Float32 => 32,
            SampleFormat::Float64 => 64,
        }
    }

    /// Bytes per sample in the interleaved stream.
    pub const fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample() / 8) as usize
    }

    /// Check whether the format stores floating-point samples.
    pub const fn is_float(&self) -> bool {
        matches!(self, SampleFormat::Float32 | SampleFormat::Float64)
    }

    /// Check whether a buffer codec is registered for this format.
    ///
    /// The built-in set is closed and fully backed; this guard exists for the
    /// "no codec for format" failure path of codec construction.
    pub const fn codec_available(&self) -> bool {
        match self {
            SampleFormat::UInt8
            | SampleFormat::Int8
            | SampleFormat::Int16
            | SampleFormat::Int24
            | SampleFormat::Int32
            | SampleFormat::Float32
            | SampleFormat::Float64 => true,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleFormat::UInt8 => "uint8",
            SampleFormat::Int8 => "int8",
            SampleFormat::Int16 => "int16",
            SampleFormat::Int24 => "int24",
            SampleFormat::Int32 => "int32",
            SampleFormat::Float32 => "float32",
            SampleFormat::Float64 => "float64",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_sample() {
        assert_eq!(SampleFormat::UInt8.bits_per_sample(), 8);
        assert_eq!(SampleFormat::Int24.bits_per_sample(), 24);
        assert_eq!(SampleFormat::Float64.bits_per_sample(), 64);
        for format in SampleFormat::all() {
            assert_eq!(format.bits_per_sample() % 8, 0);
            assert_eq!(format.bytes_per_sample() * 8, format.bits_per_sample() as usize);
        }
    }

    #[test]
    fn test_float_detection() {
        assert!(SampleFormat::Float32.is_float());
        assert!(SampleFormat::Float64.is_float());
        assert!(!SampleFormat::Int16.is_float());
    }

    #[test]
    fn test_all_formats_have_codecs() {
        for format in SampleFormat::all() {
            assert!(format.codec_available(), "{} lacks a codec", format);
        }
    }
}
