use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::SessionError;

/// Which kind of session an operation or notification concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Capture,
    Playback,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capture => f.write_str("capture"),
            Self::Playback => f.write_str("playback"),
        }
    }
}

/// Linear PCM format parameters.
///
/// `block_align` and `byte_rate` are derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WavFormat {
    pub sample_rate_hz: u32,
    pub channel_count: u16,
    pub bits_per_sample: u16,
}

impl WavFormat {
    pub const SUPPORTED_BIT_DEPTHS: [u16; 4] = [8, 16, 24, 32];

    /// Build a format, rejecting parameters the codec cannot represent.
    pub fn new(sample_rate_hz: u32, channel_count: u16, bits_per_sample: u16) -> Result<Self, SessionError> {
        let format = Self {
            sample_rate_hz,
            channel_count,
            bits_per_sample,
        };
        format.validate().map_err(SessionError::FormatError)?;
        Ok(format)
    }

    /// 16-bit mono at the given rate.
    pub fn mono_16bit(sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz,
            channel_count: 1,
            bits_per_sample: 16,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate_hz == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![1, 2].contains(&self.channel_count) {
            return Err(format!("unsupported channel count: {}", self.channel_count));
        }
        if !Self::SUPPORTED_BIT_DEPTHS.contains(&self.bits_per_sample) {
            return Err(format!("unsupported bit depth: {}", self.bits_per_sample));
        }
        if self.sample_rate_hz.checked_mul(self.block_align() as u32).is_none() {
            return Err(format!("byte rate of {} Hz overflows the WAV header", self.sample_rate_hz));
        }
        Ok(())
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Bytes per frame across all channels.
    pub fn block_align(&self) -> u16 {
        self.channel_count * (self.bits_per_sample / 8)
    }

    /// Saturates for formats that fail `validate`.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate_hz.saturating_mul(self.block_align() as u32)
    }

    /// Largest positive sample value for this bit depth.
    pub fn max_amplitude(&self) -> i32 {
        match self.bits_per_sample {
            32 => i32::MAX,
            bits => (1i32 << (bits - 1)) - 1,
        }
    }

    /// Most negative sample value for this bit depth.
    pub fn min_sample(&self) -> i32 {
        match self.bits_per_sample {
            32 => i32::MIN,
            bits => -(1i32 << (bits - 1)),
        }
    }
}

impl Default for WavFormat {
    fn default() -> Self {
        Self::mono_16bit(44100)
    }
}

/// Interleaved signed PCM samples in a fixed format.
///
/// Invariants: the format is valid, `samples.len()` is a whole number of
/// frames, and every sample fits the bit depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    format: WavFormat,
    samples: Vec<i32>,
}

impl PcmBuffer {
    pub fn new(format: WavFormat, samples: Vec<i32>) -> Result<Self, SessionError> {
        format.validate().map_err(SessionError::FormatError)?;

        if samples.len() % format.channel_count as usize != 0 {
            return Err(SessionError::InvalidParameter(format!(
                "{} samples is not a whole number of {}-channel frames",
                samples.len(),
                format.channel_count
            )));
        }

        let (min, max) = (format.min_sample(), format.max_amplitude());
        if let Some(bad) = samples.iter().find(|s| **s < min || **s > max) {
            return Err(SessionError::InvalidParameter(format!(
                "sample {} out of range for {}-bit audio",
                bad, format.bits_per_sample
            )));
        }

        Ok(Self { format, samples })
    }

    pub fn format(&self) -> &WavFormat {
        &self.format
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i32> {
        self.samples
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.format.channel_count as usize
    }

    /// Size of the encoded payload in bytes.
    pub fn payload_len(&self) -> usize {
        self.samples.len() * self.format.bytes_per_sample()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.format.sample_rate_hz as f64
    }
}

/// Codec/container used by the platform capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingCodec {
    /// Narrowband AMR in a raw `.amr` container.
    AmrNb,
    /// AAC in an MPEG-4 container.
    AacMp4,
    /// 16-bit linear PCM in a WAV container.
    PcmWav,
}

impl RecordingCodec {
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::AmrNb => "amr",
            Self::AacMp4 => "m4a",
            Self::PcmWav => "wav",
        }
    }
}

/// Capture codec selection passed to the capture device on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    pub codec: RecordingCodec,
    pub sample_rate_hz: u32,
    pub channel_count: u16,
    /// Encoder bit rate; `None` lets the device choose.
    pub bit_rate_bps: Option<u32>,
}

impl CodecConfig {
    pub fn amr_nb() -> Self {
        Self {
            codec: RecordingCodec::AmrNb,
            sample_rate_hz: 8000,
            channel_count: 1,
            bit_rate_bps: Some(12_200),
        }
    }

    pub fn aac_mp4() -> Self {
        Self {
            codec: RecordingCodec::AacMp4,
            sample_rate_hz: 44100,
            channel_count: 1,
            bit_rate_bps: Some(128_000),
        }
    }

    pub fn pcm_wav(sample_rate_hz: u32, channel_count: u16) -> Self {
        Self {
            codec: RecordingCodec::PcmWav,
            sample_rate_hz,
            channel_count,
            bit_rate_bps: None,
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.sample_rate_hz == 0 {
            return Err(SessionError::FormatError("sample rate must be positive".into()));
        }
        if ![1, 2].contains(&self.channel_count) {
            return Err(SessionError::FormatError(format!(
                "unsupported channel count: {}",
                self.channel_count
            )));
        }
        if self.codec == RecordingCodec::AmrNb && (self.sample_rate_hz != 8000 || self.channel_count != 1) {
            return Err(SessionError::FormatError(format!(
                "AMR-NB requires 8000 Hz mono, got {} Hz x{}",
                self.sample_rate_hz, self.channel_count
            )));
        }
        if self.bit_rate_bps == Some(0) {
            return Err(SessionError::FormatError("bit rate must be positive".into()));
        }
        Ok(())
    }

    /// PCM layout of the recorded file, if the codec is uncompressed.
    pub fn wav_format(&self) -> Option<WavFormat> {
        match self.codec {
            RecordingCodec::PcmWav => Some(WavFormat {
                sample_rate_hz: self.sample_rate_hz,
                channel_count: self.channel_count,
                bits_per_sample: 16,
            }),
            _ => None,
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::amr_nb()
    }
}
