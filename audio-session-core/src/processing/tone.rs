use std::f64::consts::PI;

use crate::models::audio_models::{PcmBuffer, WavFormat};
use crate::models::error::SessionError;

/// Synthesize a sine tone at full scale.
///
/// Produces `round(sample_rate * duration)` frames where frame `i` is
/// `round(sin(2π · i · frequency / sample_rate) · max_amplitude)`, clamped to
/// the bit depth. Multi-channel formats repeat each frame's sample on every
/// channel.
pub fn generate(frequency_hz: f64, duration_secs: f64, format: &WavFormat) -> Result<PcmBuffer, SessionError> {
    if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
        return Err(SessionError::InvalidParameter(format!(
            "frequency must be positive, got {}",
            frequency_hz
        )));
    }
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Err(SessionError::InvalidParameter(format!(
            "duration must be positive, got {}",
            duration_secs
        )));
    }
    if format.sample_rate_hz == 0 {
        return Err(SessionError::InvalidParameter("sample rate must be positive".into()));
    }
    format.validate().map_err(SessionError::InvalidParameter)?;

    let sample_rate = format.sample_rate_hz as f64;
    let frames = (sample_rate * duration_secs).round();
    let max_frames = (u32::MAX - 36) / format.block_align() as u32;
    if frames > max_frames as f64 {
        return Err(SessionError::InvalidParameter(format!(
            "{} s at {} Hz exceeds the WAV size limit",
            duration_secs, format.sample_rate_hz
        )));
    }
    let frame_count = frames as usize;
    let channels = format.channel_count as usize;
    let max = format.max_amplitude() as f64;
    let min = format.min_sample() as f64;

    let mut samples = Vec::with_capacity(frame_count * channels);
    for i in 0..frame_count {
        let phase = 2.0 * PI * i as f64 * frequency_hz / sample_rate;
        let value = (phase.sin() * max).round().clamp(min, max) as i32;
        samples.extend(std::iter::repeat(value).take(channels));
    }

    PcmBuffer::new(*format, samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn mono16() -> WavFormat {
        WavFormat::mono_16bit(44100)
    }

    #[test]
    fn one_second_a4_has_one_second_of_frames() {
        let pcm = generate(440.0, 1.0, &mono16()).unwrap();
        assert_eq!(pcm.samples().len(), 44100);
        assert_eq!(pcm.samples()[0], 0);
    }

    #[test]
    fn one_period_later_returns_near_start() {
        let pcm = generate(440.0, 1.0, &mono16()).unwrap();
        let period = (44100.0f64 / 440.0).round() as usize;
        let tolerance = 0.02 * 32767.0;
        assert_abs_diff_eq!(pcm.samples()[period] as f64, pcm.samples()[0] as f64, epsilon = tolerance);
    }

    #[test]
    fn whole_sample_period_repeats_exactly() {
        // 441 Hz at 44.1 kHz has a period of exactly 100 samples.
        let pcm = generate(441.0, 0.01, &mono16()).unwrap();
        let samples = pcm.samples();
        assert_eq!(samples.len(), 441);
        assert_eq!(samples[25], 32767);
        assert_eq!(samples[75], -32767);
        for i in 0..100 {
            assert_abs_diff_eq!(samples[i] as f64, samples[i + 100] as f64, epsilon = 1.0);
        }
    }

    #[test]
    fn deterministic() {
        let a = generate(1000.0, 0.25, &mono16()).unwrap();
        let b = generate(1000.0, 0.25, &mono16()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn respects_bit_depth_range() {
        for bits in WavFormat::SUPPORTED_BIT_DEPTHS {
            let format = WavFormat::new(8000, 1, bits).unwrap();
            let pcm = generate(2000.0, 0.01, &format).unwrap();
            let peak = pcm.samples().iter().copied().max().unwrap();
            assert_eq!(peak, format.max_amplitude(), "{}-bit peak", bits);
        }
    }

    #[test]
    fn stereo_duplicates_each_frame() {
        let format = WavFormat::new(8000, 2, 16).unwrap();
        let pcm = generate(440.0, 0.5, &format).unwrap();
        assert_eq!(pcm.frame_count(), 4000);
        for frame in pcm.samples().chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn rejects_bad_arguments() {
        let invalid = |result: Result<PcmBuffer, SessionError>| matches!(result, Err(SessionError::InvalidParameter(_)));
        assert!(invalid(generate(0.0, 1.0, &mono16())));
        assert!(invalid(generate(-440.0, 1.0, &mono16())));
        assert!(invalid(generate(f64::NAN, 1.0, &mono16())));
        assert!(invalid(generate(440.0, 0.0, &mono16())));
        assert!(invalid(generate(440.0, -2.0, &mono16())));
        assert!(invalid(generate(440.0, 1.0, &WavFormat::mono_16bit(0))));
    }

    #[test]
    fn rejects_duration_beyond_wav_limit() {
        let err = generate(440.0, 1e6, &mono16()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidParameter(_)));
        assert!(generate(440.0, f64::MAX, &mono16()).is_err());

        // 16-bit stereo at 44.1 kHz tops out a little past 6.7 hours.
        let stereo = WavFormat::new(44100, 2, 16).unwrap();
        assert!(generate(440.0, 24_400.0, &stereo).is_err());
    }
}
