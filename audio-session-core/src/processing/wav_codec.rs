//! Canonical RIFF/WAVE encoding and decoding.
//!
//! Only the 44-byte canonical layout is produced and accepted: a 16-byte
//! PCM `fmt ` chunk followed directly by the `data` chunk. All integers are
//! little-endian. 8-bit payloads are stored unsigned (offset 128) as WAV
//! requires; every other depth is two's complement.
use crate::models::audio_models::{PcmBuffer, WavFormat};
use crate::models::error::SessionError;

/// Size of the canonical WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const PCM_FORMAT_TAG: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

/// A decoded WAV stream borrowing its payload from the source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavContainer<'a> {
    pub format: WavFormat,
    pub data_size: u32,
    pub payload: &'a [u8],
}

impl WavContainer<'_> {
    /// RIFF chunk size implied by the payload (`36 + data_size`).
    pub fn riff_chunk_size(&self) -> u32 {
        36u32.saturating_add(self.data_size)
    }

    /// Unpack the payload into signed samples.
    ///
    /// Fails if the payload is not a whole number of frames.
    pub fn to_pcm(&self) -> Result<PcmBuffer, SessionError> {
        let block_align = self.format.block_align() as usize;
        if self.payload.len() % block_align != 0 {
            return Err(SessionError::FormatError(format!(
                "payload of {} bytes is not a multiple of block align {}",
                self.payload.len(),
                block_align
            )));
        }

        let samples = self
            .payload
            .chunks_exact(self.format.bytes_per_sample())
            .map(|bytes| read_sample(bytes, self.format.bits_per_sample))
            .collect();
        PcmBuffer::new(self.format, samples)
    }
}

/// Generate a 44-byte WAV RIFF header.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * block_align
/// [32-33]  block_align = channels * bits_per_sample / 8
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(format: &WavFormat, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&36u32.saturating_add(data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    header[22..24].copy_from_slice(&format.channel_count.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate_hz.to_le_bytes());
    header[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&format.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Encode a PCM buffer as a canonical WAV byte stream.
pub fn encode(pcm: &PcmBuffer) -> Result<Vec<u8>, SessionError> {
    let format = pcm.format();
    let payload_len = pcm.payload_len();
    let data_size = u32::try_from(payload_len)
        .ok()
        .filter(|size| *size <= u32::MAX - 36)
        .ok_or_else(|| SessionError::FormatError(format!("{} bytes of PCM exceeds the RIFF size limit", payload_len)))?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_SIZE + payload_len);
    bytes.extend_from_slice(&generate_wav_header(format, data_size));
    for &sample in pcm.samples() {
        write_sample(&mut bytes, sample, format.bits_per_sample);
    }
    Ok(bytes)
}

/// Parse and validate a canonical WAV byte stream.
///
/// Trailing bytes after the `data` chunk are ignored.
pub fn decode(bytes: &[u8]) -> Result<WavContainer<'_>, SessionError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(SessionError::FormatError(format!(
            "{} bytes is shorter than the {}-byte WAV header",
            bytes.len(),
            WAV_HEADER_SIZE
        )));
    }

    expect_tag(bytes, 0, b"RIFF")?;
    expect_tag(bytes, 8, b"WAVE")?;
    expect_tag(bytes, 12, b"fmt ")?;
    expect_tag(bytes, 36, b"data")?;

    let format_tag = read_u16(bytes, 20);
    if format_tag != PCM_FORMAT_TAG {
        return Err(SessionError::FormatError(format!(
            "audio format tag {} is not PCM",
            format_tag
        )));
    }

    let format = WavFormat {
        channel_count: read_u16(bytes, 22),
        sample_rate_hz: read_u32(bytes, 24),
        bits_per_sample: read_u16(bytes, 34),
    };
    format.validate().map_err(SessionError::FormatError)?;

    let data_size = read_u32(bytes, 40);
    let available = bytes.len() - WAV_HEADER_SIZE;
    if data_size as usize > available {
        return Err(SessionError::FormatError(format!(
            "data chunk declares {} bytes but only {} remain",
            data_size, available
        )));
    }

    Ok(WavContainer {
        format,
        data_size,
        payload: &bytes[WAV_HEADER_SIZE..WAV_HEADER_SIZE + data_size as usize],
    })
}

fn expect_tag(bytes: &[u8], offset: usize, tag: &[u8; 4]) -> Result<(), SessionError> {
    let found = &bytes[offset..offset + 4];
    if found != tag {
        return Err(SessionError::FormatError(format!(
            "expected {:?} at offset {}, found {:?}",
            String::from_utf8_lossy(tag),
            offset,
            String::from_utf8_lossy(found)
        )));
    }
    Ok(())
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn write_sample(out: &mut Vec<u8>, sample: i32, bits_per_sample: u16) {
    match bits_per_sample {
        8 => out.push((sample + 128) as u8),
        16 => out.extend_from_slice(&(sample as i16).to_le_bytes()),
        24 => out.extend_from_slice(&sample.to_le_bytes()[..3]),
        _ => out.extend_from_slice(&sample.to_le_bytes()),
    }
}

fn read_sample(bytes: &[u8], bits_per_sample: u16) -> i32 {
    match bits_per_sample {
        8 => bytes[0] as i32 - 128,
        16 => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
        24 => {
            let sign = if bytes[2] & 0x80 != 0 { 0xFF } else { 0x00 };
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], sign])
        }
        _ => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}
