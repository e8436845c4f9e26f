pub mod tone;
pub mod wav_codec;
