pub mod checksum;
pub mod metadata;
pub mod paths;
pub mod wav_file;
