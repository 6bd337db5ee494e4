pub mod device;
#[cfg(feature = "audio")]
pub mod player;
pub mod playlist;
pub mod track;

pub use device::{AudioDevice, DeviceEvent, DeviceState, MediaId};
#[cfg(feature = "audio")]
pub use player::RodioDevice;
pub use playlist::Playlist;
pub use track::{MetadataSource, TagFields, TagReader, TrackMetadata};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioConfig {
    pub volume: f32, // 0.0 to 1.0
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

impl From<&crate::config::Config> for AudioConfig {
    fn from(config: &crate::config::Config) -> Self {
        AudioConfig {
            volume: config.audio.volume.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Flac,
    Ogg,
    Mp4,
    Wav,
    Unknown,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "mp3" => AudioFormat::Mp3,
            "flac" => AudioFormat::Flac,
            "ogg" | "oga" => AudioFormat::Ogg,
            "mp4" | "m4a" | "aac" => AudioFormat::Mp4,
            "wav" => AudioFormat::Wav,
            _ => AudioFormat::Unknown,
        }
    }

    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(AudioFormat::from_extension)
            .unwrap_or(AudioFormat::Unknown)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, AudioFormat::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_format_from_path() {
        assert_eq!(AudioFormat::from_path(Path::new("a/B.FLAC")), AudioFormat::Flac);
        assert_eq!(AudioFormat::from_path(Path::new("x.m4a")), AudioFormat::Mp4);
        assert_eq!(AudioFormat::from_path(Path::new("cover.jpg")), AudioFormat::Unknown);
        assert_eq!(AudioFormat::from_path(Path::new("README")), AudioFormat::Unknown);
        assert!(!AudioFormat::Unknown.is_supported());
        assert!(AudioFormat::Ogg.is_supported());
    }
}
