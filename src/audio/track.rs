use super::AudioFormat;
use crate::error::{PlaybackError, Result};
use id3::TagLike;
use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use std::path::Path;
use std::time::Duration;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Raw tag values as read from a file. `None` means the tag is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFields {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

/// Display metadata for the track that is playing right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub display_label: String,
}

impl TrackMetadata {
    pub fn from_tags(tags: TagFields) -> Self {
        let pick = |value: Option<String>, fallback: &str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        let title = pick(tags.title, UNKNOWN_TITLE);
        let artist = pick(tags.artist, UNKNOWN_ARTIST);
        let album = pick(tags.album, UNKNOWN_ALBUM);
        let display_label = format!("{} -> {} — {}", album, title, artist);

        Self {
            title,
            artist,
            album,
            display_label,
        }
    }

    /// All sentinels, used when tags could not be read at all
    pub fn unknown() -> Self {
        Self::from_tags(TagFields::default())
    }
}

/// Where tag values come from
pub trait MetadataSource {
    fn read_tags(&self, path: &Path) -> Result<TagFields>;
}

impl<M: MetadataSource + ?Sized> MetadataSource for &M {
    fn read_tags(&self, path: &Path) -> Result<TagFields> {
        (**self).read_tags(path)
    }
}

/// Check the file exists, then read and normalize its tags
pub fn resolve<M: MetadataSource + ?Sized>(source: &M, path: &Path) -> Result<TrackMetadata> {
    if !path.is_file() {
        return Err(PlaybackError::NotFound(path.to_path_buf()));
    }
    let tags = source.read_tags(path)?;
    Ok(TrackMetadata::from_tags(tags))
}

/// Reads tags straight from audio files, picking a parser by extension
#[derive(Debug, Clone, Copy, Default)]
pub struct TagReader;

impl TagReader {
    pub fn new() -> Self {
        Self
    }

    fn extract_id3_tags(&self, path: &Path) -> Result<TagFields> {
        match id3::Tag::read_from_path(path) {
            Ok(tag) => Ok(TagFields {
                title: tag.title().map(|s| s.to_string()),
                artist: tag.artist().map(|s| s.to_string()),
                album: tag.album().map(|s| s.to_string()),
            }),
            // untagged mp3 is fine, it just gets sentinels
            Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => Ok(TagFields::default()),
            Err(e) => Err(metadata_error(path, e)),
        }
    }

    fn extract_mp4_tags(&self, path: &Path) -> Result<TagFields> {
        let tag = mp4ameta::Tag::read_from_path(path).map_err(|e| metadata_error(path, e))?;

        Ok(TagFields {
            title: tag.title().map(|s| s.to_string()),
            artist: tag.artist().map(|s| s.to_string()),
            album: tag.album().map(|s| s.to_string()),
        })
    }

    /// FLAC vorbis comments, Ogg, WAV and anything else lofty can read
    fn extract_lofty_tags(&self, path: &Path) -> Result<TagFields> {
        let tagged = lofty::read_from_path(path).map_err(|e| metadata_error(path, e))?;

        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            return Ok(TagFields::default());
        };

        Ok(TagFields {
            title: tag.title().map(|s| s.into_owned()),
            artist: tag.artist().map(|s| s.into_owned()),
            album: tag.album().map(|s| s.into_owned()),
        })
    }
}

impl MetadataSource for TagReader {
    fn read_tags(&self, path: &Path) -> Result<TagFields> {
        match AudioFormat::from_path(path) {
            AudioFormat::Mp3 => self.extract_id3_tags(path),
            AudioFormat::Mp4 => self.extract_mp4_tags(path),
            _ => self.extract_lofty_tags(path),
        }
    }
}

/// Stream length from the container headers. Covers decoders that cannot
/// tell their own length (rodio's Vorbis one, for a start).
pub fn read_length(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
        .filter(|length| !length.is_zero())
}

fn metadata_error(path: &Path, err: impl std::fmt::Display) -> PlaybackError {
    PlaybackError::Metadata {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
