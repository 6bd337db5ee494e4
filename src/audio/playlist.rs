use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::AudioFormat;

/// Ordered list of tracks for one session. Fixed once playback starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<PathBuf>,
}

impl Playlist {
    pub fn new(tracks: Vec<PathBuf>) -> Self {
        Self { tracks }
    }

    /// Build a playlist from command line paths.
    ///
    /// Files are kept as given (even missing ones, so the engine can report
    /// them at their turn). Directories expand to the supported audio files
    /// they contain, sorted by path.
    pub fn from_args<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut tracks = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                let found = Self::scan_directory(path);
                if found.is_empty() {
                    warn!("No playable files in directory {}", path.display());
                }
                debug!("Expanded {} into {} tracks", path.display(), found.len());
                tracks.extend(found);
            } else {
                tracks.push(path.to_path_buf());
            }
        }

        Self { tracks }
    }

    fn scan_directory(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                // Skip hidden files (dotfiles)
                !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with('.'))
            })
            .filter(|path| AudioFormat::from_path(path).is_supported())
            .collect();

        found.sort();
        found
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.tracks.get(index).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.tracks.iter().map(PathBuf::as_path)
    }
}

/// Turn a line typed (or pasted) on stdin into a path.
/// Drag-and-drop in most terminals wraps the path in quotes.
pub fn path_from_input(line: &str) -> Option<PathBuf> {
    let trimmed = line.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|&q| {
            trimmed
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
        })
        .unwrap_or(trimmed)
        .trim();

    if unquoted.is_empty() {
        None
    } else {
        Some(PathBuf::from(unquoted))
    }
}
