// Error taxonomy for playback
// Metadata trouble is recoverable, device trouble ends the session

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Referenced track does not exist on disk
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Tags exist but could not be parsed
    #[error("could not read tags from {}: {reason}", path.display())]
    Metadata { path: PathBuf, reason: String },

    #[error("playlist is empty")]
    EmptyPlaylist,

    /// Output device failed to load, play or keep playing
    #[error("audio device error: {0}")]
    Device(String),

    /// User asked us to stop (ctrl-c)
    #[error("playback interrupted")]
    Interrupted,
}

impl PlaybackError {
    /// Interrupts end the session but are not a failure
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PlaybackError::Interrupted)
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
