// segue library - gapless playlist playback with a one-line progress bar
// Device and tag reading sit behind traits so the core can run without sound

pub mod audio;    // output device, tags, playlist building
pub mod config;   // settings and preferences
pub mod error;    // playback error taxonomy
pub mod playback; // engine state machine and session loop
pub mod ui;       // progress line rendering

pub use audio::{AudioDevice, DeviceState, Playlist, TagReader, TrackMetadata};
pub use config::Config;
pub use error::PlaybackError;
pub use playback::{PlaybackEngine, Session, SessionOptions, SessionSummary};
