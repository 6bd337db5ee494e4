// Audio output contract
// The engine and session only ever talk to this trait, never to rodio directly

use std::path::Path;
use tokio::sync::mpsc;

use crate::error::Result;

/// State reported by the output device. The device owns these transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Idle,
    Playing,
    Paused,
    Ended,
    Error,
    Stopped,
}

/// Identifies one `load_media` call so late notifications can be told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaId(pub u64);

/// Pushed by devices that can notify instead of being polled
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    EndReached(MediaId),
    Error(String),
}

pub trait AudioDevice {
    /// Replace whatever is loaded with `path`. Does not start playback.
    fn load_media(&mut self, path: &Path) -> Result<MediaId>;

    fn play(&mut self) -> Result<()>;

    /// Stop and release the current media
    fn stop(&mut self);

    fn state(&self) -> DeviceState;

    /// Position in the current media, milliseconds
    fn time_ms(&self) -> i64;

    /// Length of the current media in milliseconds, `<= 0` while unknown
    fn length_ms(&self) -> i64;

    /// Ask for end-of-track notifications. Returns false when the device
    /// cannot push them and must be polled instead.
    fn subscribe(&mut self, _sender: mpsc::UnboundedSender<DeviceEvent>) -> bool {
        false
    }
}

impl<D: AudioDevice + ?Sized> AudioDevice for Box<D> {
    fn load_media(&mut self, path: &Path) -> Result<MediaId> {
        (**self).load_media(path)
    }

    fn play(&mut self) -> Result<()> {
        (**self).play()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn state(&self) -> DeviceState {
        (**self).state()
    }

    fn time_ms(&self) -> i64 {
        (**self).time_ms()
    }

    fn length_ms(&self) -> i64 {
        (**self).length_ms()
    }

    fn subscribe(&mut self, sender: mpsc::UnboundedSender<DeviceEvent>) -> bool {
        (**self).subscribe(sender)
    }
}
