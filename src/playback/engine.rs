use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::audio::device::{AudioDevice, DeviceState, MediaId};
use crate::audio::track::{self, MetadataSource, TrackMetadata};
use crate::audio::Playlist;
use crate::config::MissingTrackPolicy;
use crate::error::{PlaybackError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    AwaitingStart,
    Playing(usize),
    Finished,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TrackStarted {
        index: usize,
        total: usize,
        metadata: TrackMetadata,
    },
    TrackMissing {
        index: usize,
        path: std::path::PathBuf,
    },
    Finished,
    Failed(String),
}

/// Walks a playlist on a borrowed device.
///
/// The engine owns the playlist and the cursor. It never owns the device:
/// every call that needs one gets it from the session, which is the only
/// place the cursor is ever advanced from.
pub struct PlaybackEngine<M> {
    playlist: Playlist,
    cursor: usize,
    phase: EnginePhase,
    policy: MissingTrackPolicy,
    metadata: M,
    media: Option<MediaId>,
    tracks_started: usize,
    tracks_missing: usize,
    event_sender: Option<mpsc::UnboundedSender<EngineEvent>>,
}

impl<M: MetadataSource> PlaybackEngine<M> {
    pub fn new(playlist: Playlist, metadata: M, policy: MissingTrackPolicy) -> Self {
        Self {
            playlist,
            cursor: 0,
            phase: EnginePhase::AwaitingStart,
            policy,
            metadata,
            media: None,
            tracks_started: 0,
            tracks_missing: 0,
            event_sender: None,
        }
    }

    pub fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<EngineEvent>) {
        self.event_sender = Some(sender);
    }

    /// Begin with the first track. Touches nothing when the playlist is empty.
    pub fn start<D: AudioDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        if self.phase != EnginePhase::AwaitingStart {
            warn!("start() called twice, ignoring");
            return Ok(());
        }
        if self.playlist.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }

        info!("Starting playlist of {} tracks", self.playlist.len());
        self.cursor = 0;
        self.begin_from_cursor(device)
    }

    /// The media loaded for `media` reached its end
    pub fn on_track_end<D: AudioDevice + ?Sized>(
        &mut self,
        device: &mut D,
        media: MediaId,
    ) -> Result<()> {
        let EnginePhase::Playing(index) = self.phase else {
            debug!("Track end for {:?} outside of playback, ignoring", media);
            return Ok(());
        };
        if self.media != Some(media) {
            debug!(
                "Stale track end for {:?} (current {:?}), ignoring",
                media, self.media
            );
            return Ok(());
        }

        debug!("Track {} finished", index);
        self.media = None;
        self.cursor += 1;
        self.begin_from_cursor(device)
    }

    /// React to a state read from the device. Only hard stops matter here,
    /// normal end-of-track goes through `on_track_end`.
    pub fn on_device_state(&mut self, state: DeviceState) -> Result<()> {
        if !matches!(self.phase, EnginePhase::Playing(_)) {
            return Ok(());
        }
        match state {
            DeviceState::Error => self.on_device_error("device reported an error state"),
            DeviceState::Stopped => {
                info!("Device stopped externally at track {}", self.cursor);
                self.finish();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn on_device_error(&mut self, reason: &str) -> Result<()> {
        if self.is_terminal() {
            return Ok(());
        }
        self.fail(reason);
        Err(PlaybackError::Device(reason.to_string()))
    }

    fn begin_from_cursor<D: AudioDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        loop {
            let Some(path) = self.playlist.get(self.cursor).map(Path::to_path_buf) else {
                self.finish();
                return Ok(());
            };

            let metadata = match track::resolve(&self.metadata, &path) {
                Ok(metadata) => metadata,
                Err(PlaybackError::NotFound(_)) => {
                    self.handle_missing(&path)?;
                    continue;
                }
                Err(e) => {
                    warn!("{}; using placeholder metadata", e);
                    TrackMetadata::unknown()
                }
            };

            let media = match device.load_media(&path) {
                Ok(media) => media,
                // removed between the existence check and the load
                Err(PlaybackError::NotFound(_)) => {
                    self.handle_missing(&path)?;
                    continue;
                }
                Err(e) => {
                    self.fail(&e.to_string());
                    return Err(e);
                }
            };

            if let Err(e) = device.play() {
                self.fail(&e.to_string());
                return Err(e);
            }

            self.media = Some(media);
            self.phase = EnginePhase::Playing(self.cursor);
            self.tracks_started += 1;
            info!(
                "Now playing {}/{}: {}",
                self.cursor + 1,
                self.playlist.len(),
                metadata.display_label
            );
            self.emit(EngineEvent::TrackStarted {
                index: self.cursor,
                total: self.playlist.len(),
                metadata,
            });
            return Ok(());
        }
    }

    /// Report a missing file, then skip past it or halt
    fn handle_missing(&mut self, path: &Path) -> Result<()> {
        warn!("File not found: {}", path.display());
        self.tracks_missing += 1;
        self.emit(EngineEvent::TrackMissing {
            index: self.cursor,
            path: path.to_path_buf(),
        });

        match self.policy {
            MissingTrackPolicy::Skip => {
                self.cursor += 1;
                Ok(())
            }
            MissingTrackPolicy::Halt => {
                let err = PlaybackError::NotFound(path.to_path_buf());
                self.fail(&err.to_string());
                Err(err)
            }
        }
    }

    fn finish(&mut self) {
        self.phase = EnginePhase::Finished;
        self.media = None;
        info!("Playlist completed ({} tracks started)", self.tracks_started);
        self.emit(EngineEvent::Finished);
    }

    fn fail(&mut self, reason: &str) {
        self.phase = EnginePhase::Failed;
        self.media = None;
        warn!("Playback failed: {}", reason);
        self.emit(EngineEvent::Failed(reason.to_string()));
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }
}

impl<M> PlaybackEngine<M> {
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    /// Media the engine is waiting to hear the end of
    pub fn current_media(&self) -> Option<MediaId> {
        self.media
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, EnginePhase::Finished | EnginePhase::Failed)
    }

    pub fn tracks_started(&self) -> usize {
        self.tracks_started
    }

    pub fn tracks_missing(&self) -> usize {
        self.tracks_missing
    }
}
