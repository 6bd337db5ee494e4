// Scripted collaborators for engine and session tests

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::audio::device::{AudioDevice, DeviceEvent, DeviceState, MediaId};
use crate::audio::track::{MetadataSource, TagFields};
use crate::error::{PlaybackError, Result};

/// Create empty files so existence checks pass
pub(crate) fn fixture_tracks(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            fs::write(&path, b"").unwrap();
            path
        })
        .collect()
}

/// Tags derived from the file stem, with some paths scripted to fail
#[derive(Debug, Default)]
pub(crate) struct StaticTags {
    broken: HashSet<PathBuf>,
}

impl StaticTags {
    pub(crate) fn broken(mut self, path: &Path) -> Self {
        self.broken.insert(path.to_path_buf());
        self
    }
}

impl MetadataSource for StaticTags {
    fn read_tags(&self, path: &Path) -> Result<TagFields> {
        if self.broken.contains(path) {
            return Err(PlaybackError::Metadata {
                path: path.to_path_buf(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(TagFields {
            title: path.file_stem().map(|s| s.to_string_lossy().into_owned()),
            artist: Some("Tester".to_string()),
            album: Some("Fixtures".to_string()),
        })
    }
}

/// Fake output whose clock moves `step_ms` forward on every state read,
/// roughly one tick of the session loop.
pub(crate) struct MockDevice {
    length_ms: i64,
    step_ms: i64,
    notifications: bool,
    fail_load: HashSet<PathBuf>,
    error_at: Option<(MediaId, i64)>,
    stopped_at: Option<(MediaId, i64)>,
    pushed_error_at: Option<(MediaId, i64)>,
    broken_stream: Option<MediaId>,
    hidden_length_reads: Cell<u32>,
    lengths: HashMap<PathBuf, i64>,

    pub(crate) loaded: Vec<PathBuf>,
    pub(crate) plays: usize,
    pub(crate) stops: usize,

    media: u64,
    current_length: i64,
    playing: bool,
    stopped: bool,
    elapsed: Cell<i64>,
    notified: Cell<bool>,
    error_pushed: Cell<bool>,
    sender: Option<mpsc::UnboundedSender<DeviceEvent>>,
}

impl MockDevice {
    pub(crate) fn new(length_ms: i64, step_ms: i64) -> Self {
        Self {
            length_ms,
            step_ms,
            notifications: false,
            fail_load: HashSet::new(),
            error_at: None,
            stopped_at: None,
            pushed_error_at: None,
            broken_stream: None,
            hidden_length_reads: Cell::new(0),
            lengths: HashMap::new(),
            loaded: Vec::new(),
            plays: 0,
            stops: 0,
            media: 0,
            current_length: 0,
            playing: false,
            stopped: false,
            elapsed: Cell::new(0),
            notified: Cell::new(false),
            error_pushed: Cell::new(false),
            sender: None,
        }
    }

    pub(crate) fn with_notifications(mut self) -> Self {
        self.notifications = true;
        self
    }

    pub(crate) fn failing_load(mut self, path: &Path) -> Self {
        self.fail_load.insert(path.to_path_buf());
        self
    }

    /// Report `Error` once media number `media` has played `at_ms`
    pub(crate) fn error_at(mut self, media: u64, at_ms: i64) -> Self {
        self.error_at = Some((MediaId(media), at_ms));
        self
    }

    pub(crate) fn stopped_at(mut self, media: u64, at_ms: i64) -> Self {
        self.stopped_at = Some((MediaId(media), at_ms));
        self
    }

    /// Send `DeviceEvent::Error` once media `media` has played `at_ms`,
    /// while `state` keeps answering `Playing`
    pub(crate) fn push_error_at(mut self, media: u64, at_ms: i64) -> Self {
        self.pushed_error_at = Some((MediaId(media), at_ms));
        self
    }

    /// Media `media` drains the moment it starts: its end notification is
    /// queued by `play`, and every state read after that says `Error`
    pub(crate) fn broken_stream(mut self, media: u64) -> Self {
        self.broken_stream = Some(MediaId(media));
        self
    }

    /// First `reads` length queries answer 0, like a device still probing
    pub(crate) fn hide_length_for(self, reads: u32) -> Self {
        self.hidden_length_reads.set(reads);
        self
    }

    pub(crate) fn length_of(mut self, path: &Path, length_ms: i64) -> Self {
        self.lengths.insert(path.to_path_buf(), length_ms);
        self
    }

    fn notify(&self, event: DeviceEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }

    fn reached(&self, mark: Option<(MediaId, i64)>, elapsed: i64) -> bool {
        matches!(mark, Some((id, at)) if id == MediaId(self.media) && elapsed >= at)
    }
}

impl AudioDevice for MockDevice {
    fn load_media(&mut self, path: &Path) -> Result<MediaId> {
        if self.fail_load.contains(path) {
            return Err(PlaybackError::Device(format!(
                "cannot decode {}",
                path.display()
            )));
        }
        self.media += 1;
        self.current_length = self.lengths.get(path).copied().unwrap_or(self.length_ms);
        self.playing = false;
        self.stopped = false;
        self.elapsed.set(0);
        self.notified.set(false);
        self.error_pushed.set(false);
        self.loaded.push(path.to_path_buf());
        Ok(MediaId(self.media))
    }

    fn play(&mut self) -> Result<()> {
        self.playing = true;
        self.plays += 1;
        if self.broken_stream == Some(MediaId(self.media)) {
            self.notify(DeviceEvent::EndReached(MediaId(self.media)));
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.stopped = true;
        self.playing = false;
    }

    fn state(&self) -> DeviceState {
        if self.stopped {
            return DeviceState::Stopped;
        }
        if self.media == 0 || !self.playing {
            return DeviceState::Idle;
        }

        let elapsed = (self.elapsed.get() + self.step_ms).min(self.current_length);
        self.elapsed.set(elapsed);

        if self.broken_stream == Some(MediaId(self.media))
            || self.reached(self.error_at, elapsed)
        {
            return DeviceState::Error;
        }
        if self.reached(self.pushed_error_at, elapsed) && !self.error_pushed.get() {
            self.error_pushed.set(true);
            self.notify(DeviceEvent::Error("output stream lost".to_string()));
        }
        if self.reached(self.stopped_at, elapsed) {
            return DeviceState::Stopped;
        }
        if elapsed >= self.current_length {
            if !self.notified.get() {
                self.notified.set(true);
                self.notify(DeviceEvent::EndReached(MediaId(self.media)));
            }
            return DeviceState::Ended;
        }
        DeviceState::Playing
    }

    fn time_ms(&self) -> i64 {
        self.elapsed.get()
    }

    fn length_ms(&self) -> i64 {
        let hidden = self.hidden_length_reads.get();
        if hidden > 0 {
            self.hidden_length_reads.set(hidden - 1);
            return 0;
        }
        self.current_length
    }

    fn subscribe(&mut self, sender: mpsc::UnboundedSender<DeviceEvent>) -> bool {
        if !self.notifications {
            return false;
        }
        self.sender = Some(sender);
        true
    }
}
