use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::engine::{EngineEvent, PlaybackEngine};
use crate::audio::device::{AudioDevice, DeviceEvent, DeviceState};
use crate::audio::track::MetadataSource;
use crate::config::{AdvanceMode, Config};
use crate::error::{PlaybackError, Result};
use crate::ui::progress::{self, ProgressLine};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub tick_interval: Duration,
    pub show_progress: bool,
    pub advance_mode: AdvanceMode,
    pub length_wait_attempts: u32,
    pub length_wait_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            tick_interval: config.playback.tick_interval(),
            show_progress: config.ui.show_progress,
            advance_mode: config.playback.advance_mode,
            length_wait_attempts: config.playback.length_wait_attempts,
            length_wait_interval: config.playback.length_wait_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub tracks_started: usize,
    pub tracks_missing: usize,
}

/// Owns the device for the length of one playlist run.
///
/// Each tick: read the device state (an `Error` or `Stopped` device ends the
/// run before anything queued is looked at), drain pushed notifications, let
/// the engine react, print what the engine reported and redraw the progress
/// line if it changed. The device is stopped exactly once when the run ends,
/// however it ends.
pub struct Session<D: AudioDevice, M, W: Write> {
    device: D,
    engine: PlaybackEngine<M>,
    options: SessionOptions,
    mode: AdvanceMode,
    out: W,
    width: Box<dyn Fn() -> usize>,
    progress: ProgressLine,
    engine_events: mpsc::UnboundedReceiver<EngineEvent>,
    device_events: Option<mpsc::UnboundedReceiver<DeviceEvent>>,
    touched: bool,
    released: bool,
}

impl<D: AudioDevice, M: MetadataSource, W: Write> Session<D, M, W> {
    pub fn new(device: D, mut engine: PlaybackEngine<M>, options: SessionOptions, out: W) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);

        Self {
            device,
            engine,
            mode: options.advance_mode,
            options,
            out,
            width: Box::new(progress::terminal_width),
            progress: ProgressLine::new(),
            engine_events: rx,
            device_events: None,
            touched: false,
            released: false,
        }
    }

    /// Replace the terminal width query (fixed widths in tests, mostly)
    pub fn with_width(mut self, width: impl Fn() -> usize + 'static) -> Self {
        self.width = Box::new(width);
        self
    }

    /// Play the whole playlist, or until `shutdown` resolves
    pub async fn run<F: Future<Output = ()>>(&mut self, shutdown: F) -> Result<SessionSummary> {
        let result = tokio::select! {
            result = self.play_through() => result,
            _ = shutdown => {
                info!("Shutdown requested");
                Err(PlaybackError::Interrupted)
            }
        };
        self.finish(&result);
        result
    }

    async fn play_through(&mut self) -> Result<SessionSummary> {
        if self.engine.playlist().is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }

        self.touched = true;
        self.subscribe();

        let started = self.engine.start(&mut self.device);
        self.forward_engine_events();
        started?;

        if !self.engine.is_terminal() {
            self.wait_for_length().await;
        }

        let mut ticker = interval(self.options.tick_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !self.engine.is_terminal() {
            ticker.tick().await;
            self.tick()?;
        }

        Ok(self.summary())
    }

    fn subscribe(&mut self) {
        if self.mode != AdvanceMode::Event {
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        if self.device.subscribe(tx) {
            self.device_events = Some(rx);
        } else {
            warn!("Device cannot push track-end notifications, polling instead");
            self.mode = AdvanceMode::Poll;
        }
    }

    /// Some devices only know the length a moment after play
    async fn wait_for_length(&mut self) {
        for _ in 0..self.options.length_wait_attempts {
            if self.device.length_ms() > 0 {
                return;
            }
            // A short track can end (or the device fail) before its length shows up
            let state = self.device.state();
            if matches!(
                state,
                DeviceState::Ended | DeviceState::Error | DeviceState::Stopped
            ) {
                debug!("Length wait cut short, device is {:?}", state);
                return;
            }
            sleep(self.options.length_wait_interval).await;
        }
        debug!("Track length still unknown, rendering without it");
    }

    fn tick(&mut self) -> Result<()> {
        // Hard failures beat any end notification still sitting in the queue
        let state = self.device.state();
        if matches!(state, DeviceState::Error | DeviceState::Stopped) {
            let result = self.engine.on_device_state(state);
            self.forward_engine_events();
            return result;
        }

        let pending: Vec<DeviceEvent> = match &mut self.device_events {
            Some(rx) => std::iter::from_fn(|| rx.try_recv().ok()).collect(),
            None => Vec::new(),
        };

        for event in pending {
            if self.engine.is_terminal() {
                break;
            }
            let result = match event {
                DeviceEvent::EndReached(media) => self.engine.on_track_end(&mut self.device, media),
                DeviceEvent::Error(reason) => self.engine.on_device_error(&reason),
            };
            self.forward_engine_events();
            result?;
        }
        if self.engine.is_terminal() {
            return Ok(());
        }

        if state == DeviceState::Ended && self.mode == AdvanceMode::Poll {
            let result = match self.engine.current_media() {
                Some(media) => self.engine.on_track_end(&mut self.device, media),
                None => Ok(()),
            };
            self.forward_engine_events();
            result?;
        }

        if self.options.show_progress && !self.engine.is_terminal() {
            let line = progress::render(
                self.device.time_ms(),
                self.device.length_ms(),
                (self.width)(),
            );
            if let Err(e) = self.progress.draw(&mut self.out, line) {
                debug!("Could not draw progress: {}", e);
            }
        }
        Ok(())
    }

    fn forward_engine_events(&mut self) {
        while let Ok(event) = self.engine_events.try_recv() {
            let message = match event {
                EngineEvent::TrackStarted { metadata, .. } => {
                    format!("Now playing: {}", metadata.display_label)
                }
                EngineEvent::TrackMissing { path, .. } => {
                    format!("File not found: {}", path.display())
                }
                EngineEvent::Finished | EngineEvent::Failed(_) => continue,
            };
            self.say(&message);
        }
    }

    /// Print a message on its own line below the progress bar
    fn say(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, "\n{}", message).and_then(|_| self.out.flush()) {
            debug!("Could not write to terminal: {}", e);
        }
        self.progress.reset();
    }

    fn finish(&mut self, result: &Result<SessionSummary>) {
        let message = match result {
            Ok(_) => "Playback completed!".to_string(),
            Err(PlaybackError::Interrupted) => "Playback stopped.".to_string(),
            Err(PlaybackError::EmptyPlaylist) => "Playlist is empty!".to_string(),
            Err(e) => format!("Playback failed: {}", e),
        };
        self.say(&message);
        self.release();
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            tracks_started: self.engine.tracks_started(),
            tracks_missing: self.engine.tracks_missing(),
        }
    }
}

impl<D: AudioDevice, M, W: Write> Session<D, M, W> {
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn engine(&self) -> &PlaybackEngine<M> {
        &self.engine
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Stop the device, once, and only if this session ever used it
    fn release(&mut self) {
        if self.touched && !self.released {
            self.device.stop();
            self.released = true;
            debug!("Audio device released");
        }
    }
}

impl<D: AudioDevice, M, W: Write> Drop for Session<D, M, W> {
    fn drop(&mut self) {
        self.release();
    }
}
