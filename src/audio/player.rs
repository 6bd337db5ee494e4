use super::device::{AudioDevice, DeviceEvent, DeviceState, MediaId};
use super::track::read_length;
use super::AudioConfig;
use crate::error::{PlaybackError, Result};
use rodio::source::EmptyCallback;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// rodio output: one sink per track, an empty callback source queued behind
/// the track tells us when it has drained.
pub struct RodioDevice {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
    config: AudioConfig,
    length: Option<Duration>,
    media: u64,
    started: bool,
    stopped: bool,
    failed: Option<String>,
    // id of the last media whose end callback fired, 0 for none
    ended: Arc<AtomicU64>,
    notifier: Option<mpsc::UnboundedSender<DeviceEvent>>,
}

impl RodioDevice {
    pub fn new(config: AudioConfig) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| PlaybackError::Device(format!("no audio output available: {}", e)))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            config,
            length: None,
            media: 0,
            started: false,
            stopped: false,
            failed: None,
            ended: Arc::new(AtomicU64::new(0)),
            notifier: None,
        })
    }

    fn fail(&mut self, message: String) -> PlaybackError {
        self.failed = Some(message.clone());
        if let Some(sender) = &self.notifier {
            let _ = sender.send(DeviceEvent::Error(message.clone()));
        }
        PlaybackError::Device(message)
    }

    fn drop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

impl AudioDevice for RodioDevice {
    fn load_media(&mut self, path: &Path) -> Result<MediaId> {
        self.drop_sink();
        self.started = false;
        self.stopped = false;
        self.failed = None;
        self.length = None;

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PlaybackError::NotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(self.fail(format!("failed to open {}: {}", path.display(), e)));
            }
        };

        let source = match Decoder::new(BufReader::new(file)) {
            Ok(s) => s,
            Err(e) => {
                return Err(self.fail(format!(
                    "failed to decode {}: {}. The file may be corrupted or use an unsupported format",
                    path.display(),
                    e
                )));
            }
        };

        let sink = match Sink::try_new(&self.stream_handle) {
            Ok(sink) => sink,
            Err(e) => return Err(self.fail(format!("failed to open output sink: {}", e))),
        };
        sink.pause();
        sink.set_volume(self.config.volume);

        self.media += 1;
        let id = self.media;
        // rodio's Vorbis decoder never knows its length, the headers do
        self.length = source.total_duration().or_else(|| read_length(path));

        sink.append(source);

        let ended = Arc::clone(&self.ended);
        let notifier = self.notifier.clone();
        sink.append(EmptyCallback::<f32>::new(Box::new(move || {
            ended.store(id, Ordering::SeqCst);
            if let Some(sender) = &notifier {
                let _ = sender.send(DeviceEvent::EndReached(MediaId(id)));
            }
        })));

        debug!(
            "Loaded {} as media {} ({:?})",
            path.display(),
            id,
            self.length
        );
        self.sink = Some(sink);
        Ok(MediaId(id))
    }

    fn play(&mut self) -> Result<()> {
        match &self.sink {
            Some(sink) => {
                sink.play();
                self.started = true;
                Ok(())
            }
            None => Err(PlaybackError::Device("nothing loaded to play".to_string())),
        }
    }

    fn stop(&mut self) {
        self.drop_sink();
        self.stopped = true;
        self.started = false;
    }

    fn state(&self) -> DeviceState {
        if self.failed.is_some() {
            return DeviceState::Error;
        }
        if self.stopped {
            return DeviceState::Stopped;
        }
        let Some(sink) = &self.sink else {
            return DeviceState::Idle;
        };
        if self.ended.load(Ordering::SeqCst) == self.media || sink.empty() {
            DeviceState::Ended
        } else if !self.started {
            DeviceState::Idle
        } else if sink.is_paused() {
            DeviceState::Paused
        } else {
            DeviceState::Playing
        }
    }

    fn time_ms(&self) -> i64 {
        self.sink
            .as_ref()
            .map(|sink| sink.get_pos().as_millis() as i64)
            .unwrap_or(0)
    }

    fn length_ms(&self) -> i64 {
        self.length.map(|d| d.as_millis() as i64).unwrap_or(0)
    }

    fn subscribe(&mut self, sender: mpsc::UnboundedSender<DeviceEvent>) -> bool {
        if self.sink.is_some() {
            warn!("Subscribing after media was loaded; the current track will not notify");
        }
        self.notifier = Some(sender);
        true
    }
}

impl Drop for RodioDevice {
    fn drop(&mut self) {
        self.drop_sink();
    }
}
