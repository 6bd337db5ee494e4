// Playback core - the engine walks the playlist, the session drives it on a timer

pub mod engine;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{EngineEvent, EnginePhase, PlaybackEngine};
pub use session::{Session, SessionOptions, SessionSummary};
