/// Frame-exact side-scrolling platformer simulation core.
///
/// The crate owns the playfield grid, the avatar's physics state machine,
/// the enemy pool and the tick driver. Rendering, input devices, audio
/// playback and level decoding live in the embedding driver: levels are
/// streamed in through [`sim::world::TileWorld`] placement calls, sounds
/// go out through [`sim::event::AudioOutput`], and everything observable
/// is reported as [`sim::event::GameEvent`]s.

pub mod config;
pub mod domain;
pub mod sim;

pub use config::TuningConfig;
pub use domain::player::{InputFrame, PlayerBody, PlayerRecord};
pub use sim::event::{AudioOutput, GameEvent, NullAudio};
pub use sim::step::Simulation;
