pub mod behavior;
pub mod collision;
pub mod cutscene;
pub mod event;
pub mod pool;
pub mod step;
pub mod world;

use crate::config::TuningConfig;
use crate::domain::player::{PlayerBody, PlayerRecord};
use event::{AudioOutput, GameEvent, SoundEffect};
use world::World;

/// Shared mutable context threaded through one tick.
///
/// The world, the avatar and the player record are owned by
/// [`step::Simulation`]; collision and behavior code borrows all three at
/// once, so they travel together instead of as five loose parameters.
pub struct Ctx<'a> {
    pub world: &'a mut World,
    pub player: &'a mut PlayerBody,
    pub record: &'a mut PlayerRecord,
    pub audio: &'a mut dyn AudioOutput,
    pub events: &'a mut Vec<GameEvent>,
    pub tuning: &'a TuningConfig,
}

impl Ctx<'_> {
    pub fn sound(&mut self, effect: SoundEffect) {
        self.audio.play_sound(effect);
    }

    /// Credit one coin: +200 score, 100 coins roll over into a life.
    pub fn give_coin(&mut self) {
        self.record.coins += 1;
        if self.record.coins == 100 {
            self.record.coins = 0;
            self.give_life();
        } else {
            self.sound(SoundEffect::Coin);
        }

        self.record.score += 200;
        self.events.push(GameEvent::CoinCollected);
    }

    pub fn give_life(&mut self) {
        self.record.lives += 1;
        self.sound(SoundEffect::ExtraLife);
        self.events.push(GameEvent::ExtraLife);
    }

    pub fn give_score(&mut self, score: u32) {
        self.record.score += score;
        self.events.push(GameEvent::ScoreAwarded { score });
    }
}
