/// Events emitted during a simulation step.
/// The presentation layer consumes these for HUD, scoring and effects;
/// sounds and music go through [`AudioOutput`] as they happen so the
/// driver hears them in tick order.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    CoinCollected,
    ScoreAwarded { score: u32 },
    ExtraLife,
    BlockBroken { col: usize, row: usize },
    BlockBumped { col: usize, row: usize },
    ItemReleased { col: usize, row: usize },
    PowerupCollected,
    PlayerGrew,
    PlayerShrunk,
    PlayerDied { pit: bool },
    EnemyStomped { slot: usize },
    EnemyKilled { slot: usize },
    SpringLaunched,
    FlagpoleReached { score: u32 },
    LevelCleared,
    WarpTaken,
    PageStreamed,
    TimeExpired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundEffect {
    Coin,
    BlockHit,
    BrickSmash,
    PowerupSpawn,
    PowerupAcquire,
    ExtraLife,
    JumpSmall,
    JumpBig,
    Swim,
    Stomp,
    Kick,
    StarmanKill,
    FireballThrow,
    Damage,
    Flagpole,
    SpringBounce,
    Pipe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MusicTrack {
    Theme,
    Starman,
    LevelClear,
    Death,
    GameOver,
}

/// Playback sink supplied by the embedding driver.
pub trait AudioOutput {
    fn play_sound(&mut self, effect: SoundEffect);
    fn play_music(&mut self, track: MusicTrack);
}

/// Discards everything; for headless runs and tests.
pub struct NullAudio;

impl AudioOutput for NullAudio {
    fn play_sound(&mut self, _effect: SoundEffect) {}
    fn play_music(&mut self, _track: MusicTrack) {}
}
