/// Scripted sequences that take over the avatar.
///
/// A scene is boxed into [`super::world::World`]; the driver pulls it
/// out each tick, runs `update`, and calls `finish` once `finished`
/// reports true. Entry effects happen in the scene's constructor, exit
/// effects in `finish`, so a scene always leaves the world in a playable
/// state even when it rewires controls, collision or freezing on entry.
use crate::domain::enemy::Kind;
use crate::domain::physics::JUMP_SPEED_WALK;
use crate::domain::player::{Facing, PlayerBody, PlayerState};

use super::event::{GameEvent, MusicTrack, SoundEffect};
use super::pool::SPECIAL_SLOT;
use super::world::{X_COLLISION, Y_COLLISION};
use super::Ctx;

/// Walk speed cap while a scene steers the avatar.
const AUTOWALK_SPEED: f32 = 0.75;

/// Flag y position that counts as fully lowered.
const FLAG_BOTTOM: f32 = 171.0;

pub trait Cutscene {
    fn update(&mut self, ctx: &mut Ctx);

    fn on_framerule(&mut self, _ctx: &mut Ctx) {}

    fn finished(&self) -> bool;

    /// Exit effects; runs exactly once, after `finished` turns true.
    fn finish(&mut self, ctx: &mut Ctx);
}

// ── Shared scene plumbing ──

/// Every scene takes the controls on entry and hands them back on
/// exit; the return value remembers whether the avatar had them.
fn take_controls(player: &mut PlayerBody) -> bool {
    let was_accepting = player.accept_controls;

    player.accept_controls = false;
    player.visible = true;

    was_accepting
}

fn restore_controls(player: &mut PlayerBody, was_accepting: bool) {
    player.accept_controls = was_accepting;
}

fn stop_player(player: &mut PlayerBody) {
    player.vx = 0.0;
    player.vy = 0.0;
    player.clear_inputs();
}

fn autowalk(player: &mut PlayerBody) {
    player.right_held = true;

    if player.vx > AUTOWALK_SPEED {
        player.vx = AUTOWALK_SPEED;
    }
}

/// One frame of scripted motion with tile collisions, under freeze.
fn step_player_movement(ctx: &mut Ctx) {
    ctx.player.frozen = false;

    let was_on_ground = ctx.player.integrate();
    super::collision::resolve_player_tile_collisions(ctx);
    ctx.player.reconcile_ground(was_on_ground);

    ctx.player.frozen = true;
}

fn step_player_animation(player: &mut PlayerBody) {
    player.frozen = false;
    player.animate_frame();
    player.frozen = true;
}

fn freeze_game(ctx: &mut Ctx) {
    ctx.world.frozen = true;
    ctx.player.frozen = true;
}

fn unfreeze_game(ctx: &mut Ctx) {
    ctx.world.frozen = false;
    ctx.player.frozen = false;
}

// ── Hazard responses ──

/// Shrink a big avatar or kill a small one. Returns true when the hit
/// was absorbed by shrinking.
pub fn damage_player(ctx: &mut Ctx) -> bool {
    if ctx.player.invincibility != 0 {
        return false;
    }

    if ctx.player.is_big() {
        ctx.sound(SoundEffect::Damage);
        ctx.player.size = crate::domain::player::SizeTier::Small;
        ctx.player.invincibility = 8;

        ctx.events.push(GameEvent::PlayerShrunk);
        ctx.world.start_cutscene(Box::new(ShrinkScene::begin(ctx.player)));

        true
    } else {
        kill_player(ctx, false);

        false
    }
}

pub fn kill_player(ctx: &mut Ctx, pit: bool) {
    ctx.player.size = crate::domain::player::SizeTier::Small;
    ctx.audio.play_music(MusicTrack::Death);

    let scene = DeathScene::begin(ctx, pit);
    ctx.world.start_cutscene(Box::new(scene));
}

// ── Size change ──

/// Growth and shrink share the timing: 44 frozen frames stepping
/// through a flicker series, then the interrupted state resumes.
struct SizeChange {
    timer: u8,
    prior_state: PlayerState,
    was_accepting: bool,
}

impl SizeChange {
    fn begin(player: &mut PlayerBody) -> Self {
        let prior_state = player.state;
        let was_accepting = take_controls(player);

        player.on_ground = true;
        player.state = PlayerState::Changing;
        player.anim_frame = 0;
        player.frozen = true;

        SizeChange { timer: 44, prior_state, was_accepting }
    }

    fn tick(&mut self, player: &mut PlayerBody, series: &[u8; 11]) {
        self.timer -= 1;
        player.anim_frame = series[usize::from(self.timer / 4)];
    }

    fn end(&self, ctx: &mut Ctx) {
        ctx.player.state = if self.prior_state == PlayerState::Jumping {
            PlayerState::Walking
        } else {
            self.prior_state
        };

        restore_controls(ctx.player, self.was_accepting);
        unfreeze_game(ctx);
    }
}

pub struct GrowScene {
    inner: SizeChange,
}

impl GrowScene {
    pub fn begin(player: &mut PlayerBody) -> Self {
        GrowScene { inner: SizeChange::begin(player) }
    }
}

impl Cutscene for GrowScene {
    fn update(&mut self, ctx: &mut Ctx) {
        ctx.world.frozen = true;

        const SERIES: [u8; 11] = [2, 2, 1, 0, 2, 1, 0, 1, 0, 1, 0];
        self.inner.tick(ctx.player, &SERIES);
    }

    fn finished(&self) -> bool {
        self.inner.timer == 0
    }

    fn finish(&mut self, ctx: &mut Ctx) {
        self.inner.end(ctx);
    }
}

pub struct ShrinkScene {
    inner: SizeChange,
}

impl ShrinkScene {
    pub fn begin(player: &mut PlayerBody) -> Self {
        ShrinkScene { inner: SizeChange::begin(player) }
    }
}

impl Cutscene for ShrinkScene {
    fn update(&mut self, ctx: &mut Ctx) {
        ctx.world.frozen = true;

        const SERIES: [u8; 11] = [2, 1, 2, 1, 2, 1, 2, 1, 2, 1, 0];
        self.inner.tick(ctx.player, &SERIES);
    }

    fn finished(&self) -> bool {
        self.inner.timer == 0
    }

    fn finish(&mut self, ctx: &mut Ctx) {
        self.inner.end(ctx);
    }
}

// ── Fire flower ──

/// 64 frozen frames of palette cycling while the fire power settles.
pub struct FlowerScene {
    timer: u8,
    was_accepting: bool,
}

impl FlowerScene {
    pub fn begin(player: &mut PlayerBody) -> Self {
        let was_accepting = take_controls(player);

        player.frozen = true;
        player.on_ground = true;
        player.start_palette_animation(4);

        FlowerScene { timer: 64, was_accepting }
    }
}

impl Cutscene for FlowerScene {
    fn update(&mut self, ctx: &mut Ctx) {
        ctx.world.frozen = true;
        self.timer -= 1;
    }

    fn finished(&self) -> bool {
        self.timer == 0
    }

    fn finish(&mut self, ctx: &mut Ctx) {
        if ctx.player.has_starman() {
            // keep the starman flash at its current pace
            let duration = if ctx.player.starman <= crate::domain::player::STARMAN_SLOWDOWN_THRESHOLD
            {
                8
            } else {
                2
            };
            ctx.player.start_palette_animation(duration);
        } else {
            ctx.player.stop_palette_animation();
        }

        restore_controls(ctx.player, self.was_accepting);
        unfreeze_game(ctx);
    }
}

// ── Death ──

/// Twelve framerules of death jingle. A contact death also bounces the
/// corpse; a pit death plays out below the screen.
pub struct DeathScene {
    timer: u8,
    bounce_timer: u8,
    pit: bool,
    was_accepting: bool,
}

impl DeathScene {
    fn begin(ctx: &mut Ctx, pit: bool) -> Self {
        let was_accepting = take_controls(ctx.player);

        ctx.player.frozen = true;
        ctx.world.collision_mode = 0;

        let mut scene = DeathScene { timer: 12, bounce_timer: 0, pit, was_accepting };

        if !pit {
            ctx.player.state = PlayerState::Dead;
            ctx.player.vx = 0.0;
            ctx.player.vy = JUMP_SPEED_WALK;
            ctx.player.gravity = 40;
            ctx.world.frozen = true;

            scene.bounce_timer = 16;
        }

        scene
    }
}

impl Cutscene for DeathScene {
    fn update(&mut self, ctx: &mut Ctx) {
        if self.bounce_timer != 0 {
            self.bounce_timer -= 1;

            if self.bounce_timer == 0 {
                ctx.player.frozen = false;
            }
        }
    }

    fn on_framerule(&mut self, _ctx: &mut Ctx) {
        self.timer = self.timer.saturating_sub(1);
    }

    fn finished(&self) -> bool {
        self.timer == 0
    }

    fn finish(&mut self, ctx: &mut Ctx) {
        if !self.pit {
            ctx.player.state = PlayerState::Idle;
        }

        ctx.player.frozen = false;
        ctx.world.frozen = false;
        ctx.world.collision_mode = X_COLLISION | Y_COLLISION;
        restore_controls(ctx.player, self.was_accepting);

        ctx.record.lives = ctx.record.lives.saturating_sub(1);
        ctx.events.push(GameEvent::PlayerDied { pit: self.pit });
    }
}

// ── Flagpole ──

#[derive(PartialEq, Eq)]
enum FlagpoleRoutine {
    SlidingDown,
    TurnAround,
    LeaveFlag,
    WalkToCastle,
    TimerCountdown,
    Done,
}

/// Slide down the pole, hop off, walk into the castle, then cash the
/// remaining game time in for score.
pub struct FlagpoleScene {
    routine: FlagpoleRoutine,
    routine_timer: u8,
    clear_timer: u8,
    was_accepting: bool,
}

impl FlagpoleScene {
    pub fn begin(ctx: &mut Ctx) -> Self {
        let was_accepting = take_controls(ctx.player);

        let grip_x = (ctx.player.hitbox().x / 16.0).floor() * 16.0 + 9.0;

        stop_player(ctx.player);
        ctx.player.frozen = true;
        ctx.player.state = PlayerState::Climbing;
        ctx.player.anim_frame = 0;
        ctx.player.facing = Facing::Right;
        ctx.player.x = grip_x;
        ctx.player.vy = 2.0;

        let routine;
        let mut routine_timer = 0;

        if ctx.player.y >= 166.0 {
            // grabbed at the very base: skip straight to the walk
            ctx.player.hidden = true;
            ctx.world.scroll_locked = true;
            stop_player(ctx.player);
            ctx.player.state = PlayerState::Walking;
            ctx.player.anim_frame = 2;
            ctx.player.frozen = false;
            ctx.audio.play_music(MusicTrack::LevelClear);

            routine = FlagpoleRoutine::WalkToCastle;
        } else if ctx.player.y >= 164.0 {
            stop_player(ctx.player);
            ctx.player.y = 160.0;
            ctx.player.anim_frame = 0;
            routine_timer = 24;

            routine = FlagpoleRoutine::TurnAround;
        } else {
            if let Some(flag) = ctx.world.pool.special_mut() {
                if let Kind::Flag { moving } = &mut flag.kind {
                    *moving = true;
                }
            }

            routine = FlagpoleRoutine::SlidingDown;
        }

        FlagpoleScene { routine, routine_timer, clear_timer: 0, was_accepting }
    }

    fn flag_reached_bottom(ctx: &Ctx) -> bool {
        match ctx.world.pool.get(SPECIAL_SLOT) {
            Some(flag) if matches!(flag.kind, Kind::Flag { .. }) => flag.y >= FLAG_BOTTOM,
            _ => true,
        }
    }

    fn sliding_down(&mut self, ctx: &mut Ctx) {
        step_player_animation(ctx.player);
        step_player_movement(ctx);

        if Self::flag_reached_bottom(ctx) {
            if let Some(flag) = ctx.world.pool.special_mut() {
                if let Kind::Flag { moving } = &mut flag.kind {
                    *moving = false;
                }
            }

            stop_player(ctx.player);
            self.routine_timer = 2;
            self.routine = FlagpoleRoutine::TurnAround;
        }
    }

    fn turn_around(&mut self, ctx: &mut Ctx) {
        self.routine_timer -= 1;

        if self.routine_timer == 0 {
            ctx.player.x += 14.0;
            ctx.player.facing = Facing::Left;

            self.routine_timer = 24;
            self.routine = FlagpoleRoutine::LeaveFlag;
        }
    }

    fn leave_flag(&mut self, ctx: &mut Ctx) {
        self.routine_timer -= 1;

        if self.routine_timer == 0 {
            ctx.player.state = PlayerState::Walking;
            ctx.player.anim_frame = 2;
            ctx.player.x += 4.0;
            ctx.player.frozen = false;
            ctx.player.vx = 1.1875;

            ctx.audio.play_music(MusicTrack::LevelClear);

            self.routine = FlagpoleRoutine::WalkToCastle;
        }
    }

    fn walk_to_castle(&mut self, ctx: &mut Ctx) {
        autowalk(ctx.player);

        if ctx.player.vx == 0.0 && ctx.player.on_ground {
            ctx.player.hidden = true;
            ctx.world.scroll_locked = true;

            self.routine = FlagpoleRoutine::TimerCountdown;
        }
    }

    fn timer_countdown(&mut self, ctx: &mut Ctx) {
        if ctx.world.game_time != 0 {
            ctx.world.game_time -= 1;
            ctx.record.score += 50;

            autowalk(ctx.player);
        } else {
            self.clear_timer = 6;
            self.routine = FlagpoleRoutine::Done;
        }
    }
}

impl Cutscene for FlagpoleScene {
    fn update(&mut self, ctx: &mut Ctx) {
        match self.routine {
            FlagpoleRoutine::SlidingDown => self.sliding_down(ctx),
            FlagpoleRoutine::TurnAround => self.turn_around(ctx),
            FlagpoleRoutine::LeaveFlag => self.leave_flag(ctx),
            FlagpoleRoutine::WalkToCastle => self.walk_to_castle(ctx),
            FlagpoleRoutine::TimerCountdown => self.timer_countdown(ctx),
            FlagpoleRoutine::Done => {}
        }
    }

    fn on_framerule(&mut self, _ctx: &mut Ctx) {
        if self.routine == FlagpoleRoutine::Done && self.clear_timer != 0 {
            self.clear_timer -= 1;
        }
    }

    fn finished(&self) -> bool {
        self.routine == FlagpoleRoutine::Done && self.clear_timer == 0
    }

    fn finish(&mut self, ctx: &mut Ctx) {
        ctx.player.frozen = false;
        restore_controls(ctx.player, self.was_accepting);

        ctx.world.level_cleared = true;
        ctx.events.push(GameEvent::LevelCleared);
    }
}

// ── Warp pipes ──

/// Walk into a side pipe opening, hidden, then leave for the warp
/// destination.
pub struct SidePipeScene {
    autowalk_timer: u8,
    end_timer: u8,
    was_accepting: bool,
}

impl SidePipeScene {
    pub fn begin(ctx: &mut Ctx) -> Self {
        let was_accepting = take_controls(ctx.player);

        ctx.player.hidden = true;
        stop_player(ctx.player);
        ctx.player.state = PlayerState::Walking;
        ctx.player.anim_frame = 0;

        // walk just past the pipe lip
        let end_x = (ctx.player.hitbox().x / 16.0 + 1.0).trunc() * 16.0 + 2.0;
        let autowalk_timer = ((end_x - ctx.player.x) / AUTOWALK_SPEED) as u8;

        ctx.sound(SoundEffect::Pipe);

        SidePipeScene { autowalk_timer, end_timer: 48, was_accepting }
    }
}

impl Cutscene for SidePipeScene {
    fn update(&mut self, ctx: &mut Ctx) {
        if self.autowalk_timer != 0 {
            self.autowalk_timer -= 1;

            if self.autowalk_timer == 0 {
                ctx.player.right_held = false;
                ctx.player.state = PlayerState::Idle;
                ctx.player.anim_frame = 0;
            } else {
                autowalk(ctx.player);
            }
        } else {
            self.end_timer -= 1;
        }
    }

    fn finished(&self) -> bool {
        self.autowalk_timer == 0 && self.end_timer == 0
    }

    fn finish(&mut self, ctx: &mut Ctx) {
        ctx.player.hidden = false;
        restore_controls(ctx.player, self.was_accepting);

        ctx.world.warp_taken = true;
        ctx.events.push(GameEvent::WarpTaken);
    }
}

/// Sink down into a pipe below, hidden, then leave for the warp
/// destination.
pub struct DownPipeScene {
    end_timer: u8,
    was_accepting: bool,
}

impl DownPipeScene {
    pub fn begin(ctx: &mut Ctx) -> Self {
        let was_accepting = take_controls(ctx.player);

        ctx.player.frozen = true;
        ctx.player.hidden = true;

        if ctx.player.state == PlayerState::Jumping {
            ctx.player.state = if ctx.player.vx != 0.0 {
                PlayerState::Walking
            } else {
                PlayerState::Idle
            };
        }

        ctx.sound(SoundEffect::Pipe);

        DownPipeScene { end_timer: 48, was_accepting }
    }
}

impl Cutscene for DownPipeScene {
    fn update(&mut self, ctx: &mut Ctx) {
        self.end_timer -= 1;

        if self.end_timer == 0 {
            return;
        }

        ctx.player.y += 1.0;

        if ctx.player.state == PlayerState::Walking {
            step_player_animation(ctx.player);
        } else {
            ctx.player.anim_frame = 0;
        }
    }

    fn finished(&self) -> bool {
        self.end_timer == 0
    }

    fn finish(&mut self, ctx: &mut Ctx) {
        ctx.player.frozen = false;
        ctx.player.hidden = false;
        restore_controls(ctx.player, self.was_accepting);

        ctx.world.game_time_timer = ctx.tuning.timing.game_time_tick;
        ctx.world.game_time = ctx.world.game_time.saturating_sub(1);

        ctx.world.warp_taken = true;
        ctx.events.push(GameEvent::WarpTaken);
    }
}
