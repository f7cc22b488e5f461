/// The tick driver: advances the whole simulation by one frame.
///
/// Frame order:
///   1. Framerule clock (every 21st frame: player timers, cutscene,
///      shells, multi-coin window)
///   2. Avatar phases (crouch, jump, movement, friction, gravity,
///      clamp, integrate + tile collisions, fireball throw, state,
///      direction, timers, animation)
///   3. World (cutscene step, powerup pickup, entity pool, pending
///      spawns, fireballs, game time, camera, left clamp)
///   4. Page streaming
///
/// The driver feeds one [`InputFrame`] in and gets the frame's
/// [`GameEvent`]s back; sounds and music leave through the
/// [`AudioOutput`] sink as they happen.
use crate::config::TuningConfig;
use crate::domain::player::{InputFrame, JumpKind, PlayerBody, PlayerRecord};

use super::event::{AudioOutput, GameEvent, MusicTrack, SoundEffect};
use super::world::{Fireball, World};
use super::{behavior, collision, cutscene, Ctx};

pub struct Simulation {
    pub world: World,
    pub player: PlayerBody,
    pub record: PlayerRecord,
    pub tuning: TuningConfig,
    framerule_timer: u8,
}

impl Simulation {
    pub fn new(tuning: TuningConfig) -> Self {
        let mut world = World::new();
        world.reset(tuning.rules.game_time, tuning.timing.game_time_tick);

        Simulation {
            world,
            player: PlayerBody::new(),
            record: PlayerRecord::default(),
            framerule_timer: tuning.timing.framerule_frames,
            tuning,
        }
    }

    /// Back to an empty level; the record survives, the rest restarts.
    pub fn reset(&mut self) {
        self.world
            .reset(self.tuning.rules.game_time, self.tuning.timing.game_time_tick);
        self.player.reset();
        self.player.clear_inputs();
        self.framerule_timer = self.tuning.timing.framerule_frames;
    }

    /// Spatial query for the embedding driver.
    pub fn point_in_tile(&self, x: f32, y: f32) -> bool {
        self.world.tiles.point_in_tile(x, y)
    }

    /// One frame. Returns everything observable that happened in it.
    pub fn update(&mut self, input: InputFrame, audio: &mut dyn AudioOutput) -> Vec<GameEvent> {
        let mut events = Vec::new();

        self.framerule_timer -= 1;
        let framerule = self.framerule_timer == 0;
        if framerule {
            self.framerule_timer = self.tuning.timing.framerule_frames;
        }

        {
            let mut ctx = Ctx {
                world: &mut self.world,
                player: &mut self.player,
                record: &mut self.record,
                audio,
                events: &mut events,
                tuning: &self.tuning,
            };

            if framerule {
                tick_framerule(&mut ctx);
            }

            update_player(&mut ctx, input);
            update_world(&mut ctx);

            if ctx.world.stream_pages(ctx.player) {
                ctx.events.push(GameEvent::PageStreamed);
            }
        }

        events
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Simulation::new(TuningConfig::default())
    }
}

// ── Framerule clock ──

fn tick_framerule(ctx: &mut Ctx) {
    if ctx.player.on_framerule() {
        ctx.audio.play_music(MusicTrack::Theme);
    }

    if let Some(mut scene) = ctx.world.cutscene.take() {
        scene.on_framerule(ctx);

        if ctx.world.cutscene.is_none() {
            ctx.world.cutscene = Some(scene);
        }
    }

    behavior::on_framerule(ctx);

    if ctx.world.multi_coin_timer != 0 {
        ctx.world.multi_coin_timer -= 1;
    }
}

// ── Avatar phases ──

fn update_player(ctx: &mut Ctx, input: InputFrame) {
    ctx.player.latch_input(input);

    ctx.player.handle_crouching();

    if let Some(kind) = ctx.player.handle_jump() {
        ctx.sound(match kind {
            JumpKind::Swim => SoundEffect::Swim,
            JumpKind::Small => SoundEffect::JumpSmall,
            JumpKind::Big => SoundEffect::JumpBig,
        });
    }

    ctx.player.apply_movement();
    ctx.player.apply_friction();
    ctx.player.apply_gravity();
    ctx.player.clamp_velocity();

    if !ctx.player.frozen {
        let on_ground_last_frame = ctx.player.integrate();
        collision::resolve_player_tile_collisions(ctx);
        ctx.player.reconcile_ground(on_ground_last_frame);
    }

    throw_fireball(ctx);

    ctx.player.update_state();
    ctx.player.update_direction();
    ctx.player.tick_input_timers();

    ctx.player.animate_frame();
    ctx.player.animate_palette();
}

fn throw_fireball(ctx: &mut Ctx) {
    if !ctx.player.take_fireball_trigger() {
        return;
    }

    let Some(slot) = ctx.world.fireballs.iter().position(|b| b.is_none()) else {
        return;
    };

    let dir = ctx.player.facing.sign() as i8;
    ctx.world.fireballs[slot] = Some(Fireball::new(ctx.player.x, ctx.player.y + 2.0, dir));

    ctx.player.show_throw_pose();
    ctx.sound(SoundEffect::FireballThrow);
}

// ── World ──

fn update_world(ctx: &mut Ctx) {
    if let Some(mut scene) = ctx.world.cutscene.take() {
        scene.update(ctx);

        if scene.finished() {
            ctx.world.cutscene_active = false;
            scene.finish(ctx);
        } else if ctx.world.cutscene.is_none() {
            ctx.world.cutscene = Some(scene);
        }
    }

    if ctx.world.frozen {
        behavior::update_emerging_powerup(ctx);
    } else {
        behavior::handle_powerup_collisions(ctx);
        behavior::update_sprites(ctx);

        let camera = ctx.world.camera;
        ctx.world.pool.load_pending(camera);
    }

    behavior::update_fireballs(ctx);

    tick_game_time(ctx);

    if !ctx.world.scroll_locked {
        ctx.world.move_camera(ctx.player);
    }

    ctx.world.clamp_player_left(ctx.player);
}

fn tick_game_time(ctx: &mut Ctx) {
    if ctx.world.cutscene_active || ctx.world.game_time == 0 {
        return;
    }

    ctx.world.game_time_timer -= 1;
    if ctx.world.game_time_timer != 0 {
        return;
    }

    ctx.world.game_time_timer = ctx.tuning.timing.game_time_tick;
    ctx.world.game_time -= 1;

    if ctx.world.game_time == 0 {
        cutscene::kill_player(ctx, false);
        ctx.events.push(GameEvent::TimeExpired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::block::Block;
    use crate::domain::enemy::{Enemy, PowerupKind};
    use crate::domain::physics::{JUMP_SPEED_WALK, MAX_WALK_SPEED};
    use crate::domain::player::SizeTier;
    use crate::sim::event::NullAudio;
    use crate::sim::pool::SPECIAL_SLOT;
    use crate::sim::world::STREAM_TRIGGER;

    fn rig() -> Simulation {
        let mut sim = Simulation::default();
        for _ in 0..3 {
            sim.world.tiles.append_page();
        }

        // floor along grid row 10 (pixel top 192), avatar standing on it
        for col in 0..48 {
            sim.world.tiles.set(col, 10, Block::Solid { texture: 1 });
        }
        sim.player.x = 64.0;
        sim.player.y = 160.5;

        sim
    }

    fn run(sim: &mut Simulation, input: InputFrame, frames: u32) -> Vec<GameEvent> {
        let mut audio = NullAudio;
        let mut events = vec![];

        for _ in 0..frames {
            events.extend(sim.update(input, &mut audio));
        }

        events
    }

    // ── Framerule clock ──

    #[test]
    fn framerule_fires_on_the_twenty_first_frame() {
        let mut sim = rig();
        sim.world.multi_coin_timer = 3;

        run(&mut sim, InputFrame::default(), 20);
        assert_eq!(sim.world.multi_coin_timer, 3);

        run(&mut sim, InputFrame::default(), 1);
        assert_eq!(sim.world.multi_coin_timer, 2);

        run(&mut sim, InputFrame::default(), 21);
        assert_eq!(sim.world.multi_coin_timer, 1);
    }

    // ── Avatar phases ──

    #[test]
    fn a_standing_avatar_stays_on_its_floor_row() {
        let mut sim = rig();
        run(&mut sim, InputFrame::default(), 30);

        assert!(sim.player.on_ground);
        assert_eq!(sim.player.x, 64.0);
        assert!(sim.player.y >= 160.0 && sim.player.y < 162.0);
    }

    #[test]
    fn holding_right_walks_up_to_the_speed_cap() {
        let mut sim = rig();
        let input = InputFrame { right: true, ..InputFrame::default() };
        run(&mut sim, input, 60);

        assert_eq!(sim.player.vx, MAX_WALK_SPEED);
        assert!(sim.player.x > 64.0);
    }

    #[test]
    fn a_jump_takes_off_and_comes_back_down() {
        let mut sim = rig();
        let input = InputFrame { jump: true, ..InputFrame::default() };
        run(&mut sim, input, 1);

        assert!(!sim.player.on_ground);
        assert_eq!(sim.player.vy, JUMP_SPEED_WALK + 32.0 / 256.0);

        run(&mut sim, input, 120);
        assert!(sim.player.on_ground);
        assert!(sim.player.y >= 160.0 && sim.player.y < 162.0);
    }

    #[test]
    fn a_fiery_avatar_throws_one_fireball_per_press() {
        let mut sim = rig();
        sim.player.size = SizeTier::Fiery;

        let input = InputFrame { sprint: true, ..InputFrame::default() };
        run(&mut sim, input, 3);

        assert!(sim.world.fireballs[0].is_some());
        assert!(sim.world.fireballs[1].is_none());
        assert!(sim.player.throw_pose);
    }

    // ── Game time ──

    #[test]
    fn expired_game_time_kills_the_avatar() {
        let mut sim = rig();
        sim.world.game_time = 1;
        sim.world.game_time_timer = 1;

        let events = run(&mut sim, InputFrame::default(), 1);

        assert!(events.contains(&GameEvent::TimeExpired));
        assert!(sim.world.cutscene_active);
        assert!(sim.player.frozen);
    }

    #[test]
    fn game_time_holds_still_during_a_cutscene() {
        let mut sim = rig();
        sim.world.game_time = 100;
        sim.world.game_time_timer = 1;
        sim.world.cutscene_active = true;

        run(&mut sim, InputFrame::default(), 5);

        assert_eq!(sim.world.game_time, 100);
        assert_eq!(sim.world.game_time_timer, 1);
    }

    // ── Frozen world ──

    #[test]
    fn a_frozen_world_still_raises_the_emerging_powerup() {
        let mut sim = rig();
        sim.world.frozen = true;
        sim.player.frozen = true;
        sim.world
            .pool
            .add(Enemy::spawn_powerup(PowerupKind::Mushroom, 96.0, 112.0));

        run(&mut sim, InputFrame::default(), 4);

        let powerup = sim.world.pool.get(SPECIAL_SLOT).unwrap();
        assert_eq!(powerup.y, 111.0);
    }

    // ── Camera and streaming ──

    #[test]
    fn the_camera_trails_a_rightbound_avatar() {
        let mut sim = rig();
        sim.player.x = 200.0;
        sim.player.vx = 1.5;

        let input = InputFrame { right: true, ..InputFrame::default() };
        run(&mut sim, input, 1);

        assert!(sim.world.camera > 0.0);
    }

    #[test]
    fn the_left_screen_edge_is_a_wall() {
        let mut sim = rig();
        sim.world.camera = 50.0;
        sim.player.x = 40.0;

        run(&mut sim, InputFrame::default(), 1);

        assert_eq!(sim.player.x, 50.0);
    }

    #[test]
    fn crossing_the_stream_trigger_shifts_a_page() {
        let mut sim = rig();
        sim.world.camera = STREAM_TRIGGER;
        sim.player.x = 400.0;

        let events = run(&mut sim, InputFrame::default(), 1);

        assert!(events.contains(&GameEvent::PageStreamed));
        assert!(sim.world.camera < STREAM_TRIGGER);
        assert_eq!(sim.player.x, 400.0 - 256.0);
    }

    // ── Reset ──

    #[test]
    fn reset_restarts_the_level_but_keeps_the_record() {
        let mut sim = rig();
        sim.record.score = 12_300;
        sim.world.camera = 500.0;
        sim.player.frozen = true;

        sim.reset();

        assert_eq!(sim.record.score, 12_300);
        assert_eq!(sim.world.camera, 0.0);
        assert!(!sim.player.frozen);
        assert_eq!(sim.world.game_time, sim.tuning.rules.game_time);
        assert_eq!(sim.world.tiles.cols(), 0);
    }
}
