/// The avatar: a state machine plus a fixed-point-flavored integrator.
///
/// One tick runs the phases in a fixed order (crouch, jump, movement,
/// friction, gravity, clamp, integrate, state, direction, timers); the
/// driver in [`crate::sim::step`] interleaves tile collision resolution
/// between integration and ground reconciliation. Every phase is a
/// method here so each can be exercised on its own in tests.
use super::physics::{
    self, Rect, ACCEL_SPRINT, ACCEL_WALK, FRICTION_NORMAL, FRICTION_SKID, MAX_RUN_SPEED,
    MAX_SWIM_WALK_SPEED, MAX_WALK_SPEED, SKID_RESOLVE_SPEED, TERMINAL_FALL_SPEED,
};

pub const SPRINT_BUFFER_LENGTH: u8 = 10;

/// Starman framerules left when the palette flash slows down.
pub const STARMAN_SLOWDOWN_THRESHOLD: u8 = 7;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerState {
    Idle,
    Walking,
    Jumping,
    Stopping,
    Climbing,
    Crouching,
    Swimming,
    Changing,
    Dead,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum SizeTier {
    Small,
    Big,
    Fiery,
}

/// One frame of held controls, as sampled by the embedding driver.
#[derive(Clone, Copy, Default, Debug)]
pub struct InputFrame {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub jump: bool,
    pub sprint: bool,
}

/// Persistent scoring state, surviving the avatar's deaths.
#[derive(Clone, Copy, Debug)]
pub struct PlayerRecord {
    pub score: u32,
    pub coins: u32,
    pub lives: u8,
}

impl Default for PlayerRecord {
    fn default() -> Self {
        PlayerRecord { score: 0, coins: 0, lives: 3 }
    }
}

/// Which takeoff a started jump used, for the driver to voice.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpKind {
    Swim,
    Small,
    Big,
}

pub struct PlayerBody {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,

    pub state: PlayerState,
    pub size: SizeTier,
    pub facing: Facing,

    pub on_ground: bool,
    pub rising_from_jump: bool,
    /// Active gravity in 1/256 px units, swapped on jump start and cut.
    pub gravity: u8,
    pub swimming: bool,
    /// Speed class at the start of the current jump or skid.
    pub was_running: bool,

    pub frozen: bool,
    pub hidden: bool,
    pub visible: bool,
    pub accept_controls: bool,

    /// Post-damage mercy window, in framerules.
    pub invincibility: u8,
    pub starman: u8,

    // latched controls
    pub left_held: bool,
    pub right_held: bool,
    pub down_held: bool,
    pub jump_held: bool,
    jump_held_last: bool,
    pub sprint_buffer: u8,
    sprint_edge_last: bool,

    // animation
    pub anim_frame: u8,
    anim_timer: u8,
    pub throw_pose: bool,
    pub sub_palette: u8,
    palette_animating: bool,
    palette_timer: u8,
    palette_duration: u8,
}

impl Default for PlayerBody {
    fn default() -> Self {
        let mut body = PlayerBody {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            state: PlayerState::Idle,
            size: SizeTier::Small,
            facing: Facing::Right,
            on_ground: true,
            rising_from_jump: false,
            gravity: 40,
            swimming: false,
            was_running: false,
            frozen: false,
            hidden: false,
            visible: true,
            accept_controls: true,
            invincibility: 0,
            starman: 0,
            left_held: false,
            right_held: false,
            down_held: false,
            jump_held: false,
            jump_held_last: false,
            sprint_buffer: 0,
            sprint_edge_last: false,
            anim_frame: 0,
            anim_timer: 0,
            throw_pose: false,
            sub_palette: 0,
            palette_animating: false,
            palette_timer: 0,
            palette_duration: 0,
        };
        body.anim_timer = body.animation_timer();
        body
    }
}

impl PlayerBody {
    pub fn new() -> Self {
        PlayerBody::default()
    }

    /// Back to spawn defaults; size, position and record are left alone.
    pub fn reset(&mut self) {
        self.state = PlayerState::Idle;
        self.hidden = false;
        self.visible = true;
        self.frozen = false;
        self.invincibility = 0;
        self.starman = 0;
        self.on_ground = true;
        self.rising_from_jump = false;
        self.was_running = false;
        self.facing = Facing::Right;
        self.vx = 0.0;
        self.vy = 0.0;
        self.gravity = 40;
        self.swimming = false;
        self.anim_frame = 0;
        self.anim_timer = self.animation_timer();
        self.throw_pose = false;
        self.stop_palette_animation();
    }

    // ── Predicates ──

    pub fn is_big(&self) -> bool {
        self.size != SizeTier::Small
    }

    pub fn is_fiery(&self) -> bool {
        self.size == SizeTier::Fiery
    }

    pub fn is_crouching(&self) -> bool {
        self.state == PlayerState::Crouching
    }

    /// Big and not folded down; decides the hitbox and head probes.
    pub fn is_visually_big(&self) -> bool {
        self.is_big() && !self.is_crouching()
    }

    pub fn has_starman(&self) -> bool {
        self.starman != 0
    }

    pub fn is_sprinting(&self) -> bool {
        self.sprint_buffer != 0 && (!self.right_held || !self.left_held)
    }

    fn side_buttons_not_pressed(&self) -> bool {
        !self.left_held && !self.right_held
    }

    pub fn current_absolute_speed(&self) -> f32 {
        physics::quantized_speed(self.vx)
    }

    fn running_at_full_speed(&self) -> bool {
        self.current_absolute_speed() > MAX_WALK_SPEED
    }

    pub fn facing_opposite_of_movement(&self) -> bool {
        self.vx != 0.0
            && if self.vx < 0.0 {
                self.facing == Facing::Right
            } else {
                self.facing == Facing::Left
            }
    }

    pub fn hitbox(&self) -> Rect {
        if self.is_visually_big() {
            Rect::new(self.x + 2.0, self.y + 7.0, 13.0, 25.0)
        } else {
            Rect::new(self.x + 3.0, self.y + 19.0, 13.0, 13.0)
        }
    }

    // ── Input ──

    pub fn latch_input(&mut self, input: InputFrame) {
        if !self.accept_controls {
            return;
        }

        self.left_held = input.left;
        self.right_held = input.right;
        self.down_held = input.down;
        self.jump_held = input.jump;

        if input.sprint {
            self.sprint_buffer = SPRINT_BUFFER_LENGTH;
        }
    }

    pub fn clear_inputs(&mut self) {
        self.left_held = false;
        self.right_held = false;
        self.down_held = false;
        self.jump_held = false;
        self.jump_held_last = false;
        self.sprint_buffer = 0;
    }

    pub fn tick_input_timers(&mut self) {
        if !self.frozen && self.sprint_buffer != 0 {
            self.sprint_buffer -= 1;
        }
    }

    fn on_key_press_left(&mut self) {
        if self.on_ground {
            if self.vx > 0.0 {
                if self.state != PlayerState::Stopping {
                    self.was_running = self.running_at_full_speed();
                }

                self.state = PlayerState::Stopping;
                self.facing = Facing::Left;
            } else if self.state != PlayerState::Walking {
                self.state = PlayerState::Walking;
                self.anim_frame = 2;
            }
        }

        if self.state != PlayerState::Stopping {
            self.vx -= self.acceleration();
        }
    }

    fn on_key_press_right(&mut self) {
        if self.on_ground {
            if self.vx < 0.0 {
                if self.state != PlayerState::Stopping {
                    self.was_running = self.running_at_full_speed();
                }

                self.state = PlayerState::Stopping;
                self.facing = Facing::Right;
            } else if self.state != PlayerState::Walking {
                self.state = PlayerState::Walking;
                self.anim_frame = 2;
            }
        }

        if self.state != PlayerState::Stopping {
            self.vx += self.acceleration();
        }
    }

    // ── Physics phases ──

    fn acceleration(&self) -> f32 {
        let sprint = if !self.swimming && self.on_ground {
            self.is_sprinting()
        } else {
            self.was_running
        };

        let base = if sprint { ACCEL_SPRINT } else { ACCEL_WALK };

        if self.facing_opposite_of_movement() {
            base * 2.0
        } else {
            base
        }
    }

    fn max_speed(&self) -> f32 {
        if self.swimming {
            if self.on_ground {
                MAX_SWIM_WALK_SPEED
            } else {
                MAX_WALK_SPEED
            }
        } else {
            let sprint = if self.on_ground { self.is_sprinting() } else { self.was_running };
            if sprint {
                MAX_RUN_SPEED
            } else {
                MAX_WALK_SPEED
            }
        }
    }

    pub fn apply_movement(&mut self) {
        if self.frozen {
            return;
        }

        if !self.down_held && (self.left_held != self.right_held) {
            if self.left_held {
                self.on_key_press_left();
            } else {
                self.on_key_press_right();
            }
        }

        if self.vx != 0.0 && self.current_absolute_speed() <= 0.625 {
            if self.state == PlayerState::Stopping {
                // skid resolved: hand back a nudge in the new direction
                let residual = if self.is_sprinting() {
                    0.125
                } else if self.facing == Facing::Left {
                    0.0625
                } else {
                    0.0
                };
                self.vx = (residual + SKID_RESOLVE_SPEED) * self.facing.sign();

                self.state = PlayerState::Walking;
                self.anim_frame = 2;
            } else if self.is_sprinting() && self.side_buttons_not_pressed() && self.on_ground {
                self.vx = 0.0;
            }
        }
    }

    pub fn apply_friction(&mut self) {
        let decelerating = self.side_buttons_not_pressed()
            || self.state == PlayerState::Stopping
            || self.down_held;

        if self.on_ground && self.vx != 0.0 && !self.frozen && decelerating {
            let friction = if self.state == PlayerState::Stopping {
                if self.was_running {
                    FRICTION_SKID
                } else {
                    FRICTION_NORMAL * 2.0
                }
            } else {
                FRICTION_NORMAL
            };

            if self.vx > 0.0 {
                self.vx = (self.vx - friction).max(0.0);
            } else {
                self.vx = (self.vx + friction).min(0.0);
            }
        }
    }

    pub fn apply_gravity(&mut self) {
        if !self.frozen {
            self.vy += f32::from(self.gravity) / 256.0;

            if self.rising_from_jump && self.vy >= 0.0 {
                self.end_jump();
            }
        }
    }

    pub fn clamp_velocity(&mut self) {
        if self.state != PlayerState::Stopping {
            let max = self.max_speed();
            self.vx = self.vx.clamp(-max, max);
        }

        if self.vy > TERMINAL_FALL_SPEED {
            self.vy = TERMINAL_FALL_SPEED;
        }
    }

    /// Move by the frame velocity. The caller resolves tile collisions
    /// next and then feeds the returned ground flag to
    /// [`reconcile_ground`](Self::reconcile_ground).
    pub fn integrate(&mut self) -> bool {
        self.x += self.vx;
        self.y += self.vy;

        self.on_ground
    }

    /// State fixups after collisions, keyed off the ground transition.
    pub fn reconcile_ground(&mut self, on_ground_last_frame: bool) {
        if self.swimming && self.vy < 0.0 && self.y < 20.0 {
            self.vy = 0.0;
        }

        if on_ground_last_frame == self.on_ground {
            return;
        }

        if self.on_ground {
            // landed this frame
            if self.facing_opposite_of_movement() {
                self.state = PlayerState::Stopping;
            }
        } else {
            // walked off an edge this frame
            if self.state == PlayerState::Stopping || self.state == PlayerState::Idle {
                self.state = PlayerState::Walking;
                self.anim_frame = 2;
            }

            self.was_running = self.running_at_full_speed();
        }
    }

    // ── Jumping ──

    pub fn start_jump(&mut self) -> Option<JumpKind> {
        if !self.on_ground && !self.swimming {
            return None;
        }

        let running = self.running_at_full_speed();
        self.was_running = running;
        self.rising_from_jump = true;
        self.gravity = physics::rising_gravity(self.swimming, self.vx);
        self.on_ground = false;

        if self.swimming {
            self.vy = physics::JUMP_SPEED_SWIM;
            self.state = PlayerState::Swimming;
            self.anim_frame = 1;

            Some(JumpKind::Swim)
        } else {
            self.vy = if running { physics::JUMP_SPEED_RUN } else { physics::JUMP_SPEED_WALK };

            if !self.is_crouching() {
                self.state = PlayerState::Jumping;
            }
            self.anim_frame = 0;

            Some(if self.is_big() { JumpKind::Big } else { JumpKind::Small })
        }
    }

    pub fn end_jump(&mut self) {
        self.rising_from_jump = false;
        self.gravity = physics::falling_gravity(self.swimming, self.vx);
    }

    pub fn handle_jump(&mut self) -> Option<JumpKind> {
        let started = if !self.jump_held {
            if self.rising_from_jump {
                self.end_jump();
            }
            None
        } else if !self.jump_held_last {
            self.start_jump()
        } else {
            None
        };

        self.jump_held_last = self.jump_held;
        started
    }

    // ── Fireball trigger ──

    /// Edge-detects a fresh sprint press; one press, one throw.
    pub fn take_fireball_trigger(&mut self) -> bool {
        if self.frozen {
            return false;
        }

        let pressed_this_frame = self.sprint_buffer == SPRINT_BUFFER_LENGTH;
        let triggered = self.is_fiery() && pressed_this_frame && !self.sprint_edge_last;
        self.sprint_edge_last = pressed_this_frame;

        triggered
    }

    pub fn show_throw_pose(&mut self) {
        self.anim_timer = self.animation_timer();
        self.throw_pose = true;
    }

    // ── Direction and state ──

    pub fn update_direction(&mut self) {
        if self.frozen {
            return;
        }

        if self.swimming {
            if self.left_held {
                self.facing = Facing::Left;
            } else if self.right_held {
                self.facing = Facing::Right;
            }
        } else if self.on_ground && self.vx != 0.0 && self.state != PlayerState::Stopping {
            self.facing = if self.vx > 0.0 && (!self.right_held || !self.left_held) {
                Facing::Right
            } else {
                Facing::Left
            };
        }
    }

    pub fn handle_crouching(&mut self) {
        if !self.on_ground {
            return;
        }

        if self.down_held && self.side_buttons_not_pressed() {
            if self.is_visually_big() {
                self.state = PlayerState::Crouching;
            }
        } else if self.is_crouching() {
            if self.side_buttons_not_pressed() {
                self.state = PlayerState::Idle;
            } else {
                self.state = PlayerState::Walking;
                self.anim_frame = 2;
            }
        }
    }

    pub fn update_state(&mut self) {
        if !self.frozen
            && self.on_ground
            && self.state != PlayerState::Stopping
            && self.state != PlayerState::Dead
            && !self.is_crouching()
        {
            if self.vx == 0.0 && (self.down_held || self.side_buttons_not_pressed()) {
                self.state = PlayerState::Idle;
            } else if self.state != PlayerState::Walking {
                self.state = PlayerState::Walking;
                self.anim_frame = 2;
            }
        }
    }

    // ── Collision events ──

    pub fn on_side_collision(&mut self) {
        self.vx = 0.0;

        if self.state == PlayerState::Stopping {
            self.state = PlayerState::Idle;
        }
    }

    pub fn on_head_collision(&mut self) {
        self.end_jump();
    }

    pub fn on_feet_collision(&mut self) {
        self.vy = 0.0;
        self.on_ground = true;

        if self.state == PlayerState::Climbing {
            self.anim_frame = 0;
        }
    }

    // ── Framerule timers ──

    /// Counts down starman and mercy invincibility. Returns true when
    /// the starman wore off far enough that the theme music resumes.
    pub fn on_framerule(&mut self) -> bool {
        let mut resume_music = false;

        if self.starman != 0 {
            self.starman -= 1;

            if self.starman == 0 {
                self.stop_palette_animation();
            } else if self.starman == 3 {
                resume_music = true;
            } else if self.starman == STARMAN_SLOWDOWN_THRESHOLD {
                self.palette_duration = 8;
            }
        }

        if self.invincibility != 0 {
            self.invincibility -= 1;
            if self.invincibility == 0 {
                self.visible = true;
            }
        }

        resume_music
    }

    // ── Animation ──

    fn animation_frames(&self) -> u8 {
        match self.state {
            PlayerState::Walking => 3,
            PlayerState::Climbing => 2,
            PlayerState::Swimming => 5,
            _ => 1,
        }
    }

    fn animation_timer(&self) -> u8 {
        if self.state == PlayerState::Climbing {
            return 4;
        }

        let speed = (self.current_absolute_speed() * 16.0) as u8;

        if speed > 27 && !self.swimming {
            2
        } else if speed > 13 {
            4
        } else {
            7
        }
    }

    pub fn animate_frame(&mut self) {
        if !self.frozen {
            self.anim_timer = self.anim_timer.wrapping_sub(1);

            if self.anim_timer == 0 {
                self.anim_timer = self.animation_timer();
                self.throw_pose = false;

                let advance = (self.state == PlayerState::Walking && self.on_ground)
                    || (self.state == PlayerState::Swimming
                        && (self.anim_frame != 0 || self.vy < 0.0))
                    || (self.state == PlayerState::Climbing && self.vy != 0.0);

                if advance {
                    self.anim_frame += 1;
                }
            }

            self.anim_frame %= self.animation_frames();
        }

        if self.invincibility != 0 {
            self.visible = !self.visible;
        }
    }

    pub fn start_palette_animation(&mut self, duration: u8) {
        self.palette_animating = true;
        self.palette_duration = duration;
        self.palette_timer = duration;
    }

    pub fn stop_palette_animation(&mut self) {
        self.palette_animating = false;
        self.sub_palette = 0;
    }

    pub fn animate_palette(&mut self) {
        if self.palette_animating {
            self.palette_timer -= 1;
            if self.palette_timer == 0 {
                self.palette_timer = self.palette_duration;
                self.sub_palette = (self.sub_palette + 1) % 4;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded(vx: f32) -> PlayerBody {
        let mut p = PlayerBody::new();
        p.vx = vx;
        p
    }

    fn held(left: bool, right: bool) -> InputFrame {
        InputFrame { left, right, ..InputFrame::default() }
    }

    // ── Movement ──

    #[test]
    fn pressing_against_motion_starts_a_skid() {
        let mut p = grounded(2.0);
        p.latch_input(held(true, false));
        p.apply_movement();

        assert_eq!(p.state, PlayerState::Stopping);
        assert_eq!(p.facing, Facing::Left);
        assert!(p.was_running);

        // skid friction bites harder than normal deceleration
        p.apply_friction();
        assert!((p.vx - (2.0 - FRICTION_SKID)).abs() < 1e-6);
    }

    #[test]
    fn skid_resolves_into_a_nudge_the_other_way() {
        let mut p = grounded(0.5);
        p.state = PlayerState::Stopping;
        p.facing = Facing::Left;
        p.latch_input(held(true, false));
        p.apply_movement();

        assert_eq!(p.state, PlayerState::Walking);
        assert_eq!(p.anim_frame, 2);
        assert!(p.vx < 0.0);
        assert!((p.vx + (0.0625 + SKID_RESOLVE_SPEED)).abs() < 1e-6);
    }

    #[test]
    fn holding_both_directions_cancels_out() {
        let mut p = grounded(0.0);
        p.latch_input(held(true, true));
        p.apply_movement();
        assert_eq!(p.vx, 0.0);
        assert_eq!(p.state, PlayerState::Idle);
    }

    #[test]
    fn walk_speed_is_capped_unless_sprinting() {
        let mut p = grounded(2.2);
        p.clamp_velocity();
        assert_eq!(p.vx, MAX_WALK_SPEED);

        let mut p = grounded(3.0);
        p.latch_input(InputFrame { right: true, sprint: true, ..InputFrame::default() });
        p.clamp_velocity();
        assert_eq!(p.vx, MAX_RUN_SPEED);
    }

    // ── Jumping ──

    #[test]
    fn jump_speed_depends_on_takeoff_speed() {
        let mut slow = grounded(1.0);
        slow.jump_held = true;
        assert_eq!(slow.handle_jump(), Some(JumpKind::Small));
        assert_eq!(slow.vy, physics::JUMP_SPEED_WALK);
        assert_eq!(slow.gravity, 30);
        assert!(!slow.on_ground);

        let mut fast = grounded(2.5);
        fast.jump_held = true;
        fast.handle_jump();
        assert_eq!(fast.vy, physics::JUMP_SPEED_RUN);
        assert_eq!(fast.gravity, 40);
        assert!(fast.was_running);
    }

    #[test]
    fn releasing_jump_cuts_the_rise() {
        let mut p = grounded(0.0);
        p.jump_held = true;
        p.handle_jump();
        assert!(p.rising_from_jump);

        p.jump_held = false;
        p.handle_jump();
        assert!(!p.rising_from_jump);
        assert_eq!(p.gravity, 112);
    }

    #[test]
    fn rise_ends_naturally_at_the_apex() {
        let mut p = grounded(0.0);
        p.jump_held = true;
        p.handle_jump();

        p.vy = -0.05;
        p.apply_gravity();
        assert!(!p.rising_from_jump);
        assert_eq!(p.gravity, 112);
    }

    #[test]
    fn air_jump_is_refused_but_swim_stroke_is_not() {
        let mut p = grounded(0.0);
        p.on_ground = false;
        assert_eq!(p.start_jump(), None);

        p.swimming = true;
        assert_eq!(p.start_jump(), Some(JumpKind::Swim));
        assert_eq!(p.vy, physics::JUMP_SPEED_SWIM);
        assert_eq!(p.state, PlayerState::Swimming);
    }

    #[test]
    fn fall_speed_is_clamped() {
        let mut p = grounded(0.0);
        p.vy = 9.0;
        p.clamp_velocity();
        assert_eq!(p.vy, TERMINAL_FALL_SPEED);
    }

    // ── Crouching and state ──

    #[test]
    fn only_a_big_player_crouches() {
        let mut small = grounded(0.0);
        small.latch_input(InputFrame { down: true, ..InputFrame::default() });
        small.handle_crouching();
        assert_ne!(small.state, PlayerState::Crouching);

        let mut big = grounded(0.0);
        big.size = SizeTier::Big;
        big.latch_input(InputFrame { down: true, ..InputFrame::default() });
        big.handle_crouching();
        assert_eq!(big.state, PlayerState::Crouching);
        assert_eq!(big.hitbox().h, 13.0);
    }

    #[test]
    fn landing_against_motion_resumes_the_skid() {
        let mut p = grounded(-1.0);
        p.facing = Facing::Right;
        p.on_ground = true;
        p.reconcile_ground(false);
        assert_eq!(p.state, PlayerState::Stopping);
    }

    #[test]
    fn walking_off_an_edge_keeps_the_speed_class() {
        let mut p = grounded(2.0);
        p.on_ground = false;
        p.reconcile_ground(true);
        assert!(p.was_running);
        assert_eq!(p.state, PlayerState::Walking);
        assert_eq!(p.anim_frame, 2);
    }

    // ── Timers and triggers ──

    #[test]
    fn sprint_buffer_decays_and_gates_sprinting() {
        let mut p = grounded(0.0);
        p.latch_input(InputFrame { sprint: true, ..InputFrame::default() });
        assert!(p.is_sprinting());

        for _ in 0..SPRINT_BUFFER_LENGTH {
            p.tick_input_timers();
        }
        assert!(!p.is_sprinting());
    }

    #[test]
    fn fireball_trigger_fires_once_per_press() {
        let mut p = grounded(0.0);
        p.size = SizeTier::Fiery;
        p.latch_input(InputFrame { sprint: true, ..InputFrame::default() });

        assert!(p.take_fireball_trigger());
        p.latch_input(InputFrame { sprint: true, ..InputFrame::default() });
        assert!(!p.take_fireball_trigger());
    }

    #[test]
    fn mercy_invincibility_blinks_then_restores() {
        let mut p = grounded(0.0);
        p.invincibility = 1;
        p.animate_frame();
        assert!(!p.visible);

        p.on_framerule();
        assert_eq!(p.invincibility, 0);
        assert!(p.visible);
    }
}
