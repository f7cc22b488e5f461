/// Movement tuning tables and geometry primitives.
///
/// All velocities are px/frame. Sub-pixel speed is quantized to 1/16 px
/// before bucketing, mirroring the fixed-point integrator this models:
///
///   quantized |vx|   | bucket  | rising gravity | falling gravity
///   -----------------+---------+----------------+----------------
///   < 1.0            | Slow    | 32/256         | 112/256
///   1.0 ..= 1.5      | Walk    | 30/256         |  96/256
///   > 1.5            | Run     | 40/256         | 144/256
///
/// Swimming overrides both columns (13/256 rising, 10/256 falling).

pub const TILE: f32 = 16.0;
pub const VIEW_W: f32 = 256.0;
pub const VIEW_H: f32 = 240.0;

pub const MAX_WALK_SPEED: f32 = 1.5;
pub const MAX_RUN_SPEED: f32 = 2.5;
pub const MAX_SWIM_WALK_SPEED: f32 = 1.0;

pub const ACCEL_WALK: f32 = 152.0 / 256.0 / 16.0;
pub const ACCEL_SPRINT: f32 = 228.0 / 256.0 / 16.0;
pub const FRICTION_NORMAL: f32 = 152.0 / 256.0 / 16.0;
pub const FRICTION_SKID: f32 = 416.0 / 256.0 / 16.0;

/// Residual speed granted in the new facing direction when a skid
/// resolves below the stop threshold.
pub const SKID_RESOLVE_SPEED: f32 = 9.0 / 11.0 / 16.0;

/// Hard ceiling on downward velocity, applied after gravity integration.
pub const TERMINAL_FALL_SPEED: f32 = 4.0;

pub const JUMP_SPEED_WALK: f32 = -4.0;
pub const JUMP_SPEED_RUN: f32 = -5.0;
pub const JUMP_SPEED_SWIM: f32 = -2.0;
pub const STOMP_BOUNCE_SPEED: f32 = -4.0;

/// Vertical penetration under which a tile hit registers this frame.
pub const PENETRATION_THRESHOLD: f32 = 5.0;

// ── Speed buckets ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpeedBucket {
    Slow,
    Walk,
    Run,
}

/// |vx| floored to 1/16 px steps, the precision the tables are keyed on.
pub fn quantized_speed(vx: f32) -> f32 {
    ((vx * 16.0) as i32 as f32 / 16.0).abs()
}

pub fn speed_bucket(vx: f32) -> SpeedBucket {
    let speed = quantized_speed(vx);
    if speed < 1.0 {
        SpeedBucket::Slow
    } else if speed <= MAX_WALK_SPEED {
        SpeedBucket::Walk
    } else {
        SpeedBucket::Run
    }
}

/// Gravity while a held jump is still rising, in 1/256 px units.
pub fn rising_gravity(swimming: bool, vx: f32) -> u8 {
    if swimming {
        return 13;
    }

    match speed_bucket(vx) {
        SpeedBucket::Slow => 32,
        SpeedBucket::Walk => 30,
        SpeedBucket::Run => 40,
    }
}

/// Gravity once the jump is cut or the apex is passed, in 1/256 px units.
pub fn falling_gravity(swimming: bool, vx: f32) -> u8 {
    if swimming {
        return 10;
    }

    match speed_bucket(vx) {
        SpeedBucket::Slow => 112,
        SpeedBucket::Walk => 96,
        SpeedBucket::Run => 144,
    }
}

pub fn jump_speed(swimming: bool, vx: f32) -> f32 {
    if swimming {
        JUMP_SPEED_SWIM
    } else if speed_bucket(vx) == SpeedBucket::Run {
        JUMP_SPEED_RUN
    } else {
        JUMP_SPEED_WALK
    }
}

// ── Geometry ──

/// Axis-aligned box, top-left anchored.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}
