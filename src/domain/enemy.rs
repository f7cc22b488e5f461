/// Enemy archetypes as plain data.
///
/// An [`Enemy`] is one pool slot: shared fields plus a [`Kind`] payload
/// carrying the archetype's private state. Movement and contact rules
/// live in [`crate::sim::behavior`]; this module holds what can be
/// answered without a world: spawn defaults, hitboxes, capability
/// queries and the score tables.
use super::physics::Rect;

// ── Oscillator ──

/// Cubic-eased ping-pong driver for floaters and oscillating lifts.
///
/// A cycle is four phases of `phase_duration + 1` frames: ease in up,
/// ease out to the far side, then back. Returns the current offset and
/// advances one frame.
#[derive(Clone, Copy, Default, Debug)]
pub struct Oscillator {
    frame: u8,
    phase: u8,
}

impl Oscillator {
    pub fn offset(&mut self, phase_duration: u8, halfway_distance: u8) -> f32 {
        fn ease_in(t: f32) -> f32 {
            t * t * t
        }

        fn ease_out(t: f32) -> f32 {
            let t = 1.0 - t;
            1.0 - t * t * t
        }

        const PHASE_BASE: [f32; 4] = [0.0, 1.0, 2.0, 1.0];
        const PHASE_DIR: [f32; 4] = [1.0, 1.0, -1.0, -1.0];

        let t = f32::from(self.frame) / f32::from(phase_duration);
        let normalized = if self.phase % 2 == 1 { ease_out(t) } else { ease_in(t) };
        let scalar = PHASE_BASE[usize::from(self.phase)] + PHASE_DIR[usize::from(self.phase)] * normalized;

        self.frame += 1;
        if self.frame > phase_duration {
            self.frame = 0;
            self.phase = (self.phase + 1) % 4;
        }

        f32::from(halfway_distance) * scalar
    }
}

// ── Archetype payloads ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShellKind {
    Trooper,
    RedTrooper,
    Beetle,
}

impl ShellKind {
    /// Beetle shells shrug off fireballs.
    pub fn is_fireproof(self) -> bool {
        matches!(self, ShellKind::Beetle)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ShellState {
    pub kind: ShellKind,
    pub moving: bool,
    pub flipped: bool,
    /// Framerules until the shell revives, counts while resting.
    pub revival: u8,
    pub kill_chain: u8,
}

impl ShellState {
    pub fn resting(kind: ShellKind, revival: u8) -> Self {
        ShellState { kind, moving: false, flipped: false, revival, kill_chain: 0 }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum LiftKind {
    Constant,
    Oscillating { vertical: bool, origin: f32, osc: Oscillator },
    /// Sinks while ridden.
    Falling,
    /// One side of a counterweight pair; `partner` is the other slot.
    Balance { partner: Option<usize> },
}

#[derive(Clone, Copy, Debug)]
pub struct LiftState {
    pub kind: LiftKind,
    /// Platform width in 8 px segments.
    pub size: u8,
}

#[derive(Clone, Copy, Debug)]
pub struct SpringState {
    /// Compression countdown; zero means armed.
    pub timer: u8,
    pub stage: u8,
    pub big_jump: bool,
    pub jump_held_last: bool,
    pub pivot_x: f32,
    pub pivot_y: f32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerupKind {
    Mushroom,
    Flower,
    Star,
    OneUp,
}

#[derive(Clone, Copy, Debug)]
pub struct PowerupState {
    pub kind: PowerupKind,
    /// Frames left of rising out of the block.
    pub emerge: u8,
}

/// Everything one pool slot can hold. The last four variants are
/// passive props that skip the enemy contact pass.
#[derive(Clone, Copy, Debug)]
pub enum Kind {
    Grub,
    /// Squashed grub, lingers then vanishes.
    GrubFlat { timer: u8 },
    Trooper { red: bool },
    Beetle,
    /// Winged hopper, bounces off the ground.
    Hopper,
    /// Winged floater, rides a vertical oscillation.
    Floater { origin_y: f32, osc: Oscillator },
    Shell(ShellState),
    SpikeEgg,
    Spike,
    Plant { pause: u8, move_timer: u8 },
    Fish,
    Bullet,
    Hammerer,
    Lift(LiftState),
    Flag { moving: bool },
    StarFlag,
    Spring(SpringState),
    Powerup(PowerupState),
}

// ── Enemy ──

pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    /// -1 left, 0 still, 1 right.
    pub dir: i8,
    pub slot: usize,
    pub on_ground: bool,
    pub touching_player: bool,
    pub remove: bool,
    pub animate: bool,
    pub sub_palette: u8,
    pub kind: Kind,
}

pub const POWERUP_EMERGE_FRAMES: u8 = 48;
pub const GRUB_FLAT_FRAMES: u8 = 36;
pub const PLANT_PAUSE_FRAMES: u8 = 64;

impl Enemy {
    pub fn spawn(kind: Kind, x: f32, y: f32) -> Self {
        let mut enemy = Enemy {
            x,
            y,
            vy: 0.0,
            dir: -1,
            slot: 0,
            on_ground: false,
            touching_player: false,
            remove: false,
            animate: true,
            sub_palette: 0,
            kind,
        };

        match &mut enemy.kind {
            Kind::Grub => enemy.sub_palette = 3,
            Kind::GrubFlat { .. } => {
                enemy.sub_palette = 3;
                enemy.dir = 0;
                enemy.animate = false;
            }
            Kind::Trooper { red } => enemy.sub_palette = if *red { 2 } else { 1 },
            Kind::Beetle => enemy.sub_palette = 3,
            Kind::Hopper => enemy.sub_palette = 1,
            Kind::Floater { origin_y, .. } => {
                enemy.sub_palette = 2;
                *origin_y = y;
            }
            Kind::Shell(state) => {
                if !state.moving {
                    enemy.dir = 0;
                }
                enemy.animate = false;
            }
            Kind::SpikeEgg | Kind::Spike => enemy.sub_palette = 2,
            Kind::Plant { .. } | Kind::Fish | Kind::Bullet | Kind::Hammerer => {
                enemy.sub_palette = 1;
            }
            Kind::Lift(_) => {
                enemy.sub_palette = 2;
                enemy.animate = false;
            }
            Kind::Flag { .. } => enemy.sub_palette = 1,
            Kind::StarFlag => enemy.sub_palette = 2,
            Kind::Spring(_) => enemy.sub_palette = 2,
            Kind::Powerup(state) => {
                enemy.y -= 4.0;
                enemy.dir = 1;
                enemy.sub_palette = match state.kind {
                    PowerupKind::Mushroom => 2,
                    PowerupKind::Flower => {
                        enemy.dir = 0;
                        3
                    }
                    PowerupKind::Star => {
                        enemy.vy = -1.0;
                        1
                    }
                    PowerupKind::OneUp => 1,
                };
            }
        }

        enemy
    }

    pub fn spawn_powerup(kind: PowerupKind, x: f32, y: f32) -> Self {
        Enemy::spawn(
            Kind::Powerup(PowerupState { kind, emerge: POWERUP_EMERGE_FRAMES }),
            x,
            y,
        )
    }

    pub fn hitbox(&self) -> Rect {
        match self.kind {
            Kind::Grub | Kind::GrubFlat { .. } | Kind::Plant { .. } | Kind::Fish | Kind::Bullet => {
                Rect::new(self.x + 3.0, self.y + 21.0, 11.0, 7.0)
            }
            Kind::Trooper { .. } | Kind::Beetle | Kind::Shell(_) => {
                Rect::new(self.x + 2.0, self.y + 16.0, 12.0, 13.0)
            }
            Kind::Hopper | Kind::Floater { .. } => {
                Rect::new(self.x + 2.0, self.y + 16.0, 13.0, 13.0)
            }
            Kind::SpikeEgg => Rect::new(self.x + 2.0, self.y + 22.0, 13.0, 5.0),
            Kind::Spike => Rect::new(self.x + 2.0, self.y + 21.0, 11.0, 7.0),
            Kind::Hammerer => Rect::new(self.x + 2.0, self.y + 11.0, 9.0, 25.0),
            Kind::Lift(lift) => {
                Rect::new(self.x, self.y, f32::from(lift.size) * 8.0, 8.0)
            }
            Kind::Powerup(_) => Rect::new(self.x + 3.0, self.y + 16.0, 10.0, 16.0),
            Kind::Flag { .. } | Kind::StarFlag | Kind::Spring(_) => {
                Rect::new(self.x, self.y, 0.0, 0.0)
            }
        }
    }

    // ── Capabilities ──

    /// Participates in the player contact pass.
    pub fn is_contact_enemy(&self) -> bool {
        !matches!(
            self.kind,
            Kind::Flag { .. } | Kind::StarFlag | Kind::Spring(_) | Kind::Powerup(_)
        )
    }

    pub fn is_stompable(&self) -> bool {
        matches!(
            self.kind,
            Kind::Grub
                | Kind::Trooper { .. }
                | Kind::Beetle
                | Kind::Hopper
                | Kind::Floater { .. }
                | Kind::Shell(_)
                | Kind::Fish
                | Kind::Bullet
                | Kind::Hammerer
        )
    }

    /// Touching it cannot hurt the player.
    pub fn is_harmless(&self) -> bool {
        matches!(self.kind, Kind::GrubFlat { .. } | Kind::Lift(_))
    }

    pub fn is_lift(&self) -> bool {
        matches!(self.kind, Kind::Lift(_))
    }

    pub fn is_shell(&self) -> bool {
        matches!(self.kind, Kind::Shell(_))
    }

    pub fn is_fireproof(&self) -> bool {
        match self.kind {
            Kind::Beetle => true,
            Kind::Shell(state) => state.kind.is_fireproof(),
            Kind::Lift(_) | Kind::Flag { .. } | Kind::StarFlag | Kind::Spring(_) | Kind::Powerup(_) => true,
            _ => false,
        }
    }

    /// Collides with and turns around other walkers.
    pub fn bumps_into_others(&self) -> bool {
        matches!(
            self.kind,
            Kind::Grub
                | Kind::GrubFlat { .. }
                | Kind::Trooper { .. }
                | Kind::Beetle
                | Kind::Hopper
                | Kind::Shell(_)
        )
    }

    /// Uses the shorter left despawn margin.
    pub fn uses_special_despawn_margin(&self) -> bool {
        matches!(self.kind, Kind::Plant { .. } | Kind::Hammerer | Kind::Spring(_))
    }

    pub fn face_away_from(&mut self, x: f32) {
        self.dir = if self.x > x { 1 } else { -1 };
    }

    pub fn face_towards(&mut self, x: f32) {
        self.dir = if self.x > x { -1 } else { 1 };
    }
}

// ── Score tables ──

/// Consecutive-stomp scores; past the table the reward is a life.
pub fn stomp_chain_score(chain: u8) -> Option<u32> {
    const POINTS: [u32; 10] = [1, 2, 4, 5, 8, 10, 20, 40, 50, 80];

    POINTS.get(usize::from(chain)).map(|p| p * 100)
}

/// Scores for enemies mowed down by one moving shell.
pub fn shell_chain_score(chain: u8) -> Option<u32> {
    const POINTS: [u32; 7] = [5, 8, 10, 20, 40, 50, 80];

    POINTS.get(usize::from(chain)).map(|p| p * 100)
}

/// Flat stomp value, or None for the chain-scored kinds.
pub fn fixed_stomp_score(kind: &Kind) -> Option<u32> {
    match kind {
        Kind::Hopper => Some(400),
        Kind::Hammerer => Some(1000),
        Kind::Fish | Kind::Bullet => Some(200),
        _ => None,
    }
}

/// Starman or fireball kill value.
pub fn touch_kill_score(kind: &Kind) -> u32 {
    match kind {
        Kind::Grub => 100,
        Kind::Hammerer => 1000,
        _ => 200,
    }
}

pub fn block_defeat_score(kind: &Kind) -> u32 {
    match kind {
        Kind::Hammerer => 1000,
        _ => 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Oscillator ──

    #[test]
    fn oscillator_ramps_to_the_halfway_point() {
        let mut osc = Oscillator::default();
        assert_eq!(osc.offset(100, 52), 0.0);

        for _ in 0..99 {
            osc.offset(100, 52);
        }

        // end of the ease-in phase meets the start of the ease-out phase
        assert_eq!(osc.offset(100, 52), 52.0);
        assert_eq!(osc.offset(100, 52), 52.0);
    }

    #[test]
    fn oscillator_peaks_at_twice_halfway() {
        let mut osc = Oscillator::default();
        let mut peak = 0.0f32;

        for _ in 0..404 {
            peak = peak.max(osc.offset(100, 26));
        }

        assert_eq!(peak, 52.0);
    }

    // ── Spawn defaults ──

    #[test]
    fn flat_grub_spawns_inert() {
        let flat = Enemy::spawn(Kind::GrubFlat { timer: GRUB_FLAT_FRAMES }, 64.0, 160.0);
        assert_eq!(flat.dir, 0);
        assert!(!flat.animate);
        assert!(flat.is_harmless());
        assert!(!flat.is_stompable());
    }

    #[test]
    fn star_powerup_spawns_rising() {
        let star = Enemy::spawn_powerup(PowerupKind::Star, 80.0, 128.0);
        assert_eq!(star.vy, -1.0);
        assert_eq!(star.y, 124.0);
        assert!(!star.is_contact_enemy());
    }

    #[test]
    fn flower_does_not_walk() {
        let flower = Enemy::spawn_powerup(PowerupKind::Flower, 80.0, 128.0);
        assert_eq!(flower.dir, 0);
    }

    // ── Capabilities ──

    #[test]
    fn beetles_and_their_shells_resist_fire() {
        let beetle = Enemy::spawn(Kind::Beetle, 0.0, 0.0);
        assert!(beetle.is_fireproof());

        let shell = Enemy::spawn(Kind::Shell(ShellState::resting(ShellKind::Beetle, 16)), 0.0, 0.0);
        assert!(shell.is_fireproof());

        let grub = Enemy::spawn(Kind::Grub, 0.0, 0.0);
        assert!(!grub.is_fireproof());
    }

    #[test]
    fn spikes_cannot_be_stomped() {
        assert!(!Enemy::spawn(Kind::Spike, 0.0, 0.0).is_stompable());
        assert!(!Enemy::spawn(Kind::SpikeEgg, 0.0, 0.0).is_stompable());
        assert!(Enemy::spawn(Kind::Grub, 0.0, 0.0).is_stompable());
    }

    #[test]
    fn lift_hitbox_scales_with_size() {
        let lift = Enemy::spawn(
            Kind::Lift(LiftState { kind: LiftKind::Constant, size: 6 }),
            32.0,
            100.0,
        );
        let hb = lift.hitbox();
        assert_eq!(hb.w, 48.0);
        assert_eq!(hb.h, 8.0);
    }

    // ── Score tables ──

    #[test]
    fn stomp_chain_escalates_then_pays_a_life() {
        assert_eq!(stomp_chain_score(0), Some(100));
        assert_eq!(stomp_chain_score(5), Some(1000));
        assert_eq!(stomp_chain_score(9), Some(8000));
        assert_eq!(stomp_chain_score(10), None);
    }

    #[test]
    fn shell_chain_is_shorter_and_richer() {
        assert_eq!(shell_chain_score(0), Some(500));
        assert_eq!(shell_chain_score(6), Some(8000));
        assert_eq!(shell_chain_score(7), None);
    }

    #[test]
    fn fixed_scores_for_the_odd_kinds() {
        assert_eq!(fixed_stomp_score(&Kind::Hopper), Some(400));
        assert_eq!(fixed_stomp_score(&Kind::Hammerer), Some(1000));
        assert_eq!(fixed_stomp_score(&Kind::Grub), None);
        assert_eq!(touch_kill_score(&Kind::Grub), 100);
        assert_eq!(touch_kill_score(&Kind::Fish), 200);
        assert_eq!(block_defeat_score(&Kind::Hammerer), 1000);
    }
}
