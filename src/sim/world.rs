/// World: the complete snapshot of a running level.
///
/// ## Tile Architecture
///
/// The playfield is a column-major grid of 13 visible tile rows. Cells
/// hold `Option<Block>`; a parallel attribute table carries the render
/// palette per cell. Pixel space maps to the grid as
/// `col = x / 16`, `row = y / 16 - 2` (two off-screen rows above the
/// playfield), so only y in [32, 240) touches the grid at all. All
/// lookups are bounds-checked and return `None` off the grid.
///
/// ## Streaming
///
/// The level is fed in one 16-column page at a time. When the camera
/// passes 1.5 pages the whole world shifts left by one page: the front
/// page is evicted, an empty page is appended for the driver to fill,
/// and every live position (camera, avatar, pool, fireballs, bounce
/// overlay, pending spawns) moves with it. Coordinates therefore never
/// grow without bound.
use crate::domain::block::{Block, Item};
use crate::domain::enemy::{Kind, LiftKind};
use crate::domain::physics::{TILE, VIEW_W};
use crate::domain::player::{PlayerBody, PlayerState};

use super::cutscene::Cutscene;
use super::pool::EntityPool;

pub const ROWS: usize = 13;
pub const PAGE_COLS: usize = 16;
pub const PAGE_CELLS: usize = PAGE_COLS * ROWS;

/// Camera distance that triggers a one-page shift left.
pub const STREAM_TRIGGER: f32 = 256.0 + VIEW_W * 0.5;
pub const STREAM_SHIFT: f32 = 256.0;

pub const Y_COLLISION: u8 = 0b01;
pub const X_COLLISION: u8 = 0b10;

// ── Tile grid ──

pub struct TileWorld {
    cells: Vec<Option<Block>>,
    attrs: Vec<u8>,
}

impl TileWorld {
    pub fn new() -> Self {
        TileWorld { cells: vec![], attrs: vec![] }
    }

    #[inline]
    fn index(col: usize, row: usize) -> usize {
        col * ROWS + row
    }

    pub fn cols(&self) -> usize {
        self.cells.len() / ROWS
    }

    #[inline]
    pub fn block_at(&self, col: usize, row: usize) -> Option<Block> {
        if row < ROWS {
            self.cells.get(Self::index(col, row)).copied().flatten()
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, block: Block) {
        if row < ROWS {
            if let Some(cell) = self.cells.get_mut(Self::index(col, row)) {
                *cell = Some(block);
            }
        }
    }

    #[inline]
    pub fn clear(&mut self, col: usize, row: usize) {
        if row < ROWS {
            if let Some(cell) = self.cells.get_mut(Self::index(col, row)) {
                *cell = None;
            }
        }
    }

    pub fn attr(&self, col: usize, row: usize) -> u8 {
        self.attrs.get(Self::index(col, row)).copied().unwrap_or(0)
    }

    pub fn set_attr(&mut self, col: usize, row: usize, attr: u8) {
        if row < ROWS {
            if let Some(slot) = self.attrs.get_mut(Self::index(col, row)) {
                *slot = attr;
            }
        }
    }

    /// Map a pixel point onto the grid.
    #[inline]
    pub fn point_to_cell(x: f32, y: f32) -> Option<(usize, usize)> {
        if x < 0.0 || y < 2.0 * TILE {
            return None;
        }

        let col = (x / TILE) as usize;
        let row = (y / TILE) as usize - 2;

        (row < ROWS).then_some((col, row))
    }

    pub fn block_at_point(&self, x: f32, y: f32) -> Option<Block> {
        let (col, row) = Self::point_to_cell(x, y)?;
        self.block_at(col, row)
    }

    /// Is this pixel inside a movement-blocking tile?
    pub fn point_in_tile(&self, x: f32, y: f32) -> bool {
        self.block_at_point(x, y).is_some_and(|b| b.is_collidable())
    }

    /// Append one empty page for the driver to fill.
    pub fn append_page(&mut self) {
        self.cells.extend(std::iter::repeat(None).take(PAGE_CELLS));
        self.attrs.extend(std::iter::repeat(0).take(PAGE_CELLS));
    }

    fn evict_front_page(&mut self) {
        self.cells.drain(..PAGE_CELLS.min(self.cells.len()));
        self.attrs.drain(..PAGE_CELLS.min(self.attrs.len()));
    }

    pub fn reset(&mut self) {
        self.cells.clear();
        self.attrs.clear();
    }
}

// ── Loose sprites ──

/// A thrown fireball; at most two are live at a time.
#[derive(Clone, Copy, Debug)]
pub struct Fireball {
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub dir: i8,
}

impl Fireball {
    pub fn new(x: f32, y: f32, dir: i8) -> Self {
        Fireball { x, y, vy: 3.0, dir }
    }
}

/// A bumped block mid-bounce. The grid cell holds a plain solid
/// placeholder while the overlay animates; `restored` goes back into
/// the cell when the bump cooldown runs out.
pub struct BouncingBlock {
    pub col: usize,
    pub row: usize,
    pub item: Option<Item>,
    pub restored: Block,
    pub attr: u8,
}

impl BouncingBlock {
    pub fn x(&self) -> f32 {
        self.col as f32 * TILE
    }

    pub fn y(&self) -> f32 {
        (self.row as f32 + 2.0) * TILE
    }

    /// Render offset above the home cell, indexed by the bump cooldown.
    pub fn bounce_offset(&self, bump_timer: u8) -> i8 {
        const BOUNCE: [i8; 16] = [0, -2, 0, 2, 3, 5, 5, 6, 7, 7, 6, 6, 5, 2, 1, 0];

        BOUNCE[usize::from(bump_timer) % BOUNCE.len()]
    }
}

// ── World ──

pub struct World {
    // ── Playfield ──
    pub tiles: TileWorld,
    pub pool: EntityPool,
    pub fireballs: [Option<Fireball>; 2],
    pub bouncing_block: Option<BouncingBlock>,

    // ── Camera ──
    pub camera: f32,
    pub scroll_locked: bool,
    pub autoscroll: bool,

    // ── Tick state ──
    pub frozen: bool,
    pub collision_mode: u8,
    pub bump_timer: u8,
    pub multi_coin_timer: u8,
    pub multi_coin_active: bool,
    pub stomp_chain: u8,
    pub check_enemy_contact: bool,
    pub underwater: bool,

    // ── Game time ──
    pub game_time: u16,
    pub game_time_timer: u8,

    // ── Scenes and transitions ──
    pub cutscene: Option<Box<dyn Cutscene>>,
    pub cutscene_active: bool,
    pub level_cleared: bool,
    pub warp_taken: bool,
}

impl World {
    pub fn new() -> Self {
        World {
            tiles: TileWorld::new(),
            pool: EntityPool::new(),
            fireballs: [None, None],
            bouncing_block: None,
            camera: 0.0,
            scroll_locked: false,
            autoscroll: false,
            frozen: false,
            collision_mode: X_COLLISION | Y_COLLISION,
            bump_timer: 0,
            multi_coin_timer: 0,
            multi_coin_active: false,
            stomp_chain: 0,
            check_enemy_contact: false,
            underwater: false,
            game_time: 0,
            game_time_timer: 0,
            cutscene: None,
            cutscene_active: false,
            level_cleared: false,
            warp_taken: false,
        }
    }

    /// Back to an empty playfield, ready for fresh pages.
    pub fn reset(&mut self, game_time: u16, game_time_tick: u8) {
        self.tiles.reset();
        self.pool.reset();
        self.fireballs = [None, None];
        self.bouncing_block = None;
        self.camera = 0.0;
        self.scroll_locked = false;
        self.autoscroll = false;
        self.frozen = false;
        self.collision_mode = X_COLLISION | Y_COLLISION;
        self.bump_timer = 0;
        self.multi_coin_timer = 0;
        self.multi_coin_active = false;
        self.stomp_chain = 0;
        self.check_enemy_contact = false;
        self.game_time = game_time;
        self.game_time_timer = game_time_tick;
        self.cutscene = None;
        self.cutscene_active = false;
        self.level_cleared = false;
        self.warp_taken = false;
    }

    pub fn start_cutscene(&mut self, scene: Box<dyn Cutscene>) {
        self.cutscene = Some(scene);
        self.cutscene_active = true;
    }

    // ── Camera ──

    /// The camera trails the avatar, only ever scrolling right and only
    /// when the avatar pushes past 40% of the view. In autoscroll areas
    /// it creeps one pixel a frame on its own until the avatar lags
    /// half a screen behind.
    pub fn move_camera(&mut self, player: &PlayerBody) {
        if player.vx > 0.0 && self.camera < player.x - VIEW_W * 0.4 - 8.0 {
            self.camera += player.vx;
        } else if self.autoscroll && self.camera - player.x < TILE * 3.0 + VIEW_W * 0.5 {
            self.camera += 1.0;
        }
    }

    /// The left screen edge is a wall.
    pub fn clamp_player_left(&self, player: &mut PlayerBody) {
        let offset = self.camera - player.x;

        if offset > 0.0 {
            player.x += offset;

            if player.state != PlayerState::Stopping {
                player.vx = 0.0;
            }
        }
    }

    // ── Streaming ──

    /// Shift everything one page left once the camera is far enough in.
    /// Returns true when a shift happened (the caller reports it so the
    /// driver can fill the fresh page).
    pub fn stream_pages(&mut self, player: &mut PlayerBody) -> bool {
        if self.camera < STREAM_TRIGGER {
            return false;
        }

        self.camera -= STREAM_SHIFT;
        player.x -= STREAM_SHIFT;

        self.pool.shift_left(STREAM_SHIFT);

        for ball in self.fireballs.iter_mut().flatten() {
            ball.x -= STREAM_SHIFT;
        }

        if let Some(block) = self.bouncing_block.as_mut() {
            block.col -= PAGE_COLS.min(block.col);
        }

        self.tiles.evict_front_page();
        self.tiles.append_page();

        true
    }
}

/// Horizontal oscillating lifts anchor to an absolute x, so the anchor
/// shifts with the page. Used by [`EntityPool::shift_left`].
pub fn shift_entity_anchor(kind: &mut Kind, dx: f32) {
    match kind {
        Kind::Lift(lift) => {
            if let LiftKind::Oscillating { vertical: false, origin, .. } = &mut lift.kind {
                *origin -= dx;
            }
        }
        Kind::Floater { .. } => {
            // vertical anchor, unaffected by a horizontal shift
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enemy::{Enemy, LiftState};

    fn solid() -> Block {
        Block::Solid { texture: 1 }
    }

    // ── Grid addressing ──

    #[test]
    fn point_mapping_skips_the_offscreen_rows() {
        assert_eq!(TileWorld::point_to_cell(40.0, 16.0), None);
        assert_eq!(TileWorld::point_to_cell(40.0, 32.0), Some((2, 0)));
        assert_eq!(TileWorld::point_to_cell(40.0, 239.0), Some((2, 12)));
        assert_eq!(TileWorld::point_to_cell(40.0, 240.0), None);
        assert_eq!(TileWorld::point_to_cell(-1.0, 100.0), None);
    }

    #[test]
    fn lookups_off_the_grid_are_empty() {
        let mut tiles = TileWorld::new();
        tiles.append_page();
        tiles.set(3, 5, solid());

        assert_eq!(tiles.block_at(3, 5), Some(solid()));
        assert_eq!(tiles.block_at(99, 5), None);
        assert_eq!(tiles.block_at(3, 13), None);
    }

    #[test]
    fn point_in_tile_requires_a_collidable_block() {
        let mut tiles = TileWorld::new();
        tiles.append_page();
        tiles.set(2, 0, solid());
        tiles.set(4, 0, Block::Coin);

        assert!(tiles.point_in_tile(40.0, 32.0));
        assert!(!tiles.point_in_tile(72.0, 32.0));
        assert!(!tiles.point_in_tile(90.0, 32.0));
    }

    // ── Camera ──

    #[test]
    fn autoscroll_creeps_the_camera_forward() {
        let mut world = World::new();
        world.autoscroll = true;
        let mut player = PlayerBody::new();
        player.x = 100.0;

        world.move_camera(&player);
        assert_eq!(world.camera, 1.0);

        // far enough ahead of the avatar, the creep stops
        world.camera = player.x + TILE * 3.0 + VIEW_W * 0.5;
        world.move_camera(&player);
        assert_eq!(world.camera, player.x + TILE * 3.0 + VIEW_W * 0.5);
    }

    // ── Streaming ──

    #[test]
    fn streaming_shifts_the_whole_playfield() {
        let mut world = World::new();
        world.tiles.append_page();
        world.tiles.append_page();
        world.tiles.append_page();
        world.tiles.set(PAGE_COLS, 4, solid());

        world.camera = STREAM_TRIGGER;
        let mut player = PlayerBody::new();
        player.x = 400.0;

        world.fireballs[0] = Some(Fireball::new(410.0, 100.0, 1));
        world.pool.add(Enemy::spawn(Kind::Grub, 420.0, 160.0));

        assert!(world.stream_pages(&mut player));

        assert_eq!(world.camera, STREAM_TRIGGER - STREAM_SHIFT);
        assert_eq!(player.x, 400.0 - STREAM_SHIFT);
        assert_eq!(world.fireballs[0].map(|b| b.x), Some(410.0 - STREAM_SHIFT));
        // the second page became the first
        assert_eq!(world.tiles.block_at(0, 4), Some(solid()));
        assert_eq!(world.tiles.cols(), 3 * PAGE_COLS);
    }

    #[test]
    fn no_shift_before_the_trigger() {
        let mut world = World::new();
        world.camera = STREAM_TRIGGER - 1.0;
        let mut player = PlayerBody::new();

        assert!(!world.stream_pages(&mut player));
    }

    #[test]
    fn horizontal_lift_anchor_shifts_with_the_page() {
        let mut kind = Kind::Lift(LiftState {
            kind: LiftKind::Oscillating {
                vertical: false,
                origin: 500.0,
                osc: Default::default(),
            },
            size: 4,
        });
        shift_entity_anchor(&mut kind, STREAM_SHIFT);

        match kind {
            Kind::Lift(LiftState { kind: LiftKind::Oscillating { origin, .. }, .. }) => {
                assert_eq!(origin, 500.0 - STREAM_SHIFT)
            }
            _ => unreachable!(),
        }
    }
}
