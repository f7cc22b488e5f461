/// The ordered player-tile collision resolver.
///
/// One pass per tick, sampling fixed interaction points on the avatar:
/// head, then left and right foot (Y axis), then the four side points
/// (X axis). Passes stop at the first conclusive event; landing snaps
/// the avatar to the tile grid while keeping the sub-pixel fraction.
/// A 5 px penetration threshold decides whether a vertical hit counts
/// this frame or the avatar is pushed out sideways instead.
///
/// | point        | x offset | y offset              |
/// |--------------|----------|-----------------------|
/// | head         | 8        | 10 big, 16 swim, 20 small |
/// | feet         | 2 / 14   | 32                    |
/// | sides top    | 1 / 15   | 16 big, 26 small      |
/// | sides bottom | 1 / 15   | 26                    |
use crate::domain::block::{Block, Item};
use crate::domain::physics::{PENETRATION_THRESHOLD, TILE, VIEW_H};

use super::cutscene::{kill_player, DownPipeScene, FlagpoleScene, SidePipeScene};
use super::event::{GameEvent, SoundEffect};
use super::pool::{ENEMY_SLOTS, SPECIAL_SLOT};
use super::world::{TileWorld, Y_COLLISION};
use super::{behavior, Ctx};

const INTERACTION_X: [f32; 5] = [8.0, 2.0, 14.0, 1.0, 15.0];
const INTERACTION_Y: [f32; 6] = [10.0, 16.0, 20.0, 32.0, 16.0, 26.0];

// ── Master pass ──

pub fn resolve_player_tile_collisions(ctx: &mut Ctx) {
    let player_top = ctx.player.y.trunc();

    if player_top >= VIEW_H {
        if !ctx.world.cutscene_active {
            kill_player(ctx, true);
        }

        return;
    }

    if player_top >= 207.0 || player_top < 0.0 {
        return;
    }

    if ctx.world.collision_mode & Y_COLLISION != 0 {
        if resolve_head(ctx, player_top) {
            return;
        }

        if resolve_feet(ctx, player_top) {
            return;
        }
    }

    if player_top < 16.0 {
        return;
    }

    if ctx.world.collision_mode & super::world::X_COLLISION != 0 {
        resolve_sides(ctx, player_top);
    }
}

// ── Head ──

fn resolve_head(ctx: &mut Ctx, player_top: f32) -> bool {
    if player_top < if ctx.player.is_visually_big() { 32.0 } else { 16.0 } {
        return false;
    }

    let y_index = if ctx.player.is_visually_big() {
        if ctx.player.swimming {
            1
        } else {
            0
        }
    } else {
        2
    };

    let px = INTERACTION_X[0] + ctx.player.x;
    let py = INTERACTION_Y[y_index] + player_top;

    let Some((col, row)) = TileWorld::point_to_cell(px, py) else {
        return false;
    };

    if coin_check(ctx, col, row) {
        return true;
    }

    if ctx.player.vy < 0.0 && point_in_lift(ctx, px, py).is_some() {
        bonk_head(ctx);

        return false;
    }

    let Some(block) = ctx.world.tiles.block_at(col, row) else {
        return false;
    };

    if block.is_collidable() && ctx.player.vy < 0.0 {
        if ctx.world.bump_timer != 0 || ctx.player.swimming || !block.is_hittable() {
            bonk_head(ctx);
        } else {
            if ctx.player.is_big() && block.is_breakable() {
                // smash the brick
                ctx.player.vy = -2.0;
                ctx.player.on_head_collision();

                ctx.world.tiles.clear(col, row);
                ctx.sound(SoundEffect::BrickSmash);
                ctx.record.score += 50;
                ctx.events.push(GameEvent::BlockBroken { col, row });

                behavior::handle_block_defeat(ctx, col as f32 * TILE, (row as f32 + 2.0) * TILE);
            } else {
                ctx.player.vy = 0.0;
                ctx.player.on_head_collision();

                on_block_hit_from_bottom(ctx, col, row);
            }

            collect_coin_above_block(ctx, col, row);

            ctx.world.bump_timer = ctx.tuning.timing.bump_cooldown;
        }
    }

    false
}

// ── Feet ──

fn resolve_feet(ctx: &mut Ctx, player_top: f32) -> bool {
    if player_top >= 207.0 {
        return false;
    }

    ctx.player.on_ground = false;

    for (foot, x_index) in [(Foot::Left, 1), (Foot::Right, 2)] {
        match resolve_foot(ctx, player_top, foot, x_index) {
            Probe::Miss => continue,
            Probe::Stop => return false,
            Probe::End => return true,
        }
    }

    false
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Foot {
    Left,
    Right,
}

/// What one interaction point decided.
enum Probe {
    /// Nothing here; try the next point.
    Miss,
    /// Handled; skip the remaining points of this pass.
    Stop,
    /// Conclusive for the whole resolver.
    End,
}

fn resolve_foot(ctx: &mut Ctx, player_top: f32, foot: Foot, x_index: usize) -> Probe {
    let px = INTERACTION_X[x_index] + ctx.player.x;
    let py = INTERACTION_Y[3] + player_top;

    let Some((col, row)) = TileWorld::point_to_cell(px, py) else {
        return Probe::Miss;
    };

    if flagpole_check(ctx, col, row) {
        return Probe::End;
    }

    if coin_check(ctx, col, row) {
        return Probe::End;
    }

    if ctx.player.vy > 0.0 {
        if let Some((slot, lift_top)) = point_in_lift(ctx, px, py) {
            land_on_lift(ctx, lift_top);
            behavior::on_player_land_on_lift(ctx, slot);

            return Probe::Stop;
        }
    }

    let Some(block) = ctx.world.tiles.block_at(col, row) else {
        return Probe::Miss;
    };

    if !block.is_collidable() {
        return Probe::Miss;
    }

    if ctx.player.vy <= 0.0 || block.is_hidden() {
        return Probe::Stop;
    }

    // feet within the top sliver of the tile land, deeper hits push out
    if py - 32.0 <= row as f32 * TILE + PENETRATION_THRESHOLD {
        land_on_tile(ctx, block);

        if foot == Foot::Left
            && ctx.player.down_held
            && ctx.player.x >= col as f32 * TILE + 4.0
            && block.is_down_warp()
            && !ctx.world.cutscene_active
        {
            let scene = DownPipeScene::begin(ctx);
            ctx.world.start_cutscene(Box::new(scene));
        }
    } else if foot == Foot::Left {
        push_out_rightwards(ctx);
    } else {
        push_out_leftwards(ctx);
    }

    Probe::Stop
}

// ── Sides ──

fn resolve_sides(ctx: &mut Ctx, player_top: f32) {
    let top_y_index = if ctx.player.is_visually_big() { 4 } else { 5 };

    let probes = [
        // (x index, y index, left side, pipe check, needs headroom)
        (3, top_y_index, true, false, true),
        (3, 5, true, false, false),
        (4, top_y_index, false, true, true),
        (4, 5, false, true, false),
    ];

    for (x_index, y_index, left_side, pipe_check, needs_headroom) in probes {
        if needs_headroom && player_top < 32.0 {
            continue;
        }

        let px = INTERACTION_X[x_index] + ctx.player.x;
        let py = INTERACTION_Y[y_index] + player_top;

        let Some((col, row)) = TileWorld::point_to_cell(px, py) else {
            continue;
        };

        if pipe_check && side_warp_check(ctx, col, row) {
            return;
        }

        if resolve_side_point(ctx, px, py, col, row, left_side) {
            return;
        }
    }
}

fn resolve_side_point(
    ctx: &mut Ctx,
    px: f32,
    py: f32,
    col: usize,
    row: usize,
    left_side: bool,
) -> bool {
    if coin_check(ctx, col, row) {
        return true;
    }

    if point_in_lift(ctx, px, py).is_some() {
        if left_side {
            push_out_rightwards(ctx);
        } else {
            push_out_leftwards(ctx);
        }

        return true;
    }

    let Some(block) = ctx.world.tiles.block_at(col, row) else {
        return false;
    };

    if block.is_collidable() {
        if !block.is_hidden() {
            if left_side {
                push_out_rightwards(ctx);
            } else {
                push_out_leftwards(ctx);
            }
        }

        return true;
    }

    false
}

// ── Point outcomes ──

fn push_out_rightwards(ctx: &mut Ctx) {
    let player = &mut *ctx.player;

    if player.vx <= 0.0 && (player.vx < 0.0 || !player.right_held) {
        player.x += 1.0;
        player.on_side_collision();
    }
}

fn push_out_leftwards(ctx: &mut Ctx) {
    let player = &mut *ctx.player;

    if player.vx >= 0.0 && (player.vx > 0.0 || !player.left_held) {
        player.x -= 1.0;
        player.on_side_collision();
    }
}

fn bonk_head(ctx: &mut Ctx) {
    let fract = ctx.player.vy - ctx.player.vy.trunc();

    ctx.player.vy = 2.0 + fract;
    ctx.player.on_head_collision();

    ctx.sound(SoundEffect::BlockHit);
}

/// Snap to the tile the feet touched, keeping the sub-pixel fraction.
fn land_on_tile(ctx: &mut Ctx, block: Block) {
    let top = ctx.player.y;
    let fract = top - top.trunc();

    ctx.player.y = (top.trunc() / TILE).trunc() * TILE + fract;
    ctx.world.stomp_chain = 0;

    if block.is_spring_trigger() {
        behavior::activate_spring(ctx);
    } else {
        ctx.player.on_feet_collision();
    }
}

fn land_on_lift(ctx: &mut Ctx, lift_top: f32) {
    let top = ctx.player.y;
    let fract = top - top.trunc();

    ctx.player.y = lift_top - 32.0 + fract;
    ctx.player.on_feet_collision();

    ctx.world.stomp_chain = 0;
}

/// The lift whose platform contains the point, if any.
fn point_in_lift(ctx: &Ctx, px: f32, py: f32) -> Option<(usize, f32)> {
    for slot in 0..ENEMY_SLOTS {
        if let Some(enemy) = ctx.world.pool.get(slot) {
            if enemy.is_lift() && enemy.hitbox().contains(px, py) {
                return Some((slot, enemy.y));
            }
        }
    }

    None
}

fn coin_check(ctx: &mut Ctx, col: usize, row: usize) -> bool {
    if !ctx.world.tiles.block_at(col, row).is_some_and(Block::is_coin) {
        return false;
    }

    ctx.give_coin();

    if ctx.world.underwater {
        ctx.world.tiles.set(col, row, Block::Water);
        ctx.world.tiles.set_attr(col, row, 2);
    } else {
        ctx.world.tiles.clear(col, row);
    }

    true
}

fn flagpole_check(ctx: &mut Ctx, col: usize, row: usize) -> bool {
    if ctx.world.cutscene_active
        || !ctx.world.tiles.block_at(col, row).is_some_and(Block::is_flagpole)
    {
        return false;
    }

    let flag_x = col as f32 * TILE;

    if (ctx.player.x + 16.0) - flag_x < 4.0 {
        return false;
    }

    let score = flag_score(ctx.player.y);
    ctx.record.score += score;
    ctx.events.push(GameEvent::FlagpoleReached { score });
    ctx.sound(SoundEffect::Flagpole);

    let scene = FlagpoleScene::begin(ctx);
    ctx.world.start_cutscene(Box::new(scene));

    true
}

/// Grab height pays out by how high up the pole the avatar caught it.
fn flag_score(player_y: f32) -> u32 {
    let row = ((player_y + 32.0) / TILE) as u32 - 2;

    if row >= 9 {
        100
    } else if row >= 6 {
        400
    } else if row == 5 {
        800
    } else if row >= 2 {
        2000
    } else {
        5000
    }
}

fn side_warp_check(ctx: &mut Ctx, col: usize, row: usize) -> bool {
    if !ctx.player.on_ground || ctx.world.cutscene_active {
        return false;
    }

    if !ctx.world.tiles.block_at(col, row).is_some_and(Block::is_side_warp) {
        return false;
    }

    let scene = SidePipeScene::begin(ctx);
    ctx.world.start_cutscene(Box::new(scene));

    ctx.world.collision_mode = Y_COLLISION;
    ctx.world.scroll_locked = true;

    true
}

// ── Block hits ──

/// A hittable cell was struck from below: pay out its item, swap the
/// cell for its spent form when appropriate, and start the bounce
/// overlay. Multi-coin bricks keep paying inside a timed window.
pub fn on_block_hit_from_bottom(ctx: &mut Ctx, col: usize, row: usize) {
    behavior::update_bouncing_block(ctx);

    let Some(block) = ctx.world.tiles.block_at(col, row) else {
        ctx.sound(SoundEffect::BlockHit);
        return;
    };

    if block.is_multi_coin() {
        let mut spend = true;

        if ctx.world.multi_coin_timer == 0 {
            if !ctx.world.multi_coin_active {
                ctx.world.multi_coin_timer = ctx.tuning.timing.multi_coin_window;
                spend = false;
            }

            ctx.world.multi_coin_active = !ctx.world.multi_coin_active;
        } else {
            spend = false;
        }

        ctx.give_coin();
        ctx.events.push(GameEvent::ItemReleased { col, row });

        if spend {
            ctx.world.tiles.set(col, row, Block::Used);
        }

        start_block_bounce(ctx, col, row, None);
    } else if let Some(item) = block.item() {
        let bounce_item = if item.is_powerup() {
            ctx.world.pool.clear(SPECIAL_SLOT);
            ctx.sound(SoundEffect::PowerupSpawn);

            Some(item)
        } else {
            ctx.give_coin();
            ctx.events.push(GameEvent::ItemReleased { col, row });

            None
        };

        ctx.world.tiles.set(col, row, Block::Used);

        start_block_bounce(ctx, col, row, bounce_item);
    } else if block.is_hittable() {
        start_block_bounce(ctx, col, row, None);
    }

    ctx.sound(SoundEffect::BlockHit);
}

/// Move the cell into the bounce overlay, leaving a bare solid behind
/// until the bump cooldown restores it.
fn start_block_bounce(ctx: &mut Ctx, col: usize, row: usize, item: Option<Item>) {
    let Some(restored) = ctx.world.tiles.block_at(col, row) else {
        return;
    };
    let attr = ctx.world.tiles.attr(col, row);

    ctx.world.tiles.set(col, row, Block::Solid { texture: 0 });
    ctx.world.bouncing_block =
        Some(super::world::BouncingBlock { col, row, item, restored, attr });

    ctx.events.push(GameEvent::BlockBumped { col, row });

    behavior::handle_block_defeat(ctx, col as f32 * TILE, (row as f32 + 2.0) * TILE);
}

fn collect_coin_above_block(ctx: &mut Ctx, col: usize, row: usize) {
    if row == 0 {
        return;
    }

    if ctx.world.tiles.block_at(col, row - 1).is_some_and(Block::is_coin) {
        ctx.give_coin();
        ctx.world.tiles.clear(col, row - 1);
        ctx.events.push(GameEvent::ItemReleased { col, row: row - 1 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TuningConfig;
    use crate::domain::block::Item;
    use crate::domain::player::{PlayerBody, PlayerRecord, SizeTier};
    use crate::sim::event::NullAudio;
    use crate::sim::world::World;

    struct Rig {
        world: World,
        player: PlayerBody,
        record: PlayerRecord,
        audio: NullAudio,
        events: Vec<GameEvent>,
        tuning: TuningConfig,
    }

    impl Rig {
        fn new() -> Self {
            let mut world = World::new();
            for _ in 0..3 {
                world.tiles.append_page();
            }

            Rig {
                world,
                player: PlayerBody::new(),
                record: PlayerRecord::default(),
                audio: NullAudio,
                events: vec![],
                tuning: TuningConfig::default(),
            }
        }

        fn resolve(&mut self) {
            let mut ctx = Ctx {
                world: &mut self.world,
                player: &mut self.player,
                record: &mut self.record,
                audio: &mut self.audio,
                events: &mut self.events,
                tuning: &self.tuning,
            };

            resolve_player_tile_collisions(&mut ctx);
        }
    }

    fn brick() -> Block {
        Block::Brick { texture: 1, multi_coin: false }
    }

    // ── Landing ──

    #[test]
    fn falling_onto_a_tile_snaps_and_grounds() {
        let mut rig = Rig::new();
        // floor along grid row 10 (pixel top 192)
        for col in 0..16 {
            rig.world.tiles.set(col, 10, Block::Solid { texture: 1 });
        }

        rig.player.x = 64.0;
        rig.player.y = 162.5; // feet probe just inside the floor's top sliver
        rig.player.vy = 2.0;
        rig.player.on_ground = false;
        rig.world.stomp_chain = 2;

        rig.resolve();

        assert!(rig.player.on_ground);
        assert_eq!(rig.player.vy, 0.0);
        assert_eq!(rig.player.y, 160.5);
        // an airborne stomp run ends on any grounded landing
        assert_eq!(rig.world.stomp_chain, 0);
    }

    #[test]
    fn deep_foot_penetration_pushes_out_instead() {
        let mut rig = Rig::new();
        rig.world.tiles.set(4, 10, Block::Solid { texture: 1 });

        rig.player.x = 4.0 * 16.0 - 4.0;
        rig.player.y = 170.0; // feet 10 px into the tile
        rig.player.vy = 2.0;
        rig.player.vx = 0.0;
        rig.player.on_ground = false;

        let x_before = rig.player.x;
        rig.resolve();

        // the right foot caught the tile, so the push is leftwards
        assert!(!rig.player.on_ground);
        assert_eq!(rig.player.x, x_before - 1.0);
    }

    // ── Head hits ──

    #[test]
    fn big_player_smashes_a_brick_from_below() {
        let mut rig = Rig::new();
        rig.world.tiles.set(4, 4, brick());

        rig.player.size = SizeTier::Big;
        rig.player.x = 4.0 * 16.0;
        rig.player.y = (4.0 + 2.0) * 16.0 - 10.0 + 4.0; // head probe inside the brick
        rig.player.vy = -3.0;
        rig.player.on_ground = false;

        rig.resolve();

        assert_eq!(rig.world.tiles.block_at(4, 4), None);
        assert_eq!(rig.player.vy, -2.0);
        assert_eq!(rig.record.score, 50);
        assert_eq!(rig.world.bump_timer, 16);
        assert!(rig.events.contains(&GameEvent::BlockBroken { col: 4, row: 4 }));
    }

    #[test]
    fn small_player_bumps_the_brick_instead() {
        let mut rig = Rig::new();
        rig.world.tiles.set(4, 4, brick());

        rig.player.x = 4.0 * 16.0;
        rig.player.y = (4.0 + 2.0) * 16.0 - 20.0 + 4.0;
        rig.player.vy = -3.0;
        rig.player.on_ground = false;

        rig.resolve();

        // cell swapped for the bounce overlay, not destroyed
        assert!(rig.world.bouncing_block.is_some());
        assert_eq!(rig.player.vy, 0.0);
        assert!(rig.events.contains(&GameEvent::BlockBumped { col: 4, row: 4 }));
    }

    #[test]
    fn bump_cooldown_downgrades_the_hit_to_a_bonk() {
        let mut rig = Rig::new();
        rig.world.tiles.set(4, 4, brick());
        rig.world.bump_timer = 5;

        rig.player.size = SizeTier::Big;
        rig.player.x = 4.0 * 16.0;
        rig.player.y = (4.0 + 2.0) * 16.0 - 10.0 + 4.0;
        rig.player.vy = -3.5;
        rig.player.on_ground = false;

        rig.resolve();

        assert_eq!(rig.world.tiles.block_at(4, 4), Some(brick()));
        assert_eq!(rig.player.vy, 2.0 + (-0.5));
    }

    #[test]
    fn item_box_releases_its_powerup() {
        let mut rig = Rig::new();
        rig.world.tiles.set(4, 4, Block::ItemBox { texture: 2, item: Item::Powerup });

        rig.player.x = 4.0 * 16.0;
        rig.player.y = (4.0 + 2.0) * 16.0 - 20.0 + 4.0;
        rig.player.vy = -2.0;
        rig.player.on_ground = false;

        rig.resolve();

        assert_eq!(rig.world.tiles.block_at(4, 4), Some(Block::Solid { texture: 0 }));
        let bounce = rig.world.bouncing_block.as_ref().unwrap();
        assert_eq!(bounce.item, Some(Item::Powerup));
        assert_eq!(bounce.restored, Block::Used);
    }

    // ── Coins ──

    #[test]
    fn touched_coin_is_collected_and_cleared() {
        let mut rig = Rig::new();
        rig.world.tiles.set(4, 10, Block::Coin);

        rig.player.x = 4.0 * 16.0;
        rig.player.y = 162.0;
        rig.player.vy = 1.0;
        rig.player.on_ground = false;

        rig.resolve();

        assert_eq!(rig.record.coins, 1);
        assert_eq!(rig.record.score, 200);
        assert_eq!(rig.world.tiles.block_at(4, 10), None);
    }

    #[test]
    fn underwater_coin_leaves_water_behind() {
        let mut rig = Rig::new();
        rig.world.underwater = true;
        rig.world.tiles.set(4, 10, Block::Coin);

        rig.player.x = 4.0 * 16.0;
        rig.player.y = 162.0;
        rig.player.vy = 1.0;

        rig.resolve();

        assert_eq!(rig.world.tiles.block_at(4, 10), Some(Block::Water));
        assert_eq!(rig.world.tiles.attr(4, 10), 2);
    }

    // ── Sides ──

    #[test]
    fn walking_into_a_wall_stops_and_pushes_out() {
        let mut rig = Rig::new();
        rig.world.tiles.set(6, 8, Block::Solid { texture: 1 });
        rig.world.tiles.set(6, 9, Block::Solid { texture: 1 });

        // side probe (x+15) inside the wall column at x = 96
        rig.player.x = 6.0 * 16.0 - 14.0;
        rig.player.y = (8.0 + 2.0) * 16.0 - 16.0;
        rig.player.vx = 1.5;
        rig.player.vy = 0.0;

        let x_before = rig.player.x;
        rig.resolve();

        assert_eq!(rig.player.vx, 0.0);
        assert_eq!(rig.player.x, x_before - 1.0);
    }

    #[test]
    fn hidden_box_ignores_feet_and_sides() {
        let mut rig = Rig::new();
        rig.world.tiles.set(4, 10, Block::HiddenBox { item: Item::Coin });

        rig.player.x = 4.0 * 16.0;
        rig.player.y = 162.5;
        rig.player.vy = 2.0;
        rig.player.on_ground = false;

        rig.resolve();

        assert!(!rig.player.on_ground);
    }

    // ── Flagpole and pit ──

    #[test]
    fn flagpole_grab_scores_by_height_and_starts_the_scene() {
        let mut rig = Rig::new();
        for row in 0..11 {
            rig.world.tiles.set(12, row, Block::Flagpole);
        }

        rig.player.x = 12.0 * 16.0 - 10.0;
        rig.player.y = 100.0; // row 6 grab
        rig.player.vy = 2.0;
        rig.player.on_ground = false;

        rig.resolve();

        assert!(rig.world.cutscene_active);
        assert!(rig.events.contains(&GameEvent::FlagpoleReached { score: 400 }));
        assert_eq!(rig.record.score, 400);
    }

    #[test]
    fn falling_below_the_screen_is_lethal() {
        let mut rig = Rig::new();
        rig.player.y = 245.0;

        rig.resolve();

        assert!(rig.world.cutscene_active);
        assert_eq!(rig.world.collision_mode, 0);
    }

    // ── Multi-coin brick ──

    #[test]
    fn multi_coin_brick_pays_until_the_window_closes() {
        let mut rig = Rig::new();
        rig.world.tiles.set(4, 4, Block::Brick { texture: 1, multi_coin: true });

        {
            let mut ctx = Ctx {
                world: &mut rig.world,
                player: &mut rig.player,
                record: &mut rig.record,
                audio: &mut rig.audio,
                events: &mut rig.events,
                tuning: &rig.tuning,
            };

            // first hit opens the window without spending the brick
            on_block_hit_from_bottom(&mut ctx, 4, 4);
        }

        assert_eq!(rig.record.coins, 1);
        assert!(rig.world.multi_coin_timer > 0);
        // overlay restores the brick, not a spent box
        assert_eq!(
            rig.world.bouncing_block.as_ref().map(|b| b.restored),
            Some(Block::Brick { texture: 1, multi_coin: true })
        );
    }
}
