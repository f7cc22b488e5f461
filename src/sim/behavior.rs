/// Entity behavior: the per-tick movement and update passes for every
/// pool slot, plus the player contact protocol.
///
/// Each tick runs two phases over the pool, mirroring the split between
/// motion and reaction: first every entity moves (walk, gravity, ride an
/// oscillation), then every entity reacts (despawn checks, bumping into
/// neighbors, touching the avatar). The contact pass runs on alternating
/// ticks via `check_enemy_contact`. Powerups, fireballs, springs and
/// lifts also live here since they share the pool and the tile probes.
use crate::domain::block::{Block, Item};
use crate::domain::enemy::{
    block_defeat_score, fixed_stomp_score, shell_chain_score, stomp_chain_score, touch_kill_score,
    Enemy, Kind, LiftKind, PowerupKind, ShellKind, ShellState, GRUB_FLAT_FRAMES,
};
use crate::domain::physics::{Rect, STOMP_BOUNCE_SPEED, TILE, VIEW_H, VIEW_W};
use crate::domain::player::{PlayerBody, PlayerState};

use super::cutscene::{damage_player, FlowerScene, GrowScene};
use super::event::{GameEvent, MusicTrack, SoundEffect};
use super::pool::{ENEMY_SLOTS, SPECIAL_SLOT, TOTAL_SLOTS};
use super::world::{X_COLLISION, Y_COLLISION};
use super::Ctx;

/// Shared fall acceleration for walkers, in px per frame squared.
const GRAVITY_FORCE: f32 = 0.195;
/// Hoppers fall softer so the bounce arc stays floaty.
const HOPPER_GRAVITY: f32 = 1.0 / 9.5;
/// Terminal fall speed for pool entities.
const MAX_FALL: f32 = 3.0;

/// How fast an emerging powerup rises out of its block.
const EMERGE_SPEED: f32 = 0.25;

/// Framerules of starman time granted by a star.
const STARMAN_FRAMERULES: u8 = 35;

/// Driver sprite id for a balance-lift rope segment.
const ROPE_TEXTURE: u8 = 7;

// ── Tick driver ──

/// The full sprite tick: movement phase, update phase with player
/// contact on alternating ticks, then the bounce overlay upkeep.
pub fn update_sprites(ctx: &mut Ctx) {
    for slot in 0..TOTAL_SLOTS {
        let Some(mut enemy) = ctx.world.pool.take(slot) else {
            continue;
        };

        if !enemy.remove {
            handle_movement(ctx, &mut enemy);
        }

        if enemy.remove {
            continue;
        }

        ctx.world.pool.put_back(slot, enemy);
    }

    for slot in 0..TOTAL_SLOTS {
        let Some(mut enemy) = ctx.world.pool.take(slot) else {
            continue;
        };

        if enemy.remove {
            continue;
        }

        update(ctx, &mut enemy);

        if !enemy.remove
            && ctx.world.check_enemy_contact
            && !ctx.player.frozen
            && enemy.is_contact_enemy()
        {
            player_contact(ctx, &mut enemy);
        }

        if !enemy.remove {
            ctx.world.pool.put_back(slot, enemy);
        }
    }

    // a moving shell may have flagged slots it already passed
    for slot in 0..TOTAL_SLOTS {
        if ctx.world.pool.get(slot).is_some_and(|e| e.remove) {
            ctx.world.pool.clear(slot);
        }
    }

    ctx.world.check_enemy_contact = !ctx.world.check_enemy_contact;

    update_bouncing_block(ctx);

    if ctx.world.bump_timer != 0 {
        ctx.world.bump_timer -= 1;
    }
}

/// Coarse-clock events: resting shells tick towards revival.
pub fn on_framerule(ctx: &mut Ctx) {
    for slot in 0..ENEMY_SLOTS {
        let revived = {
            let Some(enemy) = ctx.world.pool.get_mut(slot) else {
                continue;
            };
            let Kind::Shell(mut state) = enemy.kind else {
                continue;
            };

            if state.moving {
                continue;
            }

            state.revival = state.revival.saturating_sub(1);
            if state.revival == 4 {
                enemy.animate = true;
            }

            enemy.kind = Kind::Shell(state);

            state.revival == 0
        };

        if revived {
            revive_shell(ctx, slot);
        }
    }
}

fn revive_shell(ctx: &mut Ctx, slot: usize) {
    let Some(shell) = ctx.world.pool.get(slot) else {
        return;
    };
    let Kind::Shell(state) = shell.kind else {
        return;
    };

    let kind = match state.kind {
        ShellKind::Trooper => Kind::Trooper { red: false },
        ShellKind::RedTrooper => Kind::Trooper { red: true },
        ShellKind::Beetle => Kind::Beetle,
    };

    let palette = shell.sub_palette;
    let mut enemy = Enemy::spawn(kind, shell.x, shell.y);
    enemy.sub_palette = palette;
    enemy.face_towards(ctx.player.x);

    // even/odd tick stands in for the original coin flip
    if ctx.world.check_enemy_contact {
        enemy.dir = -enemy.dir;
    }

    ctx.world.pool.replace(enemy, slot);
}

// ── Movement components ──

fn side_to_side(ctx: &mut Ctx, enemy: &mut Enemy, speed: f32, make_sound: bool) {
    enemy.x += speed * f32::from(enemy.dir);

    let top = enemy.y;
    if !(2.0 * TILE..207.0).contains(&top) {
        return;
    }

    let probe_x = enemy.x + if enemy.dir == 1 { TILE } else { 0.0 };

    if ctx.world.tiles.point_in_tile(probe_x, top + 31.0) {
        enemy.dir = -enemy.dir;

        if make_sound {
            ctx.sound(SoundEffect::BlockHit);
        }
    }
}

fn apply_gravity_movement(ctx: &mut Ctx, enemy: &mut Enemy, force: f32) {
    enemy.vy = (enemy.vy + force).min(MAX_FALL);
    enemy.y += enemy.vy;

    let top = enemy.y;
    if !(TILE..207.0).contains(&top) {
        return;
    }

    let hit = ctx.world.tiles.point_in_tile(enemy.x + 8.0, top + 32.0);
    enemy.on_ground = hit;

    if hit {
        enemy.y = (((top + 32.0) / TILE) as i32 - 2) as f32 * TILE;
        enemy.vy = 0.0;
    }
}

/// Walkers turn each other around on contact; only the slots after this
/// one are scanned, so a colliding pair flips exactly once.
fn collide_with_others(ctx: &mut Ctx, enemy: &mut Enemy) {
    let own_box = enemy.hitbox();

    for slot in enemy.slot + 1..ENEMY_SLOTS {
        let Some(other) = ctx.world.pool.get_mut(slot) else {
            continue;
        };

        if !other.bumps_into_others() || other.dir == enemy.dir {
            continue;
        }

        if own_box.intersects(&other.hitbox()) {
            enemy.dir = -enemy.dir;

            // a moving shell plows on instead of turning
            if !other.is_shell() {
                other.dir = -other.dir;
            }
        }
    }
}

fn despawn(ctx: &Ctx, enemy: &mut Enemy) -> bool {
    let rules = &ctx.tuning.rules;
    let margin = if enemy.uses_special_despawn_margin() {
        rules.despawn_margin_special
    } else {
        rules.despawn_margin
    };

    let left = (ctx.world.camera - margin).max(0.0);
    let right = ctx.world.camera + VIEW_W + rules.despawn_margin;

    if enemy.x < left || (enemy.dir == 1 && enemy.x > right) || enemy.y > VIEW_H {
        enemy.remove = true;
    }

    enemy.remove
}

// ── Movement phase ──

fn handle_movement(ctx: &mut Ctx, enemy: &mut Enemy) {
    match enemy.kind {
        Kind::Grub | Kind::Trooper { .. } | Kind::Beetle | Kind::Spike => {
            let speed = ctx.tuning.rules.walker_speed();
            side_to_side(ctx, enemy, speed, false);
            apply_gravity_movement(ctx, enemy, GRAVITY_FORCE);
        }
        Kind::GrubFlat { .. } | Kind::SpikeEgg => {
            apply_gravity_movement(ctx, enemy, GRAVITY_FORCE);
        }
        Kind::Hopper => {
            side_to_side(ctx, enemy, 0.5, false);
            apply_gravity_movement(ctx, enemy, HOPPER_GRAVITY);
        }
        Kind::Floater { .. } => {
            let mut new_y = enemy.y;
            if let Kind::Floater { origin_y, osc } = &mut enemy.kind {
                new_y = *origin_y + osc.offset(100, 52);
            }
            enemy.y = new_y;
        }
        Kind::Shell(_) => shell_movement(ctx, enemy),
        Kind::Plant { .. } => plant_movement(ctx, enemy),
        Kind::Fish | Kind::Bullet => {
            enemy.x -= ctx.tuning.rules.walker_speed();
        }
        Kind::Hammerer => {
            apply_gravity_movement(ctx, enemy, GRAVITY_FORCE);
            enemy.face_towards(ctx.player.x);
        }
        Kind::Lift(_) => {
            let (mut new_x, mut new_y) = (enemy.x, enemy.y);
            if let Kind::Lift(lift) = &mut enemy.kind {
                if let LiftKind::Oscillating { vertical, origin, osc } = &mut lift.kind {
                    let halfway = if *vertical { 64 } else { 26 };
                    let offset = osc.offset(100, halfway);

                    if *vertical {
                        new_y = *origin + offset;
                    } else {
                        new_x = *origin - offset;
                    }
                }
            }
            enemy.x = new_x;
            enemy.y = new_y;
        }
        Kind::Flag { moving } => {
            if moving {
                enemy.y += 2.0;
            }
        }
        Kind::Powerup(_) => powerup_movement(ctx, enemy),
        Kind::StarFlag | Kind::Spring(_) => {}
    }
}

fn shell_movement(ctx: &mut Ctx, enemy: &mut Enemy) {
    let Kind::Shell(state) = enemy.kind else {
        return;
    };

    if state.moving {
        let speed = if enemy.on_ground { 3.0 } else { 1.5 };
        side_to_side(ctx, enemy, speed, true);
    } else if !enemy.on_ground && state.flipped {
        side_to_side(ctx, enemy, 1.0, false);
    }

    let was_on_ground = enemy.on_ground;
    apply_gravity_movement(ctx, enemy, GRAVITY_FORCE);

    // a flipped shell settles shut when it lands
    if state.flipped && !state.moving && enemy.on_ground && !was_on_ground {
        enemy.animate = false;
        enemy.dir = 0;
    }
}

/// The plant pokes out of its pipe on a timer, but will not emerge
/// while the avatar stands close to the opening.
fn plant_movement(ctx: &mut Ctx, enemy: &mut Enemy) {
    const SPEED: f32 = 0.5;

    let Kind::Plant { mut pause, mut move_timer } = enemy.kind else {
        return;
    };

    if pause != 0 {
        let player_far = (ctx.player.x - enemy.x).abs() > 32.0;

        if enemy.dir == -1 || player_far {
            pause -= 1;

            if pause == 0 {
                move_timer = (24.0 / SPEED) as u8;
                enemy.dir = -enemy.dir;
            }
        }
    } else {
        enemy.y += SPEED * f32::from(enemy.dir);
        move_timer -= 1;

        if move_timer == 0 {
            pause = crate::domain::enemy::PLANT_PAUSE_FRAMES;
        }
    }

    enemy.kind = Kind::Plant { pause, move_timer };
}

// ── Update phase ──

fn update(ctx: &mut Ctx, enemy: &mut Enemy) {
    match enemy.kind {
        Kind::Grub | Kind::Beetle | Kind::Spike => {
            if despawn(ctx, enemy) {
                return;
            }
            collide_with_others(ctx, enemy);
        }
        Kind::Trooper { red } => {
            if despawn(ctx, enemy) {
                return;
            }
            collide_with_others(ctx, enemy);

            // the red patrol refuses ledges
            if red && !enemy.on_ground {
                enemy.dir = -enemy.dir;
            }
        }
        Kind::GrubFlat { ref mut timer } => {
            *timer -= 1;
            if *timer == 0 {
                enemy.remove = true;
            }
        }
        Kind::Hopper => {
            if despawn(ctx, enemy) {
                return;
            }
            collide_with_others(ctx, enemy);

            if enemy.on_ground {
                enemy.vy = -3.0;
            }
        }
        Kind::Floater { .. } | Kind::Fish | Kind::Bullet | Kind::Plant { .. } | Kind::Hammerer => {
            despawn(ctx, enemy);
        }
        Kind::Shell(_) => shell_update(ctx, enemy),
        Kind::SpikeEgg => {
            if despawn(ctx, enemy) {
                return;
            }

            if enemy.vy == 0.0 {
                let mut spike = Enemy::spawn(Kind::Spike, enemy.x, enemy.y);
                spike.face_towards(ctx.player.x);
                ctx.world.pool.replace(spike, enemy.slot);
                enemy.remove = true;
            }
        }
        Kind::Lift(_) => {
            despawn(ctx, enemy);
        }
        Kind::Spring(_) => spring_update(ctx, enemy),
        Kind::Flag { .. } | Kind::StarFlag | Kind::Powerup(_) => {}
    }
}

fn shell_update(ctx: &mut Ctx, enemy: &mut Enemy) {
    if despawn(ctx, enemy) {
        return;
    }

    let Kind::Shell(mut state) = enemy.kind else {
        return;
    };

    if state.moving {
        shell_kill_others(ctx, enemy, &mut state);
    } else {
        collide_with_others(ctx, enemy);
    }

    enemy.kind = Kind::Shell(state);
}

/// A moving shell mows down everything it overlaps, paying an
/// escalating chain that tops out in a life.
fn shell_kill_others(ctx: &mut Ctx, enemy: &Enemy, state: &mut ShellState) {
    let shell_box = enemy.hitbox();

    for slot in 0..ENEMY_SLOTS {
        if slot == enemy.slot {
            continue;
        }

        let dead = {
            let Some(victim) = ctx.world.pool.get(slot) else {
                continue;
            };

            !victim.remove
                && victim.is_contact_enemy()
                && !victim.is_lift()
                && !matches!(victim.kind, Kind::GrubFlat { .. })
                && shell_box.intersects(&victim.hitbox())
        };

        if !dead {
            continue;
        }

        if let Some(victim) = ctx.world.pool.get_mut(slot) {
            victim.remove = true;
        }

        let chain = state.kill_chain;
        state.kill_chain = state.kill_chain.saturating_add(1);

        ctx.sound(SoundEffect::Kick);
        match shell_chain_score(chain) {
            Some(score) => ctx.give_score(score),
            None => ctx.give_life(),
        }
        ctx.events.push(GameEvent::EnemyKilled { slot });
    }
}

// ── Player contact ──

fn is_stomped(player: &PlayerBody, enemy: &Enemy) -> bool {
    !player.swimming
        && (player.vy > 0.0
            || player.vy == STOMP_BOUNCE_SPEED
            || player.y + 12.0 < enemy.y)
}

fn player_contact(ctx: &mut Ctx, enemy: &mut Enemy) {
    if !enemy.hitbox().intersects(&ctx.player.hitbox()) {
        enemy.touching_player = false;
        return;
    }

    // one response per continuous touch
    if enemy.touching_player {
        return;
    }
    enemy.touching_player = true;

    if ctx.player.has_starman() && !enemy.is_harmless() {
        enemy.remove = true;
        ctx.sound(SoundEffect::StarmanKill);
        ctx.give_score(touch_kill_score(&enemy.kind));
        ctx.events.push(GameEvent::EnemyKilled { slot: enemy.slot });
        return;
    }

    if enemy.is_stompable() && is_stomped(ctx.player, enemy) {
        enemy.remove = true;
        ctx.sound(SoundEffect::Stomp);
        ctx.events.push(GameEvent::EnemyStomped { slot: enemy.slot });
        on_stomp(ctx, enemy);
    } else {
        on_collide(ctx, enemy);
    }
}

/// Bounce the avatar and pay the stomp out, either a flat value or the
/// escalating chain. Stomping mid-bounce skips one chain step.
fn default_stomp(ctx: &mut Ctx, enemy: &Enemy) {
    let last_vy = ctx.player.vy;
    ctx.player.vy = STOMP_BOUNCE_SPEED;

    if let Some(score) = fixed_stomp_score(&enemy.kind) {
        ctx.give_score(score);
        return;
    }

    let chain = ctx.world.stomp_chain;
    ctx.world.stomp_chain = chain.saturating_add(1);

    let step = if last_vy == STOMP_BOUNCE_SPEED { chain + 1 } else { chain };
    match stomp_chain_score(step) {
        Some(score) => ctx.give_score(score),
        None => ctx.give_life(),
    }
}

fn shelled(kind: &Kind) -> Option<ShellKind> {
    match kind {
        Kind::Trooper { red: true } => Some(ShellKind::RedTrooper),
        Kind::Trooper { red: false } => Some(ShellKind::Trooper),
        Kind::Beetle => Some(ShellKind::Beetle),
        _ => None,
    }
}

fn on_stomp(ctx: &mut Ctx, enemy: &mut Enemy) {
    match enemy.kind {
        Kind::Shell(_) => shell_on_stomp(ctx, enemy),
        Kind::Grub => {
            default_stomp(ctx, enemy);

            let mut flat =
                Enemy::spawn(Kind::GrubFlat { timer: GRUB_FLAT_FRAMES }, enemy.x, enemy.y);
            flat.sub_palette = enemy.sub_palette;
            ctx.world.pool.replace(flat, enemy.slot);
        }
        Kind::Hopper | Kind::Floater { .. } => {
            default_stomp(ctx, enemy);

            // the wings come off
            let red = matches!(enemy.kind, Kind::Floater { .. });
            let mut trooper = Enemy::spawn(Kind::Trooper { red }, enemy.x, enemy.y);
            trooper.sub_palette = enemy.sub_palette;
            trooper.face_towards(ctx.player.x);
            ctx.world.pool.replace(trooper, enemy.slot);
        }
        Kind::Trooper { .. } | Kind::Beetle => {
            default_stomp(ctx, enemy);

            let Some(shell_kind) = shelled(&enemy.kind) else {
                return;
            };

            let state = ShellState {
                kind: shell_kind,
                moving: false,
                flipped: !enemy.on_ground,
                revival: ctx.tuning.rules.shell_revival_framerules(),
                kill_chain: 0,
            };
            let mut shell = Enemy::spawn(Kind::Shell(state), enemy.x, enemy.y);
            shell.sub_palette = enemy.sub_palette;
            ctx.world.pool.replace(shell, enemy.slot);
        }
        _ => default_stomp(ctx, enemy),
    }
}

fn on_collide(ctx: &mut Ctx, enemy: &mut Enemy) {
    if enemy.is_harmless() {
        return;
    }

    if matches!(enemy.kind, Kind::Shell(_)) {
        shell_on_collide(ctx, enemy);
        return;
    }

    if damage_player(ctx) && !matches!(enemy.kind, Kind::Plant { .. }) {
        enemy.face_towards(ctx.player.x);
    }
}

// ── Shell handling ──

fn shell_set_moving(ctx: &mut Ctx, enemy: &mut Enemy, state: &mut ShellState) {
    enemy.dir = if enemy.x > ctx.player.x { 1 } else { -1 };
    enemy.animate = false;
    state.moving = true;

    ctx.sound(SoundEffect::Kick);
}

fn shell_set_rest(ctx: &Ctx, enemy: &mut Enemy, state: &mut ShellState) {
    enemy.dir = 0;
    enemy.animate = false;
    state.moving = false;
    state.revival = ctx.tuning.rules.shell_revival_framerules();
}

/// A kicked shell is worth more the riskier the kick: airborne kicks
/// and kicks on a waking shell pay out the most.
fn shell_kick_score(ctx: &Ctx, enemy: &Enemy) -> u32 {
    if !enemy.on_ground {
        8000
    } else if enemy.animate {
        // waking shell; tick parity stands in for the animation phase
        if ctx.world.check_enemy_contact {
            8000
        } else {
            400
        }
    } else if ctx.world.stomp_chain > 0 {
        500
    } else {
        400
    }
}

fn shell_on_stomp(ctx: &mut Ctx, enemy: &mut Enemy) {
    let Kind::Shell(mut state) = enemy.kind else {
        return;
    };

    if state.moving {
        default_stomp(ctx, enemy);
        shell_set_rest(ctx, enemy, &mut state);
    } else {
        let score = shell_kick_score(ctx, enemy);
        ctx.give_score(score);
        shell_set_moving(ctx, enemy, &mut state);
    }

    state.flipped = false;
    enemy.kind = Kind::Shell(state);

    // the shell survives the stomp that changed its state
    enemy.remove = false;
}

fn shell_on_collide(ctx: &mut Ctx, enemy: &mut Enemy) {
    let Kind::Shell(mut state) = enemy.kind else {
        return;
    };

    if state.moving {
        damage_player(ctx);
    } else {
        let score = shell_kick_score(ctx, enemy);
        ctx.give_score(score);
        shell_set_moving(ctx, enemy, &mut state);
    }

    enemy.kind = Kind::Shell(state);
}

// ── Block defeats ──

/// A block got smashed or bumped at `(block_x, block_y)`: launch the
/// powerup resting on it and flip the first enemy standing on it.
pub fn handle_block_defeat(ctx: &mut Ctx, block_x: f32, block_y: f32) {
    let player_x = ctx.player.x;

    if let Some(powerup) = ctx.world.pool.special_mut() {
        if matches!(powerup.kind, Kind::Powerup(_))
            && (block_y - 16.0..=block_y - 13.0).contains(&powerup.y)
            && (block_x - 8.0..=block_x + 8.0).contains(&powerup.x)
        {
            powerup.vy = -3.0;
            powerup.y -= 2.0;
            powerup.dir = if player_x > block_x { 1 } else { -1 };
        }
    }

    for slot in 0..ENEMY_SLOTS {
        let hit = {
            let Some(enemy) = ctx.world.pool.get(slot) else {
                continue;
            };

            !enemy.remove
                && enemy.is_contact_enemy()
                && (block_y - 32.0..=block_y - 29.0).contains(&enemy.y)
                && (block_x - 8.0..=block_x + 8.0).contains(&enemy.x)
        };

        if hit {
            on_block_defeat(ctx, slot, block_x);
            ctx.sound(SoundEffect::Kick);
            break;
        }
    }
}

fn on_block_defeat(ctx: &mut Ctx, slot: usize, block_x: f32) {
    let (kind, x, y, palette) = {
        let Some(enemy) = ctx.world.pool.get(slot) else {
            return;
        };
        (enemy.kind, enemy.x, enemy.y, enemy.sub_palette)
    };

    ctx.give_score(block_defeat_score(&kind));

    if let Some(shell_kind) = shelled(&kind) {
        // knocked onto its back, tumbling off the block
        let state = ShellState {
            kind: shell_kind,
            moving: false,
            flipped: true,
            revival: ctx.tuning.rules.shell_revival_framerules(),
            kill_chain: 0,
        };
        let mut shell = Enemy::spawn(Kind::Shell(state), x, y);
        shell.vy = -3.0;
        shell.dir = if x > block_x { 1 } else { -1 };
        shell.animate = true;
        shell.sub_palette = palette;

        ctx.world.pool.replace(shell, slot);
    } else {
        if let Some(enemy) = ctx.world.pool.get_mut(slot) {
            enemy.remove = true;
        }
        ctx.events.push(GameEvent::EnemyKilled { slot });
    }
}

// ── Bouncing block overlay ──

/// Settle the bounce overlay once the bump cooldown has run out: the
/// original cell comes back, and a held powerup starts emerging.
pub fn update_bouncing_block(ctx: &mut Ctx) {
    if ctx.world.bump_timer != 0 {
        return;
    }

    let Some(block) = ctx.world.bouncing_block.take() else {
        return;
    };

    ctx.world.tiles.set(block.col, block.row, block.restored);
    ctx.world.tiles.set_attr(block.col, block.row, block.attr);

    if let Some(item) = block.item {
        let kind = powerup_kind_for(ctx.player, item);
        ctx.world
            .pool
            .add(Enemy::spawn_powerup(kind, block.x(), block.y()));
    }
}

/// A plain powerup upgrades to a flower for a big avatar.
fn powerup_kind_for(player: &PlayerBody, item: Item) -> PowerupKind {
    match item {
        Item::Star => PowerupKind::Star,
        Item::OneUp => PowerupKind::OneUp,
        _ => {
            if player.is_big() {
                PowerupKind::Flower
            } else {
                PowerupKind::Mushroom
            }
        }
    }
}

// ── Powerups ──

fn powerup_movement(ctx: &mut Ctx, enemy: &mut Enemy) {
    let Kind::Powerup(mut state) = enemy.kind else {
        return;
    };

    if state.emerge != 0 {
        enemy.y -= EMERGE_SPEED;
        state.emerge -= 1;
        enemy.kind = Kind::Powerup(state);
        return;
    }

    // flowers stay put once they have emerged
    if state.kind == PowerupKind::Flower {
        return;
    }

    enemy.x += f32::from(enemy.dir);

    let margin = ctx.tuning.rules.despawn_margin;
    let left = (ctx.world.camera - margin).max(0.0);
    let right = ctx.world.camera + VIEW_W + margin;

    if enemy.x < left || (enemy.dir == 1 && enemy.x > right) {
        enemy.remove = true;
        return;
    }

    enemy.y += enemy.vy;

    let top = enemy.y;
    if top >= VIEW_H {
        enemy.remove = true;
        return;
    }

    let star = state.kind == PowerupKind::Star;

    if star && enemy.vy < 0.0 {
        enemy.vy += 28.0 / 256.0;
    } else {
        enemy.vy = (enemy.vy + 61.0 / 256.0).min(MAX_FALL);
    }

    if !(TILE..223.0).contains(&top) {
        return;
    }

    if enemy.vy > 0.0 && ctx.world.tiles.point_in_tile(enemy.x + 8.0, top + 16.0) {
        enemy.y = (((top + 16.0) / TILE) as i32 - 1) as f32 * TILE;
        // stars bounce where mushrooms settle
        enemy.vy = if star { -3.0 } else { 0.0 };
    }

    let top = enemy.y;
    if top < 48.0 {
        return;
    }

    if ctx
        .world
        .tiles
        .point_in_tile(enemy.x + 12.0 + 4.0 * f32::from(enemy.dir), top + 12.0)
    {
        enemy.dir = -enemy.dir;
    }
}

/// While the world is frozen only the emerging powerup keeps rising, so
/// a mid-growth box payout is not stuck behind the scene.
pub fn update_emerging_powerup(ctx: &mut Ctx) {
    let Some(enemy) = ctx.world.pool.special_mut() else {
        return;
    };
    let Kind::Powerup(mut state) = enemy.kind else {
        return;
    };

    if state.emerge != 0 {
        enemy.y -= EMERGE_SPEED;
        state.emerge -= 1;
        enemy.kind = Kind::Powerup(state);
    }
}

pub fn handle_powerup_collisions(ctx: &mut Ctx) {
    let kind = {
        let Some(enemy) = ctx.world.pool.special() else {
            return;
        };
        let Kind::Powerup(state) = enemy.kind else {
            return;
        };

        if !enemy.hitbox().intersects(&ctx.player.hitbox()) {
            return;
        }

        state.kind
    };

    ctx.world.pool.clear(SPECIAL_SLOT);
    grant_power(ctx, kind);
    ctx.events.push(GameEvent::PowerupCollected);
}

fn grant_power(ctx: &mut Ctx, kind: PowerupKind) {
    match kind {
        PowerupKind::Mushroom | PowerupKind::Flower => {
            ctx.sound(SoundEffect::PowerupAcquire);
            grow_player(ctx);
            ctx.give_score(1000);
        }
        PowerupKind::Star => {
            ctx.sound(SoundEffect::PowerupAcquire);
            start_starman(ctx);
            ctx.give_score(1000);
        }
        PowerupKind::OneUp => ctx.give_life(),
    }
}

fn grow_player(ctx: &mut Ctx) {
    if ctx.player.is_big() {
        ctx.player.size = crate::domain::player::SizeTier::Fiery;
        ctx.world.start_cutscene(Box::new(FlowerScene::begin(ctx.player)));
    } else {
        ctx.player.size = crate::domain::player::SizeTier::Big;
        ctx.events.push(GameEvent::PlayerGrew);
        ctx.world.start_cutscene(Box::new(GrowScene::begin(ctx.player)));
    }
}

fn start_starman(ctx: &mut Ctx) {
    ctx.player.starman = STARMAN_FRAMERULES;
    ctx.player.start_palette_animation(2);
    ctx.audio.play_music(MusicTrack::Starman);
}

// ── Fireballs ──

pub fn update_fireballs(ctx: &mut Ctx) {
    for i in 0..ctx.world.fireballs.len() {
        let Some(mut ball) = ctx.world.fireballs[i].take() else {
            continue;
        };

        if update_fireball(ctx, &mut ball) {
            ctx.world.fireballs[i] = Some(ball);
        }
    }
}

/// One fireball tick. Returns false when the ball is spent.
fn update_fireball(ctx: &mut Ctx, ball: &mut super::world::Fireball) -> bool {
    ball.x += 4.0 * f32::from(ball.dir);

    let gone = if ball.dir == 1 {
        ball.x >= ctx.world.camera + VIEW_W
    } else {
        ball.x <= (ctx.world.camera - 8.0).max(0.0)
    };

    if gone {
        return false;
    }

    ball.y += ball.vy;
    ball.vy = (ball.vy + 0.3).min(MAX_FALL);

    let top = ball.y;
    if top >= VIEW_H {
        return false;
    }

    if fireball_hits_enemy(ctx, ball) {
        return false;
    }

    if !(24.0..215.0).contains(&top) {
        return true;
    }

    if ball.vy > 0.0 && ctx.world.tiles.point_in_tile(ball.x + 8.0, top + 8.0) {
        ball.y = ((top + 16.0) / TILE).trunc() * TILE - 8.0;
        ball.vy = -3.0;
    }

    let top = ball.y;
    if top < 56.0 {
        return true;
    }

    if ctx
        .world
        .tiles
        .point_in_tile(ball.x + 12.0 + 4.0 * f32::from(ball.dir), top + 4.0)
    {
        ctx.sound(SoundEffect::BlockHit);
        return false;
    }

    true
}

fn fireball_hits_enemy(ctx: &mut Ctx, ball: &super::world::Fireball) -> bool {
    let ball_box = Rect::new(ball.x + 4.0, ball.y + 4.0, 8.0, 8.0);

    for slot in 0..ENEMY_SLOTS {
        let hit = {
            let Some(enemy) = ctx.world.pool.get(slot) else {
                continue;
            };

            !enemy.remove
                && enemy.is_contact_enemy()
                && !enemy.is_fireproof()
                && ball_box.intersects(&enemy.hitbox())
        };

        if !hit {
            continue;
        }

        let kind = {
            let Some(enemy) = ctx.world.pool.get_mut(slot) else {
                continue;
            };
            enemy.remove = true;
            enemy.kind
        };

        ctx.sound(SoundEffect::Kick);
        ctx.give_score(touch_kill_score(&kind));
        ctx.events.push(GameEvent::EnemyKilled { slot });

        return true;
    }

    false
}

// ── Springs ──

/// The avatar landed on a spring trigger tile: lock collision and start
/// the compression on the spring standing there.
pub fn activate_spring(ctx: &mut Ctx) {
    let mut found = None;

    for slot in 0..TOTAL_SLOTS {
        if let Some(enemy) = ctx.world.pool.get(slot) {
            if matches!(enemy.kind, Kind::Spring(_)) && (enemy.x - ctx.player.x).abs() < TILE {
                found = Some(slot);
                break;
            }
        }
    }

    let Some(slot) = found else {
        ctx.player.on_feet_collision();
        return;
    };

    ctx.world.collision_mode = 0;
    ctx.player.state = PlayerState::Idle;
    ctx.player.anim_frame = 0;
    ctx.player.gravity = 112;
    ctx.player.vy = 0.0;

    let (pivot_x, pivot_y) = (ctx.player.x, ctx.player.y);

    if let Some(enemy) = ctx.world.pool.get_mut(slot) {
        if let Kind::Spring(state) = &mut enemy.kind {
            state.timer = 14;
            state.stage = 1;
            state.big_jump = false;
            state.jump_held_last = false;
            state.pivot_x = pivot_x;
            state.pivot_y = pivot_y;
        }
    }
}

fn spring_update(ctx: &mut Ctx, enemy: &mut Enemy) {
    let Kind::Spring(mut state) = enemy.kind else {
        return;
    };

    if state.timer == 0 {
        despawn(ctx, enemy);
        return;
    }

    state.timer -= 1;

    if state.timer > 5 {
        state.pivot_y += 2.0;
    } else {
        state.pivot_y -= 2.0;
    }

    // holding jump through the rebound buys the high launch
    if !ctx.player.jump_held {
        state.big_jump = false;
    } else if !state.jump_held_last {
        state.big_jump = state.timer <= 9;
    }
    state.jump_held_last = ctx.player.jump_held;

    match state.timer {
        9 => state.stage += 1,
        5 | 1 => state.stage = state.stage.saturating_sub(1),
        0 => {
            ctx.world.collision_mode = X_COLLISION | Y_COLLISION;
            ctx.player.state = PlayerState::Walking;
            ctx.player.anim_frame = 2;
            ctx.player.vy = if state.big_jump { -12.0 } else { -7.0 };

            ctx.sound(SoundEffect::SpringBounce);
            ctx.events.push(GameEvent::SpringLaunched);
        }
        _ => {}
    }

    ctx.player.x = state.pivot_x;
    ctx.player.y = state.pivot_y;

    enemy.kind = Kind::Spring(state);
}

// ── Lifts ──

/// The avatar is standing on lift `slot` this frame; falling and
/// balance lifts react to the weight.
pub fn on_player_land_on_lift(ctx: &mut Ctx, slot: usize) {
    let kind = match ctx.world.pool.get(slot) {
        Some(enemy) => enemy.kind,
        None => return,
    };
    let Kind::Lift(lift) = kind else {
        return;
    };

    match lift.kind {
        LiftKind::Falling => {
            if let Some(enemy) = ctx.world.pool.get_mut(slot) {
                enemy.y += 2.0;
            }
            ctx.player.y += 2.0;
        }
        LiftKind::Balance { .. } => balance_sink(ctx, slot),
        LiftKind::Constant | LiftKind::Oscillating { .. } => {}
    }
}

/// One side of a counterweight pair sinks under the avatar while the
/// partner rises, and the ropes above both are redrawn to match.
fn balance_sink(ctx: &mut Ctx, slot: usize) {
    let (x, y) = match ctx.world.pool.get(slot) {
        Some(enemy) => (enemy.x, enemy.y),
        None => return,
    };

    // bottomed out
    if y >= 176.0 {
        return;
    }

    let new_y = y + 2.0;
    if let Some(enemy) = ctx.world.pool.get_mut(slot) {
        enemy.y = new_y;
    }
    ctx.player.y += 2.0;

    let col = (x / TILE) as usize + 1;
    let row = (new_y / TILE) as usize;
    if row >= 4 {
        ctx.world.tiles.set(col, row - 3, Block::Scenery { texture: ROPE_TEXTURE });
        ctx.world.tiles.set_attr(col, row - 3, 1);
    }

    if let Some(partner_slot) = ctx.world.pool.balance_partner(slot) {
        let (px, py) = match ctx.world.pool.get(partner_slot) {
            Some(partner) => (partner.x, partner.y),
            None => return,
        };

        let partner_y = py - 2.0;
        if let Some(partner) = ctx.world.pool.get_mut(partner_slot) {
            partner.y = partner_y;
        }

        let pcol = (px / TILE) as usize + 1;
        let prow = (partner_y / TILE) as usize;
        if prow >= 2 {
            ctx.world.tiles.clear(pcol, prow - 2);
        }
    }
}
