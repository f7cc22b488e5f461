/// Fixed-capacity entity pool: five enemy slots plus one special slot.
///
/// The special slot hosts at most one of flag, star flag or an emerged
/// powerup; springs and star flags overflow into it when the enemy
/// slots are full. Spawns arrive as pending groups sorted by x and
/// materialize when the camera gets close. A group that only partially
/// fits keeps its unplaced tail pending instead of dropping it.
use crate::domain::enemy::{Enemy, Kind, LiftKind};
use crate::domain::physics::{TILE, VIEW_W};

use super::world::shift_entity_anchor;

pub const ENEMY_SLOTS: usize = 5;
pub const SPECIAL_SLOT: usize = 5;
pub const TOTAL_SLOTS: usize = ENEMY_SLOTS + 1;

/// How far ahead of the right screen edge a pending group may wake.
const SPAWN_LOOKAHEAD: f32 = TILE * 3.0;

pub struct EntityPool {
    slots: [Option<Enemy>; TOTAL_SLOTS],
    /// Pending spawn groups, ascending by head x.
    pending: Vec<Vec<Enemy>>,
}

impl EntityPool {
    pub fn new() -> Self {
        EntityPool { slots: Default::default(), pending: vec![] }
    }

    pub fn reset(&mut self) {
        self.slots = Default::default();
        self.pending.clear();
    }

    // ── Slot access ──

    pub fn get(&self, slot: usize) -> Option<&Enemy> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Enemy> {
        self.slots.get_mut(slot).and_then(|s| s.as_mut())
    }

    /// Pull an entity out for exclusive processing; pair with
    /// [`put_back`](Self::put_back) unless it was replaced or removed.
    pub fn take(&mut self, slot: usize) -> Option<Enemy> {
        self.slots.get_mut(slot).and_then(|s| s.take())
    }

    /// Return a taken entity, unless its slot was reused meanwhile.
    pub fn put_back(&mut self, slot: usize, enemy: Enemy) {
        if let Some(cell) = self.slots.get_mut(slot) {
            if cell.is_none() {
                *cell = Some(enemy);
            }
        }
    }

    pub fn special(&self) -> Option<&Enemy> {
        self.get(SPECIAL_SLOT)
    }

    pub fn special_mut(&mut self) -> Option<&mut Enemy> {
        self.get_mut(SPECIAL_SLOT)
    }

    pub fn clear(&mut self, slot: usize) {
        if let Some(cell) = self.slots.get_mut(slot) {
            *cell = None;
        }
    }

    // ── Spawning ──

    /// Place an entity in the pool. Flags and powerups always claim the
    /// special slot; star flags and springs may use it when the enemy
    /// slots are full, and a star flag evicts whatever is there as a
    /// last resort. Returns false (pool unchanged) when nothing fits.
    pub fn add(&mut self, enemy: Enemy) -> bool {
        self.try_add(enemy).is_ok()
    }

    fn try_add(&mut self, mut enemy: Enemy) -> Result<(), Enemy> {
        if matches!(enemy.kind, Kind::Flag { .. } | Kind::Powerup(_)) {
            enemy.slot = SPECIAL_SLOT;
            self.slots[SPECIAL_SLOT] = Some(enemy);
            return Ok(());
        }

        let use_special = matches!(enemy.kind, Kind::StarFlag | Kind::Spring(_));
        let total = if use_special { TOTAL_SLOTS } else { ENEMY_SLOTS };

        for i in 0..total {
            if self.slots[i].is_none() {
                enemy.slot = i;

                if let Kind::Lift(lift) = &mut enemy.kind {
                    if let LiftKind::Balance { partner } = &mut lift.kind {
                        *partner = self.pair_balance_lift(i);
                    }
                }

                self.slots[i] = Some(enemy);
                return Ok(());
            }
        }

        if matches!(enemy.kind, Kind::StarFlag) {
            enemy.slot = SPECIAL_SLOT;
            self.slots[SPECIAL_SLOT] = Some(enemy);
            return Ok(());
        }

        Err(enemy)
    }

    /// Link the incoming balance lift (destined for `slot`) with the
    /// first balance lift still missing a partner.
    fn pair_balance_lift(&mut self, slot: usize) -> Option<usize> {
        for i in 0..ENEMY_SLOTS {
            if let Some(other) = self.slots[i].as_mut() {
                if let Kind::Lift(lift) = &mut other.kind {
                    if let LiftKind::Balance { partner: partner @ None } = &mut lift.kind {
                        *partner = Some(slot);
                        return Some(i);
                    }
                }
            }
        }

        None
    }

    /// Overwrite a slot, keeping the index coherent. Used when an
    /// archetype transforms in place (stomped walker, reviving shell).
    pub fn replace(&mut self, mut enemy: Enemy, slot: usize) {
        if slot < TOTAL_SLOTS {
            enemy.slot = slot;
            self.slots[slot] = Some(enemy);
        }
    }

    /// The balance-lift partner of `slot`, validated both ways.
    pub fn balance_partner(&self, slot: usize) -> Option<usize> {
        let enemy = self.get(slot)?;

        if let Kind::Lift(lift) = &enemy.kind {
            if let LiftKind::Balance { partner: Some(partner) } = lift.kind {
                if self.get(partner).is_some_and(|e| e.is_lift()) {
                    return Some(partner);
                }
            }
        }

        None
    }

    // ── Pending groups ──

    /// Queue a spawn group; groups are kept ascending by head x.
    pub fn queue_group(&mut self, group: Vec<Enemy>) {
        if group.is_empty() {
            return;
        }

        let head_x = group[0].x;
        let at = self
            .pending
            .iter()
            .position(|g| g[0].x > head_x)
            .unwrap_or(self.pending.len());
        self.pending.insert(at, group);
    }

    pub fn pending_groups(&self) -> usize {
        self.pending.len()
    }

    /// Materialize the first pending group within reach of the camera.
    /// Entities that do not fit stay pending for a later frame.
    pub fn load_pending(&mut self, camera: f32) {
        let threshold = camera + VIEW_W + SPAWN_LOOKAHEAD;

        let Some(at) = self.pending.iter().position(|g| g[0].x <= threshold) else {
            return;
        };

        let mut group = self.pending.remove(at);
        let mut leftover = Vec::new();

        for enemy in group.drain(..) {
            if !leftover.is_empty() {
                leftover.push(enemy);
            } else if let Err(enemy) = self.try_add(enemy) {
                leftover.push(enemy);
            }
        }

        if !leftover.is_empty() {
            self.queue_group(leftover);
        }
    }

    // ── Streaming ──

    pub fn shift_left(&mut self, dx: f32) {
        for enemy in self.slots.iter_mut().flatten() {
            enemy.x -= dx;
            shift_entity_anchor(&mut enemy.kind, dx);
        }

        for group in &mut self.pending {
            for enemy in group {
                enemy.x -= dx;
                shift_entity_anchor(&mut enemy.kind, dx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enemy::{LiftState, PowerupKind, SpringState};

    fn grub(x: f32) -> Enemy {
        Enemy::spawn(Kind::Grub, x, 160.0)
    }

    fn balance_lift(x: f32) -> Enemy {
        Enemy::spawn(
            Kind::Lift(LiftState { kind: LiftKind::Balance { partner: None }, size: 6 }),
            x,
            80.0,
        )
    }

    fn spring() -> Enemy {
        Enemy::spawn(
            Kind::Spring(SpringState {
                timer: 0,
                stage: 0,
                big_jump: false,
                jump_held_last: false,
                pivot_x: 0.0,
                pivot_y: 0.0,
            }),
            300.0,
            144.0,
        )
    }

    // ── Slot assignment ──

    #[test]
    fn slots_fill_in_order_and_record_their_index() {
        let mut pool = EntityPool::new();

        for i in 0..ENEMY_SLOTS {
            assert!(pool.add(grub(i as f32 * 20.0)));
            assert_eq!(pool.get(i).map(|e| e.slot), Some(i));
        }

        // enemy slots exhausted, plain enemies bounce
        assert!(!pool.add(grub(999.0)));
        assert!(pool.special().is_none());
    }

    #[test]
    fn flag_always_claims_the_special_slot() {
        let mut pool = EntityPool::new();
        assert!(pool.add(Enemy::spawn(Kind::Flag { moving: false }, 500.0, 48.0)));

        let flag = pool.special().unwrap();
        assert_eq!(flag.slot, SPECIAL_SLOT);
    }

    #[test]
    fn spring_overflows_into_the_special_slot() {
        let mut pool = EntityPool::new();
        for i in 0..ENEMY_SLOTS {
            pool.add(grub(i as f32));
        }

        assert!(pool.add(spring()));
        assert!(matches!(pool.special().unwrap().kind, Kind::Spring(_)));
    }

    #[test]
    fn star_flag_evicts_as_a_last_resort() {
        let mut pool = EntityPool::new();
        for i in 0..ENEMY_SLOTS {
            pool.add(grub(i as f32));
        }
        pool.add(Enemy::spawn(Kind::Flag { moving: false }, 500.0, 48.0));

        assert!(pool.add(Enemy::spawn(Kind::StarFlag, 520.0, 48.0)));
        assert!(matches!(pool.special().unwrap().kind, Kind::StarFlag));
    }

    #[test]
    fn powerup_spawns_into_the_special_slot() {
        let mut pool = EntityPool::new();
        assert!(pool.add(Enemy::spawn_powerup(PowerupKind::Mushroom, 96.0, 112.0)));
        assert!(matches!(pool.special().unwrap().kind, Kind::Powerup(_)));
    }

    // ── Balance lifts ──

    #[test]
    fn balance_lifts_pair_with_the_first_unpaired() {
        let mut pool = EntityPool::new();
        pool.add(balance_lift(100.0));
        pool.add(balance_lift(150.0));
        pool.add(balance_lift(300.0));
        pool.add(balance_lift(350.0));

        assert_eq!(pool.balance_partner(0), Some(1));
        assert_eq!(pool.balance_partner(1), Some(0));
        assert_eq!(pool.balance_partner(2), Some(3));
        assert_eq!(pool.balance_partner(3), Some(2));
    }

    #[test]
    fn balance_partner_is_invalidated_when_the_slot_is_reused() {
        let mut pool = EntityPool::new();
        pool.add(balance_lift(100.0));
        pool.add(balance_lift(150.0));

        pool.clear(1);
        pool.add(grub(200.0));

        assert_eq!(pool.balance_partner(0), None);
    }

    // ── Take and put back ──

    #[test]
    fn put_back_respects_a_reused_slot() {
        let mut pool = EntityPool::new();
        pool.add(grub(10.0));

        let taken = pool.take(0).unwrap();
        pool.replace(grub(99.0), 0);
        pool.put_back(0, taken);

        assert_eq!(pool.get(0).map(|e| e.x), Some(99.0));
    }

    // ── Pending groups ──

    #[test]
    fn pending_groups_wake_in_x_order() {
        let mut pool = EntityPool::new();
        pool.queue_group(vec![grub(900.0)]);
        pool.queue_group(vec![grub(310.0)]);

        pool.load_pending(0.0);
        assert_eq!(pool.get(0).map(|e| e.x), Some(310.0));
        assert_eq!(pool.pending_groups(), 1);

        // the far group stays asleep
        pool.load_pending(0.0);
        assert!(pool.get(1).is_none());
    }

    #[test]
    fn partially_placed_group_keeps_its_tail() {
        let mut pool = EntityPool::new();
        for i in 0..4 {
            pool.add(grub(i as f32));
        }

        pool.queue_group(vec![grub(300.0), grub(310.0), grub(320.0)]);
        pool.load_pending(100.0);

        // one fit, two wait for free slots
        assert_eq!(pool.get(4).map(|e| e.x), Some(300.0));
        assert_eq!(pool.pending_groups(), 1);

        pool.clear(0);
        pool.clear(1);
        pool.load_pending(100.0);
        assert_eq!(pool.get(0).map(|e| e.x), Some(310.0));
        assert_eq!(pool.get(1).map(|e| e.x), Some(320.0));
        assert_eq!(pool.pending_groups(), 0);
    }
}
