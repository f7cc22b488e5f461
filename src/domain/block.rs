/// Block cell types and their capabilities.
/// Capabilities are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

/// Item held inside a hittable box.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Item {
    Coin,
    Powerup, // mushroom, upgraded to a flower for a big player
    Star,
    OneUp,
}

impl Item {
    pub fn is_powerup(self) -> bool {
        !matches!(self, Item::Coin)
    }
}

/// One grid cell. A cell holds zero or one Block; `texture` is the
/// driver-facing sprite id and carries no simulation meaning.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Block {
    /// Decor with no collision (bushes, clouds, flag cloth).
    Scenery { texture: u8 },
    /// Plain solid terrain.
    Solid { texture: u8 },
    /// Breakable by a big player; `multi_coin` bricks pay out coins
    /// on a timed window instead of breaking.
    Brick { texture: u8, multi_coin: bool },
    /// Question box holding an item.
    ItemBox { texture: u8, item: Item },
    /// Invisible box: solid only from below.
    HiddenBox { item: Item },
    /// Free-standing coin, collected on touch.
    Coin,
    /// What a collected coin turns into on the underwater theme.
    Water,
    /// Spent box.
    Used,
    /// Pipe body. `side_entry`/`down_entry` mark the enterable lips.
    Warp { texture: u8, side_entry: bool, down_entry: bool },
    /// Flagpole trigger column.
    Flagpole,
    /// Tile under a jump spring; landing on it fires the spring.
    SpringTrigger,
}

impl Block {
    /// Does this cell block movement?
    pub fn is_collidable(self) -> bool {
        matches!(
            self,
            Block::Solid { .. }
                | Block::Brick { .. }
                | Block::ItemBox { .. }
                | Block::HiddenBox { .. }
                | Block::Used
                | Block::Warp { .. }
                | Block::SpringTrigger
        )
    }

    /// Does hitting this cell from below do something?
    pub fn is_hittable(self) -> bool {
        matches!(
            self,
            Block::Brick { .. } | Block::ItemBox { .. } | Block::HiddenBox { .. }
        )
    }

    /// Can a big player smash this cell?
    pub fn is_breakable(self) -> bool {
        matches!(self, Block::Brick { multi_coin: false, .. })
    }

    /// Invisible until hit; feet and side passes ignore it.
    pub fn is_hidden(self) -> bool {
        matches!(self, Block::HiddenBox { .. })
    }

    pub fn is_coin(self) -> bool {
        matches!(self, Block::Coin)
    }

    pub fn is_flagpole(self) -> bool {
        matches!(self, Block::Flagpole)
    }

    pub fn is_spring_trigger(self) -> bool {
        matches!(self, Block::SpringTrigger)
    }

    pub fn is_side_warp(self) -> bool {
        matches!(self, Block::Warp { side_entry: true, .. })
    }

    pub fn is_down_warp(self) -> bool {
        matches!(self, Block::Warp { down_entry: true, .. })
    }

    /// The item granted when this cell is hit from below.
    pub fn item(self) -> Option<Item> {
        match self {
            Block::ItemBox { item, .. } | Block::HiddenBox { item } => Some(item),
            _ => None,
        }
    }

    /// Multi-coin bricks keep paying inside the coin window; question
    /// boxes always spend on the first hit.
    pub fn is_multi_coin(self) -> bool {
        matches!(self, Block::Brick { multi_coin: true, .. })
    }

    pub fn texture(self) -> u8 {
        match self {
            Block::Scenery { texture }
            | Block::Solid { texture }
            | Block::Brick { texture, .. }
            | Block::ItemBox { texture, .. }
            | Block::Warp { texture, .. } => texture,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bricks_break_unless_multi_coin() {
        assert!(Block::Brick { texture: 0, multi_coin: false }.is_breakable());
        assert!(!Block::Brick { texture: 0, multi_coin: true }.is_breakable());
    }

    #[test]
    fn hidden_boxes_are_collidable_but_hidden() {
        let b = Block::HiddenBox { item: Item::Coin };
        assert!(b.is_collidable());
        assert!(b.is_hidden());
        assert!(b.is_hittable());
    }

    #[test]
    fn scenery_and_pickups_do_not_collide() {
        assert!(!Block::Scenery { texture: 4 }.is_collidable());
        assert!(!Block::Coin.is_collidable());
        assert!(!Block::Flagpole.is_collidable());
        assert!(!Block::Water.is_collidable());
    }

    #[test]
    fn used_box_no_longer_hittable() {
        assert!(Block::Used.is_collidable());
        assert!(!Block::Used.is_hittable());
        assert_eq!(Block::Used.item(), None);
    }

    #[test]
    fn warp_entries() {
        let side = Block::Warp { texture: 8, side_entry: true, down_entry: false };
        let down = Block::Warp { texture: 5, side_entry: false, down_entry: true };
        assert!(side.is_side_warp() && !side.is_down_warp());
        assert!(down.is_down_warp() && !down.is_side_warp());
    }
}
