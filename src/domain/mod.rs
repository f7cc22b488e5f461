pub mod block;
pub mod enemy;
pub mod physics;
pub mod player;
