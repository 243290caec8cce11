//! Deterministic fighting-game combat core. Fixed 60fps frame stepping,
//! no rendering, no audio, no real input devices: the host feeds
//! [`game::tick`] one `InputFrame` per entity and gets the next
//! [`game::GameState`] back.

pub mod character;
pub mod collision;
pub mod error;
pub mod fighter;
pub mod game;
pub mod geometry;
pub mod input;
pub mod logger;
pub mod motion;
pub mod physics;
pub mod projectile;
pub mod rules;
pub mod special;
pub mod stage;
