use serde::{Deserialize, Serialize};

/// The arena a match is fought in. Flat ground, hard side bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub width:       f32,
    pub height:      f32,
    /// y coordinate of the ground. Fighters at or below this are grounded.
    pub ground:      f32,
    pub left_bound:  f32,
    pub right_bound: f32,
    /// How far past the bounds a projectile may travel before it is culled.
    pub projectile_margin: f32,
}

impl Default for Stage {
    fn default() -> Stage {
        Stage {
            width:             800.0,
            height:            600.0,
            ground:            0.0,
            left_bound:        40.0,
            right_bound:       760.0,
            projectile_margin: 100.0,
        }
    }
}

impl Stage {
    pub fn clamp_x(&self, x: f32) -> f32 {
        x.max(self.left_bound).min(self.right_bound)
    }

    /// True once a projectile has left the arena by more than the margin.
    pub fn projectile_out_of_bounds(&self, x: f32) -> bool {
        x < self.left_bound - self.projectile_margin || x > self.right_bound + self.projectile_margin
    }
}
