use serde::{Deserialize, Serialize};

/// An axis-aligned box positioned relative to the entity that owns it.
/// `x` is measured forward along the entity's facing and `y` up from its
/// feet, so authored data is facing-agnostic; `to_world` mirrors it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect { x, y, w, h }
    }

    /// Resolve to arena coordinates for an entity at (`entity_x`,
    /// `entity_y`) facing `facing` (+1 right, -1 left).
    pub fn to_world(&self, entity_x: f32, entity_y: f32, facing: i8) -> WorldRect {
        let left = if facing >= 0 {
            entity_x + self.x
        }
        else {
            entity_x - self.x - self.w
        };
        WorldRect {
            left,
            right: left + self.w,
            bot:   entity_y + self.y,
            top:   entity_y + self.y + self.h,
        }
    }
}

/// A box resolved into arena coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldRect {
    pub left:  f32,
    pub right: f32,
    pub bot:   f32,
    pub top:   f32,
}

impl WorldRect {
    /// Touching edges do not overlap; a hit requires real interpenetration.
    pub fn overlaps(&self, other: &WorldRect) -> bool {
        self.left < other.right && other.left < self.right
            && self.bot < other.top && other.bot < self.top
    }
}
