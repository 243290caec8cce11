use serde::{Deserialize, Serialize};

/// The simulation runs at a fixed 60 frames per second.
pub const FPS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rules {
    pub rounds_to_win:      u32,
    pub round_time_seconds: u64,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            rounds_to_win:      2,
            round_time_seconds: 99,
        }
    }
}

impl Rules {
    pub fn round_time_frames(&self) -> u64 {
        self.round_time_seconds * FPS
    }
}
