use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::motion::DetectedMotion;

/// Rolling history depth, in frames, kept per entity.
pub const BUFFER_FRAMES: usize = 30;

/// Everything a combatant can physically press on a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Block,
    LightPunch,
    HeavyPunch,
    LightKick,
    HeavyKick,
}

/// The four attack buttons, split out of `Action` where only attacks make
/// sense (motion gestures, move tables).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Button {
    LightPunch,
    HeavyPunch,
    LightKick,
    HeavyKick,
}

impl Default for Button {
    fn default() -> Button {
        Button::LightPunch
    }
}

impl Button {
    pub fn is_heavy(&self) -> bool {
        matches!(self, Button::HeavyPunch | Button::HeavyKick)
    }

    pub fn from_action(action: Action) -> Option<Button> {
        match action {
            Action::LightPunch => Some(Button::LightPunch),
            Action::HeavyPunch => Some(Button::HeavyPunch),
            Action::LightKick  => Some(Button::LightKick),
            Action::HeavyKick  => Some(Button::HeavyKick),
            _                  => None,
        }
    }
}

/// One frame of input for one entity, as consumed by `tick`.
/// An absent entry in the tick input map is equivalent to
/// `InputFrame::default()`: nothing pressed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    pub pressed: Vec<Action>,
    /// Frame stamp from the capture layer, if it provides one.
    pub frame:   Option<u64>,
    /// A gesture the host's motion detector recognized this frame.
    pub motion:  Option<DetectedMotion>,
}

impl InputFrame {
    pub fn new(pressed: Vec<Action>) -> InputFrame {
        InputFrame { pressed, frame: None, motion: None }
    }

    pub fn pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    pub fn buttons(&self) -> Vec<Button> {
        self.pressed.iter().filter_map(|a| Button::from_action(*a)).collect()
    }
}

/// Fixed-capacity rolling history of pressed-action sets for one entity.
/// The newest frame is at the back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputBuffer {
    frames: VecDeque<Vec<Action>>,
}

impl InputBuffer {
    pub fn new() -> InputBuffer {
        InputBuffer { frames: VecDeque::with_capacity(BUFFER_FRAMES) }
    }

    /// Append one frame of pressed actions, evicting the oldest when full.
    pub fn push(&mut self, pressed: Vec<Action>) {
        if self.frames.len() == BUFFER_FRAMES {
            self.frames.pop_front();
        }
        self.frames.push_back(pressed);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Was `action` pressed on any of the last `window` frames?
    pub fn pressed_within(&self, action: Action, window: usize) -> bool {
        self.frames.iter().rev().take(window).any(|frame| frame.contains(&action))
    }

    /// Ordered-subsequence match: do the last `window` frames contain
    /// `sequence` in order, oldest first? Gaps are allowed, so this suits
    /// simple linear chains rather than strict gesture geometry.
    pub fn matches_sequence(&self, sequence: &[Action], window: usize) -> bool {
        if sequence.is_empty() {
            return true;
        }
        let start = self.frames.len().saturating_sub(window);
        let mut next = 0;
        for frame in self.frames.iter().skip(start) {
            if frame.contains(&sequence[next]) {
                next += 1;
                if next == sequence.len() {
                    return true;
                }
            }
        }
        false
    }
}
