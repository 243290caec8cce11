use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::input::{Button, InputFrame};

/// Directional history depth, in frames.
pub const HISTORY_FRAMES: usize = 60;
/// Per-gesture cooldown applied after a successful detection.
pub const GESTURE_COOLDOWN: u64 = 15;
/// Consecutive frames of back/down required to bank a charge.
pub const CHARGE_FRAMES: u32 = 40;
/// A banked charge may still be spent this many frames after release.
const CHARGE_RELEASE_GRACE: u64 = 8;

/// Frames scanned for quarter/half circle and dragon punch geometry.
const PATTERN_WINDOW: usize = 12;
const CIRCLE_WINDOW: usize = 16;
const DOUBLE_TAP_WINDOW: usize = 10;

/// 8-way stick direction, facing-relative: `Forward` is towards the
/// opponent regardless of which side the entity is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dir {
    Neutral,
    Up,
    Down,
    Back,
    Forward,
    UpBack,
    UpForward,
    DownBack,
    DownForward,
}

impl Dir {
    /// Collapse a raw pressed-action set into a facing-relative direction.
    pub fn from_input(input: &InputFrame, facing: i8) -> Dir {
        use crate::input::Action;
        let up   = input.pressed(Action::Up);
        let down = input.pressed(Action::Down);
        let (forward, back) = if facing >= 0 {
            (input.pressed(Action::Right), input.pressed(Action::Left))
        }
        else {
            (input.pressed(Action::Left), input.pressed(Action::Right))
        };

        match (up, down, forward && !back, back && !forward) {
            (true,  false, true,  _)     => Dir::UpForward,
            (true,  false, _,     true)  => Dir::UpBack,
            (true,  false, false, false) => Dir::Up,
            (false, true,  true,  _)     => Dir::DownForward,
            (false, true,  _,     true)  => Dir::DownBack,
            (false, true,  false, false) => Dir::Down,
            (_,     _,     true,  _)     => Dir::Forward,
            (_,     _,     _,     true)  => Dir::Back,
            _                            => Dir::Neutral,
        }
    }

    fn is_forward(&self) -> bool {
        matches!(self, Dir::Forward | Dir::UpForward | Dir::DownForward)
    }

    fn is_back(&self) -> bool {
        matches!(self, Dir::Back | Dir::UpBack | Dir::DownBack)
    }

    fn is_down(&self) -> bool {
        matches!(self, Dir::Down | Dir::DownBack | Dir::DownForward)
    }

    fn is_up(&self) -> bool {
        matches!(self, Dir::Up | Dir::UpBack | Dir::UpForward)
    }
}

/// The classical gesture vocabulary, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MotionType {
    FullCircle,
    ChargeBackForward,
    ChargeDownUp,
    DragonPunch,
    HalfCircleForward,
    HalfCircleBack,
    QuarterCircleForward,
    QuarterCircleBack,
    DoubleTapForward,
    DoubleTapBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedMotion {
    pub motion:     MotionType,
    pub button:     Button,
    /// 1.0 for an exact geometric pattern, 0.6-0.8 for the lenient
    /// simplified patterns that keep imprecise (touch) input viable.
    pub confidence: f32,
    /// Frames the stick was held for a charge motion, 0 for every other
    /// gesture. Specials with a longer hold requirement check this.
    pub charge:     u32,
    /// Frames since detection. A host that buffers a gesture while the
    /// fighter is busy ages it here; specials bound it per-move.
    pub age:        u64,
}

/// Stateful per-entity gesture recognizer. One `step` call per frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MotionDetector {
    history:      VecDeque<Dir>,
    prev_buttons: Vec<Button>,
    back_charge:  u32,
    down_charge:  u32,
    /// (release frame, frames held) of the last full back/down charge.
    back_charge_release: Option<(u64, u32)>,
    down_charge_release: Option<(u64, u32)>,
    /// Gesture kind -> frame its cooldown expires.
    cooldowns: BTreeMap<MotionType, u64>,
    frame:     u64,
}

impl MotionDetector {
    pub fn new() -> MotionDetector {
        MotionDetector::default()
    }

    /// Clears all history, charge state and cooldowns (round start).
    pub fn reset(&mut self) {
        self.history.clear();
        self.prev_buttons.clear();
        self.back_charge = 0;
        self.down_charge = 0;
        self.back_charge_release = None;
        self.down_charge_release = None;
        self.cooldowns.clear();
    }

    /// A caller that actually executed the gesture clears its cooldown so
    /// the next attempt is not penalized.
    pub fn clear_cooldown(&mut self, motion: MotionType) {
        self.cooldowns.remove(&motion);
    }

    pub fn charge_frames_back(&self) -> u32 {
        self.back_charge
    }

    pub fn charge_frames_down(&self) -> u32 {
        self.down_charge
    }

    /// Consume one frame of (direction, held buttons). Attempts pattern
    /// matches only on frames where a button was newly pressed.
    pub fn step(&mut self, dir: Dir, buttons: &[Button]) -> Option<DetectedMotion> {
        self.frame += 1;

        // charge accounting happens before the new direction is recorded so
        // the frame that releases the charge can still spend it
        let banked_back = self.available_charge(self.back_charge, self.back_charge_release);
        let banked_down = self.available_charge(self.down_charge, self.down_charge_release);

        if dir.is_back() {
            self.back_charge += 1;
        }
        else {
            if self.back_charge >= CHARGE_FRAMES {
                self.back_charge_release = Some((self.frame, self.back_charge));
            }
            self.back_charge = 0;
        }
        if dir.is_down() {
            self.down_charge += 1;
        }
        else {
            if self.down_charge >= CHARGE_FRAMES {
                self.down_charge_release = Some((self.frame, self.down_charge));
            }
            self.down_charge = 0;
        }

        if self.history.len() == HISTORY_FRAMES {
            self.history.pop_front();
        }
        self.history.push_back(dir);

        let mut new_buttons: Vec<Button> =
            buttons.iter().filter(|b| !self.prev_buttons.contains(*b)).cloned().collect();
        new_buttons.sort();
        self.prev_buttons = buttons.to_vec();

        let button = match new_buttons.first() {
            Some(button) => *button,
            None         => return None,
        };

        self.detect(dir, button, banked_back, banked_down)
    }

    /// Frames of charge spendable right now: a live hold past the minimum,
    /// or a full hold released inside the grace window.
    fn available_charge(&self, held: u32, release: Option<(u64, u32)>) -> Option<u32> {
        if held >= CHARGE_FRAMES {
            Some(held)
        }
        else {
            release
                .filter(|&(frame, _)| self.frame - frame <= CHARGE_RELEASE_GRACE)
                .map(|(_, held)| held)
        }
    }

    fn detect(&mut self, dir: Dir, button: Button, banked_back: Option<u32>, banked_down: Option<u32>) -> Option<DetectedMotion> {
        let candidates = [
            (MotionType::FullCircle,           self.full_circle()),
            (MotionType::ChargeBackForward,    if banked_back.is_some() && dir.is_forward() { Some(1.0) } else { None }),
            (MotionType::ChargeDownUp,         if banked_down.is_some() && dir.is_up()      { Some(1.0) } else { None }),
            (MotionType::DragonPunch,          self.dragon_punch()),
            (MotionType::HalfCircleForward,    self.half_circle(true)),
            (MotionType::HalfCircleBack,       self.half_circle(false)),
            (MotionType::QuarterCircleForward, self.quarter_circle(true)),
            (MotionType::QuarterCircleBack,    self.quarter_circle(false)),
            (MotionType::DoubleTapForward,     self.double_tap(true)),
            (MotionType::DoubleTapBack,        self.double_tap(false)),
        ];

        for (motion, matched) in candidates {
            if let Some(confidence) = matched {
                if self.on_cooldown(motion) {
                    // A held quarter-circle would otherwise decay into the
                    // double-tap patterns below it and fire an unintended
                    // move on every subsequent frame.
                    if let MotionType::QuarterCircleForward = motion {
                        return None;
                    }
                    continue;
                }
                self.cooldowns.insert(motion, self.frame + GESTURE_COOLDOWN);
                let charge = match motion {
                    MotionType::ChargeBackForward => banked_back.unwrap_or(0),
                    MotionType::ChargeDownUp      => banked_down.unwrap_or(0),
                    _                             => 0,
                };
                return Some(DetectedMotion { motion, button, confidence, charge, age: 0 });
            }
        }
        None
    }

    fn on_cooldown(&self, motion: MotionType) -> bool {
        self.cooldowns.get(&motion).map_or(false, |expires| self.frame < *expires)
    }

    fn recent(&self, window: usize) -> Vec<Dir> {
        let start = self.history.len().saturating_sub(window);
        self.history.iter().skip(start).cloned().collect()
    }

    fn quarter_circle(&self, forward: bool) -> Option<f32> {
        let dirs = self.recent(PATTERN_WINDOW);
        let (diag, end): (fn(&Dir) -> bool, fn(&Dir) -> bool) = if forward {
            (|d| matches!(d, Dir::DownForward), Dir::is_forward)
        }
        else {
            (|d| matches!(d, Dir::DownBack), Dir::is_back)
        };

        if contains_pattern(&dirs, &[&Dir::is_down, &diag, &end]) {
            Some(1.0)
        }
        else if contains_pattern(&dirs, &[&Dir::is_down, &end]) {
            Some(0.7)
        }
        else {
            None
        }
    }

    fn dragon_punch(&self) -> Option<f32> {
        let dirs = self.recent(PATTERN_WINDOW);
        let diag = |d: &Dir| matches!(d, Dir::DownForward);
        if contains_pattern(&dirs, &[&Dir::is_forward, &Dir::is_down, &diag]) {
            Some(1.0)
        }
        else if contains_pattern(&dirs, &[&Dir::is_forward, &Dir::is_down, &Dir::is_forward]) {
            Some(0.8)
        }
        else {
            None
        }
    }

    fn half_circle(&self, forward: bool) -> Option<f32> {
        let dirs = self.recent(PATTERN_WINDOW);
        let (start, end): (fn(&Dir) -> bool, fn(&Dir) -> bool) = if forward {
            (Dir::is_back, Dir::is_forward)
        }
        else {
            (Dir::is_forward, Dir::is_back)
        };
        if contains_pattern(&dirs, &[&start, &Dir::is_down, &end]) {
            if dirs.iter().any(|d| matches!(d, Dir::DownBack)) && dirs.iter().any(|d| matches!(d, Dir::DownForward)) {
                Some(1.0)
            }
            else {
                Some(0.6)
            }
        }
        else {
            None
        }
    }

    /// Full rotational order from any starting point, either way round,
    /// scores exact; merely touching all four quadrants is lenient.
    fn full_circle(&self) -> Option<f32> {
        let dirs = self.recent(CIRCLE_WINDOW);
        let quadrants: [&dyn Fn(&Dir) -> bool; 4] =
            [&Dir::is_forward, &Dir::is_down, &Dir::is_back, &Dir::is_up];

        for start in 0..4 {
            let cw:  Vec<&dyn Fn(&Dir) -> bool> = (0..4).map(|i| quadrants[(start + i) % 4]).collect();
            let ccw: Vec<&dyn Fn(&Dir) -> bool> = (0..4).map(|i| quadrants[(start + 4 - i) % 4]).collect();
            if contains_pattern(&dirs, &cw) || contains_pattern(&dirs, &ccw) {
                return Some(1.0);
            }
        }
        let hit_all = quadrants.iter().all(|quadrant| dirs.iter().any(|d| quadrant(d)));
        if hit_all {
            Some(0.8)
        }
        else {
            None
        }
    }

    fn double_tap(&self, forward: bool) -> Option<f32> {
        let dirs = self.recent(DOUBLE_TAP_WINDOW);
        let tap: fn(&Dir) -> bool = if forward { Dir::is_forward } else { Dir::is_back };
        let released = |d: &Dir| !tap(d);
        if contains_pattern(&dirs, &[&tap, &released, &tap]) {
            Some(1.0)
        }
        else {
            None
        }
    }
}

/// Ordered-subsequence match of direction predicates over a frame window.
fn contains_pattern(dirs: &[Dir], pattern: &[&dyn Fn(&Dir) -> bool]) -> bool {
    let mut next = 0;
    for dir in dirs {
        if pattern[next](dir) {
            next += 1;
            if next == pattern.len() {
                return true;
            }
        }
    }
    false
}

/// All motion detectors for one match, keyed by entity id. Never share a
/// bank between matches: detector state is match-local.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MotionBank {
    detectors: BTreeMap<u64, MotionDetector>,
}

impl MotionBank {
    pub fn new() -> MotionBank {
        MotionBank::default()
    }

    pub fn register(&mut self, entity_id: u64) {
        self.detectors.entry(entity_id).or_insert_with(MotionDetector::new);
    }

    /// Unknown ids are a caller bug, not a game-rule edge case.
    pub fn detector(&mut self, entity_id: u64) -> Result<&mut MotionDetector, CoreError> {
        self.detectors.get_mut(&entity_id).ok_or(CoreError::EntityNotFound(entity_id))
    }

    /// Run one entity's detector over a raw input frame.
    pub fn step(&mut self, entity_id: u64, input: &InputFrame, facing: i8) -> Result<Option<DetectedMotion>, CoreError> {
        let dir = Dir::from_input(input, facing);
        let buttons = input.buttons();
        self.detector(entity_id).map(|detector| detector.step(dir, &buttons))
    }

    pub fn reset_all(&mut self) {
        for detector in self.detectors.values_mut() {
            detector.reset();
        }
    }
}
