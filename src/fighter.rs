use log::warn;
use serde::{Deserialize, Serialize};

use crate::character::{CharacterDef, ProjectileDef, StanceReq, Strength};
use crate::geometry::Rect;
use crate::input::{Action, InputFrame};
use crate::special;

pub const WALK_SPEED:      f32 = 3.0;
pub const BACK_WALK_SPEED: f32 = 2.4;
pub const JUMP_X_VEL:      f32 = 3.5;
pub const JUMP_Y_VEL:      f32 = 13.0;

pub const ENERGY_REGEN: f32 = 0.25;
pub const METER_REGEN:  f32 = 0.1;

/// Frames a combo survives without a fresh hit before it resets.
pub const COMBO_TIMEOUT: u64 = 90;
/// Minimum spacing between two cancels, to stop zero-cost cancel loops.
pub const MIN_CANCEL_INTERVAL: u64 = 10;

pub const KNOCKDOWN_FRAMES:     u64 = 30;
pub const WAKEUP_INVULN_FRAMES: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Idle,
    WalkForward,
    WalkBackward,
    Crouch,
    Jump,
    Attack,
    Block,
    Hitstun,
    Blockstun,
    Knockdown,
    Wakeup,
}

impl Status {
    pub fn stunned(&self) -> bool {
        matches!(self, Status::Hitstun | Status::Blockstun | Status::Knockdown | Status::Wakeup)
    }
}

/// The move currently playing out, if any. A fighter runs at most one
/// attack at a time; starting a special while a normal plays (a cancel)
/// replaces the slot outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActiveAttack {
    Normal  { id: String },
    Special { id: String, strength: Strength },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    pub hits:           u32,
    /// Multiplier applied to the NEXT hit of the combo.
    pub scaling:        f32,
    pub start_frame:    u64,
    pub last_hit_frame: u64,
}

impl ComboState {
    pub fn new() -> ComboState {
        ComboState { hits: 0, scaling: 1.0, start_frame: 0, last_hit_frame: 0 }
    }

    pub fn reset(&mut self) {
        *self = ComboState::new();
    }

    pub fn register_hit(&mut self, frame: u64) {
        if self.hits == 0 {
            self.start_frame = frame;
        }
        self.hits += 1;
        self.last_hit_frame = frame;
        self.scaling = (self.scaling - 0.1).max(0.3);
    }
}

/// Hyper armor granted by a special, absolute-frame window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmorState {
    pub hits_left:        u32,
    pub damage_reduction: f32,
    pub start_frame:      u64,
    pub end_frame:        u64,
}

impl ArmorState {
    pub fn active(&self, frame: u64) -> bool {
        self.hits_left > 0 && frame >= self.start_frame && frame <= self.end_frame
    }
}

/// Scalar attack data for the move a fighter currently has active,
/// resolved per frame for the hit resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackStats {
    pub damage:      i32,
    pub chip_damage: i32,
    pub hit_stun:    u64,
    pub block_stun:  u64,
    pub knockback:   (f32, f32),
    pub meter_gain:  f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fighter {
    pub id:        u64,
    pub character: String,
    pub team:      u32,

    pub x:       f32,
    pub y:       f32,
    pub x_vel:   f32,
    pub y_vel:   f32,
    /// +1 faces right, -1 faces left.
    pub facing:  i8,
    pub spawn_x: f32,
    pub grounded: bool,

    pub health:     i32,
    pub max_health: i32,
    pub energy:     f32,
    pub max_energy: f32,
    pub meter:      f32,
    pub max_meter:  f32,

    pub status:      Status,
    pub stun_frames: u64,
    pub attack:      Option<ActiveAttack>,
    /// Frames elapsed inside the current attack, 0 on the frame it starts.
    pub move_frame:  u64,
    pub move_hit:     bool,
    pub move_blocked: bool,
    pub last_cancel_frame: Option<u64>,

    pub combo: ComboState,
    /// Absolute-frame invincibility window, inclusive.
    pub invincibility: Option<(u64, u64)>,
    pub armor:         Option<ArmorState>,
    pub being_grabbed: bool,

    /// Entities already struck by the current attack activation.
    pub hitlist:   Vec<u64>,
    pub hurtboxes: Vec<Rect>,
    pub hitboxes:  Vec<Rect>,
}

impl Fighter {
    pub fn new(id: u64, character: &str, team: u32, x: f32, def: &CharacterDef) -> Fighter {
        Fighter {
            id,
            character: character.to_string(),
            team,
            x,
            y:        0.0,
            x_vel:    0.0,
            y_vel:    0.0,
            facing:   1,
            spawn_x:  x,
            grounded: true,
            health:     def.max_health,
            max_health: def.max_health,
            energy:     def.max_energy,
            max_energy: def.max_energy,
            meter:      0.0,
            max_meter:  def.max_meter,
            status:      Status::Idle,
            stun_frames: 0,
            attack:      None,
            move_frame:  0,
            move_hit:     false,
            move_blocked: false,
            last_cancel_frame: None,
            combo: ComboState::new(),
            invincibility: None,
            armor:         None,
            being_grabbed: false,
            hitlist:   vec!(),
            hurtboxes: def.standing_hurtboxes.clone(),
            hitboxes:  vec!(),
        }
    }

    /// Fresh round: positions, health and energy come back, meter carries
    /// over between rounds.
    pub fn reset_for_round(&mut self, def: &CharacterDef) {
        self.x = self.spawn_x;
        self.y = 0.0;
        self.x_vel = 0.0;
        self.y_vel = 0.0;
        self.grounded = true;
        self.health = def.max_health;
        self.energy = def.max_energy;
        self.status = Status::Idle;
        self.stun_frames = 0;
        self.attack = None;
        self.move_frame = 0;
        self.move_hit = false;
        self.move_blocked = false;
        self.last_cancel_frame = None;
        self.combo.reset();
        self.invincibility = None;
        self.armor = None;
        self.being_grabbed = false;
        self.hitlist.clear();
        self.hitboxes.clear();
        self.hurtboxes = def.standing_hurtboxes.clone();
    }

    pub fn ko(&self) -> bool {
        self.health <= 0
    }

    pub fn airborne(&self) -> bool {
        !self.grounded
    }

    pub fn is_invincible(&self, def: &CharacterDef, frame: u64) -> bool {
        if self.status == Status::Wakeup {
            return true;
        }
        if let Some((start, end)) = self.invincibility {
            if frame >= start && frame <= end {
                return true;
            }
        }
        if let Some(ActiveAttack::Normal { ref id }) = self.attack {
            if let Some(move_def) = def.move_def(id) {
                return move_def.invincible_frames.contains(&self.move_frame);
            }
        }
        false
    }

    /// One frame of the action state machine. Returns a projectile to
    /// spawn when an attack reaches the frame that fires one.
    pub fn step_action(
        &mut self,
        input: &InputFrame,
        def: &CharacterDef,
        frame: u64,
        opponent_x: f32,
    ) -> Option<ProjectileDef> {
        if self.combo.hits > 0 && frame.saturating_sub(self.combo.last_hit_frame) > COMBO_TIMEOUT {
            self.combo.reset();
        }
        if let Some((_, end)) = self.invincibility {
            if frame > end {
                self.invincibility = None;
            }
        }
        if let Some(armor) = self.armor {
            if frame > armor.end_frame || armor.hits_left == 0 {
                self.armor = None;
            }
        }

        let mut spawn = None;
        match self.status {
            Status::Hitstun | Status::Blockstun => {
                self.stun_frames = self.stun_frames.saturating_sub(1);
                if self.stun_frames == 0 && self.grounded {
                    self.status = Status::Idle;
                    self.being_grabbed = false;
                }
            }
            Status::Knockdown => {
                self.stun_frames = self.stun_frames.saturating_sub(1);
                if self.stun_frames == 0 {
                    self.status = Status::Wakeup;
                    self.stun_frames = WAKEUP_INVULN_FRAMES;
                }
            }
            Status::Wakeup => {
                self.stun_frames = self.stun_frames.saturating_sub(1);
                if self.stun_frames == 0 {
                    self.status = Status::Idle;
                }
            }
            Status::Attack => {
                spawn = self.step_attack(input, def, frame);
            }
            _ => {
                self.check_inputs(input, def, frame);
            }
        }

        self.energy = (self.energy + ENERGY_REGEN).min(self.max_energy);
        self.meter = (self.meter + METER_REGEN).min(self.max_meter);

        if !matches!(self.status, Status::Attack | Status::Hitstun | Status::Blockstun | Status::Knockdown) {
            self.facing = if opponent_x >= self.x { 1 } else { -1 };
        }

        self.refresh_boxes(def);
        spawn
    }

    /// Neutral-state input priority: special gesture beats attack button
    /// beats block beats jump beats crouch beats walk.
    fn check_inputs(&mut self, input: &InputFrame, def: &CharacterDef, frame: u64) {
        if self.check_special(input, def, frame) {
        }
        else if self.check_attack(input, def) {
        }
        else if self.grounded {
            if self.check_block(input) {
            }
            else if self.check_jump(input) {
            }
            else if self.check_crouch(input) {
            }
            else if self.check_walk(input) {
            }
            else {
                self.status = Status::Idle;
                self.x_vel = 0.0;
            }
        }
    }

    fn check_special(&mut self, input: &InputFrame, def: &CharacterDef, frame: u64) -> bool {
        match input.motion {
            Some(ref detected) => special::try_execute(self, def, detected, frame),
            None               => false,
        }
    }

    fn check_attack(&mut self, input: &InputFrame, def: &CharacterDef) -> bool {
        for button in input.buttons() {
            if let Some(move_def) = def.normal_for(button, self.airborne()) {
                let id = move_def.id.clone();
                if self.start_normal(&id, def) {
                    return true;
                }
            }
        }
        false
    }

    fn check_block(&mut self, input: &InputFrame) -> bool {
        if input.pressed(Action::Block) {
            self.status = Status::Block;
            self.x_vel = 0.0;
            true
        }
        else {
            false
        }
    }

    fn check_jump(&mut self, input: &InputFrame) -> bool {
        if input.pressed(Action::Up) {
            self.status = Status::Jump;
            self.grounded = false;
            self.y_vel = JUMP_Y_VEL;
            self.x_vel = if input.pressed(Action::Right) {
                JUMP_X_VEL
            }
            else if input.pressed(Action::Left) {
                -JUMP_X_VEL
            }
            else {
                0.0
            };
            true
        }
        else {
            false
        }
    }

    fn check_crouch(&mut self, input: &InputFrame) -> bool {
        if input.pressed(Action::Down) {
            self.status = Status::Crouch;
            self.x_vel = 0.0;
            true
        }
        else {
            false
        }
    }

    fn check_walk(&mut self, input: &InputFrame) -> bool {
        let dir: i8 = if input.pressed(Action::Right) {
            1
        }
        else if input.pressed(Action::Left) {
            -1
        }
        else {
            return false;
        };

        if dir == self.facing {
            self.status = Status::WalkForward;
            self.x_vel = WALK_SPEED * dir as f32;
        }
        else {
            self.status = Status::WalkBackward;
            self.x_vel = BACK_WALK_SPEED * dir as f32;
        }
        true
    }

    /// Start a normal attack if the stance and resource gates pass.
    pub fn start_normal(&mut self, id: &str, def: &CharacterDef) -> bool {
        let Some(move_def) = def.move_def(id) else {
            warn!("fighter {} has no move '{}'", self.id, id);
            return false;
        };
        let stance_ok = match move_def.stance {
            StanceReq::Grounded => self.grounded,
            StanceReq::Airborne => self.airborne(),
            StanceReq::Any      => true,
        };
        if !stance_ok || self.energy < move_def.energy_cost || self.meter < move_def.meter_cost {
            return false;
        }

        self.energy -= move_def.energy_cost;
        self.meter -= move_def.meter_cost;
        self.begin_attack(ActiveAttack::Normal { id: id.to_string() });
        self.hitboxes = move_def.hitboxes_on(0).to_vec();
        if self.grounded {
            self.x_vel = 0.0;
        }
        true
    }

    pub fn begin_attack(&mut self, attack: ActiveAttack) {
        self.status = Status::Attack;
        self.attack = Some(attack);
        self.move_frame = 0;
        self.move_hit = false;
        self.move_blocked = false;
        self.hitlist.clear();
        self.hitboxes.clear();
    }

    pub fn end_attack(&mut self) {
        self.attack = None;
        self.move_frame = 0;
        self.hitboxes.clear();
        if self.status == Status::Attack {
            self.status = Status::Idle;
        }
    }

    fn step_attack(&mut self, input: &InputFrame, def: &CharacterDef, frame: u64) -> Option<ProjectileDef> {
        self.move_frame += 1;
        let attack = match self.attack {
            Some(ref attack) => attack.clone(),
            None => {
                self.status = Status::Idle;
                return None;
            }
        };

        match attack {
            ActiveAttack::Normal { id } => {
                let Some(move_def) = def.move_def(&id) else {
                    warn!("fighter {} lost move '{}' mid-swing", self.id, id);
                    self.end_attack();
                    return None;
                };
                let move_def = move_def.clone();

                if self.move_frame >= move_def.total_frames() {
                    self.end_attack();
                    return None;
                }
                if self.try_cancel(input, def, &move_def, frame) {
                    return None;
                }
                self.hitboxes = move_def.hitboxes_on(self.move_frame).to_vec();
                if self.move_frame == move_def.startup {
                    return move_def.projectile.clone();
                }
            }
            ActiveAttack::Special { id, strength } => {
                let Some(special_def) = def.special_def(&id) else {
                    warn!("fighter {} lost special '{}' mid-swing", self.id, id);
                    self.end_attack();
                    return None;
                };
                let variant = special_def.variant(strength).clone();

                if self.move_frame >= variant.total_frames() {
                    self.end_attack();
                    return None;
                }
                self.hitboxes = variant.hitboxes_on(self.move_frame).to_vec();
                if self.move_frame == variant.startup {
                    return variant.projectile.clone();
                }
            }
        }
        None
    }

    /// Cancel the current normal into a listed follow-up, rate-limited so
    /// a cancel chain cannot fire more often than once per
    /// `MIN_CANCEL_INTERVAL` frames.
    fn try_cancel(
        &mut self,
        input: &InputFrame,
        def: &CharacterDef,
        move_def: &crate::character::MoveDef,
        frame: u64,
    ) -> bool {
        let Some(ref rule) = move_def.cancel else {
            return false;
        };
        if self.move_frame < rule.window.0 || self.move_frame > rule.window.1 {
            return false;
        }
        let outcome_ok = (rule.on_hit && self.move_hit)
            || (rule.on_block && self.move_blocked)
            || (rule.on_whiff && !self.move_hit && !self.move_blocked);
        if !outcome_ok {
            return false;
        }
        if let Some(last) = self.last_cancel_frame {
            if frame.saturating_sub(last) < MIN_CANCEL_INTERVAL {
                return false;
            }
        }
        let rule = rule.clone();

        if let Some(ref detected) = input.motion {
            for target in &rule.into {
                if let Some(special_def) = def.special_def(target) {
                    if special_def.accepts(detected)
                        && special::execute(self, special_def, detected, frame)
                    {
                        self.last_cancel_frame = Some(frame);
                        return true;
                    }
                }
            }
        }
        for button in input.buttons() {
            for target in &rule.into {
                if let Some(target_def) = def.move_def(target) {
                    if target_def.input == button && self.start_normal(target, def) {
                        self.last_cancel_frame = Some(frame);
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Attack data for the frame, only while hitboxes are live.
    pub fn attack_stats(&self, def: &CharacterDef) -> Option<AttackStats> {
        match self.attack {
            Some(ActiveAttack::Normal { ref id }) => {
                let move_def = def.move_def(id)?;
                Some(AttackStats {
                    damage:      move_def.damage,
                    chip_damage: move_def.chip_damage,
                    hit_stun:    move_def.hit_stun,
                    block_stun:  move_def.block_stun,
                    knockback:   move_def.knockback,
                    meter_gain:  move_def.meter_gain,
                })
            }
            Some(ActiveAttack::Special { ref id, strength }) => {
                let variant = def.special_def(id)?.variant(strength);
                Some(AttackStats {
                    damage:      variant.damage,
                    chip_damage: variant.chip_damage,
                    hit_stun:    variant.hit_stun,
                    block_stun:  variant.block_stun,
                    knockback:   variant.knockback,
                    meter_gain:  variant.meter_gain,
                })
            }
            None => None,
        }
    }

    pub fn blocking(&self) -> bool {
        matches!(self.status, Status::Block | Status::Blockstun)
    }

    /// A clean hit landed on this fighter.
    pub fn take_clean_hit(
        &mut self,
        damage: i32,
        hit_stun: u64,
        knockback: (f32, f32),
        attacker_facing: i8,
    ) {
        self.health = (self.health - damage).max(0);
        self.status = Status::Hitstun;
        self.stun_frames = hit_stun.max(1);
        self.x_vel = knockback.0 * attacker_facing as f32;
        self.y_vel = knockback.1;
        if knockback.1 > 0.0 {
            self.grounded = false;
        }
        self.meter = (self.meter + damage as f32 * 0.25).min(self.max_meter);
        self.combo.reset();
        self.attack = None;
        self.move_frame = 0;
        self.hitboxes.clear();
    }

    /// A hit absorbed by block: chip damage and blockstun, no knockback.
    pub fn take_blocked_hit(&mut self, chip_damage: i32, block_stun: u64) {
        self.health = (self.health - chip_damage.max(0)).max(0);
        self.status = Status::Blockstun;
        self.stun_frames = block_stun.max(1);
        self.meter = (self.meter + chip_damage.max(0) as f32 * 0.25).min(self.max_meter);
    }

    /// Attacker-side bookkeeping when a hit connects clean.
    pub fn confirm_hit(&mut self, frame: u64, meter_gain: f32) {
        self.move_hit = true;
        self.combo.register_hit(frame);
        self.meter = (self.meter + meter_gain).min(self.max_meter);
    }

    /// Attacker-side bookkeeping when the hit was blocked.
    pub fn confirm_block(&mut self, meter_gain: f32) {
        self.move_blocked = true;
        self.combo.reset();
        self.meter = (self.meter + meter_gain * 0.5).min(self.max_meter);
    }

    fn refresh_boxes(&mut self, def: &CharacterDef) {
        self.hurtboxes = if self.airborne() {
            def.airborne_hurtboxes.clone()
        }
        else if self.status == Status::Crouch {
            def.crouching_hurtboxes.clone()
        }
        else {
            def.standing_hurtboxes.clone()
        };
        if self.status != Status::Attack {
            self.hitboxes.clear();
        }
    }
}

/// Simultaneous mutable access to two distinct fighters by index.
pub(crate) fn pair_mut(fighters: &mut [Fighter], a: usize, b: usize) -> (&mut Fighter, &mut Fighter) {
    if a < b {
        let (head, tail) = fighters.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    }
    else {
        let (head, tail) = fighters.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Button, InputFrame};
    use crate::motion::{DetectedMotion, MotionType};

    fn fighter() -> (Fighter, CharacterDef) {
        let def = CharacterDef::base();
        (Fighter::new(0, "base", 0, 200.0, &def), def)
    }

    #[test]
    fn walk_direction_tracks_facing() {
        let (mut f, def) = fighter();
        let input = InputFrame::new(vec!(Action::Right));
        f.step_action(&input, &def, 1, 500.0);
        assert_eq!(f.status, Status::WalkForward);
        assert_eq!(f.x_vel, WALK_SPEED);

        let input = InputFrame::new(vec!(Action::Left));
        f.step_action(&input, &def, 2, 500.0);
        assert_eq!(f.status, Status::WalkBackward);
        assert_eq!(f.x_vel, -BACK_WALK_SPEED);
    }

    #[test]
    fn attack_plays_out_and_returns_to_idle() {
        let (mut f, def) = fighter();
        let total = def.move_def("light_punch").unwrap().total_frames();

        let press = InputFrame::new(vec!(Action::LightPunch));
        f.step_action(&press, &def, 1, 500.0);
        assert_eq!(f.status, Status::Attack);

        let neutral = InputFrame::default();
        for frame in 2..=total + 1 {
            f.step_action(&neutral, &def, frame, 500.0);
        }
        assert_eq!(f.status, Status::Idle);
        assert!(f.attack.is_none());
    }

    #[test]
    fn hitboxes_exist_only_on_active_frames() {
        let (mut f, def) = fighter();
        let move_def = def.move_def("light_punch").unwrap().clone();

        let press = InputFrame::new(vec!(Action::LightPunch));
        f.step_action(&press, &def, 1, 500.0);
        assert!(f.hitboxes.is_empty());

        let neutral = InputFrame::default();
        for _ in 0..move_def.startup {
            f.step_action(&neutral, &def, 2, 500.0);
        }
        assert!(!f.hitboxes.is_empty());
    }

    #[test]
    fn combo_resets_after_timeout() {
        let (mut f, def) = fighter();
        f.combo.register_hit(10);
        f.combo.register_hit(20);
        assert_eq!(f.combo.hits, 2);

        let neutral = InputFrame::default();
        f.step_action(&neutral, &def, 20 + COMBO_TIMEOUT, 500.0);
        assert_eq!(f.combo.hits, 2);

        f.step_action(&neutral, &def, 21 + COMBO_TIMEOUT, 500.0);
        assert_eq!(f.combo.hits, 0);
        assert_eq!(f.combo.scaling, 1.0);
    }

    #[test]
    fn stun_gates_all_inputs() {
        let (mut f, def) = fighter();
        f.take_clean_hit(50, 12, (3.0, 0.0), 1);
        assert_eq!(f.status, Status::Hitstun);

        let press = InputFrame::new(vec!(Action::LightPunch));
        f.step_action(&press, &def, 6, 500.0);
        assert_eq!(f.status, Status::Hitstun);
        assert!(f.attack.is_none());
    }

    #[test]
    fn knockdown_flows_through_wakeup() {
        let (mut f, def) = fighter();
        f.status = Status::Knockdown;
        f.stun_frames = 2;

        let neutral = InputFrame::default();
        f.step_action(&neutral, &def, 1, 500.0);
        f.step_action(&neutral, &def, 2, 500.0);
        assert_eq!(f.status, Status::Wakeup);
        assert!(f.is_invincible(&def, 2));

        for frame in 3..3 + WAKEUP_INVULN_FRAMES {
            f.step_action(&neutral, &def, frame, 500.0);
        }
        assert_eq!(f.status, Status::Idle);
    }

    #[test]
    fn cancel_starts_the_listed_special_not_a_lookalike() {
        let (mut f, mut def) = fighter();
        // A second special on the same gesture, ahead of the listed one in
        // the table but absent from light punch's cancel list.
        let mut decoy = def.special_def("fireball").unwrap().clone();
        decoy.id = "ex_fireball".to_string();
        def.specials.insert(0, decoy);

        let press = InputFrame::new(vec!(Action::LightPunch));
        f.step_action(&press, &def, 1, 500.0);
        f.move_hit = true;
        f.move_frame = 3;

        let mut cancel = InputFrame::new(vec!());
        cancel.motion = Some(DetectedMotion {
            motion:     MotionType::QuarterCircleForward,
            button:     Button::LightPunch,
            confidence: 1.0,
            charge:     0,
            age:        0,
        });
        f.step_action(&cancel, &def, 2, 500.0);

        match f.attack {
            Some(ActiveAttack::Special { ref id, .. }) => assert_eq!(id, "fireball"),
            ref other => panic!("expected cancelled fireball, got {:?}", other),
        }
    }

    #[test]
    fn scaling_floors_at_point_three() {
        let mut combo = ComboState::new();
        for frame in 0..20 {
            combo.register_hit(frame);
        }
        assert_eq!(combo.scaling, 0.3);
    }
}
