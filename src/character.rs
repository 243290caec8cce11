use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geometry::Rect;
use crate::input::Button;
use crate::motion::{DetectedMotion, MotionType};

/// Whether a move may start on the ground, in the air, or either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StanceReq {
    Grounded,
    Airborne,
    Any,
}

impl Default for StanceReq {
    fn default() -> StanceReq {
        StanceReq::Grounded
    }
}

/// Which of the two severity variants of a special move was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    Light,
    Heavy,
}

impl Default for Strength {
    fn default() -> Strength {
        Strength::Light
    }
}

/// Everything needed to spawn a projectile, attached to the move or
/// special variant that fires it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileDef {
    pub speed:          f32,
    pub damage:         i32,
    pub chip_damage:    i32,
    pub hit_stun:       u64,
    pub block_stun:     u64,
    pub knockback:      (f32, f32),
    pub hitbox:         Rect,
    pub lifespan:       u64,
    pub hit_limit:      u32,
    pub destroy_on_hit: bool,
    /// Credited to the owner when the projectile connects.
    pub meter_gain:     f32,
}

/// When and into what a move's recovery may be cancelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancelRule {
    pub into:     Vec<String>,
    /// Inclusive move-local frame window in which cancelling is legal.
    pub window:   (u64, u64),
    pub on_hit:   bool,
    pub on_block: bool,
    pub on_whiff: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveDef {
    pub id:          String,
    pub input:       Button,
    /// Display notation only, e.g. "5HP"; gameplay never parses it.
    pub notation:    Option<String>,
    pub startup:     u64,
    pub active:      u64,
    pub recovery:    u64,
    pub damage:      i32,
    pub chip_damage: i32,
    pub hit_stun:    u64,
    pub block_stun:  u64,
    pub knockback:   (f32, f32),
    /// Move-local frame -> hitboxes live on that frame.
    pub hitboxes:    BTreeMap<u64, Vec<Rect>>,
    pub energy_cost: f32,
    pub meter_cost:  f32,
    pub meter_gain:  f32,
    pub cancel:      Option<CancelRule>,
    pub stance:      StanceReq,
    /// Move-local frames on which the fighter cannot be hit.
    pub invincible_frames: Vec<u64>,
    pub projectile:  Option<ProjectileDef>,
}

impl MoveDef {
    pub fn total_frames(&self) -> u64 {
        self.startup + self.active + self.recovery
    }

    pub fn hitboxes_on(&self, frame: u64) -> &[Rect] {
        self.hitboxes.get(&frame).map(|boxes| boxes.as_slice()).unwrap_or(&[])
    }
}

/// Armor attached to one special-move variant: absorb up to `hits` hits at
/// `damage_reduction` inside the move-local `window`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorDef {
    pub hits:             u32,
    pub damage_reduction: f32,
    pub window:           (u64, u64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialVariant {
    pub startup:         u64,
    pub active:          u64,
    pub recovery:        u64,
    pub damage:          i32,
    pub chip_damage:     i32,
    pub hit_stun:        u64,
    pub block_stun:      u64,
    pub hit_advantage:   i64,
    pub block_advantage: i64,
    pub knockback:       (f32, f32),
    pub hitboxes:        BTreeMap<u64, Vec<Rect>>,
    pub energy_cost:     f32,
    pub meter_cost:      f32,
    pub meter_gain:      f32,
    pub projectile:      Option<ProjectileDef>,
    /// Move-local invincibility windows, inclusive.
    pub invincibility:   Vec<(u64, u64)>,
    pub armor:           Option<ArmorDef>,
    /// Instantaneous velocity change applied on activation, forward/up.
    pub impulse:         (f32, f32),
}

impl SpecialVariant {
    pub fn total_frames(&self) -> u64 {
        self.startup + self.active + self.recovery
    }

    pub fn hitboxes_on(&self, frame: u64) -> &[Rect] {
        self.hitboxes.get(&frame).map(|boxes| boxes.as_slice()).unwrap_or(&[])
    }

    pub fn is_active_frame(&self, frame: u64) -> bool {
        frame >= self.startup && frame < self.startup + self.active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialDef {
    pub id:              String,
    pub motion:          MotionType,
    /// None accepts any attack button.
    pub button:          Option<Button>,
    pub charge_frames:   Option<u64>,
    pub buffer_window:   u64,
    pub light:           SpecialVariant,
    pub heavy:           SpecialVariant,
    pub command_grab:    bool,
    pub grab_range_mult: f32,
}

impl SpecialDef {
    pub fn variant(&self, strength: Strength) -> &SpecialVariant {
        match strength {
            Strength::Light => &self.light,
            Strength::Heavy => &self.heavy,
        }
    }

    /// Gate for a recognized gesture: motion and button must match, the
    /// gesture must still sit inside this special's buffer window, and a
    /// charge special must have banked at least its required hold.
    pub fn accepts(&self, detected: &DetectedMotion) -> bool {
        self.motion == detected.motion
            && self.button.map_or(true, |b| b == detected.button)
            && detected.age <= self.buffer_window
            && self.charge_frames.map_or(true, |required| detected.charge as u64 >= required)
    }
}

/// Static, read-only data for one playable character. Supplied by the
/// host application; the simulation never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterDef {
    pub name:       String,
    pub max_health: i32,
    pub max_energy: f32,
    pub max_meter:  f32,
    pub standing_hurtboxes:  Vec<Rect>,
    pub crouching_hurtboxes: Vec<Rect>,
    pub airborne_hurtboxes:  Vec<Rect>,
    pub moves:      Vec<MoveDef>,
    pub specials:   Vec<SpecialDef>,
}

impl CharacterDef {
    pub fn move_def(&self, id: &str) -> Option<&MoveDef> {
        self.moves.iter().find(|m| m.id == id)
    }

    pub fn special_def(&self, id: &str) -> Option<&SpecialDef> {
        self.specials.iter().find(|s| s.id == id)
    }

    /// A plain grounded normal for the given button: any move requiring no
    /// gesture whose stance allows the fighter's current one.
    pub fn normal_for(&self, button: Button, airborne: bool) -> Option<&MoveDef> {
        self.moves.iter().find(|m| {
            m.input == button
                && match m.stance {
                    StanceReq::Grounded => !airborne,
                    StanceReq::Airborne => airborne,
                    StanceReq::Any      => true,
                }
        })
    }

    /// A workable default character used by tests and as authoring
    /// reference. Two punches, a fireball, a rising punch and a command
    /// grab.
    pub fn base() -> CharacterDef {
        let light_punch = MoveDef {
            id:          "light_punch".to_string(),
            input:       Button::LightPunch,
            notation:    Some("5LP".to_string()),
            startup:     3,
            active:      3,
            recovery:    6,
            damage:      30,
            chip_damage: 3,
            hit_stun:    12,
            block_stun:  8,
            knockback:   (2.0, 0.0),
            hitboxes:    active_boxes(3, 3, Rect::new(30.0, 60.0, 40.0, 20.0)),
            energy_cost: 0.0,
            meter_cost:  0.0,
            meter_gain:  4.0,
            cancel:      Some(CancelRule {
                into:     vec!("heavy_punch".to_string(), "fireball".to_string()),
                window:   (4, 9),
                on_hit:   true,
                on_block: true,
                on_whiff: false,
            }),
            stance:      StanceReq::Grounded,
            invincible_frames: vec!(),
            projectile:  None,
        };

        let heavy_punch = MoveDef {
            id:          "heavy_punch".to_string(),
            input:       Button::HeavyPunch,
            notation:    Some("5HP".to_string()),
            startup:     8,
            active:      4,
            recovery:    14,
            damage:      80,
            chip_damage: 8,
            hit_stun:    20,
            block_stun:  14,
            knockback:   (5.0, 2.0),
            hitboxes:    active_boxes(8, 4, Rect::new(30.0, 55.0, 55.0, 30.0)),
            energy_cost: 0.0,
            meter_cost:  0.0,
            meter_gain:  8.0,
            cancel:      None,
            stance:      StanceReq::Grounded,
            invincible_frames: vec!(),
            projectile:  None,
        };

        let fireball_light = SpecialVariant {
            startup:     13,
            active:      2,
            recovery:    18,
            damage:      0,
            chip_damage: 0,
            hit_stun:    0,
            block_stun:  0,
            hit_advantage:   0,
            block_advantage: -4,
            knockback:   (0.0, 0.0),
            hitboxes:    BTreeMap::new(),
            energy_cost: 10.0,
            meter_cost:  0.0,
            meter_gain:  6.0,
            projectile:  Some(ProjectileDef {
                speed:          6.0,
                damage:         60,
                chip_damage:    6,
                hit_stun:       16,
                block_stun:     12,
                knockback:      (4.0, 0.0),
                hitbox:         Rect::new(0.0, -10.0, 30.0, 20.0),
                lifespan:       180,
                hit_limit:      1,
                destroy_on_hit: true,
                meter_gain:     6.0,
            }),
            invincibility: vec!(),
            armor:       None,
            impulse:     (0.0, 0.0),
        };
        let mut fireball_heavy = fireball_light.clone();
        fireball_heavy.energy_cost = 15.0;
        if let Some(ref mut projectile) = fireball_heavy.projectile {
            projectile.speed = 9.0;
            projectile.damage = 70;
            projectile.chip_damage = 7;
            projectile.meter_gain = 7.0;
        }

        let rising_light = SpecialVariant {
            startup:     3,
            active:      8,
            recovery:    24,
            damage:      90,
            chip_damage: 9,
            hit_stun:    28,
            block_stun:  16,
            hit_advantage:   0,
            block_advantage: -18,
            knockback:   (3.0, 10.0),
            hitboxes:    active_boxes(3, 8, Rect::new(15.0, 40.0, 45.0, 80.0)),
            energy_cost: 15.0,
            meter_cost:  0.0,
            meter_gain:  10.0,
            projectile:  None,
            invincibility: vec!((0, 6)),
            armor:       None,
            impulse:     (2.0, 11.0),
        };
        let mut rising_heavy = rising_light.clone();
        rising_heavy.damage = 110;
        rising_heavy.energy_cost = 20.0;
        rising_heavy.invincibility = vec!((0, 10));
        rising_heavy.impulse = (3.0, 13.0);

        let grab_light = SpecialVariant {
            startup:     5,
            active:      3,
            recovery:    30,
            damage:      140,
            chip_damage: 0,
            hit_stun:    45,
            block_stun:  0,
            hit_advantage:   0,
            block_advantage: 0,
            knockback:   (5.0, 9.0),
            hitboxes:    BTreeMap::new(),
            energy_cost: 0.0,
            meter_cost:  25.0,
            meter_gain:  0.0,
            projectile:  None,
            invincibility: vec!(),
            armor:       Some(ArmorDef { hits: 1, damage_reduction: 0.8, window: (0, 7) }),
            impulse:     (0.0, 0.0),
        };
        let mut grab_heavy = grab_light.clone();
        grab_heavy.damage = 170;
        grab_heavy.meter_cost = 35.0;

        CharacterDef {
            name:       "Base Fighter".to_string(),
            max_health: 1000,
            max_energy: 100.0,
            max_meter:  100.0,
            standing_hurtboxes:  vec!(Rect::new(-20.0, 0.0, 40.0, 100.0)),
            crouching_hurtboxes: vec!(Rect::new(-20.0, 0.0, 40.0, 60.0)),
            airborne_hurtboxes:  vec!(Rect::new(-20.0, 10.0, 40.0, 80.0)),
            moves:      vec!(light_punch, heavy_punch),
            specials:   vec!(
                SpecialDef {
                    id:              "fireball".to_string(),
                    motion:          MotionType::QuarterCircleForward,
                    button:          Some(Button::LightPunch),
                    charge_frames:   None,
                    buffer_window:   10,
                    light:           fireball_light,
                    heavy:           fireball_heavy,
                    command_grab:    false,
                    grab_range_mult: 1.0,
                },
                SpecialDef {
                    id:              "rising_punch".to_string(),
                    motion:          MotionType::DragonPunch,
                    button:          None,
                    charge_frames:   None,
                    buffer_window:   10,
                    light:           rising_light,
                    heavy:           rising_heavy,
                    command_grab:    false,
                    grab_range_mult: 1.0,
                },
                SpecialDef {
                    id:              "command_grab".to_string(),
                    motion:          MotionType::HalfCircleBack,
                    button:          Some(Button::HeavyPunch),
                    charge_frames:   None,
                    buffer_window:   10,
                    light:           grab_light,
                    heavy:           grab_heavy,
                    command_grab:    true,
                    grab_range_mult: 1.2,
                },
            ),
        }
    }
}

/// Helper for authoring: the same hitbox on every active frame.
pub fn active_boxes(startup: u64, active: u64, hitbox: Rect) -> BTreeMap<u64, Vec<Rect>> {
    let mut map = BTreeMap::new();
    for frame in startup..startup + active {
        map.insert(frame, vec!(hitbox));
    }
    map
}

/// The read-only character table handed to `tick`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Characters {
    characters: BTreeMap<String, CharacterDef>,
}

impl Characters {
    pub fn new() -> Characters {
        Characters::default()
    }

    pub fn insert(&mut self, id: &str, def: CharacterDef) {
        self.characters.insert(id.to_string(), def);
    }

    pub fn get(&self, id: &str) -> Option<&CharacterDef> {
        self.characters.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&CharacterDef, CoreError> {
        self.get(id).ok_or_else(|| CoreError::UnknownCharacter(id.to_string()))
    }
}
