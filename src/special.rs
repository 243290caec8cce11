use crate::character::{CharacterDef, Characters, SpecialDef, Strength};
use crate::fighter::{ActiveAttack, ArmorState, Fighter, Status};
use crate::motion::DetectedMotion;

/// Base throw reach in arena units, scaled by each grab's multiplier.
pub const GRAB_RANGE: f32 = 60.0;
/// Feet may differ by this much in height and still be grabbed.
pub const GRAB_HEIGHT_TOLERANCE: f32 = 40.0;
/// Where the victim is held, forward of the grabber.
pub const GRAB_HOLD_OFFSET: f32 = 30.0;

/// Try to start the first special accepting a recognized gesture. Returns
/// false when nothing matches or a gate refuses it; callers fall through
/// to the next input check.
pub fn try_execute(
    fighter: &mut Fighter,
    def: &CharacterDef,
    detected: &DetectedMotion,
    frame: u64,
) -> bool {
    let Some(special_def) = def.specials.iter().find(|s| s.accepts(detected)) else {
        return false;
    };
    execute(fighter, special_def, detected, frame)
}

/// Start one specific special. Cancels resolve their target up front and
/// come through here so two specials sharing a motion cannot collide.
pub fn execute(
    fighter: &mut Fighter,
    special_def: &SpecialDef,
    detected: &DetectedMotion,
    frame: u64,
) -> bool {
    if fighter.status.stunned() || fighter.being_grabbed || fighter.airborne() {
        return false;
    }
    // A special never cancels into another special.
    if let Some(ActiveAttack::Special { .. }) = fighter.attack {
        return false;
    }

    let strength = if detected.button.is_heavy() {
        Strength::Heavy
    }
    else {
        Strength::Light
    };
    let variant = special_def.variant(strength).clone();

    if fighter.energy < variant.energy_cost || fighter.meter < variant.meter_cost {
        return false;
    }
    fighter.energy -= variant.energy_cost;
    fighter.meter -= variant.meter_cost;

    let id = special_def.id.clone();
    fighter.begin_attack(ActiveAttack::Special { id, strength });
    fighter.hitboxes = variant.hitboxes_on(0).to_vec();

    if let Some(&(start, end)) = variant.invincibility.first() {
        fighter.invincibility = Some((frame + start, frame + end));
    }
    if let Some(ref armor) = variant.armor {
        fighter.armor = Some(ArmorState {
            hits_left:        armor.hits,
            damage_reduction: armor.damage_reduction,
            start_frame:      frame + armor.window.0,
            end_frame:        frame + armor.window.1,
        });
    }

    fighter.x_vel = variant.impulse.0 * fighter.facing as f32;
    if variant.impulse.1 > 0.0 {
        fighter.y_vel = variant.impulse.1;
        fighter.grounded = false;
    }
    true
}

/// Resolve command grabs for the frame. Grabs ignore block entirely; they
/// whiff against airborne, invincible or already-grabbed targets, and each
/// activation connects with a given victim at most once.
pub fn resolve_grabs(fighters: &mut [Fighter], characters: &Characters, frame: u64) {
    let count = fighters.len();
    for attacker_i in 0..count {
        let grab = {
            let attacker = &fighters[attacker_i];
            let Some(att_def) = characters.get(&attacker.character) else {
                continue;
            };
            let Some(ActiveAttack::Special { ref id, strength }) = attacker.attack else {
                continue;
            };
            let Some(special_def) = att_def.special_def(id) else {
                continue;
            };
            if !special_def.command_grab {
                continue;
            }
            let variant = special_def.variant(strength);
            if !variant.is_active_frame(attacker.move_frame) {
                continue;
            }
            (variant.clone(), special_def.grab_range_mult)
        };
        let (variant, range_mult) = grab;

        let mut victim = None;
        for defender_i in 0..count {
            if defender_i == attacker_i {
                continue;
            }
            let attacker = &fighters[attacker_i];
            let defender = &fighters[defender_i];
            if defender.team == attacker.team || attacker.hitlist.contains(&defender.id) {
                continue;
            }
            if defender.airborne() || defender.being_grabbed {
                continue;
            }
            // Active specials cannot be thrown out of.
            if matches!(defender.attack, Some(ActiveAttack::Special { .. })) {
                continue;
            }
            let Some(def_def) = characters.get(&defender.character) else {
                continue;
            };
            if defender.is_invincible(def_def, frame) {
                continue;
            }
            let dx = defender.x - attacker.x;
            let dy = defender.y - attacker.y;
            // Must reach toward the victim, within the scaled range.
            if dx * (attacker.facing as f32) < 0.0 {
                continue;
            }
            if dx.abs() > GRAB_RANGE * range_mult || dy.abs() > GRAB_HEIGHT_TOLERANCE {
                continue;
            }
            victim = Some(defender_i);
            break;
        }

        if let Some(defender_i) = victim {
            let (attacker, defender) = crate::fighter::pair_mut(fighters, attacker_i, defender_i);

            defender.health = (defender.health - variant.damage).max(0);
            defender.status = Status::Hitstun;
            defender.stun_frames = variant.hit_stun.max(1);
            defender.x = attacker.x + attacker.facing as f32 * GRAB_HOLD_OFFSET;
            defender.x_vel = variant.knockback.0 * attacker.facing as f32;
            defender.y_vel = variant.knockback.1;
            if variant.knockback.1 > 0.0 {
                defender.grounded = false;
            }
            defender.being_grabbed = true;
            defender.combo.reset();
            defender.attack = None;
            defender.move_frame = 0;
            defender.hitboxes.clear();

            let defender_id = defender.id;
            attacker.hitlist.push(defender_id);
            attacker.confirm_hit(frame, variant.meter_gain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterDef;
    use crate::input::Button;
    use crate::motion::MotionType;

    fn setup() -> (Fighter, CharacterDef) {
        let def = CharacterDef::base();
        (Fighter::new(0, "base", 0, 200.0, &def), def)
    }

    #[test]
    fn heavy_button_selects_heavy_variant() {
        let (mut f, def) = setup();
        f.meter = 50.0;
        let detected = DetectedMotion {
            motion:     MotionType::HalfCircleBack,
            button:     Button::HeavyPunch,
            confidence: 1.0,
            charge:     0,
            age:        0,
        };
        assert!(try_execute(&mut f, &def, &detected, 10));
        match f.attack {
            Some(ActiveAttack::Special { ref id, strength }) => {
                assert_eq!(id, "command_grab");
                assert_eq!(strength, Strength::Heavy);
            }
            ref other => panic!("expected special, got {:?}", other),
        }
    }

    #[test]
    fn special_refused_without_resources() {
        let (mut f, def) = setup();
        f.energy = 0.0;
        let detected = DetectedMotion {
            motion:     MotionType::QuarterCircleForward,
            button:     Button::LightPunch,
            confidence: 1.0,
            charge:     0,
            age:        0,
        };
        assert!(!try_execute(&mut f, &def, &detected, 10));
        assert!(f.attack.is_none());
    }

    #[test]
    fn dragon_punch_gets_startup_invincibility() {
        let (mut f, def) = setup();
        let detected = DetectedMotion {
            motion:     MotionType::DragonPunch,
            button:     Button::LightPunch,
            confidence: 1.0,
            charge:     0,
            age:        0,
        };
        assert!(try_execute(&mut f, &def, &detected, 100));
        assert_eq!(f.invincibility, Some((100, 106)));
        assert!(f.is_invincible(&def, 103));
        assert!(!f.is_invincible(&def, 107));
    }

    #[test]
    fn grab_connects_inside_scaled_range() {
        let def = CharacterDef::base();
        let mut characters = Characters::new();
        characters.insert("base", def.clone());

        let mut attacker = Fighter::new(0, "base", 0, 200.0, &def);
        attacker.meter = 50.0;
        let defender = Fighter::new(1, "base", 1, 260.0, &def);

        let detected = DetectedMotion {
            motion:     MotionType::HalfCircleBack,
            button:     Button::HeavyPunch,
            confidence: 1.0,
            charge:     0,
            age:        0,
        };
        assert!(try_execute(&mut attacker, &def, &detected, 0));

        // Walk the grab to its first active frame.
        let startup = def.special_def("command_grab").unwrap().heavy.startup;
        attacker.move_frame = startup;

        let mut fighters = vec!(attacker, defender);
        resolve_grabs(&mut fighters, &characters, startup);

        assert!(fighters[1].health < fighters[1].max_health);
        assert!(fighters[1].being_grabbed);
        assert_eq!(fighters[0].combo.hits, 1);
    }

    #[test]
    fn grab_whiffs_out_of_range() {
        let def = CharacterDef::base();
        let mut characters = Characters::new();
        characters.insert("base", def.clone());

        let mut attacker = Fighter::new(0, "base", 0, 200.0, &def);
        attacker.meter = 50.0;
        let defender = Fighter::new(1, "base", 1, 400.0, &def);

        let detected = DetectedMotion {
            motion:     MotionType::HalfCircleBack,
            button:     Button::HeavyPunch,
            confidence: 1.0,
            charge:     0,
            age:        0,
        };
        assert!(try_execute(&mut attacker, &def, &detected, 0));
        let startup = def.special_def("command_grab").unwrap().heavy.startup;
        attacker.move_frame = startup;

        let mut fighters = vec!(attacker, defender);
        resolve_grabs(&mut fighters, &characters, startup);

        assert_eq!(fighters[1].health, fighters[1].max_health);
        assert!(!fighters[1].being_grabbed);
    }

    #[test]
    fn charge_special_requires_its_full_hold() {
        let (mut f, mut def) = setup();
        let mut wave = def.special_def("fireball").unwrap().clone();
        wave.id = "sonic_wave".to_string();
        wave.motion = MotionType::ChargeBackForward;
        wave.charge_frames = Some(60);
        def.specials.push(wave);

        let mut detected = DetectedMotion {
            motion:     MotionType::ChargeBackForward,
            button:     Button::LightPunch,
            confidence: 1.0,
            charge:     40,
            age:        0,
        };
        assert!(!try_execute(&mut f, &def, &detected, 10));
        assert!(f.attack.is_none());

        detected.charge = 60;
        assert!(try_execute(&mut f, &def, &detected, 10));
    }

    #[test]
    fn stale_gesture_falls_out_of_the_buffer_window() {
        let (mut f, def) = setup();
        let window = def.special_def("fireball").unwrap().buffer_window;
        let mut detected = DetectedMotion {
            motion:     MotionType::QuarterCircleForward,
            button:     Button::LightPunch,
            confidence: 1.0,
            charge:     0,
            age:        window + 1,
        };
        assert!(!try_execute(&mut f, &def, &detected, 10));
        assert!(f.attack.is_none());

        detected.age = window;
        assert!(try_execute(&mut f, &def, &detected, 10));
    }
}
