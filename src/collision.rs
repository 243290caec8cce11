use serde::{Deserialize, Serialize};

use crate::character::Characters;
use crate::fighter::{AttackStats, Fighter};

/// Combo-scaled damage, rounded down. Scaling accumulates in f32, so a
/// nominal 0.9 sits a hair below it; nudge before flooring or 100 * 0.9
/// comes out as 89.
pub fn calculate_damage(base: i32, scaling: f32) -> i32 {
    (base as f64 * scaling as f64 + 1e-4).floor() as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitKind {
    Clean,
    Blocked,
    Armored,
}

/// One connected hit, as reported to the caller for presentation effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    pub attacker: u64,
    pub defender: u64,
    pub kind:     HitKind,
    pub damage:   i32,
}

struct PendingHit {
    attacker_i: usize,
    defender_i: usize,
    stats:      AttackStats,
}

/// Test every live hitbox against every opposing hurtbox, then apply the
/// results. Detection runs over a snapshot of the frame so simultaneous
/// trades land for both sides.
pub fn resolve_hits(fighters: &mut [Fighter], characters: &Characters, frame: u64) -> Vec<HitResult> {
    let mut pending = vec!();

    for attacker_i in 0..fighters.len() {
        let attacker = &fighters[attacker_i];
        if attacker.hitboxes.is_empty() {
            continue;
        }
        let Some(att_def) = characters.get(&attacker.character) else {
            continue;
        };
        let Some(stats) = attacker.attack_stats(att_def) else {
            continue;
        };

        for defender_i in 0..fighters.len() {
            if defender_i == attacker_i {
                continue;
            }
            let defender = &fighters[defender_i];
            if defender.team == attacker.team || attacker.hitlist.contains(&defender.id) {
                continue;
            }
            let Some(def_def) = characters.get(&defender.character) else {
                continue;
            };
            if defender.is_invincible(def_def, frame) {
                continue;
            }
            if boxes_touch(attacker, defender) {
                pending.push(PendingHit { attacker_i, defender_i, stats });
            }
        }
    }

    let mut results = vec!();
    for hit in pending {
        let (attacker, defender) = crate::fighter::pair_mut(fighters, hit.attacker_i, hit.defender_i);
        let stats = hit.stats;
        let defender_id = defender.id;
        attacker.hitlist.push(defender_id);

        let kind;
        let damage;
        if defender.blocking() && defender.grounded {
            damage = stats.chip_damage.max(0);
            defender.take_blocked_hit(damage, stats.block_stun);
            attacker.confirm_block(stats.meter_gain);
            kind = HitKind::Blocked;
        }
        else if let Some(mut armor) = defender.armor.filter(|a| a.active(frame)) {
            armor.hits_left -= 1;
            defender.armor = Some(armor);
            damage = calculate_damage(stats.damage, 1.0 - armor.damage_reduction).max(0);
            defender.health = (defender.health - damage).max(0);
            defender.meter = (defender.meter + damage as f32 * 0.25).min(defender.max_meter);
            attacker.move_hit = true;
            attacker.meter = (attacker.meter + stats.meter_gain).min(attacker.max_meter);
            kind = HitKind::Armored;
        }
        else {
            damage = calculate_damage(stats.damage, attacker.combo.scaling);
            defender.take_clean_hit(damage, stats.hit_stun, stats.knockback, attacker.facing);
            attacker.confirm_hit(frame, stats.meter_gain);
            kind = HitKind::Clean;
        }

        results.push(HitResult {
            attacker: attacker.id,
            defender: defender_id,
            kind,
            damage,
        });
    }
    results
}

fn boxes_touch(attacker: &Fighter, defender: &Fighter) -> bool {
    for hitbox in &attacker.hitboxes {
        let hit = hitbox.to_world(attacker.x, attacker.y, attacker.facing);
        for hurtbox in &defender.hurtboxes {
            let hurt = hurtbox.to_world(defender.x, defender.y, defender.facing);
            if hit.overlaps(&hurt) {
                return true;
            }
        }
    }
    false
}
