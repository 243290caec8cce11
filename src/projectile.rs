use serde::{Deserialize, Serialize};

use crate::character::{Characters, ProjectileDef};
use crate::collision::{calculate_damage, HitKind, HitResult};
use crate::fighter::Fighter;
use crate::geometry::Rect;
use crate::stage::Stage;

/// Vertical launch offset relative to the owner's feet.
pub const SPAWN_HEIGHT:  f32 = 50.0;
/// How far ahead of the owner a projectile materializes.
pub const SPAWN_FORWARD: f32 = 60.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id:    u64,
    pub owner: u64,
    pub team:  u32,

    pub x:      f32,
    pub y:      f32,
    pub x_vel:  f32,
    pub facing: i8,

    pub damage:      i32,
    pub chip_damage: i32,
    pub hit_stun:    u64,
    pub block_stun:  u64,
    pub knockback:   (f32, f32),
    pub hitbox:      Rect,

    pub spawn_frame: u64,
    pub lifespan:    u64,
    pub meter_gain:  f32,
    pub hits:        u32,
    pub hit_limit:   u32,
    pub destroy_on_hit: bool,
    pub active:      bool,
    /// Entities this projectile has already struck.
    pub hitlist:     Vec<u64>,
}

impl Projectile {
    pub fn spawn(id: u64, owner: &Fighter, def: &ProjectileDef, frame: u64) -> Projectile {
        Projectile {
            id,
            owner:  owner.id,
            team:   owner.team,
            x:      owner.x + owner.facing as f32 * SPAWN_FORWARD,
            y:      owner.y + SPAWN_HEIGHT,
            x_vel:  def.speed * owner.facing as f32,
            facing: owner.facing,
            damage:      def.damage,
            chip_damage: def.chip_damage,
            hit_stun:    def.hit_stun,
            block_stun:  def.block_stun,
            knockback:   def.knockback,
            hitbox:      def.hitbox,
            spawn_frame: frame,
            lifespan:    def.lifespan,
            meter_gain:  def.meter_gain,
            hits:        0,
            hit_limit:   def.hit_limit,
            destroy_on_hit: def.destroy_on_hit,
            active:      true,
            hitlist:     vec!(),
        }
    }

    pub fn age(&self, frame: u64) -> u64 {
        frame.saturating_sub(self.spawn_frame)
    }

    /// Lifespan is exclusive: a projectile spawned on frame S with
    /// lifespan L is live through frame S+L-1 and gone on S+L.
    pub fn expired(&self, frame: u64) -> bool {
        self.age(frame) >= self.lifespan
    }

    /// One frame of flight. Deactivates on expiry, leaving the arena, or
    /// running out of hits.
    pub fn step(&mut self, stage: &Stage, frame: u64) {
        self.x += self.x_vel;
        if self.expired(frame) || stage.projectile_out_of_bounds(self.x) || self.hits >= self.hit_limit {
            self.active = false;
        }
    }
}

/// Projectiles against fighters, same policy as direct hits on both
/// sides: invincibility whiffs, block chips, armor absorbs, otherwise
/// clean with the owner's combo scaling, and the owner is credited meter
/// and combo advance the way a landed punch would credit them.
pub fn collide_with_fighters(
    projectiles: &mut [Projectile],
    fighters: &mut [Fighter],
    characters: &Characters,
    frame: u64,
) -> Vec<HitResult> {
    let mut results = vec!();

    for projectile in projectiles.iter_mut() {
        if !projectile.active {
            continue;
        }
        let shot = projectile.hitbox.to_world(projectile.x, projectile.y, projectile.facing);
        let owner_i = fighters.iter().position(|f| f.id == projectile.owner);

        for defender_i in 0..fighters.len() {
            let defender = &fighters[defender_i];
            if defender.team == projectile.team || projectile.hitlist.contains(&defender.id) {
                continue;
            }
            let Some(def) = characters.get(&defender.character) else {
                continue;
            };
            if defender.is_invincible(def, frame) {
                continue;
            }
            let touched = defender
                .hurtboxes
                .iter()
                .any(|hurtbox| shot.overlaps(&hurtbox.to_world(defender.x, defender.y, defender.facing)));
            if !touched {
                continue;
            }

            // A dead or absent owner still deals unscaled damage.
            let scaling = owner_i.map_or(1.0, |i| fighters[i].combo.scaling);
            let defender_id = defender.id;
            projectile.hitlist.push(defender_id);
            projectile.hits += 1;

            let kind;
            let damage;
            {
                let defender = &mut fighters[defender_i];
                if defender.blocking() && defender.grounded {
                    damage = projectile.chip_damage.max(0);
                    defender.take_blocked_hit(damage, projectile.block_stun);
                    kind = HitKind::Blocked;
                }
                else if let Some(mut armor) = defender.armor.filter(|a| a.active(frame)) {
                    armor.hits_left -= 1;
                    defender.armor = Some(armor);
                    damage = calculate_damage(projectile.damage, 1.0 - armor.damage_reduction).max(0);
                    defender.health = (defender.health - damage).max(0);
                    defender.meter = (defender.meter + damage as f32 * 0.25).min(defender.max_meter);
                    kind = HitKind::Armored;
                }
                else {
                    damage = calculate_damage(projectile.damage, scaling);
                    defender.take_clean_hit(damage, projectile.hit_stun, projectile.knockback, projectile.facing);
                    kind = HitKind::Clean;
                }
            }
            if let Some(owner_i) = owner_i {
                if owner_i != defender_i {
                    let owner = &mut fighters[owner_i];
                    match kind {
                        HitKind::Clean   => owner.confirm_hit(frame, projectile.meter_gain),
                        HitKind::Blocked => owner.confirm_block(projectile.meter_gain),
                        HitKind::Armored => {
                            owner.move_hit = true;
                            owner.meter = (owner.meter + projectile.meter_gain).min(owner.max_meter);
                        }
                    }
                }
            }
            results.push(HitResult {
                attacker: projectile.owner,
                defender: defender_id,
                kind,
                damage,
            });

            if projectile.destroy_on_hit || projectile.hits >= projectile.hit_limit {
                projectile.active = false;
                break;
            }
        }
    }
    results
}

/// Opposing projectiles that touch destroy each other.
pub fn resolve_clashes(projectiles: &mut [Projectile]) {
    let count = projectiles.len();
    for a in 0..count {
        for b in a + 1..count {
            if !projectiles[a].active || !projectiles[b].active {
                continue;
            }
            if projectiles[a].team == projectiles[b].team {
                continue;
            }
            let box_a = projectiles[a].hitbox.to_world(projectiles[a].x, projectiles[a].y, projectiles[a].facing);
            let box_b = projectiles[b].hitbox.to_world(projectiles[b].x, projectiles[b].y, projectiles[b].facing);
            if box_a.overlaps(&box_b) {
                projectiles[a].active = false;
                projectiles[b].active = false;
            }
        }
    }
}
