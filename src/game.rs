use std::collections::{BTreeMap, HashMap};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::character::{CharacterDef, Characters};
use crate::collision::{self, HitKind, HitResult};
use crate::error::CoreError;
use crate::fighter::{ActiveAttack, Fighter};
use crate::input::{InputBuffer, InputFrame};
use crate::motion::{DetectedMotion, MotionBank};
use crate::physics;
use crate::projectile::{self, Projectile};
use crate::rules::Rules;
use crate::special;
use crate::stage::Stage;

/// Base frames of hit freeze; damage adds more on top.
pub const HIT_FREEZE_BASE: u64 = 3;
/// Clean hits at or above this damage rattle the camera.
pub const SHAKE_THRESHOLD: i32 = 70;
pub const SHAKE_FRAMES:    u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenShake {
    pub magnitude: f32,
    pub frames:    u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySetup {
    pub character: String,
    pub id:        u64,
    pub team:      u32,
    pub x:         f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    pub entities: Vec<EntitySetup>,
    pub stage:    Stage,
    pub rules:    Rules,
}

/// Per-entity input history and gesture recognizers. Lives with the host
/// across ticks rather than inside the copy-per-frame game state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSession {
    buffers: BTreeMap<u64, InputBuffer>,
    bank:    MotionBank,
    /// Last recognized gesture per entity, aging until a special spends
    /// it or no special's buffer window could still accept it.
    pending: BTreeMap<u64, DetectedMotion>,
}

impl InputSession {
    pub fn new() -> InputSession {
        InputSession::default()
    }

    pub fn register(&mut self, entity_id: u64) {
        self.buffers.entry(entity_id).or_insert_with(InputBuffer::new);
        self.bank.register(entity_id);
    }

    pub fn buffer(&self, entity_id: u64) -> Option<&InputBuffer> {
        self.buffers.get(&entity_id)
    }

    pub fn bank_mut(&mut self) -> &mut MotionBank {
        &mut self.bank
    }

    /// The gesture currently buffered for an entity, aged one frame per
    /// tick and dropped once every special's buffer window has passed.
    fn buffered_motion(&mut self, entity_id: u64, def: &CharacterDef) -> Option<DetectedMotion> {
        if let Some(pending) = self.pending.get(&entity_id) {
            let longest = def.specials.iter().map(|s| s.buffer_window).max().unwrap_or(0);
            if pending.age > longest {
                self.pending.remove(&entity_id);
            }
        }
        self.pending.get(&entity_id).copied()
    }

    pub fn reset(&mut self) {
        for buffer in self.buffers.values_mut() {
            buffer.clear();
        }
        self.bank.reset_all();
        self.pending.clear();
    }
}

/// The whole simulation for one frame. Cheap to clone, serializes
/// losslessly, advances only through [`tick`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub frame: u64,
    pub round: u32,
    /// Frames left on the round clock.
    pub time_remaining: u64,

    pub paused:     bool,
    pub round_over: bool,
    pub match_over: bool,
    pub round_winner: Option<u64>,
    pub match_winner: Option<u64>,
    pub wins: BTreeMap<u64, u32>,

    pub fighters:    Vec<Fighter>,
    pub projectiles: Vec<Projectile>,
    pub stage: Stage,
    pub rules: Rules,

    pub hit_freeze:   u64,
    pub screen_shake: Option<ScreenShake>,
    next_projectile_id: u64,
}

impl GameState {
    pub fn new(config: MatchConfig, characters: &Characters) -> Result<GameState, CoreError> {
        let mut fighters = vec!();
        for entity in &config.entities {
            let def = characters.require(&entity.character)?;
            fighters.push(Fighter::new(entity.id, &entity.character, entity.team, entity.x, def));
        }
        // Face the nearest opponent from the opening bell.
        let snapshot = fighters.clone();
        for fighter in &mut fighters {
            if let Some(x) = opponent_x(&snapshot, fighter) {
                fighter.facing = if x >= fighter.x { 1 } else { -1 };
            }
        }
        let wins = fighters.iter().map(|f| (f.id, 0)).collect();

        Ok(GameState {
            frame: 0,
            round: 1,
            time_remaining: config.rules.round_time_frames(),
            paused:     false,
            round_over: false,
            match_over: false,
            round_winner: None,
            match_winner: None,
            wins,
            fighters,
            projectiles: vec!(),
            stage: config.stage,
            rules: config.rules,
            hit_freeze:   0,
            screen_shake: None,
            next_projectile_id: 0,
        })
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Reset the arena for the next round. Health, energy and positions
    /// come back; meter and the win tally carry over. A host holding an
    /// [`InputSession`] should `reset()` it alongside this call.
    pub fn start_next_round(&mut self, characters: &Characters) {
        if self.match_over {
            return;
        }
        self.round += 1;
        self.time_remaining = self.rules.round_time_frames();
        self.round_over = false;
        self.round_winner = None;
        self.projectiles.clear();
        self.hit_freeze = 0;
        self.screen_shake = None;
        for fighter in &mut self.fighters {
            match characters.get(&fighter.character) {
                Some(def) => fighter.reset_for_round(def),
                None      => warn!("character '{}' vanished between rounds", fighter.character),
            }
        }
    }
}

/// Advance the simulation one frame. Pure with respect to its inputs:
/// the same state, inputs and character table always produce the same
/// next state. `session` is optional; without it gestures must arrive
/// pre-recognized in `InputFrame::motion`.
pub fn tick(
    state: &GameState,
    inputs: &HashMap<u64, InputFrame>,
    characters: &Characters,
    mut session: Option<&mut InputSession>,
) -> GameState {
    let mut next = state.clone();
    if next.paused || next.match_over {
        return next;
    }
    next.frame += 1;
    let frame = next.frame;

    if let Some(mut shake) = next.screen_shake {
        shake.frames = shake.frames.saturating_sub(1);
        next.screen_shake = if shake.frames == 0 { None } else { Some(shake) };
    }
    // Hit freeze halts everything but the presentation timers.
    if next.hit_freeze > 0 {
        next.hit_freeze -= 1;
        return next;
    }
    if next.round_over {
        return next;
    }

    // Action stage: every fighter reads the previous frame's world, so
    // stepping order never leaks into the outcome.
    let neutral = InputFrame::default();
    let snapshot = state.fighters.clone();
    let mut spawns = vec!();
    for i in 0..next.fighters.len() {
        let id = next.fighters[i].id;
        let mut input = inputs.get(&id).unwrap_or(&neutral).clone();

        let Some(def) = characters.get(&next.fighters[i].character) else {
            warn!("no character data for '{}'", next.fighters[i].character);
            continue;
        };

        if let Some(session) = session.as_deref_mut() {
            session.register(id);
            if let Some(buffer) = session.buffers.get_mut(&id) {
                buffer.push(input.pressed.clone());
            }
            if input.motion.is_none() {
                let facing = next.fighters[i].facing;
                match session.bank.step(id, &input, facing).unwrap_or(None) {
                    Some(detected) => {
                        session.pending.insert(id, detected);
                    }
                    None => {
                        if let Some(pending) = session.pending.get_mut(&id) {
                            pending.age += 1;
                        }
                    }
                }
                input.motion = session.buffered_motion(id, def);
            }
        }

        let opp_x = opponent_x(&snapshot, &next.fighters[i]).unwrap_or(next.fighters[i].x);
        if let Some(projectile_def) = next.fighters[i].step_action(&input, def, frame, opp_x) {
            spawns.push((i, projectile_def));
        }

        // A gesture that actually came out is spent and does not pay its
        // cooldown.
        if let (Some(session), Some(detected)) = (session.as_deref_mut(), input.motion) {
            let started_special = next.fighters[i].move_frame == 0
                && matches!(next.fighters[i].attack, Some(ActiveAttack::Special { .. }));
            if started_special {
                session.pending.remove(&id);
                if let Ok(detector) = session.bank.detector(id) {
                    detector.clear_cooldown(detected.motion);
                }
            }
        }
    }

    special::resolve_grabs(&mut next.fighters, characters, frame);

    for fighter in &mut next.fighters {
        physics::step_fighter(fighter, &next.stage);
    }
    physics::separate_pushboxes(&mut next.fighters, &next.stage);

    let mut hits = collision::resolve_hits(&mut next.fighters, characters, frame);

    for (owner_i, projectile_def) in spawns {
        let projectile = Projectile::spawn(
            next.next_projectile_id,
            &next.fighters[owner_i],
            &projectile_def,
            frame,
        );
        next.next_projectile_id += 1;
        next.projectiles.push(projectile);
    }
    for projectile in &mut next.projectiles {
        projectile.step(&next.stage, frame);
    }
    hits.extend(projectile::collide_with_fighters(
        &mut next.projectiles,
        &mut next.fighters,
        characters,
        frame,
    ));
    projectile::resolve_clashes(&mut next.projectiles);
    next.projectiles.retain(|p| p.active);

    apply_feedback(&mut next, &hits);

    next.time_remaining = next.time_remaining.saturating_sub(1);
    settle_round(&mut next);
    next
}

/// Presentation side effects of the frame's hits: freeze scales with the
/// biggest clean hit, heavy hits shake the camera.
fn apply_feedback(state: &mut GameState, hits: &[HitResult]) {
    let biggest = hits
        .iter()
        .filter(|h| h.kind == HitKind::Clean)
        .map(|h| h.damage)
        .max();
    if let Some(damage) = biggest {
        state.hit_freeze = state.hit_freeze.max(damage as u64 / 30 + HIT_FREEZE_BASE);
        if damage >= SHAKE_THRESHOLD {
            state.screen_shake = Some(ScreenShake {
                magnitude: damage as f32 / 20.0,
                frames:    SHAKE_FRAMES,
            });
        }
    }
}

fn settle_round(state: &mut GameState) {
    let any_ko = state.fighters.iter().any(|f| f.ko());
    if !any_ko && state.time_remaining > 0 {
        return;
    }

    let winner = if any_ko {
        let mut alive_teams: Vec<u32> = state
            .fighters
            .iter()
            .filter(|f| !f.ko())
            .map(|f| f.team)
            .collect();
        alive_teams.sort_unstable();
        alive_teams.dedup();
        match alive_teams.as_slice() {
            [team] => state.fighters.iter().find(|f| !f.ko() && f.team == *team).map(|f| f.id),
            // Double KO, or a KO that leaves the fight going.
            _ => {
                if alive_teams.is_empty() {
                    None
                }
                else {
                    return;
                }
            }
        }
    }
    else {
        // Time over: most health left wins, an exact tie crowns no one.
        let best = state.fighters.iter().map(|f| f.health).max().unwrap_or(0);
        let mut leaders = state.fighters.iter().filter(|f| f.health == best);
        let first = leaders.next().map(|f| f.id);
        if leaders.next().is_some() { None } else { first }
    };

    state.round_over = true;
    state.round_winner = winner;
    if let Some(id) = winner {
        let wins = state.wins.entry(id).or_insert(0);
        *wins += 1;
        if *wins >= state.rules.rounds_to_win {
            state.match_over = true;
            state.match_winner = Some(id);
        }
    }
}

/// x of the nearest fighter on another team.
fn opponent_x(fighters: &[Fighter], of: &Fighter) -> Option<f32> {
    fighters
        .iter()
        .filter(|f| f.team != of.team)
        .min_by(|a, b| {
            let da = (a.x - of.x).abs();
            let db = (b.x - of.x).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|f| f.x)
}
