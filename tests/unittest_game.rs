use std::collections::HashMap;

use fg_core::character::{CharacterDef, Characters};
use fg_core::fighter::ActiveAttack;
use fg_core::game::{tick, EntitySetup, GameState, InputSession, MatchConfig};
use fg_core::input::{Action, InputFrame};
use fg_core::rules::Rules;
use fg_core::stage::Stage;

fn new_match() -> (GameState, Characters) {
    let mut characters = Characters::new();
    characters.insert("base", CharacterDef::base());
    let config = MatchConfig {
        entities: vec!(
            EntitySetup { character: "base".to_string(), id: 0, team: 0, x: 200.0 },
            EntitySetup { character: "base".to_string(), id: 1, team: 1, x: 600.0 },
        ),
        stage: Stage::default(),
        rules: Rules::default(),
    };
    (GameState::new(config, &characters).unwrap(), characters)
}

fn scripted(frame: u64) -> HashMap<u64, InputFrame> {
    let mut inputs = HashMap::new();
    let p0 = if frame % 40 < 20 {
        vec!(Action::Right)
    }
    else {
        vec!(Action::LightPunch)
    };
    let p1 = if frame % 30 < 15 {
        vec!(Action::Left)
    }
    else {
        vec!(Action::HeavyPunch)
    };
    inputs.insert(0, InputFrame::new(p0));
    inputs.insert(1, InputFrame::new(p1));
    inputs
}

#[test]
fn identical_inputs_replay_identically() {
    let run = || {
        let (mut state, characters) = new_match();
        let mut session = InputSession::new();
        for _ in 0..300 {
            let inputs = scripted(state.frame);
            state = tick(&state, &inputs, &characters, Some(&mut session));
        }
        serde_json::to_string(&state).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn unknown_character_is_rejected_up_front() {
    let characters = Characters::new();
    let config = MatchConfig {
        entities: vec!(EntitySetup { character: "nobody".to_string(), id: 0, team: 0, x: 100.0 }),
        stage: Stage::default(),
        rules: Rules::default(),
    };
    assert!(GameState::new(config, &characters).is_err());
}

#[test]
fn ko_ends_the_round() {
    let (mut state, characters) = new_match();
    state.fighters[1].health = 0;

    state = tick(&state, &HashMap::new(), &characters, None);
    assert!(state.round_over);
    assert_eq!(state.round_winner, Some(0));
    assert_eq!(state.wins.get(&0), Some(&1));
    assert!(!state.match_over);
}

#[test]
fn timeout_crowns_the_healthier_fighter() {
    let (mut state, characters) = new_match();
    state.time_remaining = 1;
    state.fighters[0].health = 80;
    state.fighters[1].health = 50;

    state = tick(&state, &HashMap::new(), &characters, None);
    assert!(state.round_over);
    assert_eq!(state.round_winner, Some(0));
}

#[test]
fn timeout_tie_crowns_no_one() {
    let (mut state, characters) = new_match();
    state.time_remaining = 1;
    state.fighters[0].health = 50;
    state.fighters[1].health = 50;

    state = tick(&state, &HashMap::new(), &characters, None);
    assert!(state.round_over);
    assert_eq!(state.round_winner, None);
    assert_eq!(state.wins.get(&0), Some(&0));
    assert_eq!(state.wins.get(&1), Some(&0));
}

#[test]
fn second_round_win_takes_the_match() {
    let (mut state, characters) = new_match();
    state.wins.insert(0, 1);
    state.fighters[1].health = 0;

    state = tick(&state, &HashMap::new(), &characters, None);
    assert!(state.match_over);
    assert_eq!(state.match_winner, Some(0));

    // A finished match no longer advances.
    let frozen = tick(&state, &HashMap::new(), &characters, None);
    assert_eq!(frozen.frame, state.frame);
}

#[test]
fn next_round_restores_the_arena_but_keeps_meter() {
    let (mut state, characters) = new_match();
    state.fighters[0].meter = 33.0;
    state.fighters[0].x = 350.0;
    state.fighters[1].health = 0;
    state = tick(&state, &HashMap::new(), &characters, None);
    assert!(state.round_over);

    state.start_next_round(&characters);
    assert_eq!(state.round, 2);
    assert!(!state.round_over);
    assert_eq!(state.fighters[0].x, state.fighters[0].spawn_x);
    assert_eq!(state.fighters[1].health, state.fighters[1].max_health);
    assert_eq!(state.fighters[0].meter, 33.0);
    assert_eq!(state.wins.get(&0), Some(&1));
    assert_eq!(state.time_remaining, state.rules.round_time_frames());
}

#[test]
fn fighters_never_leave_the_arena() {
    let (mut state, characters) = new_match();
    let mut inputs = HashMap::new();
    inputs.insert(0, InputFrame::new(vec!(Action::Left)));
    inputs.insert(1, InputFrame::new(vec!(Action::Left)));

    for _ in 0..300 {
        state = tick(&state, &inputs, &characters, None);
        for fighter in &state.fighters {
            assert!(fighter.x >= state.stage.left_bound);
            assert!(fighter.x <= state.stage.right_bound);
        }
    }
}

#[test]
fn pause_stops_the_clock() {
    let (mut state, characters) = new_match();
    state.toggle_pause();

    let next = tick(&state, &scripted(0), &characters, None);
    assert_eq!(next.frame, 0);
    assert_eq!(next.time_remaining, state.time_remaining);
}

#[test]
fn hit_freeze_halts_movement() {
    let (mut state, characters) = new_match();
    state.hit_freeze = 4;
    let x_before = state.fighters[0].x;

    let mut inputs = HashMap::new();
    inputs.insert(0, InputFrame::new(vec!(Action::Right)));
    state = tick(&state, &inputs, &characters, None);

    assert_eq!(state.fighters[0].x, x_before);
    assert_eq!(state.hit_freeze, 3);
}

#[test]
fn energy_regenerates_faster_than_meter() {
    let (mut state, characters) = new_match();
    state.fighters[0].energy = 0.0;
    state.fighters[0].meter = 0.0;

    for _ in 0..40 {
        state = tick(&state, &HashMap::new(), &characters, None);
    }
    assert_eq!(state.fighters[0].energy, 10.0);
    assert!((state.fighters[0].meter - 4.0).abs() < 1e-3);
    assert!(state.fighters[0].energy > state.fighters[0].meter);
}

#[test]
fn gesture_buffered_in_recovery_fires_when_free() {
    let (mut state, characters) = new_match();
    let mut session = InputSession::new();

    // Whiff a light punch, enter the fireball gesture during its
    // recovery; the buffered gesture comes out once the punch ends.
    let script: Vec<Vec<Action>> = vec!(
        vec!(Action::LightPunch),
        vec!(), vec!(), vec!(), vec!(), vec!(), vec!(),
        vec!(Action::Down),
        vec!(Action::Down, Action::Right),
        vec!(Action::Right),
        vec!(Action::Right, Action::LightPunch),
    );

    for t in 0..16 {
        let mut inputs = HashMap::new();
        if let Some(actions) = script.get(t) {
            inputs.insert(0, InputFrame::new(actions.clone()));
        }
        state = tick(&state, &inputs, &characters, Some(&mut session));
    }

    match state.fighters[0].attack {
        Some(ActiveAttack::Special { ref id, .. }) => assert_eq!(id, "fireball"),
        ref other => panic!("expected a buffered fireball, got {:?}", other),
    }
}

#[test]
fn fireball_travels_and_connects() {
    let (mut state, characters) = new_match();
    let mut session = InputSession::new();

    // Quarter circle forward into light punch, entered over four frames.
    let script = vec!(
        vec!(Action::Down),
        vec!(Action::Down, Action::Right),
        vec!(Action::Right),
        vec!(Action::Right, Action::LightPunch),
    );

    let mut saw_projectile = false;
    for t in 0..250 {
        let mut inputs = HashMap::new();
        if let Some(actions) = script.get(t) {
            inputs.insert(0, InputFrame::new(actions.clone()));
        }
        state = tick(&state, &inputs, &characters, Some(&mut session));
        saw_projectile |= !state.projectiles.is_empty();
    }

    assert!(saw_projectile);
    // One clean fireball: 60 damage, single use, gone after the hit.
    assert_eq!(state.fighters[1].health, state.fighters[1].max_health - 60);
    assert!(state.projectiles.is_empty());
}
