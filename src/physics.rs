use crate::fighter::{Fighter, Status, KNOCKDOWN_FRAMES};
use crate::stage::Stage;

pub const GRAVITY:          f32 = 0.7;
pub const TERMINAL_FALL:    f32 = 14.0;
pub const GROUND_FRICTION:  f32 = 0.4;
/// Half of the body width used when two grounded fighters push apart.
pub const PUSH_HALF_WIDTH:  f32 = 20.0;

/// One frame of movement for one fighter: gravity, integration, landing
/// and wall clamping. Runs after the action stage so fresh impulses move
/// the fighter on the frame they are applied.
pub fn step_fighter(fighter: &mut Fighter, stage: &Stage) {
    if fighter.airborne() {
        fighter.y_vel = (fighter.y_vel - GRAVITY).max(-TERMINAL_FALL);
    }
    else if !matches!(fighter.status, Status::WalkForward | Status::WalkBackward) {
        // Knockback slides scrub off against the ground.
        if fighter.x_vel > 0.0 {
            fighter.x_vel = (fighter.x_vel - GROUND_FRICTION).max(0.0);
        }
        else {
            fighter.x_vel = (fighter.x_vel + GROUND_FRICTION).min(0.0);
        }
    }

    fighter.x += fighter.x_vel;
    fighter.y += fighter.y_vel;

    if fighter.y <= stage.ground && fighter.y_vel <= 0.0 {
        let was_airborne = fighter.airborne();
        fighter.y = stage.ground;
        fighter.y_vel = 0.0;
        fighter.grounded = true;
        if was_airborne {
            land(fighter);
        }
    }

    let clamped = stage.clamp_x(fighter.x);
    if clamped != fighter.x {
        fighter.x = clamped;
        fighter.x_vel = 0.0;
    }
}

/// Landing transitions: a jump just ends, getting knocked out of the air
/// puts the fighter face down.
fn land(fighter: &mut Fighter) {
    match fighter.status {
        Status::Jump => {
            fighter.status = Status::Idle;
            fighter.x_vel = 0.0;
        }
        Status::Hitstun => {
            fighter.status = Status::Knockdown;
            fighter.stun_frames = KNOCKDOWN_FRAMES;
            fighter.x_vel = 0.0;
            fighter.being_grabbed = false;
        }
        // An airborne attack that touches down keeps playing out.
        _ => {}
    }
}

/// Grounded fighters cannot stand inside each other. Overlap along x is
/// split evenly; a dead-center overlap breaks the tie by id so the result
/// never depends on iteration order.
pub fn separate_pushboxes(fighters: &mut [Fighter], stage: &Stage) {
    let count = fighters.len();
    for a in 0..count {
        for b in a + 1..count {
            if fighters[a].airborne() || fighters[b].airborne() {
                continue;
            }
            let dx = fighters[b].x - fighters[a].x;
            let overlap = PUSH_HALF_WIDTH * 2.0 - dx.abs();
            if overlap <= 0.0 {
                continue;
            }
            let dir = if dx > 0.0 {
                1.0
            }
            else if dx < 0.0 {
                -1.0
            }
            else if fighters[a].id < fighters[b].id {
                1.0
            }
            else {
                -1.0
            };
            let shift = overlap / 2.0;
            fighters[a].x = stage.clamp_x(fighters[a].x - dir * shift);
            fighters[b].x = stage.clamp_x(fighters[b].x + dir * shift);
        }
    }
}
