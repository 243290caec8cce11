use fg_core::input::Button;
use fg_core::motion::{Dir, MotionDetector, MotionType, CHARGE_FRAMES, GESTURE_COOLDOWN};

fn quiet(detector: &mut MotionDetector, frames: u32) {
    for _ in 0..frames {
        assert_eq!(detector.step(Dir::Neutral, &[]), None);
    }
}

#[test]
fn quarter_circle_forward_exact() {
    let mut detector = MotionDetector::new();
    quiet(&mut detector, 5);
    assert_eq!(detector.step(Dir::Down, &[]), None);
    assert_eq!(detector.step(Dir::DownForward, &[]), None);
    let detected = detector.step(Dir::Forward, &[Button::LightPunch]).unwrap();
    assert_eq!(detected.motion, MotionType::QuarterCircleForward);
    assert_eq!(detected.button, Button::LightPunch);
    assert_eq!(detected.confidence, 1.0);
    assert_eq!(detected.charge, 0);
}

#[test]
fn quarter_circle_forward_lenient() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Down, &[]);
    let detected = detector.step(Dir::Forward, &[Button::HeavyKick]).unwrap();
    assert_eq!(detected.motion, MotionType::QuarterCircleForward);
    assert_eq!(detected.confidence, 0.7);
}

#[test]
fn no_detection_without_a_fresh_button() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Down, &[Button::LightPunch]);
    detector.step(Dir::DownForward, &[Button::LightPunch]);
    // Button held the whole way through: never a new press.
    assert_eq!(detector.step(Dir::Forward, &[Button::LightPunch]), None);
}

#[test]
fn cooldown_swallows_the_repeat() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Down, &[]);
    detector.step(Dir::DownForward, &[]);
    assert!(detector.step(Dir::Forward, &[Button::LightPunch]).is_some());

    // Same geometry still in history, button released and re-pressed:
    // the gesture is on cooldown and must not fall through to anything.
    detector.step(Dir::Forward, &[]);
    assert_eq!(detector.step(Dir::Forward, &[Button::LightPunch]), None);
}

#[test]
fn executed_gesture_clears_its_cooldown() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Down, &[]);
    detector.step(Dir::DownForward, &[]);
    assert!(detector.step(Dir::Forward, &[Button::LightPunch]).is_some());

    detector.clear_cooldown(MotionType::QuarterCircleForward);
    detector.step(Dir::Forward, &[]);
    let again = detector.step(Dir::Forward, &[Button::LightPunch]).unwrap();
    assert_eq!(again.motion, MotionType::QuarterCircleForward);
}

#[test]
fn gesture_fires_again_after_cooldown_expires() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Down, &[]);
    detector.step(Dir::DownForward, &[]);
    assert!(detector.step(Dir::Forward, &[Button::LightPunch]).is_some());

    quiet(&mut detector, GESTURE_COOLDOWN as u32 + 1);

    detector.step(Dir::Down, &[]);
    detector.step(Dir::DownForward, &[]);
    assert!(detector.step(Dir::Forward, &[Button::LightPunch]).is_some());
}

#[test]
fn dragon_punch_beats_quarter_circle() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Forward, &[]);
    detector.step(Dir::Down, &[]);
    let detected = detector.step(Dir::DownForward, &[Button::HeavyPunch]).unwrap();
    assert_eq!(detected.motion, MotionType::DragonPunch);
    assert_eq!(detected.confidence, 1.0);
}

#[test]
fn dragon_punch_lenient_shortcut() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Forward, &[]);
    detector.step(Dir::Down, &[]);
    let detected = detector.step(Dir::Forward, &[Button::LightPunch]).unwrap();
    assert_eq!(detected.motion, MotionType::DragonPunch);
    assert_eq!(detected.confidence, 0.8);
}

#[test]
fn charge_back_forward_requires_full_charge() {
    let mut detector = MotionDetector::new();
    for _ in 0..CHARGE_FRAMES - 1 {
        detector.step(Dir::Back, &[]);
    }
    assert_eq!(detector.step(Dir::Forward, &[Button::HeavyPunch]), None);

    let mut detector = MotionDetector::new();
    for _ in 0..CHARGE_FRAMES {
        detector.step(Dir::Back, &[]);
    }
    let detected = detector.step(Dir::Forward, &[Button::HeavyPunch]).unwrap();
    assert_eq!(detected.motion, MotionType::ChargeBackForward);
    assert_eq!(detected.confidence, 1.0);
}

#[test]
fn charge_down_up() {
    let mut detector = MotionDetector::new();
    for _ in 0..CHARGE_FRAMES {
        detector.step(Dir::Down, &[]);
    }
    let detected = detector.step(Dir::Up, &[Button::LightKick]).unwrap();
    assert_eq!(detected.motion, MotionType::ChargeDownUp);
}

#[test]
fn charge_survives_a_short_release() {
    let mut detector = MotionDetector::new();
    for _ in 0..CHARGE_FRAMES {
        detector.step(Dir::Back, &[]);
    }
    // Let go for a few frames before committing to forward.
    detector.step(Dir::Neutral, &[]);
    detector.step(Dir::Neutral, &[]);
    let detected = detector.step(Dir::Forward, &[Button::HeavyPunch]).unwrap();
    assert_eq!(detected.motion, MotionType::ChargeBackForward);
}

#[test]
fn double_tap_forward() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Forward, &[]);
    detector.step(Dir::Neutral, &[]);
    let detected = detector.step(Dir::Forward, &[Button::LightKick]).unwrap();
    assert_eq!(detected.motion, MotionType::DoubleTapForward);
    assert_eq!(detected.confidence, 1.0);
}

#[test]
fn full_circle_beats_half_circles() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Forward, &[]);
    detector.step(Dir::Down, &[]);
    detector.step(Dir::Back, &[]);
    let detected = detector.step(Dir::Up, &[Button::HeavyPunch]).unwrap();
    assert_eq!(detected.motion, MotionType::FullCircle);
    assert_eq!(detected.confidence, 1.0);
}

#[test]
fn half_circle_back_exact_needs_both_diagonals() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Forward, &[]);
    detector.step(Dir::DownForward, &[]);
    detector.step(Dir::Down, &[]);
    detector.step(Dir::DownBack, &[]);
    let detected = detector.step(Dir::Back, &[Button::HeavyPunch]).unwrap();
    assert_eq!(detected.motion, MotionType::HalfCircleBack);
    assert_eq!(detected.confidence, 1.0);
}

#[test]
fn half_circle_back_lenient_without_diagonals() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Forward, &[]);
    detector.step(Dir::Down, &[]);
    let detected = detector.step(Dir::Back, &[Button::HeavyPunch]).unwrap();
    assert_eq!(detected.motion, MotionType::HalfCircleBack);
    assert_eq!(detected.confidence, 0.6);
}

#[test]
fn charge_reports_frames_held() {
    let mut detector = MotionDetector::new();
    for _ in 0..CHARGE_FRAMES + 15 {
        detector.step(Dir::Back, &[]);
    }
    let detected = detector.step(Dir::Forward, &[Button::HeavyPunch]).unwrap();
    assert_eq!(detected.motion, MotionType::ChargeBackForward);
    assert_eq!(detected.charge, CHARGE_FRAMES + 15);
}

#[test]
fn full_circle_out_of_order_is_lenient() {
    let mut detector = MotionDetector::new();
    detector.step(Dir::Forward, &[]);
    detector.step(Dir::Back, &[]);
    detector.step(Dir::Down, &[]);
    let detected = detector.step(Dir::Up, &[Button::HeavyPunch]).unwrap();
    assert_eq!(detected.motion, MotionType::FullCircle);
    assert_eq!(detected.confidence, 0.8);
}

#[test]
fn reset_forgets_history_and_charge() {
    let mut detector = MotionDetector::new();
    for _ in 0..CHARGE_FRAMES {
        detector.step(Dir::Back, &[]);
    }
    detector.step(Dir::Down, &[]);
    detector.reset();

    assert_eq!(detector.charge_frames_back(), 0);
    assert_eq!(detector.step(Dir::Forward, &[Button::LightPunch]), None);
}
