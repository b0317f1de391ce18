use cozy_chess::Color;
use kestrel::time::{bullet_correction, plan_move_time, GoParameters, TimeBudget, MAX_DEPTH, UNBOUNDED_MOVE_TIME_MS};
use pretty_assertions::assert_eq;

fn go(line: &str) -> GoParameters { GoParameters::parse(line.split_whitespace()) }

#[test]
fn forty_moves_one_minute() {
    // 60000/40 = 1500, no risk scaling, minus lag margin, above bullet tiers
    assert_eq!(plan_move_time(60_000, 0, 40, 100), 1490);
}

#[test]
fn last_move_before_control_keeps_a_reserve() {
    // 100 - min(1000, 10) = 90; risk scaling at 100% keeps 90; -10 = 80; 80*23/32 = 57
    assert_eq!(plan_move_time(100, 0, 1, 100), 57);
    // at 50%: 45 -> 35 -> 35*23/32 = 25
    assert_eq!(plan_move_time(100, 0, 1, 50), 25);
}

#[test]
fn risky_allowance_is_scaled_then_clamped() {
    // raw = (1000 + 2000*39)/40 = 1975 > half the clock
    assert_eq!(plan_move_time(1000, 2000, 40, 100), 897);
    assert_eq!(plan_move_time(1000, 2000, 40, 50), 885);
}

#[test]
fn empty_clock_gives_zero() {
    assert_eq!(plan_move_time(0, 0, 40, 100), 0);
    assert_eq!(plan_move_time(5, 0, 1, 100), 0);
}

#[test]
fn bullet_correction_is_stepwise() {
    assert_eq!(bullet_correction(199), 143);
    assert_eq!(bullet_correction(200), 162);
    assert!(bullet_correction(200) > bullet_correction(199));
    assert_eq!(bullet_correction(399), 324);
    assert_eq!(bullet_correction(400), 362);
    assert_eq!(bullet_correction(1199), 1086);
    assert_eq!(bullet_correction(1200), 1200);
}

#[test]
fn clock_of_side_to_move_is_used() {
    let p = go("wtime 60000 btime 4000 winc 0 binc 0");
    let white = TimeBudget::from_go(&p, Color::White, 100);
    let black = TimeBudget::from_go(&p, Color::Black, 100);
    assert_eq!(white.move_time_ms, Some(1490));
    assert_eq!(black.move_time_ms, Some(plan_move_time(4000, 0, 40, 100) as u64));
    assert_eq!(white.node_limit, None);
    assert_eq!(white.depth, MAX_DEPTH);
}

#[test]
fn nodes_make_a_dual_budget() {
    let b = TimeBudget::from_go(&go("nodes 500000"), Color::White, 100);
    assert_eq!(b.node_limit, Some(500_000));
    assert_eq!(b.move_time_ms, Some(UNBOUNDED_MOVE_TIME_MS));
}

#[test]
fn strict_limits_bypass_the_clock() {
    let b = TimeBudget::from_go(&go("movetime 50 wtime 100 btime 100"), Color::White, 100);
    assert_eq!(b.move_time_ms, Some(50));

    let b = TimeBudget::from_go(&go("depth 6 wtime 100 btime 100"), Color::White, 100);
    assert_eq!(b, TimeBudget { move_time_ms: None, node_limit: None, depth: 6 });

    let b = TimeBudget::from_go(&go("nodes 1000 movetime 20"), Color::Black, 100);
    assert_eq!((b.move_time_ms, b.node_limit), (Some(20), Some(1000)));
}

#[test]
fn no_clock_means_no_time_limit() {
    let b = TimeBudget::from_go(&go(""), Color::White, 100);
    assert_eq!(b, TimeBudget::default());
}

#[test]
fn absurd_increment_is_clamped_to_the_clock() {
    // the increment term saturates; the clock clamp still caps it at 1000
    let b = TimeBudget::from_go(&go("wtime 1000 winc 999999999999999999 btime 1000"), Color::White, 100);
    assert_eq!(b.move_time_ms, Some(897));
}
