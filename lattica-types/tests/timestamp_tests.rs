use lattica_types::HybridTimestamp;
use proptest::prelude::*;

// ── Construction ─────────────────────────────────────────────────

#[test]
fn now_has_zero_logical() {
    let ts = HybridTimestamp::now();
    assert_eq!(ts.logical(), 0);
    assert!(ts.wall_time() > 0);
}

#[test]
fn new_from_components() {
    let ts = HybridTimestamp::new(42, 7);
    assert_eq!(ts.wall_time(), 42);
    assert_eq!(ts.logical(), 7);
}

#[test]
fn zero_is_smallest() {
    assert!(HybridTimestamp::ZERO < HybridTimestamp::new(0, 1));
    assert!(HybridTimestamp::ZERO < HybridTimestamp::now());
}

// ── Ordering ─────────────────────────────────────────────────────

#[test]
fn ordering_by_wall_time() {
    let a = HybridTimestamp::new(100, 0);
    let b = HybridTimestamp::new(200, 0);
    assert!(a < b);
}

#[test]
fn ordering_by_logical_when_wall_time_equal() {
    let a = HybridTimestamp::new(100, 0);
    let b = HybridTimestamp::new(100, 1);
    assert!(a < b);
    assert!(b > a);
}

#[test]
fn equal_timestamps() {
    let a = HybridTimestamp::new(100, 5);
    let b = HybridTimestamp::new(100, 5);
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
}

// ── tick ─────────────────────────────────────────────────────

#[test]
fn tick_from_future_bumps_logical() {
    let future = HybridTimestamp::new(u64::MAX / 2, 3);
    let next = future.tick();
    assert_eq!(next.wall_time(), future.wall_time());
    assert_eq!(next.logical(), 4);
}

#[test]
fn tick_from_past_follows_wall_clock() {
    let past = HybridTimestamp::new(1, 9);
    let next = past.tick();
    assert!(next.wall_time() > 1);
    assert_eq!(next.logical(), 0);
}

#[test]
fn tick_when_logical_exhausted_advances_wall() {
    let ts = HybridTimestamp::new(u64::MAX / 2, u32::MAX);
    let next = ts.tick();
    assert!(next > ts);
    assert_eq!(next.wall_time(), ts.wall_time() + 1);
}

#[test]
fn serialization_roundtrip() {
    let ts = HybridTimestamp::new(1234, 5);
    let json = serde_json::to_string(&ts).unwrap();
    let parsed: HybridTimestamp = serde_json::from_str(&json).unwrap();
    assert_eq!(ts, parsed);
}

proptest! {
    #[test]
    fn tick_is_strictly_increasing(wall in 0u64..u64::MAX / 2, logical in any::<u32>()) {
        let ts = HybridTimestamp::new(wall, logical);
        prop_assert!(ts.tick() > ts);
    }

    #[test]
    fn tick_from_a_peer_stamp_sorts_after_it(
        w1 in 0u64..u64::MAX / 2, l1 in any::<u32>(),
        w2 in 0u64..u64::MAX / 2, l2 in any::<u32>(),
    ) {
        let a = HybridTimestamp::new(w1, l1);
        let b = HybridTimestamp::new(w2, l2);
        let next = a.max(b).tick();
        prop_assert!(next > a);
        prop_assert!(next > b);
    }
}
