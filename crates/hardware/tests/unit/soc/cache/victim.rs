//! # Victim Generator Tests

use memsim_core::soc::cache::victim::RandomVictim;

#[test]
fn same_seed_same_sequence() {
    let mut a = RandomVictim::new(42);
    let mut b = RandomVictim::new(42);
    let picks_a: Vec<usize> = (0..64).map(|_| a.pick(7)).collect();
    let picks_b: Vec<usize> = (0..64).map(|_| b.pick(7)).collect();
    assert_eq!(picks_a, picks_b);
}

#[test]
fn picks_stay_in_range() {
    let mut rng = RandomVictim::new(1);
    for len in 1..=16 {
        for _ in 0..32 {
            assert!(rng.pick(len) < len);
        }
    }
}

#[test]
fn zero_seed_still_varies() {
    let mut rng = RandomVictim::new(0);
    let picks: Vec<usize> = (0..32).map(|_| rng.pick(1000)).collect();
    assert!(picks.windows(2).any(|w| w[0] != w[1]));
}

#[test]
fn every_slot_is_eventually_picked() {
    let mut rng = RandomVictim::new(123_456_789);
    let mut seen = [false; 8];
    for _ in 0..1000 {
        seen[rng.pick(8)] = true;
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
#[should_panic(expected = "empty set")]
fn picking_from_nothing_panics() {
    let _ = RandomVictim::new(5).pick(0);
}

#[test]
fn picks_are_available_at_compile_time() {
    const PICKS: [usize; 3] = {
        let mut rng = RandomVictim::new(42);
        [rng.pick(7), rng.pick(7), rng.pick(7)]
    };
    let mut rng = RandomVictim::new(42);
    assert_eq!(PICKS, [rng.pick(7), rng.pick(7), rng.pick(7)]);
}
