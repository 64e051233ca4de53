use ascent_system_selection::{select_entry, select_weighted, WeightedEntry};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn zero_weight_candidate_never_wins() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let items = [("A", 0.0_f32), ("B", 10.0_f32)];

    for _ in 0..10_000 {
        let picked = select_weighted(&items, |item| item.1, &mut rng).expect("candidate");
        assert_eq!(picked.0, "B");
    }
}

#[test]
fn equal_weights_split_evenly() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x1234_5678);
    let entries = [WeightedEntry::new('A', 1.0), WeightedEntry::new('B', 1.0)];
    let draws = 20_000;

    let mut a_count = 0;
    for _ in 0..draws {
        if select_entry(&entries, &mut rng) == Some(&'A') {
            a_count += 1;
        }
    }

    let share = f64::from(a_count) / f64::from(draws);
    assert!(
        (0.47..=0.53).contains(&share),
        "expected roughly half of the draws, got {share}"
    );
}

#[test]
fn selection_is_proportional_to_weight() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let items = [(0usize, 1.0_f32), (1, 3.0)];
    let mut counts = [0u32; 2];
    for _ in 0..20_000 {
        let picked = select_weighted(&items, |item| item.1, &mut rng).expect("candidate");
        counts[picked.0] += 1;
    }

    let share = f64::from(counts[1]) / 20_000.0;
    assert!((0.72..=0.78).contains(&share), "heavy share was {share}");
}

#[test]
fn seeded_selection_replays() {
    let items = [("a", 1.0_f32), ("b", 2.0), ("c", 3.0)];
    let run = |seed| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..64)
            .map(|_| select_weighted(&items, |item| item.1, &mut rng).map(|item| item.0))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(5), run(5));
}
