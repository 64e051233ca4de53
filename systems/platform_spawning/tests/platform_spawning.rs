use ascent_core::{
    BoundaryProvider, Part, PlatformSpawner, PlatformVariant, SpawnBoundaries, SpawnRecord,
};
use ascent_system_platform_spawning::VariantPlatformSpawner;
use glam::Vec2;

#[derive(Debug)]
struct Walls {
    left: f32,
    right: f32,
}

impl BoundaryProvider for Walls {
    fn spawn_boundaries(&self) -> SpawnBoundaries {
        SpawnBoundaries::new(self.left, self.right)
    }
}

fn mixed_part() -> Part {
    Part {
        name: "mixed".into(),
        platform_variants: vec![
            PlatformVariant::new("ledge", 3.0),
            PlatformVariant::new("crate", 1.0),
            PlatformVariant::new("ghost", 0.0),
        ],
        ..Part::default()
    }
}

#[test]
fn variants_follow_their_weights() {
    let mut spawner = VariantPlatformSpawner::new(SpawnBoundaries::new(-8.0, 8.0), 21);
    let part = mixed_part();
    let mut sink: Vec<SpawnRecord> = Vec::new();

    for step in 0..4000 {
        let _ = spawner.spawn_platform_at(step as f32, &part, &mut sink);
    }

    let ledges = sink
        .iter()
        .filter(|record| record.prefab.as_str() == "ledge")
        .count();
    let ghosts = sink
        .iter()
        .filter(|record| record.prefab.as_str() == "ghost")
        .count();
    assert_eq!(sink.len(), 4000);
    assert_eq!(ghosts, 0);
    assert!((2700..=3300).contains(&ledges), "ledges = {ledges}");
}

#[test]
fn boundaries_are_queried_on_every_spawn() {
    let walls = Walls {
        left: -4.0,
        right: 4.0,
    };
    let mut spawner = VariantPlatformSpawner::new(walls, 5);
    let part = mixed_part();
    let mut sink: Vec<SpawnRecord> = Vec::new();

    let first = spawner
        .spawn_platform_near(Vec2::new(-20.0, 1.0), &part, &mut sink)
        .expect("platform");
    assert_eq!(first.x, -3.0);

    spawner.boundary_provider_mut().left = 10.0;
    spawner.boundary_provider_mut().right = 30.0;
    assert_eq!(spawner.spawn_boundaries(), SpawnBoundaries::new(10.0, 30.0));

    for step in 0..50 {
        let placed = spawner
            .spawn_platform_at(step as f32, &part, &mut sink)
            .expect("platform");
        assert!((11.0..=29.0).contains(&placed.x), "x = {}", placed.x);
    }
}

#[test]
fn identical_seeds_place_identically() {
    let run = |seed| {
        let mut spawner = VariantPlatformSpawner::new(SpawnBoundaries::new(-8.0, 8.0), seed);
        let part = mixed_part();
        let mut sink: Vec<SpawnRecord> = Vec::new();
        for step in 0..64 {
            let _ = spawner.spawn_platform_at(step as f32 * 2.5, &part, &mut sink);
        }
        sink
    };

    assert_eq!(run(77), run(77));
    assert_ne!(run(77), run(78));
}
