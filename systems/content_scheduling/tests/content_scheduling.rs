use ascent_core::{
    ChainRule, ContentCategory, ContentPlacement, ContentSpawnRule, CountRange, FlipMode, Part,
    PartProgress, PlatformSpawner, PlatformVariant, Positioning, PrefabSink, SpawnBoundaries,
    SpawnKind, SpawnRecord,
};
use ascent_system_content_scheduling::{ContentAnchor, ContentQueue, ContentSpawner};
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

struct FixedBounds(SpawnBoundaries);

impl PlatformSpawner for FixedBounds {
    fn spawn_boundaries(&self) -> SpawnBoundaries {
        self.0
    }

    fn spawn_platform_at(
        &mut self,
        _y: f32,
        _part: &Part,
        _sink: &mut dyn PrefabSink,
    ) -> Option<Vec2> {
        None
    }

    fn spawn_platform_near(
        &mut self,
        _position: Vec2,
        _part: &Part,
        _sink: &mut dyn PrefabSink,
    ) -> Option<Vec2> {
        None
    }
}

fn spawner() -> ContentSpawner {
    let mut spawner = ContentSpawner::new(21);
    spawner.initialize(&FixedBounds(SpawnBoundaries::new(-6.0, 6.0)));
    spawner
}

fn part_with(rules: Vec<ContentSpawnRule>) -> Part {
    Part {
        name: "content".into(),
        platform_variants: vec![PlatformVariant::new("ledge", 1.0)],
        content_rules: rules,
        ..Part::default()
    }
}

fn counted(prefab: &str, count: u32) -> ContentSpawnRule {
    let mut rule = ContentSpawnRule::new(ContentCategory::Enemy, prefab);
    rule.count = CountRange::new(count, count);
    rule
}

#[test]
fn chains_queue_once_and_counts_expand() {
    let mut chained = counted("bats", 5);
    chained.chain = Some(ChainRule::default());
    let blank = ContentSpawnRule::new(ContentCategory::Obstacle, "");
    let part = part_with(vec![counted("slime", 3), chained, blank]);

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let queue = ContentQueue::for_part(&part, &mut rng);

    assert_eq!(queue.total(), 4);
    assert_eq!(queue.items().iter().filter(|item| item.is_chain()).count(), 1);
    assert_eq!(queue.spawned(), 0);
}

#[test]
fn releases_follow_part_progress() {
    let part = part_with(vec![counted("slime", 6)]);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut queue = ContentQueue::for_part(&part, &mut rng);
    let mut spawner = spawner();
    let mut sink: Vec<SpawnRecord> = Vec::new();
    let mut placements = Vec::new();

    let mut released = Vec::new();
    for generated in 1..=4 {
        let anchor = ContentAnchor::at_platform(Vec2::new(0.0, generated as f32 * 2.0));
        released.push(spawner.spawn_content_based_on_progress(
            &mut queue,
            PartProgress::new(generated, 4),
            anchor,
            &mut sink,
            &mut placements,
        ));
        let expected = (generated as usize * 6) / 4;
        assert_eq!(queue.spawned(), expected);
    }

    assert_eq!(released, vec![1, 2, 1, 2]);
    assert!(queue.is_drained());
    assert_eq!(sink.len(), 6);
}

#[test]
fn remaining_content_flush_drains_everything() {
    let mut pickup = ContentSpawnRule::new(ContentCategory::PowerUp, "heart");
    pickup.spawn_before_part = true;
    let part = part_with(vec![counted("slime", 5), pickup]);
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut queue = ContentQueue::for_part(&part, &mut rng);
    let mut spawner = spawner();
    let mut sink: Vec<SpawnRecord> = Vec::new();
    let mut placements = Vec::new();
    let anchor = ContentAnchor::at_platform(Vec2::new(0.0, 4.0));

    let _ = spawner.spawn_content_based_on_progress(
        &mut queue,
        PartProgress::new(1, 5),
        anchor,
        &mut sink,
        &mut placements,
    );
    let flushed = spawner.spawn_remaining_content(&mut queue, anchor, &mut sink, &mut placements);

    assert_eq!(flushed, 5);
    assert!(queue.is_drained());
    assert_eq!(placements.len(), 6);
    assert_eq!(placements.iter().filter(|p| p.before_part).count(), 1);
    assert_eq!(
        spawner.spawn_remaining_content(&mut queue, anchor, &mut sink, &mut placements),
        0
    );
}

#[test]
fn pre_part_content_releases_once_above_first_platform() {
    let mut pickup = ContentSpawnRule::new(ContentCategory::PowerUp, "heart");
    pickup.spawn_before_part = true;
    pickup.positioning = Positioning::OverPlatform;
    let part = part_with(vec![pickup]);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut queue = ContentQueue::for_part(&part, &mut rng);
    let mut spawner = spawner();
    let mut sink: Vec<SpawnRecord> = Vec::new();
    let mut placements: Vec<ContentPlacement> = Vec::new();
    let anchor = ContentAnchor::at_platform(Vec2::new(2.5, 3.0));

    assert_eq!(queue.total(), 0);
    assert_eq!(
        spawner.spawn_pre_part_content(&mut queue, anchor, &mut sink, &mut placements),
        1
    );
    assert_eq!(
        spawner.spawn_pre_part_content(&mut queue, anchor, &mut sink, &mut placements),
        0
    );

    assert_eq!(placements.len(), 1);
    assert!(placements[0].before_part);
    assert_eq!(placements[0].positions, vec![Vec2::new(2.5, 4.0)]);
    assert_eq!(sink[0].kind, SpawnKind::Content(ContentCategory::PowerUp));
}

#[test]
fn content_sits_one_unit_above_the_anchor_inside_bounds() {
    let part = part_with(vec![counted("slime", 8)]);
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut queue = ContentQueue::for_part(&part, &mut rng);
    let mut spawner = spawner();
    let mut sink: Vec<SpawnRecord> = Vec::new();
    let mut placements = Vec::new();
    let anchor = ContentAnchor::at_platform(Vec2::new(1.0, 10.0));

    let _ = spawner.spawn_remaining_content(&mut queue, anchor, &mut sink, &mut placements);

    assert_eq!(sink.len(), 8);
    for record in &sink {
        assert_eq!(record.position.y, 11.0);
        assert!((-6.0..=6.0).contains(&record.position.x));
        assert!(!record.flip_x);
    }
}

#[test]
fn over_platform_content_follows_the_platform() {
    let mut rule = counted("spikes", 1);
    rule.positioning = Positioning::OverPlatform;
    rule.flip = FlipMode::Fixed;
    let part = part_with(vec![rule]);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut queue = ContentQueue::for_part(&part, &mut rng);
    let mut spawner = spawner();
    let mut sink: Vec<SpawnRecord> = Vec::new();
    let mut placements = Vec::new();

    let anchor = ContentAnchor::at_platform(Vec2::new(9.0, 2.0));
    let _ = spawner.spawn_remaining_content(&mut queue, anchor, &mut sink, &mut placements);

    assert_eq!(sink.len(), 1);
    assert_eq!(sink[0].position, Vec2::new(6.0, 3.0));
    assert!(sink[0].flip_x);
}

#[test]
fn chain_members_share_height_and_flip() {
    let mut rule = counted("bats", 1);
    rule.flip = FlipMode::Random;
    rule.chain = Some(ChainRule {
        min_length: 3,
        max_length: 3,
        ..ChainRule::default()
    });
    let part = part_with(vec![rule]);
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut queue = ContentQueue::for_part(&part, &mut rng);
    let mut spawner = spawner();
    let mut sink: Vec<SpawnRecord> = Vec::new();
    let mut placements = Vec::new();

    let anchor = ContentAnchor::at_platform(Vec2::new(0.0, 5.0));
    let _ = spawner.spawn_remaining_content(&mut queue, anchor, &mut sink, &mut placements);

    assert_eq!(placements.len(), 1);
    let chain = &placements[0];
    assert!(chain.chained);
    assert_eq!(chain.positions, vec![
        Vec2::new(-3.0, 6.0),
        Vec2::new(0.0, 6.0),
        Vec2::new(3.0, 6.0),
    ]);
    assert_eq!(sink.len(), 3);
    assert!(sink.iter().all(|record| record.flip_x == chain.flip_x));
}
