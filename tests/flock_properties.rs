use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shoal::{
    Avoidance, Boid, BoidConfig, Bounds, BoundingSphere, FlockIndex, Simulation, SimulationParams, SphereRaycaster,
    Vec3,
};

const EPS: f32 = 1e-5;

fn params(fish_count: usize, bounds: Bounds, seed: u64) -> SimulationParams {
    SimulationParams {
        fish_count,
        bounds,
        seed: Some(seed),
        enable_parallel: false,
        ..SimulationParams::default()
    }
}

fn assert_inside(boid: &Boid, bounds: Bounds) {
    let p = boid.position;
    assert!(p.is_finite(), "non-finite position {:?}", p);
    assert!(boid.velocity.is_finite(), "non-finite velocity {:?}", boid.velocity);
    assert!(p.x.abs() <= bounds.half_width(), "x out of bounds: {:?}", p);
    assert!(p.z.abs() <= bounds.half_depth(), "z out of bounds: {:?}", p);
    assert!(p.y <= bounds.half_height(), "above the ceiling: {:?}", p);
    assert!(p.y >= boid.config.min_height, "below the floor: {:?}", p);
}

fn random_positions(rng: &mut ChaCha8Rng, count: usize, bounds: Bounds) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-bounds.half_width()..bounds.half_width()),
                rng.gen_range(-bounds.half_height()..bounds.half_height()),
                rng.gen_range(-bounds.half_depth()..bounds.half_depth()),
            )
        })
        .collect()
}

#[test]
fn speed_stays_under_the_limit_and_fish_stay_inside() {
    let bounds = Bounds::new(120.0, 40.0, 80.0);
    let obstacles = [
        BoundingSphere::new(Vec3::new(0.0, 10.0, 0.0), 8.0),
        BoundingSphere::new(Vec3::new(30.0, 5.0, -20.0), 6.0),
    ];
    let mut sim = Simulation::new(params(300, bounds, 3)).unwrap();
    let max_speed = sim.params().boid.max_speed;

    for _ in 0..300 {
        sim.step(&obstacles, &SphereRaycaster);
        for boid in sim.boids() {
            assert!(boid.velocity.length() <= max_speed + EPS);
            assert_inside(boid, bounds);
        }
    }
}

#[test]
fn neighbor_queries_match_brute_force() {
    let bounds = Bounds::new(200.0, 60.0, 120.0);
    let radius = 15.0;
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for &count in &[50, 137, 500] {
        let positions = random_positions(&mut rng, count, bounds);
        let mut index = FlockIndex::new(bounds, radius);
        assert_eq!(index.rebuild(positions.iter().copied()), 0);

        let mut out = Vec::new();
        for (a, &pa) in positions.iter().enumerate() {
            index.query_neighbors(a, &mut out);
            let candidates: BTreeSet<usize> = out.iter().copied().collect();
            assert_eq!(candidates.len(), out.len(), "duplicate candidates for {}", a);

            // Exactly the box of half-size `radius`
            let in_box: BTreeSet<usize> = positions
                .iter()
                .enumerate()
                .filter(|&(b, pb)| b != a && (*pb - pa).abs().max_element() <= radius)
                .map(|(b, _)| b)
                .collect();
            assert_eq!(candidates, in_box, "box mismatch for agent {} of {}", a, count);

            // And after the distance filter, exactly the perception sphere
            let in_sphere: BTreeSet<usize> = positions
                .iter()
                .enumerate()
                .filter(|&(b, pb)| b != a && pb.distance(pa) < radius)
                .map(|(b, _)| b)
                .collect();
            let filtered: BTreeSet<usize> = candidates
                .into_iter()
                .filter(|&b| positions[b].distance(pa) < radius)
                .collect();
            assert_eq!(filtered, in_sphere);
        }
    }
}

#[test]
fn rebuilding_twice_gives_the_same_answers() {
    let bounds = Bounds::new(200.0, 60.0, 120.0);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let positions = random_positions(&mut rng, 250, bounds);

    let mut index = FlockIndex::new(bounds, 15.0);
    index.rebuild(positions.iter().copied());
    let mut first = Vec::new();
    let answers: Vec<Vec<usize>> = (0..positions.len())
        .map(|a| {
            index.query_neighbors(a, &mut first);
            first.clone()
        })
        .collect();

    index.rebuild(positions.iter().copied());
    let mut second = Vec::new();
    for (a, expected) in answers.iter().enumerate() {
        index.query_neighbors(a, &mut second);
        assert_eq!(&second, expected);
    }
}

#[test]
fn close_neighbors_push_apart() {
    let bounds = Bounds::new(400.0, 50.0, 180.0);
    let config = BoidConfig::default();
    // Slowest spawnable cruise, so cohesion stays under the force cap
    let cruise = config.max_speed * 0.2;

    let mut a = Boid::from_state(bounds, 0, config, Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, cruise);
    let mut b = Boid::from_state(bounds, 1, config, Vec3::new(3.0, 11.0, -2.0), Vec3::ZERO, cruise);
    assert!(a.position.distance(b.position) < config.collision_radius * 2.0);

    let (seen_by_a, seen_by_b) = (b.as_neighbor(), a.as_neighbor());
    a.flock(&[seen_by_a]);
    b.flock(&[seen_by_b]);
    assert!(a.acceleration.dot(a.position - b.position) > 0.0);
    assert!(b.acceleration.dot(b.position - a.position) > 0.0);
}

#[test]
fn two_fish_one_unit_apart_separate() {
    let bounds = Bounds::new(400.0, 50.0, 180.0);
    let config = BoidConfig::default();
    let cruise = config.max_speed * 0.2;

    let mut fish = [
        Boid::from_state(bounds, 0, config, Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, cruise),
        Boid::from_state(bounds, 1, config, Vec3::new(1.0, 10.0, 0.0), Vec3::ZERO, cruise),
    ];
    let before = fish[0].position.distance(fish[1].position);

    let snapshot = [fish[0].as_neighbor(), fish[1].as_neighbor()];
    fish[0].flock(&snapshot[1..]);
    fish[1].flock(&snapshot[..1]);
    for boid in &mut fish {
        boid.update();
    }

    assert!(fish[0].position.distance(fish[1].position) > before);
}

#[test]
fn avoidance_force_decays_without_obstacles() {
    let bounds = Bounds::new(400.0, 50.0, 180.0);
    let config = BoidConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut boid = Boid::from_state(
        bounds,
        0,
        config,
        Vec3::new(0.0, 10.0, 0.0),
        Vec3::new(0.1, 0.0, 0.0),
        config.max_speed,
    );
    let start = Vec3::new(0.0, 0.0, 0.05);
    boid.avoidance_force = start;

    // Frame 0 probes, frames 1..5 coast
    let mut expected = start;
    for frame in 0..10u64 {
        boid.frame_count = frame;
        let outcome = boid.avoid_obstacles(&[], &SphereRaycaster, &mut rng);
        if frame % 5 == 0 {
            assert_eq!(outcome, Avoidance::Clear);
            expected *= 0.9;
        } else {
            assert_eq!(outcome, Avoidance::Skipped);
            expected *= 0.98;
        }
        assert!((boid.avoidance_force - expected).length() < 1e-7);
    }
}

#[test]
fn lone_fish_runs_a_thousand_steps_cleanly() {
    let bounds = Bounds::new(400.0, 50.0, 180.0);
    let mut p = params(1, bounds, 2024);
    p.boid.max_force = 0.01;
    p.boid.max_speed = 0.3;
    let mut sim = Simulation::new(p).unwrap();

    for _ in 0..1000 {
        sim.step(&[], &SphereRaycaster);
        assert_inside(&sim.boids()[0], bounds);
    }
    assert!(sim.boids()[0].velocity.length() <= 0.3 + EPS);
    assert_eq!(sim.frame(), 1000);
}

#[test]
fn fish_turn_away_from_an_obstacle_ahead() {
    let bounds = Bounds::new(400.0, 50.0, 180.0);
    let config = BoidConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let mut boid = Boid::from_state(
        bounds,
        0,
        config,
        Vec3::new(0.0, 10.0, 0.0),
        Vec3::new(config.max_speed, 0.0, 0.0),
        config.max_speed,
    );
    let rock = [BoundingSphere::new(Vec3::new(8.0, 10.0, 0.0), 3.0)];

    let outcome = boid.avoid_obstacles(&rock, &SphereRaycaster, &mut rng);
    assert_ne!(outcome, Avoidance::Clear);
    assert_ne!(outcome, Avoidance::Skipped);
    assert!(boid.avoidance_force.length() > 0.0);
    // Never pushed further into the rock
    assert!(boid.avoidance_force.x < config.max_force * 5.0);
}

#[test]
fn config_file_round_trips_through_json() {
    let mut params = SimulationParams::default();
    params.fish_count = 64;
    params.boid.cohesion_weight = 0.5;
    params.seed = Some(5);

    let path = std::env::temp_dir().join(format!("shoal-config-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_string_pretty(&params).unwrap()).unwrap();
    let loaded = SimulationParams::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, params);
    let sim = Simulation::new(loaded).unwrap();
    assert_eq!(sim.boids().len(), 64);
    assert_eq!(sim.seed(), 5);
}
