use std::collections::{HashMap, HashSet};

use backdrop_core::delaunay::{triangulate, Site};
use backdrop_core::graph::extract_triangles;
use backdrop_core::{
    BoidConfig, Field, FieldConfig, Flock, MeshStrategy, Rect, Simulation, Vector2D,
};
use core::f32::consts::{PI, TAU};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Exactly `count` boids on a 1000×1000 surface.
fn boid_config(count: usize) -> BoidConfig {
    BoidConfig {
        density: count as f32 / 100.0,
        ..BoidConfig::default()
    }
}

/// Exactly `count` points on an unpadded 1000×1000 surface.
fn field_config(count: usize) -> FieldConfig {
    FieldConfig {
        density: count as f32 / 100.0,
        simulation_padding: 0.0,
        ..FieldConfig::default()
    }
}

#[test]
fn test_head_on_pair_turns_apart() {
    let mut flock = Flock::new(1000.0, 1000.0, boid_config(2), 11).unwrap();
    assert_eq!(flock.boids().len(), 2);
    {
        let boids = flock.boids_mut();
        boids[0].position = Vector2D::new(100.0, 100.0);
        boids[0].angle = 0.0;
        boids[1].position = Vector2D::new(110.0, 100.0);
        boids[1].angle = PI;
    }

    flock.update(None);

    let boids = flock.boids();
    let turn_a = boids[0].turning_history().last().unwrap();
    let turn_b = boids[1].turning_history().last().unwrap();
    assert!(turn_a != 0.0 && turn_b != 0.0);
    // sidestep in opposite directions
    assert!(boids[0].position.y > 100.0, "a: {:?}", boids[0].position);
    assert!(boids[1].position.y < 100.0, "b: {:?}", boids[1].position);
}

#[test]
fn test_flock_stays_on_torus() {
    let config = BoidConfig::swift();
    let mut flock = Flock::new(640.0, 480.0, config.clone(), 5).unwrap();
    let mut rng = StdRng::seed_from_u64(99);

    for tick in 0..400 {
        let pointer = (tick % 50 < 30)
            .then(|| Vector2D::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0)));
        flock.update(pointer);

        for boid in flock.boids() {
            assert!((0.0..640.0).contains(&boid.position.x), "{:?}", boid.position);
            assert!((0.0..480.0).contains(&boid.position.y), "{:?}", boid.position);
            assert!((0.0..TAU).contains(&boid.angle));
            assert!(boid.current_speed >= config.min_speed - 1e-4);
            assert!(boid.current_speed <= config.max_speed + 1e-4);
            assert!(boid.turning_history_len() <= config.turning_history_length);
        }
    }
}

#[test]
fn test_population_follows_resizes() {
    let mut flock = Flock::new(800.0, 600.0, BoidConfig::default(), 2).unwrap();
    let mut field = Field::new(800.0, 600.0, FieldConfig::default(), 2).unwrap();
    let mut seen_boids: HashSet<u64> = flock.boids().iter().map(|b| b.id).collect();
    let mut seen_points: HashSet<u64> = field.points().iter().map(|p| p.id).collect();

    for (width, height) in [(1920.0, 1080.0), (320.0, 240.0), (0.0, 0.0), (1280.0, 720.0)] {
        let issued_boids = seen_boids.len();
        Simulation::resize(&mut flock, width, height);
        Simulation::resize(&mut field, width, height);
        flock.tick(None);
        field.tick(None);

        assert_eq!(flock.population(), flock.target_count());
        assert_eq!(field.population(), field.target_count());

        for boid in flock.boids() {
            assert!(boid.position.x < width.max(f32::MIN_POSITIVE));
            // ids are never handed out twice
            if seen_boids.insert(boid.id) {
                assert!(boid.id >= issued_boids as u64);
            }
        }
        seen_points.extend(field.points().iter().map(|p| p.id));
    }

    let ids: Vec<u64> = field.points().iter().map(|p| p.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert!(seen_points.len() >= field.points().len());
}

#[test]
fn test_new_boids_avoid_exclusion_zone() {
    let config = BoidConfig::default();
    let mut flock = Flock::new(1000.0, 500.0, config.clone(), 17).unwrap();
    let initial = flock.boids().len() as u64;

    let zone = Rect::new(400.0, 400.0, 200.0, 100.0);
    flock.set_exclusion_zone(Some(zone));
    flock.resize(1000.0, 1000.0);

    let padded = zone.expand(config.text_avoid_distance);
    let spawned: Vec<_> = flock.boids().iter().filter(|b| b.id >= initial).collect();
    assert!(!spawned.is_empty());
    assert!(spawned.iter().all(|b| !padded.contains(b.position)));
}

#[test]
fn test_resting_point_starts_drifting() {
    let config = FieldConfig {
        wall_margin: 50.0,
        ..field_config(1)
    };
    let mut field = Field::new(1000.0, 1000.0, config.clone(), 3).unwrap();
    assert_eq!(field.points().len(), 1);
    {
        let point = &mut field.points_mut()[0];
        point.position = Vector2D::new(500.0, 500.0);
        point.velocity = Vector2D::zero();
    }

    field.update(None);

    let point = &field.points()[0];
    assert!(point.velocity.magnitude() > 0.0);
    let moved = point.position.distance(&Vector2D::new(500.0, 500.0));
    assert!(moved > 0.0 && moved <= config.max_speed);
    assert_eq!(point.offset, Vector2D::zero());
}

#[test]
fn test_field_graph_invariants() {
    let config = FieldConfig::interactive();
    let mut field = Field::new(900.0, 700.0, config.clone(), 8).unwrap();
    let max_degree = config.angular_sectors * config.max_per_sector;

    for tick in 0..60 {
        let pointer = (tick % 3 != 0).then(|| Vector2D::new(450.0, 350.0));
        field.update(pointer);

        let radius = field.connection_radius();
        let mut degree: HashMap<usize, usize> = HashMap::new();
        for connection in field.connections() {
            assert!(connection.a < connection.b);
            assert!(connection.distance > 0.0 && connection.distance < radius);
            *degree.entry(connection.a).or_default() += 1;
            *degree.entry(connection.b).or_default() += 1;
        }
        assert!(degree.values().all(|&d| d <= max_degree));
        assert!(field
            .connections()
            .windows(2)
            .all(|w| w[0].distance <= w[1].distance));

        let edges: HashSet<(usize, usize)> =
            field.connections().iter().map(|c| (c.a, c.b)).collect();
        for triangle in field.triangles() {
            let [a, b, c] = triangle.vertices;
            assert!(edges.contains(&(a, b)) && edges.contains(&(b, c)) && edges.contains(&(a, c)));
        }
        assert_eq!(
            field.triangles(),
            &extract_triangles(field.points().len(), field.connections())[..]
        );
    }
}

#[test]
fn test_square_with_centre_fans_around_centre() {
    let sites = [
        Site::new(0, 0.0, 0.0),
        Site::new(1, 1.0, 0.0),
        Site::new(2, 1.0, 1.0),
        Site::new(3, 0.0, 1.0),
        Site::new(4, 0.5, 0.5),
    ];
    let triangles = triangulate(&sites);

    assert_eq!(triangles.len(), 4);
    assert!(triangles.iter().all(|t| t.contains_vertex(4)));
    // each spoke triangle touches its two neighbours around the centre
    assert!(triangles.iter().all(|t| t.neighbors.len() == 2));
}

/// Circumcircle containment with a relative tolerance so near-cocircular
/// quadruples do not count as violations.
fn strictly_inside(a: Vector2D, b: Vector2D, c: Vector2D, p: Vector2D) -> bool {
    let (ax, ay, bx, by, cx, cy) = (
        a.x as f64, a.y as f64, b.x as f64, b.y as f64, c.x as f64, c.y as f64,
    );
    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < 1e-10 {
        return false;
    }
    let a_sq = ax * ax + ay * ay;
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let ux = (a_sq * (by - cy) + b_sq * (cy - ay) + c_sq * (ay - by)) / d;
    let uy = (a_sq * (cx - bx) + b_sq * (ax - cx) + c_sq * (bx - ax)) / d;
    let r_sq = (ax - ux).powi(2) + (ay - uy).powi(2);
    let d_sq = (p.x as f64 - ux).powi(2) + (p.y as f64 - uy).powi(2);
    d_sq < r_sq * (1.0 - 1e-9)
}

#[test]
fn test_delaunay_empty_circumcircles() {
    let mut rng = StdRng::seed_from_u64(2024);
    let sites: Vec<Site> = (0..80)
        .map(|i| Site::new(i, rng.gen_range(0.0..1000.0), rng.gen_range(0.0..800.0)))
        .collect();
    let by_id: HashMap<i64, Vector2D> = sites.iter().map(|s| (s.id, s.position)).collect();

    let triangles = triangulate(&sites);
    assert!(!triangles.is_empty());
    assert!(triangles.len() <= 2 * sites.len() - 5);

    for triangle in &triangles {
        let [a, b, c] = triangle.vertices.map(|id| by_id[&id]);
        for site in &sites {
            if triangle.contains_vertex(site.id) {
                continue;
            }
            assert!(
                !strictly_inside(a, b, c, site.position),
                "site {} inside circumcircle of {:?}",
                site.id,
                triangle.vertices
            );
        }
    }
}

/// Ids of the convex hull vertices in counter-clockwise order (monotone
/// chain, collinear boundary points dropped).
fn convex_hull(sites: &[Site]) -> Vec<i64> {
    let mut sorted: Vec<&Site> = sites.iter().collect();
    sorted.sort_by(|a, b| {
        a.position
            .x
            .total_cmp(&b.position.x)
            .then(a.position.y.total_cmp(&b.position.y))
    });
    let cross = |o: &Site, a: &Site, b: &Site| {
        let (ox, oy) = (o.position.x as f64, o.position.y as f64);
        (a.position.x as f64 - ox) * (b.position.y as f64 - oy)
            - (a.position.y as f64 - oy) * (b.position.x as f64 - ox)
    };

    let mut lower: Vec<&Site> = Vec::new();
    for &site in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], site) <= 0.0 {
            lower.pop();
        }
        lower.push(site);
    }
    let mut upper: Vec<&Site> = Vec::new();
    for &site in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], site) <= 0.0 {
            upper.pop();
        }
        upper.push(site);
    }
    lower.pop();
    upper.pop();
    lower.into_iter().chain(upper).map(|s| s.id).collect()
}

#[test]
fn test_delaunay_interior_edges_shared_twice() {
    for (seed, count) in [(7, 60), (8, 120), (9, 200)] {
        let mut rng = StdRng::seed_from_u64(seed);
        let sites: Vec<Site> = (0..count)
            .map(|i| Site::new(i, rng.gen_range(0.0..500.0), rng.gen_range(0.0..500.0)))
            .collect();
        let triangles = triangulate(&sites);

        let mut edge_uses: HashMap<(i64, i64), usize> = HashMap::new();
        for triangle in &triangles {
            let [a, b, c] = triangle.vertices;
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edge_uses.entry((u.min(v), u.max(v))).or_default() += 1;
            }
        }

        let hull = convex_hull(&sites);
        let hull_edges: HashSet<(i64, i64)> = hull
            .iter()
            .zip(hull.iter().cycle().skip(1))
            .map(|(&u, &v)| (u.min(v), u.max(v)))
            .collect();

        for edge in &hull_edges {
            assert_eq!(edge_uses.get(edge), Some(&1), "seed {seed}: hull edge {edge:?}");
        }
        for (edge, &uses) in &edge_uses {
            if !hull_edges.contains(edge) {
                assert_eq!(uses, 2, "seed {seed}: interior edge {edge:?}");
            }
        }
        // Euler: 2n - 2 - h triangles for points in general position
        let expected = 2 * sites.len() - 2 - hull.len();
        assert_eq!(triangles.len(), expected, "seed {seed}");

        for (i, triangle) in triangles.iter().enumerate() {
            assert!(triangle.neighbors.len() <= 3);
            for &j in &triangle.neighbors {
                assert!(triangles[j].neighbors.contains(&i));
            }
        }
    }
}

#[test]
fn test_delaunay_mesh_strategy_respects_radius() {
    let config = FieldConfig {
        mesh_strategy: MeshStrategy::Delaunay,
        ..field_config(150)
    };
    let mut field = Field::new(1000.0, 1000.0, config, 12).unwrap();
    for _ in 0..10 {
        field.update(Some(Vector2D::new(500.0, 500.0)));
    }

    let radius = field.connection_radius();
    assert!(!field.triangles().is_empty());
    for triangle in field.triangles() {
        let [a, b, c] = triangle.vertices;
        assert!(a < b && b < c);
        let [pa, pb, pc] = [a, b, c].map(|i| field.points()[i].position);
        assert!(pa.distance(&pb) <= radius);
        assert!(pb.distance(&pc) <= radius);
        assert!(pc.distance(&pa) <= radius);
    }
}
