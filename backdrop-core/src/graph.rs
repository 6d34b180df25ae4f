//! Per-frame proximity graph over field points and the triangles it implies.
//!
//! Everything here is a pure function of the current positions; nothing
//! about edges survives from one frame to the next.

use std::collections::BTreeSet;

use core::f32::consts::{PI, TAU};

use crate::angle::{angle_difference, normalize_angle};
use crate::vector::Vector2D;

/// Limits on how connections may fan out around a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FairnessRules {
    pub angular_sectors: usize,
    pub max_per_sector: usize,
    pub angular_proximity_threshold: f32,
}

impl FairnessRules {
    /// Most connections any single point can end up with.
    pub fn max_degree(&self) -> usize {
        self.angular_sectors * self.max_per_sector
    }

    fn sector_of(&self, angle: f32) -> usize {
        let sectors = self.angular_sectors.max(1);
        ((angle / TAU * sectors as f32) as usize).min(sectors - 1)
    }
}

/// An accepted edge between two points, by index into the frame's point
/// slice (`a < b`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
}

/// A 3-cycle of the connection graph, vertices sorted ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshTriangle {
    pub vertices: [usize; 3],
}

struct Candidate {
    a: usize,
    b: usize,
    distance: f32,
    /// Direction of the edge seen from `a`, in `[0, 2π)`.
    angle_from_a: f32,
}

impl Candidate {
    fn angle_from_b(&self) -> f32 {
        normalize_angle(self.angle_from_a + PI)
    }
}

/// Per-point bookkeeping for the greedy acceptance pass.
struct Fan {
    sector_counts: Vec<usize>,
    angles: Vec<f32>,
}

impl Fan {
    fn new(sectors: usize) -> Self {
        Self {
            sector_counts: vec![0; sectors],
            angles: Vec::new(),
        }
    }

    fn admits(&self, angle: f32, rules: &FairnessRules) -> bool {
        self.sector_counts[rules.sector_of(angle)] < rules.max_per_sector
            && self
                .angles
                .iter()
                .all(|&taken| angle_difference(taken, angle).abs() >= rules.angular_proximity_threshold)
    }

    fn accept(&mut self, angle: f32, rules: &FairnessRules) {
        self.sector_counts[rules.sector_of(angle)] += 1;
        self.angles.push(angle);
    }
}

/// Connect points closer than `radius`, shortest first, keeping each
/// point's connections spread around it.
///
/// A candidate is rejected for an endpoint when that endpoint's sector for
/// the edge direction is full, or when it already has a connection within
/// `angular_proximity_threshold` of the direction. Both endpoints must
/// accept. Coincident points are never connected.
pub fn derive_connections(
    positions: &[Vector2D],
    radius: f32,
    rules: &FairnessRules,
) -> Vec<Connection> {
    let radius_sq = radius * radius;
    let mut candidates = Vec::new();

    for a in 0..positions.len() {
        for b in (a + 1)..positions.len() {
            let delta = positions[b] - positions[a];
            let dist_sq = delta.magnitude_squared();
            if dist_sq > 0.0 && dist_sq < radius_sq {
                candidates.push(Candidate {
                    a,
                    b,
                    distance: dist_sq.sqrt(),
                    angle_from_a: normalize_angle(delta.angle()),
                });
            }
        }
    }

    // stable sort keeps index order between equal distances
    candidates.sort_by(|x, y| x.distance.total_cmp(&y.distance));

    let sectors = rules.angular_sectors.max(1);
    let mut fans: Vec<Fan> = (0..positions.len()).map(|_| Fan::new(sectors)).collect();
    let mut accepted = Vec::new();

    for candidate in &candidates {
        let from_a = candidate.angle_from_a;
        let from_b = candidate.angle_from_b();
        if fans[candidate.a].admits(from_a, rules) && fans[candidate.b].admits(from_b, rules) {
            fans[candidate.a].accept(from_a, rules);
            fans[candidate.b].accept(from_b, rules);
            accepted.push(Connection {
                a: candidate.a,
                b: candidate.b,
                distance: candidate.distance,
            });
        }
    }

    accepted
}

/// Every 3-cycle among `connections`, each reported once.
///
/// Purely combinatorial: long thin triangles count as much as fat ones.
pub fn extract_triangles(point_count: usize, connections: &[Connection]) -> Vec<MeshTriangle> {
    let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); point_count];
    for connection in connections {
        if connection.a == connection.b
            || connection.a >= point_count
            || connection.b >= point_count
        {
            continue;
        }
        adjacency[connection.a].insert(connection.b);
        adjacency[connection.b].insert(connection.a);
    }

    let mut seen = BTreeSet::new();
    for (i, neighbours) in adjacency.iter().enumerate() {
        for &j in neighbours {
            for &k in &adjacency[j] {
                if k != i && neighbours.contains(&k) {
                    let mut key = [i, j, k];
                    key.sort_unstable();
                    seen.insert(MeshTriangle { vertices: key });
                }
            }
        }
    }

    seen.into_iter().collect()
}
