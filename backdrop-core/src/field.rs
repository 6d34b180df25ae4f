//! Floating-points field: wandering particles on a padded, non-wrapping
//! plane, joined every frame by a proximity graph and meshed into triangles.

use core::f32::consts::{PI, TAU};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::angle::normalize_angle;
use crate::config::{ConfigError, FieldConfig, MeshStrategy, RepulsionMode};
use crate::delaunay::{self, Site};
use crate::graph::{self, Connection, FairnessRules, MeshTriangle};
use crate::population::{self, IdAllocator, PopulationChange, Rect};
use crate::vector::Vector2D;

/// A single field particle
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: u64,
    pub position: Vector2D,
    /// Where the point was spawned.
    pub base: Vector2D,
    pub velocity: Vector2D,
    pub wander_angle: f32,
    /// Per-point multiplier on the wander jitter, in `[0.5, 1.5)`.
    pub wander_speed: f32,
    /// Draw-time distortion offset; never fed back into the physics.
    pub offset: Vector2D,
}

impl Point {
    pub fn new(id: u64, position: Vector2D, wander_angle: f32, wander_speed: f32) -> Self {
        Self {
            id,
            position,
            base: position,
            velocity: Vector2D::zero(),
            wander_angle,
            wander_speed,
            offset: Vector2D::zero(),
        }
    }

    /// Where the point should be drawn this frame.
    pub fn render_position(&self) -> Vector2D {
        self.position + self.offset
    }

    fn wander(&mut self, jitter: f32, config: &FieldConfig) {
        self.wander_angle =
            normalize_angle(self.wander_angle + jitter * config.wander_rate * self.wander_speed);
        self.velocity += Vector2D::from_angle(self.wander_angle) * config.wander_force;
    }

    fn integrate(&mut self, config: &FieldConfig) {
        self.velocity = self.velocity.limit(config.max_speed);
        self.velocity *= config.damping;
        self.position += self.velocity;
    }

    fn repel_from_walls(&mut self, bounds: &Rect, config: &FieldConfig) {
        let margin = config.wall_margin;
        if margin <= 0.0 {
            return;
        }
        let push = |distance: f32| (1.0 - distance / margin) * config.wall_strength;

        let left = self.position.x - bounds.min.x;
        if left < margin {
            self.velocity.x += push(left);
        }
        let right = bounds.max.x - self.position.x;
        if right < margin {
            self.velocity.x -= push(right);
        }
        let top = self.position.y - bounds.min.y;
        if top < margin {
            self.velocity.y += push(top);
        }
        let bottom = bounds.max.y - self.position.y;
        if bottom < margin {
            self.velocity.y -= push(bottom);
        }
    }

    /// Positional nudge toward the pointer, zero at both ends of the
    /// attraction band and strongest in its middle.
    fn attract_to(&mut self, pointer: Vector2D, config: &FieldConfig) {
        let to_pointer = pointer - self.position;
        let dist = to_pointer.magnitude();
        let (near, far) = (
            config.mouse_attraction_min_radius,
            config.mouse_attraction_radius,
        );
        if dist <= 0.0 || dist < near || dist > far || far <= near {
            return;
        }
        let t = (dist - near) / (far - near);
        let bump = (PI * t).sin().powi(2);
        self.position += to_pointer / dist * (bump * config.mouse_attraction_strength);
    }

    fn distort(&mut self, pointer: Option<Vector2D>, config: &FieldConfig) {
        self.offset *= config.distortion_decay;
        if let Some(pointer) = pointer {
            let to_pointer = pointer - self.position;
            let dist = to_pointer.magnitude();
            let radius = config.distortion_radius;
            if dist > 0.0 && dist < radius {
                self.offset +=
                    to_pointer / dist * ((1.0 - dist / radius) * config.distortion_strength);
            }
        }
        self.offset = self.offset.limit(config.distortion_max_radius);
    }
}

/// Surface expanded by `padding` (a fraction of each extent) on every side.
pub fn padded_bounds(width: f32, height: f32, padding: f32) -> Rect {
    let pad_x = width * padding;
    let pad_y = height * padding;
    Rect {
        min: Vector2D::new(-pad_x, -pad_y),
        max: Vector2D::new(width + pad_x, height + pad_y),
    }
}

/// `sqrt(area / count) * factor`: a connection radius that follows the
/// mean spacing between points.
pub fn adaptive_connection_radius(area: f32, count: usize, factor: f32) -> f32 {
    if count == 0 || area <= 0.0 {
        0.0
    } else {
        (area / count as f32).sqrt() * factor
    }
}

fn spawn_point(rng: &mut StdRng, ids: &mut IdAllocator, bounds: &Rect) -> Point {
    let x = bounds.min.x + rng.gen::<f32>() * bounds.width().max(0.0);
    let y = bounds.min.y + rng.gen::<f32>() * bounds.height().max(0.0);
    let wander_angle = rng.gen_range(0.0..TAU);
    let wander_speed = rng.gen_range(0.5..1.5);
    Point::new(ids.next_id(), Vector2D::new(x, y), wander_angle, wander_speed)
}

/// The particle field engine.
#[derive(Debug, Clone)]
pub struct Field {
    points: Vec<Point>,
    connections: Vec<Connection>,
    triangles: Vec<MeshTriangle>,
    config: FieldConfig,
    width: f32,
    height: f32,
    connection_radius: f32,
    paused: bool,
    ids: IdAllocator,
    rng: StdRng,
}

impl Field {
    pub fn new(width: f32, height: f32, config: FieldConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(width, height, config, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(width: f32, height: f32, config: FieldConfig) -> Result<Self, ConfigError> {
        Self::with_rng(width, height, config, StdRng::from_entropy())
    }

    fn with_rng(
        width: f32,
        height: f32,
        config: FieldConfig,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut field = Self {
            points: Vec::new(),
            connections: Vec::new(),
            triangles: Vec::new(),
            config,
            width: width.max(0.0),
            height: height.max(0.0),
            connection_radius: 0.0,
            paused: false,
            ids: IdAllocator::new(),
            rng,
        };
        field.reconcile_population();
        field.refresh_mesh();
        log::debug!(
            "field initialised on {}x{} with {} points, connection radius {:.1}",
            field.width,
            field.height,
            field.points.len(),
            field.connection_radius
        );
        Ok(field)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Mutable access to the points; the population size is engine-owned.
    /// Call [`Field::refresh_mesh`] after moving points by hand.
    pub fn points_mut(&mut self) -> &mut [Point] {
        &mut self.points
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn triangles(&self) -> &[MeshTriangle] {
        &self.triangles
    }

    pub fn connection_radius(&self) -> f32 {
        self.connection_radius
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FieldConfig) -> Result<(), ConfigError> {
        if let Err(err) = config.validate() {
            log::warn!("rejected field config: {err}");
            return Err(err);
        }
        self.config = config;
        self.reconcile_population();
        self.refresh_mesh();
        Ok(())
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// The simulated area: the surface plus the padding margin.
    pub fn bounds(&self) -> Rect {
        padded_bounds(self.width, self.height, self.config.simulation_padding)
    }

    pub fn target_count(&self) -> usize {
        population::target_count(self.bounds().area(), self.config.density)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        let change = self.reconcile_population();
        self.refresh_mesh();
        log::debug!(
            "field resized to {}x{} ({:?}, {} points, connection radius {:.1})",
            self.width,
            self.height,
            change,
            self.points.len(),
            self.connection_radius
        );
    }

    /// Spawn or truncate points to the density target and re-derive the
    /// connection radius from the new spacing.
    pub fn reconcile_population(&mut self) -> PopulationChange {
        let bounds = self.bounds();
        let target = self.target_count();
        let Self {
            points, ids, rng, ..
        } = self;
        let change = population::reconcile(points, target, || spawn_point(rng, ids, &bounds));

        self.connection_radius = adaptive_connection_radius(
            bounds.area(),
            target,
            self.config.connection_radius_factor,
        );
        change
    }

    /// Advance every point by one tick and rebuild the connection graph and
    /// mesh. `pointer` is `None` while the pointer is inactive.
    pub fn update(&mut self, pointer: Option<Vector2D>) {
        if self.paused {
            return;
        }
        self.reconcile_population();
        self.apply_pair_forces(pointer);

        let bounds = self.bounds();
        let config = &self.config;
        for point in self.points.iter_mut() {
            let jitter = self.rng.gen::<f32>() - 0.5;
            point.wander(jitter, config);
            point.integrate(config);
            point.repel_from_walls(&bounds, config);

            if config.pointer_attraction {
                if let Some(pointer) = pointer {
                    point.attract_to(pointer, config);
                }
            }
            if config.distortion {
                point.distort(pointer, config);
            } else {
                point.distort(None, config);
            }
        }

        self.refresh_mesh();
        log::trace!(
            "field tick: {} points, {} connections, {} triangles",
            self.points.len(),
            self.connections.len(),
            self.triangles.len()
        );
    }

    /// Pairwise repulsion, plus clustering of pairs near the pointer.
    fn apply_pair_forces(&mut self, pointer: Option<Vector2D>) {
        let config = &self.config;
        let points = &mut self.points;
        let repulsion_radius = config.repulsion_radius;
        let pair_pointer = pointer.filter(|_| config.pointer_pairs);

        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let delta = points[j].position - points[i].position;
                let dist = delta.magnitude();

                if dist > 0.0 && dist < repulsion_radius {
                    let mut falloff = 1.0 - dist / repulsion_radius;
                    if config.repulsion_squared {
                        falloff *= falloff;
                    }
                    let magnitude = (falloff * config.repulsion_strength).min(config.repulsion_max_push);
                    let push = delta / dist * magnitude;
                    match config.repulsion_mode {
                        RepulsionMode::Position => {
                            points[i].position -= push;
                            points[j].position += push;
                        }
                        RepulsionMode::Velocity => {
                            points[i].velocity -= push;
                            points[j].velocity += push;
                        }
                    }
                }

                if let Some(target) = pair_pointer {
                    let radius = config.pointer_pair_radius;
                    let from_i = points[i].position.distance(&target);
                    let from_j = points[j].position.distance(&target);
                    if radius > 0.0 && from_i < radius && from_j < radius {
                        let proximity = 1.0 - from_i / radius;
                        let toward = points[j].position - points[i].position;
                        points[i].position += toward * (proximity * config.pointer_pair_strength);
                    }
                }
            }
        }
    }

    /// Rebuild connections and triangles from the current physical
    /// positions (distortion offsets are ignored).
    pub fn refresh_mesh(&mut self) {
        let positions: Vec<Vector2D> = self.points.iter().map(|p| p.position).collect();
        let rules = FairnessRules {
            angular_sectors: self.config.angular_sectors,
            max_per_sector: self.config.max_per_sector,
            angular_proximity_threshold: self.config.angular_proximity_threshold,
        };
        self.connections = graph::derive_connections(&positions, self.connection_radius, &rules);
        self.triangles = match self.config.mesh_strategy {
            MeshStrategy::ConnectionCycles => {
                graph::extract_triangles(self.points.len(), &self.connections)
            }
            MeshStrategy::Delaunay => self.delaunay_triangles(),
        };
    }

    fn delaunay_triangles(&self) -> Vec<MeshTriangle> {
        let sites: Vec<Site> = self
            .points
            .iter()
            .map(|p| Site {
                id: p.id as i64,
                position: p.position,
            })
            .collect();
        let max_edge = self.connection_radius;

        let mut triangles: Vec<MeshTriangle> = delaunay::triangulate(&sites)
            .into_iter()
            .filter_map(|triangle| {
                // ids grow along the collection, so the index is a binary search away
                let mut vertices = [0usize; 3];
                for (slot, id) in vertices.iter_mut().zip(triangle.vertices) {
                    *slot = self
                        .points
                        .binary_search_by_key(&id, |p| p.id as i64)
                        .ok()?;
                }
                let [a, b, c] = vertices.map(|i| self.points[i].position);
                let short_edges =
                    a.distance(&b) <= max_edge && b.distance(&c) <= max_edge && c.distance(&a) <= max_edge;
                vertices.sort_unstable();
                short_edges.then_some(MeshTriangle { vertices })
            })
            .collect();
        triangles.sort_unstable();
        triangles
    }
}
