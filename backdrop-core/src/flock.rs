//! Boid flock on a torus.
//!
//! Each boid only steers by rotating its heading: cohesion toward the local
//! centre of mass, optional attraction to the pointer, and separation or
//! alignment against its single nearest neighbour. Speed drops while a boid
//! keeps turning the same way, which reads as banking.

use heapless::Deque;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::angle::{angle_difference, normalize_angle};
use crate::config::{BoidConfig, ConfigError, TURNING_HISTORY_CAPACITY};
use crate::population::{self, IdAllocator, PopulationChange, Rect};
use crate::vector::{toroidal_delta, Vector2D};

/// A single boid entity
#[derive(Debug, Clone)]
pub struct Boid {
    pub id: u64,
    pub position: Vector2D,
    /// Heading in radians, kept in `[0, 2π)`.
    pub angle: f32,
    pub current_speed: f32,
    turning_history: Deque<f32, TURNING_HISTORY_CAPACITY>,
}

impl Boid {
    pub fn new(id: u64, position: Vector2D, angle: f32, speed: f32) -> Self {
        Self {
            id,
            position,
            angle: normalize_angle(angle),
            current_speed: speed,
            turning_history: Deque::new(),
        }
    }

    pub fn heading_vector(&self) -> Vector2D {
        Vector2D::from_angle(self.angle)
    }

    /// Applied heading changes of the most recent frames, oldest first.
    pub fn turning_history(&self) -> impl Iterator<Item = f32> + '_ {
        self.turning_history.iter().copied()
    }

    pub fn turning_history_len(&self) -> usize {
        self.turning_history.len()
    }

    fn record_turn(&mut self, delta: f32, limit: usize) {
        let limit = limit.clamp(1, TURNING_HISTORY_CAPACITY);
        while self.turning_history.len() >= limit {
            self.turning_history.pop_front();
        }
        let pushed = self.turning_history.push_back(delta);
        debug_assert!(pushed.is_ok(), "turning history full after eviction");
    }

    /// Speed the boid wants given how it has been turning lately.
    fn target_speed(&self, config: &BoidConfig) -> f32 {
        let samples = self.turning_history.len();
        if samples < 3 {
            return config.max_speed;
        }

        let mean_turn =
            self.turning_history.iter().map(|d| d.abs()).sum::<f32>() / samples as f32;
        let banking_left = self.turning_history.iter().all(|&d| d > 0.0);
        let banking_right = self.turning_history.iter().all(|&d| d < 0.0);

        if (banking_left || banking_right) && mean_turn > config.turn_noise_floor {
            let intensity = (mean_turn / config.turn_intensity_reference).min(1.0);
            config.max_speed - (config.max_speed - config.min_speed) * intensity
        } else {
            config.max_speed
        }
    }

    /// Apply this frame's steering result: rotate, log the turn, adapt speed.
    fn steer(&mut self, turn: Option<f32>, config: &BoidConfig) {
        if let Some(delta) = turn {
            self.angle = normalize_angle(self.angle + delta);
        }
        self.record_turn(turn.unwrap_or(0.0), config.turning_history_length);

        let target = self.target_speed(config);
        self.current_speed += (target - self.current_speed) * config.speed_smoothing;
    }

    fn advance(&mut self, width: f32, height: f32) {
        self.position += self.heading_vector() * self.current_speed;
        self.wrap_edges(width, height);
    }

    /// Fold the position back onto the surface, one correction per axis.
    pub fn wrap_edges(&mut self, width: f32, height: f32) {
        self.position.x = wrap_coordinate(self.position.x, width);
        self.position.y = wrap_coordinate(self.position.y, height);
    }
}

/// Single wrap correction; only falls back to a full modulo when the value
/// was more than one extent outside (e.g. after a resize).
fn wrap_coordinate(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return 0.0;
    }
    let wrapped = if value < 0.0 {
        value + extent
    } else if value >= extent {
        value - extent
    } else {
        value
    };
    if (0.0..extent).contains(&wrapped) {
        wrapped
    } else {
        let folded = wrapped.rem_euclid(extent);
        if folded >= extent {
            0.0
        } else {
            folded
        }
    }
}

fn random_in(rng: &mut StdRng, extent: f32) -> f32 {
    if extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}

fn spawn_boid(
    rng: &mut StdRng,
    ids: &mut IdAllocator,
    width: f32,
    height: f32,
    avoid: Option<Rect>,
    config: &BoidConfig,
) -> Boid {
    let mut candidate = Vector2D::new(random_in(rng, width), random_in(rng, height));
    for _ in 1..config.spawn_attempts {
        if !avoid.is_some_and(|zone| zone.contains(candidate)) {
            break;
        }
        candidate = Vector2D::new(random_in(rng, width), random_in(rng, height));
    }

    let angle = rng.gen_range(0.0..core::f32::consts::TAU);
    Boid::new(ids.next_id(), candidate, angle, config.max_speed)
}

/// The flock engine: owns the boids and advances them one tick at a time.
#[derive(Debug, Clone)]
pub struct Flock {
    boids: Vec<Boid>,
    config: BoidConfig,
    width: f32,
    height: f32,
    exclusion_zone: Option<Rect>,
    paused: bool,
    ids: IdAllocator,
    rng: StdRng,
}

impl Flock {
    /// Create a flock for a `width` × `height` surface, populated to the
    /// density target.
    pub fn new(width: f32, height: f32, config: BoidConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(width, height, config, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(width: f32, height: f32, config: BoidConfig) -> Result<Self, ConfigError> {
        Self::with_rng(width, height, config, StdRng::from_entropy())
    }

    fn with_rng(
        width: f32,
        height: f32,
        config: BoidConfig,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut flock = Self {
            boids: Vec::new(),
            config,
            width: width.max(0.0),
            height: height.max(0.0),
            exclusion_zone: None,
            paused: false,
            ids: IdAllocator::new(),
            rng,
        };
        flock.reconcile_population();
        log::debug!(
            "flock initialised on {}x{} with {} boids",
            flock.width,
            flock.height,
            flock.boids.len()
        );
        Ok(flock)
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    /// Mutable access to the boids; the population size is engine-owned.
    pub fn boids_mut(&mut self) -> &mut [Boid] {
        &mut self.boids
    }

    pub fn config(&self) -> &BoidConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: BoidConfig) -> Result<(), ConfigError> {
        if let Err(err) = config.validate() {
            log::warn!("rejected flock config: {err}");
            return Err(err);
        }
        self.config = config;
        self.reconcile_population();
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

    /// Reserve a rectangle (usually the hero text) that new boids avoid.
    pub fn set_exclusion_zone(&mut self, zone: Option<Rect>) {
        self.exclusion_zone = zone;
    }

    pub fn exclusion_zone(&self) -> Option<Rect> {
        self.exclusion_zone
    }

    pub fn target_count(&self) -> usize {
        population::target_count(self.width * self.height, self.config.density)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        for boid in &mut self.boids {
            boid.wrap_edges(self.width, self.height);
        }
        let change = self.reconcile_population();
        log::debug!(
            "flock resized to {}x{} ({:?}, {} boids)",
            self.width,
            self.height,
            change,
            self.boids.len()
        );
    }

    /// Spawn or truncate boids until the count matches the density target.
    /// Shrinking drops boids from the tail of the collection.
    pub fn reconcile_population(&mut self) -> PopulationChange {
        let target = self.target_count();
        let Self {
            boids,
            ids,
            rng,
            config,
            width,
            height,
            exclusion_zone,
            ..
        } = self;
        let avoid = exclusion_zone.map(|zone| zone.expand(config.text_avoid_distance));
        population::reconcile(boids, target, || {
            spawn_boid(rng, ids, *width, *height, avoid, config)
        })
    }

    /// Advance every boid by one tick. `pointer` is `None` while the pointer
    /// is inactive.
    ///
    /// Boids are updated in place in collection order, so later boids already
    /// see the moved positions and headings of earlier ones.
    pub fn update(&mut self, pointer: Option<Vector2D>) {
        if self.paused {
            return;
        }
        self.reconcile_population();

        for i in 0..self.boids.len() {
            self.update_boid(i, pointer);
        }
        log::trace!("flock tick: {} boids", self.boids.len());
    }

    fn update_boid(&mut self, index: usize, pointer: Option<Vector2D>) {
        self.boids[index].wrap_edges(self.width, self.height);
        let turn = self.steering(index, pointer);

        let boid = &mut self.boids[index];
        boid.steer(turn, &self.config);
        boid.advance(self.width, self.height);
    }

    /// Total heading change for boid `index`, or `None` when no behaviour
    /// fired this frame.
    fn steering(&self, index: usize, pointer: Option<Vector2D>) -> Option<f32> {
        let config = &self.config;
        let boid = &self.boids[index];
        let cohesion_sq = config.cohesion_radius * config.cohesion_radius;

        let mut center_sum = Vector2D::zero();
        let mut center_count = 0usize;
        let mut nearest: Option<(usize, f32, Vector2D)> = None;

        for (j, other) in self.boids.iter().enumerate() {
            if j == index {
                continue;
            }
            let delta = toroidal_delta(boid.position, other.position, self.width, self.height);
            let dist_sq = delta.magnitude_squared();

            if dist_sq < cohesion_sq {
                center_sum += boid.position + delta;
                center_count += 1;
            }
            if nearest.map_or(true, |(_, best, _)| dist_sq < best) {
                nearest = Some((j, dist_sq, delta));
            }
        }

        let mut turn = 0.0;
        let mut fired = false;

        if center_count > 0 {
            let to_center = center_sum / center_count as f32 - boid.position;
            if to_center.magnitude_squared() > 0.0 {
                let diff = angle_difference(boid.angle, to_center.angle());
                if diff.abs() > config.min_turn_angle {
                    turn += diff * config.cohesion_strength;
                    fired = true;
                }
            }
        }

        if let Some(target) = pointer {
            let to_pointer = target - boid.position;
            let dist_sq = to_pointer.magnitude_squared();
            let radius = config.mouse_attraction_radius;
            if dist_sq > 0.0 && dist_sq < radius * radius {
                let diff = angle_difference(boid.angle, to_pointer.angle());
                if diff.abs() > config.min_turn_angle {
                    turn += diff * config.mouse_attraction_strength;
                    fired = true;
                }
            }
        }

        if let Some((j, dist_sq, delta)) = nearest {
            let bearing = angle_difference(boid.angle, delta.angle());
            if dist_sq > 0.0 && bearing.abs() < config.looking_angle {
                let dist = dist_sq.sqrt();
                if dist < config.separation_distance {
                    // neighbour on the left (positive bearing) → turn right
                    let step = config.angle_interpolate * config.separation_strength;
                    turn += if bearing > 0.0 { -step } else { step };
                    fired = true;
                } else if dist < config.alignment_radius {
                    let diff = angle_difference(boid.angle, self.boids[j].angle);
                    if diff != 0.0 {
                        let step = config.angle_interpolate * config.alignment_strength;
                        turn += if diff > 0.0 { step } else { -step };
                        fired = true;
                    }
                }
            }
        }

        fired.then_some(turn)
    }
}
