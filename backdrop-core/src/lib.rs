//! Simulation core for animated website backdrops.
//!
//! Two independent engines share the vector and population plumbing:
//!
//! - [`Flock`]: boids on a torus, steering by heading angle toward
//!   cohesion, the pointer and their nearest neighbour.
//! - [`Field`]: wandering points on a padded plane, joined every frame by
//!   an angular-fairness proximity graph and meshed into triangles.
//!
//! [`delaunay`] provides the alternative incremental triangulator used by
//! [`MeshStrategy::Delaunay`]. Rendering is left to the host: every engine
//! exposes plain data for it to draw.

pub mod angle;
pub mod config;
pub mod delaunay;
pub mod field;
pub mod flock;
pub mod graph;
pub mod population;
pub mod vector;

pub use angle::{angle_difference, normalize_angle};
pub use config::{
    BoidConfig, ConfigError, FieldConfig, MeshStrategy, RepulsionMode, TURNING_HISTORY_CAPACITY,
};
pub use delaunay::{triangulate, DelaunayTriangle, Site};
pub use field::{Field, Point};
pub use flock::{Boid, Flock};
pub use graph::{Connection, FairnessRules, MeshTriangle};
pub use population::{PopulationChange, Rect};
pub use vector::Vector2D;

/// Frame-driven engine lifecycle shared by [`Flock`] and [`Field`].
///
/// Hosts drive any engine the same way: resize on surface changes, feed
/// the pointer (or `None` once it leaves) to `tick`, and pause while the
/// backdrop is hidden.
pub trait Simulation {
    fn tick(&mut self, pointer: Option<Vector2D>);
    fn resize(&mut self, width: f32, height: f32);
    fn set_paused(&mut self, paused: bool);
    fn is_paused(&self) -> bool;
    /// Number of live entities.
    fn population(&self) -> usize;
}

impl Simulation for Flock {
    fn tick(&mut self, pointer: Option<Vector2D>) {
        self.update(pointer);
    }

    fn resize(&mut self, width: f32, height: f32) {
        Flock::resize(self, width, height);
    }

    fn set_paused(&mut self, paused: bool) {
        Flock::set_paused(self, paused);
    }

    fn is_paused(&self) -> bool {
        Flock::is_paused(self)
    }

    fn population(&self) -> usize {
        self.boids().len()
    }
}

impl Simulation for Field {
    fn tick(&mut self, pointer: Option<Vector2D>) {
        self.update(pointer);
    }

    fn resize(&mut self, width: f32, height: f32) {
        Field::resize(self, width, height);
    }

    fn set_paused(&mut self, paused: bool) {
        Field::set_paused(self, paused);
    }

    fn is_paused(&self) -> bool {
        Field::is_paused(self)
    }

    fn population(&self) -> usize {
        self.points().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<S: Simulation>(engine: &mut S, ticks: usize) {
        for i in 0..ticks {
            let pointer = (i % 2 == 0).then(|| Vector2D::new(200.0, 150.0));
            engine.tick(pointer);
        }
    }

    #[test]
    fn test_engines_share_lifecycle() {
        let mut flock = Flock::new(400.0, 300.0, BoidConfig::default(), 1).unwrap();
        let mut field = Field::new(400.0, 300.0, FieldConfig::default(), 1).unwrap();

        run(&mut flock, 5);
        run(&mut field, 5);

        Simulation::resize(&mut flock, 800.0, 600.0);
        Simulation::resize(&mut field, 800.0, 600.0);
        assert_eq!(flock.population(), flock.target_count());
        assert_eq!(field.population(), field.target_count());

        Simulation::set_paused(&mut field, true);
        assert!(Simulation::is_paused(&field));
    }
}
