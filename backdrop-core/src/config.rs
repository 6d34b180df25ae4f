//! Tunables for both engines.
//!
//! Every constant the engines read lives here as a named field with a
//! documented default. Several tunings of the same engines coexist on the
//! site, so presets are provided for the known variants and every field can
//! be overridden on its own (partially, from JSON, with the `serde` feature).

use core::f32::consts::PI;

use thiserror::Error;

/// Capacity of the boid turning-history ring buffer.
///
/// `BoidConfig::turning_history_length` may be anything in
/// `1..=TURNING_HISTORY_CAPACITY`.
pub const TURNING_HISTORY_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{field}` must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("`{field}` must be strictly positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("`{field}` must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("`min_speed` ({min}) exceeds `max_speed` ({max})")]
    SpeedBounds { min: f32, max: f32 },
    #[error("`mouse_attraction_min_radius` ({min}) must be below `mouse_attraction_radius` ({max})")]
    AttractionBand { min: f32, max: f32 },
    #[error("`turning_history_length` must be in 1..={capacity}, got {value}")]
    HistoryLength { value: usize, capacity: usize },
    #[error("`{field}` must be at least 1")]
    ZeroCount { field: &'static str },
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Configuration for the boid flock engine
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BoidConfig {
    /// Boids per 10 000 px² of surface.
    pub density: f32,
    /// Neighbours closer than this contribute to the local centre of mass.
    pub cohesion_radius: f32,
    pub cohesion_strength: f32,
    /// Steering toward a centre or the pointer is skipped below this angle.
    pub min_turn_angle: f32,
    pub mouse_attraction_radius: f32,
    pub mouse_attraction_strength: f32,
    /// Half-width of the forward field of view (radians); 3π/4 is a 270° cone.
    pub looking_angle: f32,
    pub separation_distance: f32,
    pub alignment_radius: f32,
    /// Base rotation step for separation and alignment.
    pub angle_interpolate: f32,
    pub separation_strength: f32,
    pub alignment_strength: f32,
    pub max_speed: f32,
    pub min_speed: f32,
    pub turning_history_length: usize,
    /// Mean absolute turn (rad/frame) below which a boid is "flying straight".
    pub turn_noise_floor: f32,
    /// Mean absolute turn (rad/frame) that maps to `min_speed`.
    pub turn_intensity_reference: f32,
    /// Fraction of the gap to the target speed closed per frame (1 = instant).
    pub speed_smoothing: f32,
    /// Margin kept around the reserved text rectangle when spawning.
    pub text_avoid_distance: f32,
    pub spawn_attempts: usize,
}

impl Default for BoidConfig {
    fn default() -> Self {
        Self {
            density: 0.6,
            cohesion_radius: 100.0,
            cohesion_strength: 0.02,
            min_turn_angle: 0.05,
            mouse_attraction_radius: 200.0,
            mouse_attraction_strength: 0.05,
            looking_angle: PI * 0.75,
            separation_distance: 30.0,
            alignment_radius: 60.0,
            angle_interpolate: 0.05,
            separation_strength: 1.5,
            alignment_strength: 0.6,
            max_speed: 6.0,
            min_speed: 3.0,
            turning_history_length: 7,
            turn_noise_floor: 0.02,
            turn_intensity_reference: 0.15,
            speed_smoothing: 1.0,
            text_avoid_distance: 50.0,
            spawn_attempts: 100,
        }
    }
}

impl BoidConfig {
    /// The faster landing-page tuning.
    pub fn swift() -> Self {
        Self {
            max_speed: 8.0,
            min_speed: 4.0,
            ..Self::default()
        }
    }

    /// The slower tuning used behind long-form pages.
    pub fn calm() -> Self {
        Self {
            max_speed: 5.0,
            min_speed: 2.5,
            density: 0.4,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("density", self.density)?;
        non_negative("cohesion_radius", self.cohesion_radius)?;
        non_negative("cohesion_strength", self.cohesion_strength)?;
        non_negative("min_turn_angle", self.min_turn_angle)?;
        non_negative("mouse_attraction_radius", self.mouse_attraction_radius)?;
        non_negative("mouse_attraction_strength", self.mouse_attraction_strength)?;
        in_range("looking_angle", self.looking_angle, 0.0, PI)?;
        non_negative("separation_distance", self.separation_distance)?;
        non_negative("alignment_radius", self.alignment_radius)?;
        non_negative("angle_interpolate", self.angle_interpolate)?;
        non_negative("separation_strength", self.separation_strength)?;
        non_negative("alignment_strength", self.alignment_strength)?;
        non_negative("min_speed", self.min_speed)?;
        positive("max_speed", self.max_speed)?;
        if self.min_speed > self.max_speed {
            return Err(ConfigError::SpeedBounds {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if self.turning_history_length == 0
            || self.turning_history_length > TURNING_HISTORY_CAPACITY
        {
            return Err(ConfigError::HistoryLength {
                value: self.turning_history_length,
                capacity: TURNING_HISTORY_CAPACITY,
            });
        }
        non_negative("turn_noise_floor", self.turn_noise_floor)?;
        positive("turn_intensity_reference", self.turn_intensity_reference)?;
        in_range("speed_smoothing", self.speed_smoothing, 0.0, 1.0)?;
        non_negative("text_avoid_distance", self.text_avoid_distance)?;
        if self.spawn_attempts == 0 {
            return Err(ConfigError::ZeroCount {
                field: "spawn_attempts",
            });
        }
        Ok(())
    }
}

/// Where pairwise repulsion is applied.
///
/// `Position` separates particles stiffly within the frame; `Velocity` is
/// softer and lets damping absorb the push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RepulsionMode {
    Position,
    #[default]
    Velocity,
}

/// How the field engine derives its triangle mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MeshStrategy {
    /// Every 3-cycle of the accepted connection graph.
    #[default]
    ConnectionCycles,
    /// Delaunay triangles whose three edges fit inside the connection radius.
    Delaunay,
}

/// Configuration for the particle field engine
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FieldConfig {
    /// Points per 10 000 px² of padded area.
    pub density: f32,
    /// Fraction of the surface added as margin on every side.
    pub simulation_padding: f32,
    /// Connection radius as a multiple of the mean point spacing.
    pub connection_radius_factor: f32,
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    pub repulsion_mode: RepulsionMode,
    /// Square the `(1 - d/r)` falloff for a softer edge.
    pub repulsion_squared: bool,
    /// Upper bound on a single pair's push per frame.
    pub repulsion_max_push: f32,
    /// Global scale on the per-frame wander-angle jitter.
    pub wander_rate: f32,
    /// Velocity added along the wander direction every frame.
    pub wander_force: f32,
    pub max_speed: f32,
    /// Per-frame velocity multiplier, below 1.
    pub damping: f32,
    pub wall_margin: f32,
    pub wall_strength: f32,
    pub pointer_attraction: bool,
    pub mouse_attraction_min_radius: f32,
    pub mouse_attraction_radius: f32,
    pub mouse_attraction_strength: f32,
    pub pointer_pairs: bool,
    pub pointer_pair_radius: f32,
    pub pointer_pair_strength: f32,
    pub distortion: bool,
    pub distortion_radius: f32,
    pub distortion_strength: f32,
    pub distortion_max_radius: f32,
    pub distortion_decay: f32,
    pub angular_sectors: usize,
    pub max_per_sector: usize,
    /// Minimum angle (radians) between two connections at the same point.
    pub angular_proximity_threshold: f32,
    pub mesh_strategy: MeshStrategy,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            density: 8.0,
            simulation_padding: 0.1,
            connection_radius_factor: 1.8,
            repulsion_radius: 40.0,
            repulsion_strength: 0.05,
            repulsion_mode: RepulsionMode::Velocity,
            repulsion_squared: false,
            repulsion_max_push: 2.0,
            wander_rate: 0.1,
            wander_force: 0.02,
            max_speed: 0.6,
            damping: 0.98,
            wall_margin: 50.0,
            wall_strength: 0.05,
            pointer_attraction: false,
            mouse_attraction_min_radius: 30.0,
            mouse_attraction_radius: 200.0,
            mouse_attraction_strength: 1.0,
            pointer_pairs: false,
            pointer_pair_radius: 150.0,
            pointer_pair_strength: 0.002,
            distortion: false,
            distortion_radius: 150.0,
            distortion_strength: 0.3,
            distortion_max_radius: 20.0,
            distortion_decay: 0.9,
            angular_sectors: 6,
            max_per_sector: 2,
            angular_proximity_threshold: 0.35,
            mesh_strategy: MeshStrategy::ConnectionCycles,
        }
    }
}

impl FieldConfig {
    /// The denser tuning used on the home page.
    pub fn dense() -> Self {
        Self {
            density: 20.0,
            ..Self::default()
        }
    }

    /// Default tuning with every pointer-driven term switched on.
    pub fn interactive() -> Self {
        Self {
            pointer_attraction: true,
            pointer_pairs: true,
            distortion: true,
            repulsion_squared: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("density", self.density)?;
        non_negative("simulation_padding", self.simulation_padding)?;
        positive("connection_radius_factor", self.connection_radius_factor)?;
        non_negative("repulsion_radius", self.repulsion_radius)?;
        non_negative("repulsion_strength", self.repulsion_strength)?;
        non_negative("repulsion_max_push", self.repulsion_max_push)?;
        non_negative("wander_rate", self.wander_rate)?;
        non_negative("wander_force", self.wander_force)?;
        positive("max_speed", self.max_speed)?;
        in_range("damping", self.damping, 0.0, 1.0)?;
        non_negative("wall_margin", self.wall_margin)?;
        non_negative("wall_strength", self.wall_strength)?;
        non_negative("mouse_attraction_min_radius", self.mouse_attraction_min_radius)?;
        non_negative("mouse_attraction_radius", self.mouse_attraction_radius)?;
        if self.mouse_attraction_min_radius >= self.mouse_attraction_radius {
            return Err(ConfigError::AttractionBand {
                min: self.mouse_attraction_min_radius,
                max: self.mouse_attraction_radius,
            });
        }
        non_negative("mouse_attraction_strength", self.mouse_attraction_strength)?;
        non_negative("pointer_pair_radius", self.pointer_pair_radius)?;
        non_negative("pointer_pair_strength", self.pointer_pair_strength)?;
        non_negative("distortion_radius", self.distortion_radius)?;
        non_negative("distortion_strength", self.distortion_strength)?;
        non_negative("distortion_max_radius", self.distortion_max_radius)?;
        in_range("distortion_decay", self.distortion_decay, 0.0, 1.0)?;
        if self.angular_sectors == 0 {
            return Err(ConfigError::ZeroCount {
                field: "angular_sectors",
            });
        }
        if self.max_per_sector == 0 {
            return Err(ConfigError::ZeroCount {
                field: "max_per_sector",
            });
        }
        in_range(
            "angular_proximity_threshold",
            self.angular_proximity_threshold,
            0.0,
            PI,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert_eq!(BoidConfig::default().validate(), Ok(()));
        assert_eq!(BoidConfig::swift().validate(), Ok(()));
        assert_eq!(BoidConfig::calm().validate(), Ok(()));
        assert_eq!(FieldConfig::default().validate(), Ok(()));
        assert_eq!(FieldConfig::dense().validate(), Ok(()));
        assert_eq!(FieldConfig::interactive().validate(), Ok(()));
    }

    #[test]
    fn test_boid_speed_bounds_rejected() {
        let config = BoidConfig {
            min_speed: 9.0,
            ..BoidConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SpeedBounds { min: 9.0, max: 6.0 })
        );
    }

    #[test]
    fn test_history_length_bounded_by_capacity() {
        let config = BoidConfig {
            turning_history_length: TURNING_HISTORY_CAPACITY + 1,
            ..BoidConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HistoryLength { .. })
        ));
    }

    #[test]
    fn test_field_rejects_bad_values() {
        let config = FieldConfig {
            damping: 1.5,
            ..FieldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "damping", .. })
        ));

        let config = FieldConfig {
            angular_sectors: 0,
            ..FieldConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroCount {
                field: "angular_sectors"
            })
        );

        let config = FieldConfig {
            repulsion_radius: f32::NAN,
            ..FieldConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json_overrides_defaults() {
        let config: FieldConfig =
            serde_json::from_str(r#"{"density": 20.0, "mesh_strategy": "delaunay"}"#).unwrap();
        assert_eq!(config.density, 20.0);
        assert_eq!(config.mesh_strategy, MeshStrategy::Delaunay);
        assert_eq!(config.damping, FieldConfig::default().damping);
    }
}
