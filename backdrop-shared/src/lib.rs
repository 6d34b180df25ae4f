use backdrop_core::{BoidConfig, Field, FieldConfig, Flock, Vector2D};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Represents a 2D position in surface coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another position
    pub fn distance_to(&self, other: &Position) -> f32 {
        Vector2D::from(*self).distance(&Vector2D::from(*other))
    }
}

impl From<Vector2D> for Position {
    fn from(v: Vector2D) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Position> for Vector2D {
    fn from(p: Position) -> Self {
        Vector2D::new(p.x, p.y)
    }
}

/// Pointer snapshot sent by the page each frame
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PointerState {
    /// `None` while the pointer is outside the surface (or released).
    pub position: Option<Position>,
}

impl PointerState {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Some(Position::new(x, y)),
        }
    }

    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn as_vector(&self) -> Option<Vector2D> {
        self.position.map(Vector2D::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoidView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    /// Heading in radians.
    pub angle: f32,
    pub speed: f32,
}

/// Everything needed to draw one flock frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoidFrame {
    pub tick: u64,
    pub width: f32,
    pub height: f32,
    pub boids: Vec<BoidView>,
}

impl BoidFrame {
    pub fn capture(tick: u64, flock: &Flock) -> Self {
        Self {
            tick,
            width: flock.width(),
            height: flock.height(),
            boids: flock
                .boids()
                .iter()
                .map(|b| BoidView {
                    id: b.id,
                    x: b.position.x,
                    y: b.position.y,
                    angle: b.angle,
                    speed: b.current_speed,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    /// Draw position including the distortion offset.
    pub render_x: f32,
    pub render_y: f32,
}

/// Everything needed to draw one field frame. Connection and triangle
/// entries index into `points`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldFrame {
    pub tick: u64,
    pub width: f32,
    pub height: f32,
    pub connection_radius: f32,
    pub points: Vec<PointView>,
    pub connections: Vec<[usize; 2]>,
    pub triangles: Vec<[usize; 3]>,
}

impl FieldFrame {
    pub fn capture(tick: u64, field: &Field) -> Self {
        Self {
            tick,
            width: field.width(),
            height: field.height(),
            connection_radius: field.connection_radius(),
            points: field
                .points()
                .iter()
                .map(|p| {
                    let render = p.render_position();
                    PointView {
                        id: p.id,
                        x: p.position.x,
                        y: p.position.y,
                        render_x: render.x,
                        render_y: render.y,
                    }
                })
                .collect(),
            connections: field.connections().iter().map(|c| [c.a, c.b]).collect(),
            triangles: field.triangles().iter().map(|t| t.vertices).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Boids,
    Field,
}

/// Status summary reported to the page or printed by the CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineStatus {
    pub engine: EngineKind,
    pub population: usize,
    pub target_population: usize,
    pub paused: bool,
    pub width: f32,
    pub height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triangles: Option<usize>,
}

impl EngineStatus {
    pub fn of_flock(flock: &Flock) -> Self {
        Self {
            engine: EngineKind::Boids,
            population: flock.boids().len(),
            target_population: flock.target_count(),
            paused: flock.is_paused(),
            width: flock.width(),
            height: flock.height(),
            connections: None,
            triangles: None,
        }
    }

    pub fn of_field(field: &Field) -> Self {
        Self {
            engine: EngineKind::Field,
            population: field.points().len(),
            target_population: field.target_count(),
            paused: field.is_paused(),
            width: field.width(),
            height: field.height(),
            connections: Some(field.connections().len()),
            triangles: Some(field.triangles().len()),
        }
    }
}

/// Parse a (possibly partial) flock config; missing fields keep defaults.
pub fn parse_boid_config(json: &str) -> Result<BoidConfig, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parse a (possibly partial) field config; missing fields keep defaults.
pub fn parse_field_config(json: &str) -> Result<FieldConfig, serde_json::Error> {
    serde_json::from_str(json)
}

/// Overlay the fields present in `patch` onto `current`; anything the patch
/// leaves out keeps its current value rather than the default.
pub fn merge_config<T>(current: &T, patch: &str) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(current)?;
    let patch: serde_json::Value = serde_json::from_str(patch)?;
    match (&mut merged, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overrides)) => {
            base.extend(overrides);
        }
        (_, other) => merged = other,
    }
    serde_json::from_value(merged)
}

pub fn parse_pointer(json: &str) -> Result<PointerState, serde_json::Error> {
    serde_json::from_str(json)
}

/// Single-line JSON for streaming frames.
pub fn to_json_line<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}
