//! Entity identity and surface-driven population sizing shared by both
//! engines.

use crate::vector::Vector2D;

/// Hands out entity ids from a monotonic counter; ids are never reused.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Axis-aligned rectangle, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vector2D,
    pub max: Vector2D,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vector2D::new(x, y),
            max: Vector2D::new(x + width, y + height),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn contains(&self, p: Vector2D) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: Vector2D::new(self.min.x - margin, self.min.y - margin),
            max: Vector2D::new(self.max.x + margin, self.max.y + margin),
        }
    }
}

/// `round(area / 10 000 * density)`: entities wanted for a surface.
pub fn target_count(area: f32, density: f32) -> usize {
    let target = (area / 10_000.0 * density).round();
    if target.is_finite() && target > 0.0 {
        target as usize
    } else {
        0
    }
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationChange {
    Unchanged,
    Grew(usize),
    Shrank(usize),
}

/// Bring `entities` to exactly `target` items: spawn the shortfall at the
/// tail, or truncate the excess from the tail.
pub fn reconcile<T>(
    entities: &mut Vec<T>,
    target: usize,
    mut spawn: impl FnMut() -> T,
) -> PopulationChange {
    let current = entities.len();
    if target > current {
        let missing = target - current;
        entities.reserve(missing);
        entities.extend((0..missing).map(|_| spawn()));
        PopulationChange::Grew(missing)
    } else if target < current {
        entities.truncate(target);
        PopulationChange::Shrank(current - target)
    } else {
        PopulationChange::Unchanged
    }
}
