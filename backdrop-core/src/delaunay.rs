//! Incremental (Bowyer–Watson) Delaunay triangulation.
//!
//! Geometry is evaluated in `f64`: circumcircle tests against the large
//! seeding super-triangle lose too much precision in `f32`.

use crate::vector::Vector2D;

/// Determinants with a smaller magnitude are treated as collinear.
const COLLINEAR_EPSILON: f64 = 1e-10;

/// Super-triangle extent as a multiple of the input's bounding box.
const SUPER_TRIANGLE_SCALE: f64 = 1000.0;

/// Input point; ids are expected to be non-negative, negative ids are
/// reserved for the super-triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub id: i64,
    pub position: Vector2D,
}

impl Site {
    pub fn new(id: i64, x: f32, y: f32) -> Self {
        Self {
            id,
            position: Vector2D::new(x, y),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DelaunayTriangle {
    /// Ids of the three sites.
    pub vertices: [i64; 3],
    pub centroid: Vector2D,
    /// Indices of triangles sharing an edge with this one.
    pub neighbors: Vec<usize>,
}

impl DelaunayTriangle {
    pub fn contains_vertex(&self, id: i64) -> bool {
        self.vertices.contains(&id)
    }

    fn shares_edge_with(&self, other: &DelaunayTriangle) -> bool {
        self.vertices
            .iter()
            .filter(|v| other.vertices.contains(v))
            .count()
            >= 2
    }
}

#[derive(Debug, Clone, Copy)]
struct Vertex {
    id: i64,
    x: f64,
    y: f64,
}

impl From<&Site> for Vertex {
    fn from(site: &Site) -> Self {
        Self {
            id: site.id,
            x: site.position.x as f64,
            y: site.position.y as f64,
        }
    }
}

/// Working triangle: indices into the vertex table.
type Face = [usize; 3];

/// Whether `p` lies strictly inside the circle through `a`, `b` and `c`.
///
/// Collinear (or nearly so) triples have no finite circumcircle and never
/// contain anything.
pub fn circumcircle_contains(a: Vector2D, b: Vector2D, c: Vector2D, p: Vector2D) -> bool {
    let to_f64 = |v: Vector2D| (v.x as f64, v.y as f64);
    contains_f64(to_f64(a), to_f64(b), to_f64(c), to_f64(p))
}

fn contains_f64(a: (f64, f64), b: (f64, f64), c: (f64, f64), p: (f64, f64)) -> bool {
    let (ax, ay) = a;
    let (bx, by) = b;
    let (cx, cy) = c;

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < COLLINEAR_EPSILON {
        return false;
    }

    let a_sq = ax * ax + ay * ay;
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let ux = (a_sq * (by - cy) + b_sq * (cy - ay) + c_sq * (ay - by)) / d;
    let uy = (a_sq * (cx - bx) + b_sq * (ax - cx) + c_sq * (bx - ax)) / d;

    let radius_sq = (ax - ux).powi(2) + (ay - uy).powi(2);
    let dist_sq = (p.0 - ux).powi(2) + (p.1 - uy).powi(2);
    dist_sq < radius_sq
}

fn same_edge(e: (usize, usize), f: (usize, usize)) -> bool {
    (e.0 == f.0 && e.1 == f.1) || (e.0 == f.1 && e.1 == f.0)
}

fn edges(face: &Face) -> [(usize, usize); 3] {
    [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])]
}

fn super_triangle(sites: &[Site]) -> [Vertex; 3] {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for site in sites {
        let v = Vertex::from(site);
        min_x = min_x.min(v.x);
        min_y = min_y.min(v.y);
        max_x = max_x.max(v.x);
        max_y = max_y.max(v.y);
    }

    let span = (max_x - min_x).max(max_y - min_y).max(1.0) * SUPER_TRIANGLE_SCALE;
    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;

    [
        Vertex {
            id: -1,
            x: mid_x - 2.0 * span,
            y: mid_y - span,
        },
        Vertex {
            id: -2,
            x: mid_x,
            y: mid_y + 2.0 * span,
        },
        Vertex {
            id: -3,
            x: mid_x + 2.0 * span,
            y: mid_y - span,
        },
    ]
}

/// Triangulate `sites`. Fewer than three sites, or only collinear ones,
/// give an empty result. Duplicate positions are inserted once.
///
/// The super-triangle is finite, so long thin near-collinear inputs can lose
/// a sliver triangle along the hull.
pub fn triangulate(sites: &[Site]) -> Vec<DelaunayTriangle> {
    if sites.len() < 3 {
        return Vec::new();
    }

    let mut vertices: Vec<Vertex> = super_triangle(sites).to_vec();
    let mut faces: Vec<Face> = vec![[0, 1, 2]];

    for site in sites {
        let p = Vertex::from(site);
        let p_index = vertices.len();
        vertices.push(p);

        let (bad, good): (Vec<Face>, Vec<Face>) = faces.into_iter().partition(|face| {
            let [a, b, c] = face.map(|i| (vertices[i].x, vertices[i].y));
            contains_f64(a, b, c, (p.x, p.y))
        });
        faces = good;

        // cavity boundary: edges owned by exactly one bad face
        let mut boundary = Vec::new();
        for (i, face) in bad.iter().enumerate() {
            for edge in edges(face) {
                let shared = bad
                    .iter()
                    .enumerate()
                    .any(|(j, other)| j != i && edges(other).iter().any(|&e| same_edge(e, edge)));
                if !shared {
                    boundary.push(edge);
                }
            }
        }

        faces.extend(boundary.into_iter().map(|(a, b)| [a, b, p_index]));
    }

    let mut triangles: Vec<DelaunayTriangle> = faces
        .iter()
        .filter(|face| face.iter().all(|&i| vertices[i].id >= 0))
        .map(|face| {
            let [a, b, c] = face.map(|i| vertices[i]);
            DelaunayTriangle {
                vertices: [a.id, b.id, c.id],
                centroid: Vector2D::new(
                    ((a.x + b.x + c.x) / 3.0) as f32,
                    ((a.y + b.y + c.y) / 3.0) as f32,
                ),
                neighbors: Vec::new(),
            }
        })
        .collect();

    for i in 0..triangles.len() {
        for j in (i + 1)..triangles.len() {
            if triangles[i].shares_edge_with(&triangles[j]) {
                triangles[i].neighbors.push(j);
                triangles[j].neighbors.push(i);
            }
        }
    }

    log::trace!(
        "triangulated {} sites into {} triangles",
        sites.len(),
        triangles.len()
    );
    triangles
}
