//! Point, vector and plane primitives shared by the cost model, legality
//! checks and projection.

use nalgebra::{Point3, Vector3};

/// Boundary classification of a mesh vertex.
///
/// Mirrors the `{0,1,2}` flag of the original mesh store: interior vertices
/// may move anywhere; boundary vertices may only move along the boundary
/// curve; triple (corner) vertices never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Boundary {
    Interior,
    Edge,
    Triple,
}

impl Boundary {
    pub fn is_triple(self) -> bool {
        matches!(self, Boundary::Triple)
    }
}

/// An oriented plane, grounded on the teacher's `creation::Plane`.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub origin: Point3<f64>,
}

impl Plane {
    /// Fit a plane to a triangle via the cross product of two edges.
    /// Returns `None` for a degenerate (zero-area) triangle.
    pub fn from_triangle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len < f64::EPSILON {
            return None;
        }
        Some(Plane {
            normal: n / len,
            origin: *a,
        })
    }

    /// Signed distance `n . (p - origin)`.
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&(p - self.origin))
    }

    /// The plane's homogeneous offset `d = -n . origin`, as used by the
    /// quadric `K` matrix (`nx,ny,nz,d`).
    pub fn offset(&self) -> f64 {
        -self.normal.dot(&self.origin.coords)
    }
}

/// Unnormalized normal (direction only) of a triangle; zero for a degenerate
/// triangle.
pub fn triangle_normal(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Vector3<f64> {
    (b - a).cross(&(c - a))
}

/// Twice the signed area magnitude of the triangle.
pub fn triangle_double_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    triangle_normal(a, b, c).norm()
}

pub fn triangle_is_degenerate(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> bool {
    triangle_double_area(a, b, c) < 1e-12
}

/// Closest point on a triangle to `p`, and the squared distance to it.
///
/// Grounded on the projection rule of spec §4.7: project onto the plane
/// first, and fall back to the closest edge/vertex when the foot lies
/// outside the triangle.
pub fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> (Point3<f64>, f64) {
    // Barycentric projection, following the standard closest-point-on-
    // triangle decomposition (Ericson, "Real-Time Collision Detection" 5.1.5).
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (*a, (p - a).norm_squared());
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (*b, (p - b).norm_squared());
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        let q = a + ab * v;
        return (q, (p - q).norm_squared());
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (*c, (p - c).norm_squared());
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        let q = a + ac * w;
        return (q, (p - q).norm_squared());
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        let q = b + (c - b) * w;
        return (q, (p - q).norm_squared());
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    let q = a + ab * v + ac * w;
    (q, (p - q).norm_squared())
}

/// Pairwise triangle-triangle intersection test used by the self-intersection
/// legality check. Returns true for any proper intersection (coplanar
/// overlap included); shared vertices/edges between adjacent triangles do
/// not count (callers are expected to skip pairs that already share a
/// vertex).
pub fn triangles_intersect(
    (a0, a1, a2): (&Point3<f64>, &Point3<f64>, &Point3<f64>),
    (b0, b1, b2): (&Point3<f64>, &Point3<f64>, &Point3<f64>),
) -> bool {
    let na = triangle_normal(a0, a1, a2);
    if na.norm_squared() < f64::EPSILON {
        return false;
    }
    let da = -na.dot(&a0.coords);
    let db = [b0, b1, b2].map(|p| na.dot(&p.coords) + da);
    if db.iter().all(|&d| d > 1e-9) || db.iter().all(|&d| d < -1e-9) {
        return false;
    }

    let nb = triangle_normal(b0, b1, b2);
    if nb.norm_squared() < f64::EPSILON {
        return false;
    }
    let db2 = -nb.dot(&b0.coords);
    let da2 = [a0, a1, a2].map(|p| nb.dot(&p.coords) + db2);
    if da2.iter().all(|&d| d > 1e-9) || da2.iter().all(|&d| d < -1e-9) {
        return false;
    }

    // Both triangles straddle each other's plane (or are coplanar): project
    // onto the axis of greatest separation and test 1D interval overlap,
    // which is a conservative but adequate test for this crate's purposes
    // (rejecting near-coincident folded layers per S6).
    let dir = na.cross(&nb);
    if dir.norm_squared() < f64::EPSILON {
        return coplanar_triangles_overlap(a0, a1, a2, b0, b1, b2, &na);
    }
    let axis = dir.normalize();
    let proj = |p: &Point3<f64>| axis.dot(&p.coords);
    let (amin, amax) = min_max3(proj(a0), proj(a1), proj(a2));
    let (bmin, bmax) = min_max3(proj(b0), proj(b1), proj(b2));
    amax >= bmin - 1e-9 && bmax >= amin - 1e-9
}

fn min_max3(a: f64, b: f64, c: f64) -> (f64, f64) {
    let mn = a.min(b).min(c);
    let mx = a.max(b).max(c);
    (mn, mx)
}

fn coplanar_triangles_overlap(
    a0: &Point3<f64>,
    a1: &Point3<f64>,
    a2: &Point3<f64>,
    b0: &Point3<f64>,
    b1: &Point3<f64>,
    b2: &Point3<f64>,
    normal: &Vector3<f64>,
) -> bool {
    // Project both triangles into a 2D basis of the shared plane and test
    // separating axes along each edge normal.
    let u = if normal.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    }
    .cross(normal)
    .normalize();
    let v = normal.cross(&u);
    let to2d = |p: &Point3<f64>| (u.dot(&p.coords), v.dot(&p.coords));
    let tri_a = [to2d(a0), to2d(a1), to2d(a2)];
    let tri_b = [to2d(b0), to2d(b1), to2d(b2)];
    for tri in [&tri_a, &tri_b] {
        for i in 0..3 {
            let (x1, y1) = tri[i];
            let (x2, y2) = tri[(i + 1) % 3];
            let axis = (-(y2 - y1), x2 - x1);
            let proj = |pts: &[(f64, f64); 3]| {
                let vals: Vec<f64> = pts.iter().map(|&(x, y)| axis.0 * x + axis.1 * y).collect();
                (
                    vals.iter().cloned().fold(f64::INFINITY, f64::min),
                    vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                )
            };
            let (amin, amax) = proj(&tri_a);
            let (bmin, bmax) = proj(&tri_b);
            if amax < bmin - 1e-9 || bmax < amin - 1e-9 {
                return false;
            }
        }
    }
    true
}
