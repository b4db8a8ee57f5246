//! Quadric error metric (Garland-Heckbert). Grounded on the teacher's
//! `simplify::SymmetricMatrix` and on `imp_OnlyGeo.hpp`'s `getKMatrix` /
//! `buildQs` / `imp_update` / `getOptimumPoint`.

use nalgebra::{Matrix3, Point3, Vector3};

use crate::connectivity::Connectivity;
use crate::geometry::Plane;
use crate::mesh::Mesh;

/// Symmetric 4x4 quadric, stored as the 10 entries of its upper triangle:
/// `[q0 q1 q2 q3; _ q4 q5 q6; _ _ q7 q8; _ _ _ q9]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SymmetricMatrix {
    pub m: [f64; 10],
}

impl SymmetricMatrix {
    pub fn zero() -> Self {
        SymmetricMatrix { m: [0.0; 10] }
    }

    /// `K` matrix of a triangle's plane: outer product of `(n, d)` with
    /// itself, `d = -n . p0`.
    pub fn from_plane(plane: &Plane) -> Self {
        let n = plane.normal;
        let d = plane.offset();
        SymmetricMatrix {
            m: [
                n.x * n.x,
                n.x * n.y,
                n.x * n.z,
                n.x * d,
                n.y * n.y,
                n.y * n.z,
                n.y * d,
                n.z * n.z,
                n.z * d,
                d * d,
            ],
        }
    }

    pub fn add(&self, other: &SymmetricMatrix) -> SymmetricMatrix {
        let mut out = [0.0; 10];
        for i in 0..10 {
            out[i] = self.m[i] + other.m[i];
        }
        SymmetricMatrix { m: out }
    }

    pub fn scaled(&self, s: f64) -> SymmetricMatrix {
        let mut out = [0.0; 10];
        for i in 0..10 {
            out[i] = self.m[i] * s;
        }
        SymmetricMatrix { m: out }
    }

    /// `p^T Q p` with homogeneous coordinate 1.
    pub fn quadric_form(&self, p: &Point3<f64>) -> f64 {
        let q = &self.m;
        q[0] * p.x * p.x
            + q[4] * p.y * p.y
            + q[7] * p.z * p.z
            + 2.0 * (q[1] * p.x * p.y + q[2] * p.x * p.z + q[5] * p.y * p.z)
            + 2.0 * (q[3] * p.x + q[6] * p.y + q[8] * p.z)
            + q[9]
    }

    /// Solve `A x = b` for the quadric minimizer, `A` the upper-left 3x3
    /// block and `b = -[q3,q6,q8]`. Returns `None` if the residual exceeds
    /// `tolerance` (relative to `||b||`), matching the source's `TOLL` guard.
    pub fn optimum_point(&self, tolerance: f64) -> Option<Point3<f64>> {
        let q = &self.m;
        let a = Matrix3::new(q[0], q[1], q[2], q[1], q[4], q[5], q[2], q[5], q[7]);
        let b = Vector3::new(-q[3], -q[6], -q[8]);
        let b_norm = b.norm();
        if b_norm < f64::EPSILON {
            return None;
        }
        let decomp = a.qr();
        let x = decomp.solve(&b)?;
        let residual = (a * x - b).norm();
        if residual / b_norm < tolerance {
            Some(Point3::from(x))
        } else {
            None
        }
    }
}

/// Per-vertex Q matrices, built once and refreshed incrementally.
#[derive(Debug, Clone)]
pub struct QuadricState {
    q: Vec<SymmetricMatrix>,
}

impl QuadricState {
    pub fn build(mesh: &Mesh) -> Self {
        let mut q = vec![SymmetricMatrix::zero(); mesh.node_capacity()];
        for elem in mesh.active_elems() {
            let [a, b, c] = elem.verts;
            if let Some(plane) = Plane::from_triangle(
                &mesh.node(a).point,
                &mesh.node(b).point,
                &mesh.node(c).point,
            ) {
                let k = SymmetricMatrix::from_plane(&plane);
                for v in [a, b, c] {
                    q[v] = q[v].add(&k);
                }
            }
        }
        QuadricState { q }
    }

    pub fn get(&self, v: usize) -> SymmetricMatrix {
        self.q[v]
    }

    pub fn edge_quadric(&self, id1: usize, id2: usize) -> SymmetricMatrix {
        self.q[id1].add(&self.q[id2]).scaled(0.5)
    }

    /// Rebuild Q for `kept` and every one of its current neighbors, by
    /// re-summing the incident triangles' plane matrices. Grounded on
    /// `imp_update` in the original source, which refreshes the kept vertex
    /// *and* its neighborhood, not just the kept vertex.
    pub fn update(&mut self, mesh: &Mesh, conn: &Connectivity, kept: usize) {
        let mut to_refresh: Vec<usize> = conn.node2node(kept).connected().collect();
        to_refresh.push(kept);

        for v in to_refresh {
            let mut acc = SymmetricMatrix::zero();
            for elem_id in conn.node2elem(v).connected() {
                let elem = mesh.elem(elem_id);
                if !elem.active {
                    continue;
                }
                let [a, b, c] = elem.verts;
                if let Some(plane) = Plane::from_triangle(
                    &mesh.node(a).point,
                    &mesh.node(b).point,
                    &mesh.node(c).point,
                ) {
                    acc = acc.add(&SymmetricMatrix::from_plane(&plane));
                }
            }
            self.q[v] = acc;
        }
    }
}
