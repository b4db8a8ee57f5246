//! Collapse legality checks (spec §4.4), run in order; the first failure
//! rejects the candidate. Grounded on the inversion-walk shape of the
//! teacher's `simplify::Simplifier::flipped`, extended to the manifold and
//! self-intersection checks this system additionally requires.

use std::collections::HashSet;

use nalgebra::Point3;

use crate::connectivity::Connectivity;
use crate::geometry::{self, Boundary};
use crate::mesh::Mesh;
use crate::spatial_index::SpatialIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegalityFailure {
    Degenerate,
    Inversion,
    BoundaryMismatch,
    NonManifold,
    SelfIntersection,
}

/// Position a vertex would take after the collapse: `p` if it is `id1` or
/// `id2`, its current position otherwise.
fn moved_position(mesh: &Mesh, id1: usize, id2: usize, p: &Point3<f64>, v: usize) -> Point3<f64> {
    if v == id1 || v == id2 {
        *p
    } else {
        mesh.node(v).point
    }
}

fn check_degenerate(mesh: &Mesh, conn: &Connectivity, id1: usize, id2: usize, p: &Point3<f64>) -> bool {
    let neighborhood = conn
        .node2node(id1)
        .connected()
        .chain(conn.node2node(id2).connected())
        .filter(|&v| v != id1 && v != id2);
    for v in neighborhood {
        if (mesh.node(v).point - p).norm() < 1e-12 {
            return false;
        }
    }
    true
}

fn check_inversion(
    mesh: &Mesh,
    id1: usize,
    id2: usize,
    p: &Point3<f64>,
    elems_to_keep: &[usize],
) -> bool {
    for &e in elems_to_keep {
        let verts = mesh.elem(e).verts;
        let before = [
            mesh.node(verts[0]).point,
            mesh.node(verts[1]).point,
            mesh.node(verts[2]).point,
        ];
        let after = verts.map(|v| moved_position(mesh, id1, id2, p, v));

        if geometry::triangle_is_degenerate(&after[0], &after[1], &after[2]) {
            return false;
        }

        let n_before = geometry::triangle_normal(&before[0], &before[1], &before[2]);
        let n_after = geometry::triangle_normal(&after[0], &after[1], &after[2]);
        let denom = n_before.norm() * n_after.norm();
        if denom < f64::EPSILON {
            return false;
        }
        if n_before.dot(&n_after) / denom <= 0.0 {
            return false;
        }
    }
    true
}

fn expected_boundary(bp: Boundary, bq: Boundary) -> Option<Boundary> {
    match (bp, bq) {
        (Boundary::Triple, Boundary::Triple) => None,
        (Boundary::Triple, _) | (_, Boundary::Triple) => Some(Boundary::Triple),
        (Boundary::Edge, Boundary::Edge) => Some(Boundary::Edge),
        (Boundary::Interior, Boundary::Interior) => Some(Boundary::Interior),
        _ => Some(Boundary::Edge),
    }
}

fn check_boundary(mesh: &Mesh, id1: usize, id2: usize, p: &Point3<f64>) -> bool {
    let bp = mesh.node(id1).boundary;
    let bq = mesh.node(id2).boundary;
    match expected_boundary(bp, bq) {
        None => false,
        Some(Boundary::Triple) => {
            let fixed = if bp.is_triple() { mesh.node(id1).point } else { mesh.node(id2).point };
            (fixed - p).norm() < 1e-9
        }
        Some(_) => true,
    }
}

fn check_manifold(mesh: &Mesh, id1: usize, id2: usize, elems_to_keep: &[usize]) -> bool {
    let mut seen_tuples: HashSet<[usize; 3]> = HashSet::new();
    let mut edge_count: std::collections::HashMap<(usize, usize), usize> =
        std::collections::HashMap::new();

    for &e in elems_to_keep {
        let mut verts = mesh.elem(e).verts;
        for v in verts.iter_mut() {
            if *v == id2 {
                *v = id1;
            }
        }
        if verts[0] == verts[1] || verts[1] == verts[2] || verts[0] == verts[2] {
            return false;
        }
        let mut sorted = verts;
        sorted.sort_unstable();
        if !seen_tuples.insert(sorted) {
            return false;
        }
        for i in 0..3 {
            let a = verts[i];
            let b = verts[(i + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };
            *edge_count.entry(key).or_insert(0) += 1;
        }
    }
    edge_count.values().all(|&c| c <= 2)
}

fn check_self_intersection(
    mesh: &Mesh,
    index: &SpatialIndex,
    id1: usize,
    id2: usize,
    p: &Point3<f64>,
    elems_to_keep: &[usize],
) -> bool {
    for &e in elems_to_keep {
        let verts = mesh.elem(e).verts;
        let tri = verts.map(|v| moved_position(mesh, id1, id2, p, v));
        for other in index.neighbors(e) {
            if elems_to_keep.contains(&other) {
                continue;
            }
            let other_verts = mesh.elem(other).verts;
            if other_verts.iter().any(|v| verts.contains(v)) {
                continue;
            }
            let other_tri = other_verts.map(|v| mesh.node(v).point);
            if geometry::triangles_intersect(
                (&tri[0], &tri[1], &tri[2]),
                (&other_tri[0], &other_tri[1], &other_tri[2]),
            ) {
                return false;
            }
        }
    }
    true
}

/// Run the five checks of spec §4.4 in order against the current mesh
/// state, for a proposed collapse of `(id1, id2)` to `p`. `elems_to_keep`
/// must be the set of elements incident to exactly one endpoint.
pub fn check_collapse(
    mesh: &Mesh,
    conn: &Connectivity,
    index: &SpatialIndex,
    id1: usize,
    id2: usize,
    p: &Point3<f64>,
    elems_to_keep: &[usize],
) -> Result<(), LegalityFailure> {
    if !check_degenerate(mesh, conn, id1, id2, p) {
        return Err(LegalityFailure::Degenerate);
    }
    if !check_inversion(mesh, id1, id2, p, elems_to_keep) {
        return Err(LegalityFailure::Inversion);
    }
    if !check_boundary(mesh, id1, id2, p) {
        return Err(LegalityFailure::BoundaryMismatch);
    }
    if !check_manifold(mesh, id1, id2, elems_to_keep) {
        return Err(LegalityFailure::NonManifold);
    }
    if !check_self_intersection(mesh, index, id1, id2, p, elems_to_keep) {
        return Err(LegalityFailure::SelfIntersection);
    }
    Ok(())
}
