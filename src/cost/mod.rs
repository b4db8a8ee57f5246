//! Pluggable edge cost. Reimplemented as a tagged variant (spec §9 offers
//! either a tagged enum or a three-method interface; this crate picks the
//! enum since the three variants share nearly all of their state — the Q
//! matrices — and only differ in the final scalar combination).

pub mod combined;
pub mod data;
pub mod geometric;

use nalgebra::Point3;

use crate::connectivity::Connectivity;
use crate::geometry::Boundary;
use crate::mesh::Mesh;
pub use combined::Weights;
use geometric::QuadricState;

#[derive(Debug, Clone, Copy)]
pub enum CostMode {
    Geometric,
    Data,
    Combined(Weights),
}

/// Candidate point policy shared by all cost variants (spec §4.3.1): the
/// admissible new locations depend only on the endpoints' boundary flags
/// and the edge quadric's optimum-point solve.
pub fn candidate_points(
    mesh: &Mesh,
    quadrics: &QuadricState,
    tolerance: f64,
    id1: usize,
    id2: usize,
) -> Vec<Point3<f64>> {
    let p = mesh.node(id1).point;
    let q = mesh.node(id2).point;
    let bp = mesh.node(id1).boundary;
    let bq = mesh.node(id2).boundary;

    if bp.is_triple() && bq.is_triple() {
        return Vec::new();
    }
    if bp.is_triple() {
        return vec![p];
    }
    if bq.is_triple() {
        return vec![q];
    }

    let both_interior = bp == Boundary::Interior && bq == Boundary::Interior;
    let both_boundary = bp == Boundary::Edge && bq == Boundary::Edge;
    if both_interior || both_boundary {
        let midpoint = Point3::from((p.coords + q.coords) * 0.5);
        let mut candidates = vec![p, q, midpoint];
        let edge_q = quadrics.edge_quadric(id1, id2);
        if let Some(opt) = edge_q.optimum_point(tolerance) {
            candidates.push(opt);
        }
        return candidates;
    }

    // One interior, one boundary: only the boundary endpoint may receive
    // the merged vertex.
    if bp == Boundary::Edge {
        vec![p]
    } else {
        vec![q]
    }
}

/// Owns the Q matrices (needed by every mode to place candidate points) and
/// dispatches the final scalar cost per the active mode.
#[derive(Debug, Clone)]
pub struct CostEngine {
    mode: CostMode,
    quadrics: QuadricState,
    tolerance: f64,
    max_geom: f64,
    max_disp: f64,
    max_equi: f64,
}

impl CostEngine {
    pub fn build(mesh: &Mesh, mode: CostMode, tolerance: f64) -> Self {
        CostEngine {
            mode,
            quadrics: QuadricState::build(mesh),
            tolerance,
            max_geom: f64::EPSILON,
            max_disp: f64::EPSILON,
            max_equi: f64::EPSILON,
        }
    }

    pub fn candidate_points(&self, mesh: &Mesh, id1: usize, id2: usize) -> Vec<Point3<f64>> {
        candidate_points(mesh, &self.quadrics, self.tolerance, id1, id2)
    }

    /// Evaluate the active cost at `p` for collapsing `(id1, id2)`.
    /// `elems_to_keep` is needed by the equi term; the data term is
    /// evaluated over the union of `elems_to_keep` and `elems_to_remove`
    /// (spec §4.3.3: dispersion "over the triangles in `elemsToKeep ∪
    /// elemsToRemove`"), since those are exactly the triangles whose
    /// `N_t` the collapse can disturb.
    pub fn cost(
        &mut self,
        mesh: &Mesh,
        conn: &Connectivity,
        id1: usize,
        id2: usize,
        p: &Point3<f64>,
        elems_to_keep: &[usize],
        elems_to_remove: &[usize],
    ) -> f64 {
        let geom = self.quadrics.edge_quadric(id1, id2).quadric_form(p);
        match self.mode {
            CostMode::Geometric => geom.max(0.0),
            CostMode::Data => data::data_cost(conn, &touched_elems(elems_to_keep, elems_to_remove)),
            CostMode::Combined(w) => {
                let disp = data::data_cost(conn, &touched_elems(elems_to_keep, elems_to_remove));
                let equi = combined::equi_cost(mesh, elems_to_keep, id2, id1, p);
                self.max_geom = self.max_geom.max(geom.max(0.0));
                self.max_disp = self.max_disp.max(disp);
                self.max_equi = self.max_equi.max(equi);
                w.geom * (geom.max(0.0) / self.max_geom)
                    + w.disp * (disp / self.max_disp)
                    + w.equi * (equi / self.max_equi)
            }
        }
    }

    /// Rebuild Q for `kept` and its neighbors after a committed collapse.
    pub fn update(&mut self, mesh: &Mesh, conn: &Connectivity, kept: usize) {
        self.quadrics.update(mesh, conn, kept);
    }
}

/// Deduplicated union of two element-id lists, used to scope the data cost
/// to every triangle a candidate collapse can touch (spec §4.3.3).
fn touched_elems(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut all: Vec<usize> = a.iter().chain(b.iter()).copied().collect();
    all.sort_unstable();
    all.dedup();
    all
}
