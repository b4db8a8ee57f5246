//! Uniform-grid spatial index over triangle bounding boxes, used by the
//! self-intersection legality check. Grid parameters (origin, cell size)
//! are instance fields, not process-wide statics — see DESIGN.md's Open
//! Questions for why that deviates from the source this is grounded on.

use ahash::{AHashMap, AHashSet};
use nalgebra::Point3;

use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellBox {
    pub lo: [i64; 3],
    pub hi: [i64; 3],
}

impl CellBox {
    fn cells(&self) -> impl Iterator<Item = [i64; 3]> + '_ {
        let (lo, hi) = (self.lo, self.hi);
        (lo[0]..=hi[0]).flat_map(move |x| {
            (lo[1]..=hi[1]).flat_map(move |y| (lo[2]..=hi[2]).map(move |z| [x, y, z]))
        })
    }
}

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    origin: Point3<f64>,
    cell_size: [f64; 3],
    boxes: AHashMap<usize, CellBox>,
    cells: AHashMap<[i64; 3], AHashSet<usize>>,
}

impl SpatialIndex {
    /// Derive grid parameters from the mesh extents so cell size ≈ average
    /// edge length, then index every active triangle.
    pub fn build(mesh: &Mesh) -> Self {
        let mut lo = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut hi = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for node in mesh.active_nodes() {
            for k in 0..3 {
                lo[k] = lo[k].min(node.point[k]);
                hi[k] = hi[k].max(node.point[k]);
            }
        }
        if !lo.x.is_finite() {
            lo = Point3::origin();
            hi = Point3::origin();
        }

        let avg_edge = average_edge_length(mesh).max(1e-6);
        let cell_size = [avg_edge, avg_edge, avg_edge];

        let mut index = SpatialIndex {
            origin: lo,
            cell_size,
            boxes: AHashMap::default(),
            cells: AHashMap::default(),
        };
        let _ = hi;
        let ids: Vec<usize> = mesh.active_elems().map(|e| e.id).collect();
        index.insert_all(mesh, &ids);
        index
    }

    fn cell_of(&self, p: &Point3<f64>) -> [i64; 3] {
        std::array::from_fn(|k| {
            ((p[k] - self.origin[k]) / self.cell_size[k]).floor() as i64
        })
    }

    fn bbox_of(&self, mesh: &Mesh, elem_id: usize) -> CellBox {
        let elem = mesh.elem(elem_id);
        let pts = elem.verts.map(|v| mesh.node(v).point);
        let cells = pts.map(|p| self.cell_of(&p));
        let mut lo = cells[0];
        let mut hi = cells[0];
        for c in &cells[1..] {
            for k in 0..3 {
                lo[k] = lo[k].min(c[k]);
                hi[k] = hi[k].max(c[k]);
            }
        }
        CellBox { lo, hi }
    }

    fn insert_all(&mut self, mesh: &Mesh, ids: &[usize]) {
        for &id in ids {
            let bbox = self.bbox_of(mesh, id);
            for cell in bbox.cells() {
                self.cells.entry(cell).or_default().insert(id);
            }
            self.boxes.insert(id, bbox);
        }
    }

    /// Element ids whose bounding box overlaps `elem_id`'s, excluding
    /// `elem_id` itself.
    pub fn neighbors(&self, elem_id: usize) -> Vec<usize> {
        let Some(bbox) = self.boxes.get(&elem_id) else {
            return Vec::new();
        };
        let mut found = AHashSet::default();
        for cell in bbox.cells() {
            if let Some(ids) = self.cells.get(&cell) {
                found.extend(ids.iter().copied());
            }
        }
        found.remove(&elem_id);
        found.into_iter().collect()
    }

    pub fn erase(&mut self, ids: &[usize]) {
        for &id in ids {
            if let Some(bbox) = self.boxes.remove(&id) {
                for cell in bbox.cells() {
                    if let Some(set) = self.cells.get_mut(&cell) {
                        set.remove(&id);
                        if set.is_empty() {
                            self.cells.remove(&cell);
                        }
                    }
                }
            }
        }
    }

    pub fn update(&mut self, mesh: &Mesh, ids: &[usize]) {
        self.erase(ids);
        self.insert_all(mesh, ids);
    }

    /// Remove `to_remove` from the index and recompute bounding boxes for
    /// `to_keep` (their vertex positions or tuples may have changed).
    pub fn update_after_collapse(&mut self, mesh: &Mesh, to_remove: &[usize], to_keep: &[usize]) {
        self.erase(to_remove);
        self.update(mesh, to_keep);
    }
}

fn average_edge_length(mesh: &Mesh) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for elem in mesh.active_elems() {
        for i in 0..3 {
            let a = mesh.node(elem.verts[i]).point;
            let b = mesh.node(elem.verts[(i + 1) % 3]).point;
            total += (b - a).norm();
            count += 1;
        }
    }
    if count == 0 {
        1.0
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Boundary;

    fn two_triangle_square() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.insert_node(Point3::new(0.0, 0.0, 0.0), Boundary::Edge);
        mesh.insert_node(Point3::new(1.0, 0.0, 0.0), Boundary::Edge);
        mesh.insert_node(Point3::new(1.0, 1.0, 0.0), Boundary::Edge);
        mesh.insert_node(Point3::new(0.0, 1.0, 0.0), Boundary::Edge);
        mesh.insert_elem([0, 1, 2], 0);
        mesh.insert_elem([0, 2, 3], 0);
        mesh
    }

    #[test]
    fn adjacent_triangles_are_neighbors() {
        let mesh = two_triangle_square();
        let index = SpatialIndex::build(&mesh);
        let neighbors = index.neighbors(0);
        assert!(neighbors.contains(&1));
    }

    #[test]
    fn erase_removes_from_all_cells() {
        let mesh = two_triangle_square();
        let mut index = SpatialIndex::build(&mesh);
        index.erase(&[0]);
        assert!(index.neighbors(1).is_empty());
    }
}
