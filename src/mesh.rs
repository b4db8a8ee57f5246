//! The mesh store: arrays of nodes and triangles with soft (active-flag)
//! deletion. Ids are stable array indices until an explicit [`Mesh::refresh`].

use nalgebra::Point3;

use crate::error::{Result, SimplifyError};
use crate::geometry::Boundary;

#[derive(Debug, Clone)]
pub struct Node {
    pub id: usize,
    pub point: Point3<f64>,
    pub boundary: Boundary,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct Triangle {
    pub id: usize,
    pub verts: [usize; 3],
    pub geo_id: u32,
    pub active: bool,
    pub bucket: Option<usize>,
}

impl Triangle {
    pub fn has_vertex(&self, v: usize) -> bool {
        self.verts.contains(&v)
    }
}

/// Array-of-structs mesh store. Erasure is soft: the active flag is cleared
/// and a live count decremented; the backing `Vec`s are only compacted by
/// [`Mesh::refresh`] or on output.
#[derive(Debug, Clone)]
pub struct Mesh {
    nodes: Vec<Node>,
    elems: Vec<Triangle>,
    live_nodes: usize,
    live_elems: usize,
}

impl Mesh {
    pub fn new() -> Self {
        Mesh {
            nodes: Vec::new(),
            elems: Vec::new(),
            live_nodes: 0,
            live_elems: 0,
        }
    }

    pub fn from_parts(nodes: Vec<Node>, elems: Vec<Triangle>) -> Self {
        let live_nodes = nodes.iter().filter(|n| n.active).count();
        let live_elems = elems.iter().filter(|e| e.active).count();
        Mesh {
            nodes,
            elems,
            live_nodes,
            live_elems,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.live_nodes
    }

    pub fn num_elems(&self) -> usize {
        self.live_elems
    }

    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn elem_capacity(&self) -> usize {
        self.elems.len()
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: usize) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn elem(&self, id: usize) -> &Triangle {
        &self.elems[id]
    }

    pub fn elem_mut(&mut self, id: usize) -> &mut Triangle {
        &mut self.elems[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elems(&self) -> &[Triangle] {
        &self.elems
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.active)
    }

    pub fn active_elems(&self) -> impl Iterator<Item = &Triangle> {
        self.elems.iter().filter(|e| e.active)
    }

    pub fn insert_node(&mut self, point: Point3<f64>, boundary: Boundary) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            point,
            boundary,
            active: true,
        });
        self.live_nodes += 1;
        id
    }

    pub fn insert_elem(&mut self, verts: [usize; 3], geo_id: u32) -> usize {
        let id = self.elems.len();
        self.elems.push(Triangle {
            id,
            verts,
            geo_id,
            active: true,
            bucket: None,
        });
        self.live_elems += 1;
        id
    }

    pub fn set_node_active(&mut self, id: usize, active: bool) {
        let node = &mut self.nodes[id];
        if node.active != active {
            self.live_nodes = if active {
                self.live_nodes + 1
            } else {
                self.live_nodes - 1
            };
        }
        node.active = active;
    }

    pub fn set_elem_active(&mut self, id: usize, active: bool) {
        let elem = &mut self.elems[id];
        if elem.active != active {
            self.live_elems = if active {
                self.live_elems + 1
            } else {
                self.live_elems - 1
            };
        }
        elem.active = active;
    }

    /// Rewrite one vertex slot of element `elem` from `old` to `new`.
    /// Fails if `old` is not currently a vertex of `elem`.
    pub fn replace_vertex(&mut self, elem: usize, old: usize, new: usize) -> Result<()> {
        let verts = &mut self.elems[elem].verts;
        match verts.iter().position(|&v| v == old) {
            Some(slot) => {
                verts[slot] = new;
                Ok(())
            }
            None => Err(SimplifyError::InvariantViolation(format!(
                "element {elem} has no vertex {old} to replace"
            ))),
        }
    }

    /// Compact inactive nodes and elements, remapping ids to a contiguous
    /// `0..N` range. Grounded on `bmesh::refresh()` in the original source.
    pub fn refresh(&mut self) {
        let mut old2new_node = vec![None; self.nodes.len()];
        let mut new_nodes = Vec::with_capacity(self.live_nodes);
        for node in &self.nodes {
            if node.active {
                old2new_node[node.id] = Some(new_nodes.len());
                let mut remapped = node.clone();
                remapped.id = new_nodes.len();
                new_nodes.push(remapped);
            }
        }

        let mut new_elems = Vec::with_capacity(self.live_elems);
        for elem in &self.elems {
            if !elem.active {
                continue;
            }
            let mut remapped = elem.clone();
            remapped.id = new_elems.len();
            for v in remapped.verts.iter_mut() {
                *v = old2new_node[*v].expect("active element referenced an inactive node");
            }
            new_elems.push(remapped);
        }

        self.nodes = new_nodes;
        self.elems = new_elems;
        self.live_nodes = self.nodes.len();
        self.live_elems = self.elems.len();
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify every active node's boundary flag from the mesh topology alone:
/// an edge shared by exactly one active triangle is a boundary edge; a
/// vertex touching exactly two boundary edges is `Edge`, touching more than
/// two (three or more boundary curves meeting) is `Triple`, and touching
/// none is `Interior`. Grounded on the border-detection pass of the
/// teacher's `simplify::Simplifier::update_mesh`.
pub fn assign_boundary_flags(mesh: &mut Mesh) {
    use std::collections::HashMap;

    let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
    for elem in mesh.active_elems() {
        for i in 0..3 {
            let a = elem.verts[i];
            let b = elem.verts[(i + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };
            *edge_count.entry(key).or_insert(0) += 1;
        }
    }

    let mut boundary_touches: HashMap<usize, usize> = HashMap::new();
    for (&(a, b), &count) in &edge_count {
        if count == 1 {
            *boundary_touches.entry(a).or_insert(0) += 1;
            *boundary_touches.entry(b).or_insert(0) += 1;
        }
    }

    let ids: Vec<usize> = mesh.active_nodes().map(|n| n.id).collect();
    for id in ids {
        let touches = boundary_touches.get(&id).copied().unwrap_or(0);
        mesh.node_mut(id).boundary = match touches {
            0 => Boundary::Interior,
            2 => Boundary::Edge,
            _ => Boundary::Triple,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.insert_node(Point3::new(0.0, 0.0, 0.0), Boundary::Edge);
        mesh.insert_node(Point3::new(1.0, 0.0, 0.0), Boundary::Edge);
        mesh.insert_node(Point3::new(0.0, 1.0, 0.0), Boundary::Edge);
        mesh.insert_elem([0, 1, 2], 0);
        mesh
    }

    #[test]
    fn soft_delete_decrements_live_count_without_shrinking_storage() {
        let mut mesh = unit_triangle();
        assert_eq!(mesh.num_nodes(), 3);
        mesh.set_node_active(0, false);
        assert_eq!(mesh.num_nodes(), 2);
        assert_eq!(mesh.node_capacity(), 3);
    }

    #[test]
    fn refresh_compacts_and_remaps_ids() {
        let mut mesh = unit_triangle();
        mesh.insert_node(Point3::new(5.0, 5.0, 5.0), Boundary::Interior);
        mesh.set_node_active(0, false);
        mesh.set_elem_active(0, false);
        mesh.refresh();
        assert_eq!(mesh.node_capacity(), 3);
        assert_eq!(mesh.elem_capacity(), 0);
        assert_eq!(mesh.node(0).point, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn replace_vertex_fails_when_old_is_absent() {
        let mut mesh = unit_triangle();
        assert!(mesh.replace_vertex(0, 99, 1).is_err());
    }
}
