//! node↔node, node↔element, element↔element (and, in data mode,
//! element↔data / data↔element) adjacency graphs, plus the one mutating
//! operation the driver needs: [`Connectivity::apply_edge_collapse`].

use std::collections::BTreeSet;

use crate::error::{Result, SimplifyError};
use crate::mesh::Mesh;

/// A vertex of a connectivity graph: its sorted set of neighbors. The id is
/// implicit (its index into `Connectivity`'s row vectors) and the active
/// flag is not duplicated here — `Mesh` is already the single source of
/// truth for node/element activity, so `GraphItem` only carries the
/// connection set the original source's `inline_graphItem.hpp` wraps
/// alongside those two fields. Equality/ordering follow the connection set.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct GraphItem {
    connected: BTreeSet<usize>,
}

impl GraphItem {
    pub fn connected(&self) -> impl Iterator<Item = usize> + '_ {
        self.connected.iter().copied()
    }

    pub fn contains(&self, other: usize) -> bool {
        self.connected.contains(&other)
    }

    pub fn insert(&mut self, other: usize) {
        self.connected.insert(other);
    }

    pub fn erase(&mut self, other: usize) {
        self.connected.remove(&other);
    }

    pub fn len(&self) -> usize {
        self.connected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connected.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Connectivity {
    node2node: Vec<GraphItem>,
    node2elem: Vec<GraphItem>,
    elem2elem: Vec<GraphItem>,
    elem2data: Vec<GraphItem>,
    data2elem: Vec<GraphItem>,
    data_mode: bool,
}

impl Connectivity {
    /// Build node2elem (O(E)) and node2node (O(E·9)) from scratch by
    /// scanning every active element once.
    pub fn build(mesh: &Mesh, num_data: usize, data_mode: bool) -> Self {
        let n = mesh.node_capacity();
        let e = mesh.elem_capacity();
        let mut node2elem = vec![GraphItem::default(); n];
        let mut elem2elem = vec![GraphItem::default(); e];

        for elem in mesh.active_elems() {
            for &v in &elem.verts {
                node2elem[v].insert(elem.id);
            }
        }

        let mut node2node = vec![GraphItem::default(); n];
        for elem in mesh.active_elems() {
            for &v in &elem.verts {
                for &u in &elem.verts {
                    if u != v {
                        node2node[v].insert(u);
                    }
                }
            }
        }

        for elem in mesh.active_elems() {
            let mut neighbors = BTreeSet::new();
            for &v in &elem.verts {
                for other in node2elem[v].connected() {
                    if other != elem.id {
                        neighbors.insert(other);
                    }
                }
            }
            elem2elem[elem.id].connected = neighbors;
        }

        let data2elem = vec![GraphItem::default(); if data_mode { num_data } else { 0 }];
        let elem2data = vec![GraphItem::default(); if data_mode { e } else { 0 }];

        Connectivity {
            node2node,
            node2elem,
            elem2elem,
            elem2data,
            data2elem,
            data_mode,
        }
    }

    pub fn node2node(&self, v: usize) -> &GraphItem {
        &self.node2node[v]
    }

    pub fn node2elem(&self, v: usize) -> &GraphItem {
        &self.node2elem[v]
    }

    pub fn elem2elem(&self, e: usize) -> &GraphItem {
        &self.elem2elem[e]
    }

    pub fn elem2data(&self, e: usize) -> &GraphItem {
        &self.elem2data[e]
    }

    pub fn data2elem(&self, d: usize) -> &GraphItem {
        &self.data2elem[d]
    }

    pub fn is_data_mode(&self) -> bool {
        self.data_mode
    }

    pub fn num_nodes(&self) -> usize {
        self.node2node.len()
    }

    pub fn num_elems(&self) -> usize {
        self.elem2elem.len()
    }

    /// Link datum `d` to element `e`, returning the previous link (if any)
    /// so callers can [`Connectivity::undo_data_link`] a speculative
    /// projection.
    pub fn set_data_link(&mut self, d: usize, e: usize) -> Option<usize> {
        let previous = self.data2elem[d].connected().next();
        if let Some(prev) = previous {
            self.elem2data[prev].erase(d);
        }
        self.data2elem[d] = GraphItem::default();
        self.data2elem[d].insert(e);
        self.elem2data[e].insert(d);
        previous
    }

    pub fn undo_data_link(&mut self, d: usize, previous: Option<usize>) {
        if let Some(cur) = self.data2elem[d].connected().next() {
            self.elem2data[cur].erase(d);
        }
        self.data2elem[d] = GraphItem::default();
        if let Some(prev) = previous {
            self.data2elem[d].insert(prev);
            self.elem2data[prev].insert(d);
        }
    }

    /// Rewire connectivity after the driver has merged `removed` into
    /// `kept`. `mesh` must already reflect `kept`'s new position; this call
    /// performs the vertex-tuple rewrite on `elems_to_keep` itself.
    ///
    /// Steps 1-4 follow the contract verbatim:
    /// 1. deactivate `elems_to_remove`, dropping them from node2elem;
    /// 2. rewrite `removed -> kept` on `elems_to_keep`, in both the mesh and
    ///    node2elem;
    /// 3. recompute node2node for `kept` and every vertex still adjacent to
    ///    the touched elements;
    /// 4. deactivate `removed` (its id stays valid, just inactive).
    pub fn apply_edge_collapse(
        &mut self,
        mesh: &mut Mesh,
        removed: usize,
        kept: usize,
        elems_to_remove: &[usize],
        elems_to_keep: &[usize],
    ) -> Result<()> {
        for &e in elems_to_remove {
            mesh.set_elem_active(e, false);
            let verts = mesh.elem(e).verts;
            for v in verts {
                self.node2elem[v].erase(e);
            }
            self.elem2elem[e] = GraphItem::default();
        }

        for &e in elems_to_keep {
            mesh.replace_vertex(e, removed, kept)?;
            self.node2elem[removed].erase(e);
            self.node2elem[kept].insert(e);
        }

        let mut touched_verts: BTreeSet<usize> = BTreeSet::new();
        touched_verts.insert(kept);
        for &e in elems_to_keep.iter().chain(elems_to_remove.iter()) {
            for &v in &mesh.elem(e).verts {
                touched_verts.insert(v);
            }
        }
        touched_verts.remove(&removed);

        for v in touched_verts {
            let mut row = BTreeSet::new();
            for elem_id in self.node2elem[v].connected() {
                if !mesh.elem(elem_id).active {
                    continue;
                }
                for &u in &mesh.elem(elem_id).verts {
                    if u != v {
                        row.insert(u);
                    }
                }
            }
            self.node2node[v].connected = row;
        }
        self.node2node[removed] = GraphItem::default();
        for row in self.node2node.iter_mut() {
            row.erase(removed);
        }

        // Recompute elem2elem for elements touched by the merge.
        for &e in elems_to_keep {
            let mut neighbors = BTreeSet::new();
            for &v in &mesh.elem(e).verts {
                for other in self.node2elem[v].connected() {
                    if other != e {
                        neighbors.insert(other);
                    }
                }
            }
            self.elem2elem[e].connected = neighbors;
        }
        for row in self.elem2elem.iter_mut() {
            for &e in elems_to_remove {
                row.erase(e);
            }
        }

        mesh.set_node_active(removed, false);
        Ok(())
    }

    /// Elements incident to either endpoint of the edge, split into those
    /// incident to both (to be removed) and those incident to exactly one
    /// (to be kept and rewritten).
    pub fn elems_on_edge(&self, id1: usize, id2: usize) -> (Vec<usize>, Vec<usize>) {
        let a: BTreeSet<usize> = self.node2elem[id1].connected().collect();
        let b: BTreeSet<usize> = self.node2elem[id2].connected().collect();
        let to_remove: Vec<usize> = a.intersection(&b).copied().collect();
        let to_keep: Vec<usize> = a.symmetric_difference(&b).copied().collect();
        (to_remove, to_keep)
    }

    /// Union of `elem2data` across a set of elements (DATA mode).
    pub fn data_involved_in(&self, elems: &[usize]) -> Vec<usize> {
        if !self.data_mode {
            return Vec::new();
        }
        let mut set = BTreeSet::new();
        for &e in elems {
            set.extend(self.elem2data[e].connected());
        }
        set.into_iter().collect()
    }

    /// Data whose *every* connected element lies inside `elems` — i.e. data
    /// that does not straddle the boundary of the affected patch. Grounded
    /// on `getDataModifiedInEdgeCollapsing` in the original source.
    pub fn data_modified_in(&self, elems: &[usize]) -> Vec<usize> {
        if !self.data_mode {
            return Vec::new();
        }
        let elems_set: BTreeSet<usize> = elems.iter().copied().collect();
        self.data_involved_in(elems)
            .into_iter()
            .filter(|&d| {
                self.data2elem[d]
                    .connected()
                    .all(|e| elems_set.contains(&e))
            })
            .collect()
    }

    pub fn invariant_violation(context: &str) -> SimplifyError {
        SimplifyError::InvariantViolation(context.to_string())
    }
}
