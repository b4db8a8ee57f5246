//! Re-attaches data points to the nearest triangle of an affected patch,
//! with undo support for speculative (evaluate-then-revert) use by the cost
//! model. Grounded on the projection/undo sequence in
//! `examples/original_source/new-code/test/main_projection.cpp`.

use nalgebra::Point3;

use crate::connectivity::Connectivity;
use crate::geometry::closest_point_on_triangle;
use crate::mesh::Mesh;

/// One link change, sufficient to reverse a single [`project_datum`] call.
pub struct ProjectionRecord {
    pub datum: usize,
    pub previous: Option<usize>,
}

/// Find the triangle among `candidates` minimizing distance to `p`,
/// following spec §4.7: orthogonal projection onto the plane, falling back
/// to the closest edge/vertex when the foot lies outside the triangle.
pub fn closest_triangle(mesh: &Mesh, candidates: &[usize], p: &Point3<f64>) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .map(|e| {
            let verts = mesh.elem(e).verts;
            let (_, d2) = closest_point_on_triangle(
                p,
                &mesh.node(verts[0]).point,
                &mesh.node(verts[1]).point,
                &mesh.node(verts[2]).point,
            );
            (e, d2)
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).expect("distances are never NaN"))
        .map(|(e, _)| e)
}

/// Project one datum onto the closest of `candidates`, writing the new link
/// into both directions of the connectivity graph and returning a record
/// that [`undo_projection`] can roll back.
pub fn project_datum(
    mesh: &Mesh,
    conn: &mut Connectivity,
    data_point: &Point3<f64>,
    datum: usize,
    candidates: &[usize],
) -> Option<ProjectionRecord> {
    let chosen = closest_triangle(mesh, candidates, data_point)?;
    let previous = conn.set_data_link(datum, chosen);
    Some(ProjectionRecord { datum, previous })
}

pub fn undo_projection(conn: &mut Connectivity, record: &ProjectionRecord) {
    conn.undo_data_link(record.datum, record.previous);
}

pub fn undo_all(conn: &mut Connectivity, records: &[ProjectionRecord]) {
    for record in records.iter().rev() {
        undo_projection(conn, record);
    }
}

/// Re-project every datum associated with the patch (`elems_to_remove ∪
/// elems_to_keep`) that does not straddle its boundary, onto the nearest
/// triangle of `elems_to_keep`. Returns the undo log.
pub fn reproject_patch(
    mesh: &Mesh,
    conn: &mut Connectivity,
    data_positions: &[Point3<f64>],
    elems_to_remove: &[usize],
    elems_to_keep: &[usize],
) -> Vec<ProjectionRecord> {
    if !conn.is_data_mode() {
        return Vec::new();
    }
    let touched: Vec<usize> = elems_to_remove
        .iter()
        .chain(elems_to_keep.iter())
        .copied()
        .collect();
    let data = conn.data_modified_in(&touched);
    let mut records = Vec::with_capacity(data.len());
    for datum in data {
        if let Some(record) =
            project_datum(mesh, conn, &data_positions[datum], datum, elems_to_keep)
        {
            records.push(record);
        }
    }
    records
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
    fn project_then_undo_restores_previous_link() {
        let mesh = two_triangle_square();
        let mut conn = Connectivity::build(&mesh, 1, true);
        conn.set_data_link(0, 0);
        let p = Point3::new(0.1, 0.9, 0.0);
        let record = project_datum(&mesh, &mut conn, &p, 0, &[1]).unwrap();
        assert_eq!(conn.data2elem(0).connected().next(), Some(1));
        undo_projection(&mut conn, &record);
        assert_eq!(conn.data2elem(0).connected().next(), Some(0));
    }

    #[test]
    fn closest_triangle_picks_the_nearer_one() {
        let mesh = two_triangle_square();
        let p = Point3::new(0.1, 0.1, 0.0);
        let chosen = closest_triangle(&mesh, &[0, 1], &p).unwrap();
        assert_eq!(chosen, 0);
    }
}
