//! End-to-end scenarios, named after the seed suite this system is tested
//! against: S1-S3, S5, S6. S4 (the pawn mesh) needs external fixtures not
//! shipped with this repo; see the ignored stub at the bottom.

use nalgebra::Point3;
use rmesh::config::CostConfig;
use rmesh::geometry::Boundary;
use rmesh::mesh::{self, Mesh};

fn tetrahedron() -> Mesh {
    let mut mesh = Mesh::new();
    mesh.insert_node(Point3::new(0.0, 0.0, 0.0), Boundary::Edge);
    mesh.insert_node(Point3::new(1.0, 0.0, 0.0), Boundary::Edge);
    mesh.insert_node(Point3::new(0.0, 1.0, 0.0), Boundary::Edge);
    mesh.insert_node(Point3::new(0.0, 0.0, 1.0), Boundary::Edge);
    mesh.insert_elem([0, 1, 2], 0);
    mesh.insert_elem([0, 1, 3], 0);
    mesh.insert_elem([0, 2, 3], 0);
    mesh.insert_elem([1, 2, 3], 0);
    mesh
}

#[test]
fn s1_tetrahedron_at_target_four_is_untouched() {
    let mesh = tetrahedron();
    let config = CostConfig::geometric(1e-10);
    let (out, report) = rmesh::simplify(mesh, config, 4, &[]).unwrap();
    assert_eq!(out.num_nodes(), 4);
    assert_eq!(out.num_elems(), 4);
    assert_eq!(report.committed_collapses, 0);
}

#[test]
fn s2_tetrahedron_to_three_vertices() {
    let mesh = tetrahedron();
    let config = CostConfig::geometric(1e-10);
    let (out, report) = rmesh::simplify(mesh, config, 3, &[]).unwrap();
    assert_eq!(out.num_nodes(), 3);
    assert_eq!(out.num_elems(), 2);
    assert_eq!(report.committed_collapses, 1);
    for elem in out.active_elems() {
        assert!(elem.verts.contains(&elem.verts[0]));
    }
}

#[test]
fn s3_unit_square_diagonal_collapses_to_one_triangle() {
    let mut mesh = Mesh::new();
    mesh.insert_node(Point3::new(0.0, 0.0, 0.0), Boundary::Edge); // a
    mesh.insert_node(Point3::new(1.0, 0.0, 0.0), Boundary::Edge); // b
    mesh.insert_node(Point3::new(1.0, 1.0, 0.0), Boundary::Edge); // c
    mesh.insert_node(Point3::new(0.0, 1.0, 0.0), Boundary::Edge); // d
    mesh.insert_elem([0, 1, 2], 0); // a b c
    mesh.insert_elem([0, 2, 3], 0); // a c d

    let config = CostConfig::geometric(1e-10);
    let (out, report) = rmesh::simplify(mesh, config, 3, &[]).unwrap();
    assert_eq!(out.num_nodes(), 3);
    assert_eq!(out.num_elems(), 1);
    assert_eq!(report.committed_collapses, 1);
}

/// A triangulated disk: one center vertex plus an 8-gon ring, fanned into 8
/// triangles. Boundary flags are derived from topology alone.
fn disk(n_ring: usize) -> Mesh {
    let mut mesh = Mesh::new();
    mesh.insert_node(Point3::new(0.0, 0.0, 0.0), Boundary::Interior);
    for i in 0..n_ring {
        let theta = 2.0 * std::f64::consts::PI * i as f64 / n_ring as f64;
        mesh.insert_node(Point3::new(theta.cos(), theta.sin(), 0.0), Boundary::Interior);
    }
    for i in 0..n_ring {
        let a = 1 + i;
        let b = 1 + (i + 1) % n_ring;
        mesh.insert_elem([0, a, b], 0);
    }
    mesh::assign_boundary_flags(&mut mesh);
    mesh
}

#[test]
fn s5_boundary_ring_stays_tagged_and_on_the_original_polygon() {
    let original = disk(8);
    let ring_points: Vec<Point3<f64>> = (1..=8).map(|i| original.node(i).point).collect();
    for i in 1..=8 {
        assert_eq!(original.node(i).boundary, Boundary::Edge);
    }

    let config = CostConfig::geometric(1e-10);
    let (out, _report) = rmesh::simplify(original, config, 7, &[]).unwrap();

    for node in out.active_nodes() {
        if node.boundary == Boundary::Edge {
            let on_polygon = ring_points
                .iter()
                .any(|rp| (rp - node.point).norm() < 1e-6);
            assert!(on_polygon, "boundary vertex drifted off the original ring");
        }
    }
}

#[test]
fn s6_self_intersection_is_rejected() {
    use rmesh::connectivity::Connectivity;
    use rmesh::legality::{check_collapse, LegalityFailure};
    use rmesh::spatial_index::SpatialIndex;

    // Triangle [0,2,3] is the one kept/rewritten by collapsing edge (0,1) to
    // `moved`; triangle [4,5,6] is its medial triangle (vertices at the
    // edge midpoints) and so is always fully contained in it, guaranteeing
    // overlap once vertex 0 relocates to `moved`.
    let moved = Point3::new(0.3, 0.3, 0.0);
    let b = Point3::new(1.0, 0.0, 0.0);
    let c = Point3::new(0.0, 1.0, 0.0);

    let mut mesh = Mesh::new();
    mesh.insert_node(Point3::new(0.0, 0.0, 0.0), Boundary::Interior); // 0, collapses to `moved`
    mesh.insert_node(Point3::new(-1.0, -1.0, 0.0), Boundary::Interior); // 1, the other endpoint
    mesh.insert_node(b, Boundary::Interior); // 2
    mesh.insert_node(c, Boundary::Interior); // 3
    mesh.insert_node(Point3::from((moved.coords + b.coords) * 0.5), Boundary::Interior); // 4
    mesh.insert_node(Point3::from((b.coords + c.coords) * 0.5), Boundary::Interior); // 5
    mesh.insert_node(Point3::from((c.coords + moved.coords) * 0.5), Boundary::Interior); // 6
    mesh.insert_elem([0, 2, 3], 0); // kept triangle, will move vertex 0 -> `moved`
    mesh.insert_elem([4, 5, 6], 0); // unrelated medial triangle, always inside the kept one
    // vertex 1 needs no incident element of its own for this check: it only
    // has to exist as the edge's other (deactivated) endpoint.

    let conn = Connectivity::build(&mesh, 0, false);
    let index = SpatialIndex::build(&mesh);
    let elems_to_keep = vec![0usize];

    let result = check_collapse(&mesh, &conn, &index, 0, 1, &moved, &elems_to_keep);
    assert_eq!(result, Err(LegalityFailure::SelfIntersection));
}

#[test]
#[ignore = "requires externally supplied mesh/pawn.inp and mesh/pawn_2000_033_033_033.inp fixtures"]
fn s4_pawn_mesh_matches_reference_output_byte_for_byte() {
    use rmesh::exchange::{self, MeshFormat};

    let input = std::fs::read_to_string("mesh/pawn.inp").expect("pawn.inp fixture not present");
    let expected = std::fs::read_to_string("mesh/pawn_2000_033_033_033.inp")
        .expect("reference output fixture not present");

    let mesh = exchange::read_mesh(&input, MeshFormat::Inp).unwrap();
    let weights = rmesh::Weights {
        geom: 0.33,
        disp: 0.33,
        equi: 0.34,
    };
    let config = CostConfig::combined(weights, 1e-10).unwrap();
    let (mut out, _report) = rmesh::simplify(mesh, config, 2000, &[]).unwrap();
    let actual = exchange::write_mesh(&mut out, MeshFormat::Inp);
    assert_eq!(actual, expected);
}
