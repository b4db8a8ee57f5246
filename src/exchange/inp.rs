//! INP text format. Grounded on
//! `examples/original_source/new-code/include/implementation/imp_bmesh.hpp`
//! (`read_inp` / `print_inp`) for exact field layout and the 1-based to
//! 0-based id shift on read.

use std::fmt::Write as _;

use nalgebra::Point3;
use rayon::prelude::*;

use crate::error::{Result, SimplifyError};
use crate::geometry::Boundary;
use crate::mesh::Mesh;

fn malformed(line: usize, reason: impl Into<String>) -> SimplifyError {
    SimplifyError::MalformedInput {
        line,
        reason: reason.into(),
    }
}

pub fn read(data: &str) -> Result<Mesh> {
    let mut lines = data.lines().enumerate();

    let (header_no, header) = lines
        .next()
        .ok_or_else(|| malformed(0, "empty file: missing header line"))?;
    let parts: Vec<&str> = header.split_whitespace().collect();
    let [num_nodes_s, num_elems_s, ..] = parts.as_slice() else {
        return Err(malformed(header_no + 1, "header must have at least 2 fields"));
    };
    let num_nodes: usize = num_nodes_s
        .parse()
        .map_err(|_| malformed(header_no + 1, "numNodes is not an integer"))?;
    let num_elems: usize = num_elems_s
        .parse()
        .map_err(|_| malformed(header_no + 1, "numElems is not an integer"))?;

    let node_lines: Vec<(usize, &str)> = (0..num_nodes)
        .map(|_| {
            lines
                .next()
                .ok_or_else(|| malformed(0, "unexpected end of file while reading nodes"))
        })
        .collect::<Result<_>>()?;
    // Parsing each line is a pure, read-only computation, so it can be
    // dispatched across threads; only the resulting `insert_node` calls
    // below need to happen in id order.
    let parsed_nodes: Vec<Result<Point3<f64>>> = node_lines
        .par_iter()
        .map(|&(line_no, line)| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let [_id, x, y, z] = parts.as_slice() else {
                return Err(malformed(line_no + 1, "expected '<id> <x> <y> <z>'"));
            };
            Ok(Point3::new(
                x.parse().map_err(|_| malformed(line_no + 1, "bad x coordinate"))?,
                y.parse().map_err(|_| malformed(line_no + 1, "bad y coordinate"))?,
                z.parse().map_err(|_| malformed(line_no + 1, "bad z coordinate"))?,
            ))
        })
        .collect();

    let mut mesh = Mesh::new();
    for point in parsed_nodes {
        mesh.insert_node(point?, Boundary::Interior);
    }

    let elem_lines: Vec<(usize, &str)> = (0..num_elems)
        .map(|_| {
            lines
                .next()
                .ok_or_else(|| malformed(0, "unexpected end of file while reading elements"))
        })
        .collect::<Result<_>>()?;
    let parsed_elems: Vec<Result<([usize; 3], u32)>> = elem_lines
        .par_iter()
        .map(|&(line_no, line)| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let [_id, geo_id, kind, v1, v2, v3] = parts.as_slice() else {
                return Err(malformed(
                    line_no + 1,
                    "expected '<id> <geoId> tri <v1> <v2> <v3>'",
                ));
            };
            if *kind != "tri" {
                return Err(malformed(line_no + 1, format!("unsupported element kind {kind:?}")));
            }
            let geo_id: u32 = geo_id
                .parse()
                .map_err(|_| malformed(line_no + 1, "bad geoId"))?;
            let parse_vertex = |s: &str| -> Result<usize> {
                let raw: i64 = s.parse().map_err(|_| malformed(line_no + 1, "bad vertex id"))?;
                if raw < 1 {
                    return Err(malformed(line_no + 1, "vertex ids are 1-based"));
                }
                Ok((raw - 1) as usize)
            };
            let verts = [parse_vertex(v1)?, parse_vertex(v2)?, parse_vertex(v3)?];
            Ok((verts, geo_id))
        })
        .collect();

    for elem in parsed_elems {
        let (verts, geo_id) = elem?;
        mesh.insert_elem(verts, geo_id);
    }

    Ok(mesh)
}

pub fn write(mesh: &Mesh) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} 0 0 0", mesh.num_nodes(), mesh.num_elems());
    for node in mesh.active_nodes() {
        let _ = writeln!(
            out,
            "{} {} {} {}",
            node.id + 1,
            node.point.x,
            node.point.y,
            node.point.z
        );
    }
    for elem in mesh.active_elems() {
        let _ = writeln!(
            out,
            "{} {} tri {} {} {}",
            elem.id + 1,
            elem.geo_id,
            elem.verts[0] + 1,
            elem.verts[1] + 1,
            elem.verts[2] + 1
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TETRAHEDRON: &str = "4 4 0 0 0\n\
1 0 0 0\n\
2 1 0 0\n\
3 0 1 0\n\
4 0 0 1\n\
1 0 tri 1 2 3\n\
2 0 tri 1 2 4\n\
3 0 tri 1 3 4\n\
4 0 tri 2 3 4\n";

    #[test]
    fn reads_vertex_ids_as_zero_based() {
        let mesh = read(TETRAHEDRON).unwrap();
        assert_eq!(mesh.num_nodes(), 4);
        assert_eq!(mesh.num_elems(), 4);
        assert_eq!(mesh.elem(0).verts, [0, 1, 2]);
    }

    #[test]
    fn round_trips_through_write() {
        let mesh = read(TETRAHEDRON).unwrap();
        let text = write(&mesh);
        let reparsed = read(&text).unwrap();
        assert_eq!(reparsed.num_nodes(), mesh.num_nodes());
        assert_eq!(reparsed.num_elems(), mesh.num_elems());
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(read("oops").is_err());
    }
}
