//! VTK legacy ASCII format (the subset this system reads/writes: points and
//! triangle cells tagged with a region id). Grounded on
//! `imp_bmesh.hpp::read_vtk` / `print_vtk`.
//!
//! Blank lines inside the POINTS/CELLS regions are not supported — read
//! rejects them with `MalformedInput` rather than silently skipping, per
//! the restriction noted against the original source (spec Design Notes).

use std::fmt::Write as _;

use itertools::Itertools;
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
    let all_lines: Vec<&str> = data.lines().collect();
    if all_lines.len() < 5 {
        return Err(malformed(0, "file shorter than the fixed 4-line header"));
    }
    let mut cursor = 4usize; // skip the four fixed header lines

    let points_header = all_lines[cursor];
    cursor += 1;
    let header_parts: Vec<&str> = points_header.split_whitespace().collect();
    let [tag, n_points_s, ..] = header_parts.as_slice() else {
        return Err(malformed(cursor, "expected 'POINTS n float'"));
    };
    if *tag != "POINTS" {
        return Err(malformed(cursor, "expected a POINTS header"));
    }
    let n_points: usize = n_points_s
        .parse()
        .map_err(|_| malformed(cursor, "bad POINTS count"))?;

    let mut coords: Vec<f64> = Vec::with_capacity(n_points * 3);
    while coords.len() < n_points * 3 {
        let line = all_lines
            .get(cursor)
            .ok_or_else(|| malformed(cursor, "unexpected end of file while reading points"))?;
        cursor += 1;
        if line.trim().is_empty() {
            return Err(malformed(cursor, "blank lines are not supported in POINTS"));
        }
        for tok in line.split_whitespace() {
            let v: f64 = tok
                .parse()
                .map_err(|_| malformed(cursor, "bad coordinate value"))?;
            coords.push(v);
        }
    }
    if coords.len() != n_points * 3 {
        return Err(malformed(cursor, "POINTS line(s) overshot the declared count"));
    }

    let mut mesh = Mesh::new();
    for (x, y, z) in coords.into_iter().tuples::<(f64, f64, f64)>() {
        mesh.insert_node(Point3::new(x, y, z), Boundary::Interior);
    }

    let cells_header = all_lines
        .get(cursor)
        .ok_or_else(|| malformed(cursor, "missing CELLS header"))?;
    cursor += 1;
    let cell_parts: Vec<&str> = cells_header.split_whitespace().collect();
    let [tag, n_cells_s, ..] = cell_parts.as_slice() else {
        return Err(malformed(cursor, "expected a CELLS header"));
    };
    if *tag != "CELLS" {
        return Err(malformed(cursor, "expected a CELLS header"));
    }
    let n_cells: usize = n_cells_s
        .parse()
        .map_err(|_| malformed(cursor, "bad CELLS count"))?;

    let mut cell_lines: Vec<(usize, &str)> = Vec::with_capacity(n_cells);
    for _ in 0..n_cells {
        let line = all_lines
            .get(cursor)
            .ok_or_else(|| malformed(cursor, "unexpected end of file while reading cells"))?;
        if line.trim().is_empty() {
            return Err(malformed(cursor, "blank lines are not supported in CELLS"));
        }
        cell_lines.push((cursor, line));
        cursor += 1;
    }
    // Parsing a CELLS line is a pure read of already-gathered text, so the
    // per-line work is dispatched across threads; only the resulting
    // `insert_elem` calls below need to happen in id order.
    let parsed_cells: Vec<Result<([usize; 3], u32)>> = cell_lines
        .par_iter()
        .map(|&(line_no, line)| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let [geo_id, v1, v2, v3] = parts.as_slice() else {
                return Err(malformed(line_no, "expected '<geoId> <v1> <v2> <v3>'"));
            };
            let geo_id: u32 = geo_id.parse().map_err(|_| malformed(line_no, "bad geoId"))?;
            // Already zero-based per the original source's convention.
            let parse_vertex = |s: &str| -> Result<usize> {
                s.parse().map_err(|_| malformed(line_no, "bad vertex id"))
            };
            let verts = [parse_vertex(v1)?, parse_vertex(v2)?, parse_vertex(v3)?];
            Ok((verts, geo_id))
        })
        .collect();

    for cell in parsed_cells {
        let (verts, geo_id) = cell?;
        mesh.insert_elem(verts, geo_id);
    }

    Ok(mesh)
}

pub fn write(mesh: &Mesh) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# vtk DataFile Version 3.0");
    let _ = writeln!(out, "rmesh output");
    let _ = writeln!(out, "ASCII");
    let _ = writeln!(out, "DATASET UNSTRUCTURED_GRID");
    let _ = writeln!(out, "POINTS {} float", mesh.num_nodes());
    for node in mesh.active_nodes() {
        let _ = writeln!(out, "{} {} {}", node.point.x, node.point.y, node.point.z);
    }
    let _ = writeln!(out, "CELLS {} {}", mesh.num_elems(), mesh.num_elems() * 4);
    for elem in mesh.active_elems() {
        let _ = writeln!(
            out,
            "{} {} {} {}",
            elem.geo_id, elem.verts[0], elem.verts[1], elem.verts[2]
        );
    }
    let _ = writeln!(out, "CELL_TYPES {}", mesh.num_elems());
    for _ in mesh.active_elems() {
        let _ = writeln!(out, "5"); // VTK_TRIANGLE
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "header\nheader\nheader\nheader\n\
POINTS 4 float\n\
0 0 0\n1 0 0\n1 1 0\n0 1 0\n\
CELLS 2 8\n\
0 0 1 2\n0 0 2 3\n";

    #[test]
    fn reads_points_and_cells_zero_based() {
        let mesh = read(SQUARE).unwrap();
        assert_eq!(mesh.num_nodes(), 4);
        assert_eq!(mesh.num_elems(), 2);
        assert_eq!(mesh.elem(1).verts, [0, 2, 3]);
    }

    #[test]
    fn round_trips_through_write() {
        let mesh = read(SQUARE).unwrap();
        let text = write(&mesh);
        let reparsed = read(&text).unwrap();
        assert_eq!(reparsed.num_nodes(), mesh.num_nodes());
        assert_eq!(reparsed.num_elems(), mesh.num_elems());
    }

    #[test]
    fn blank_line_in_points_is_rejected() {
        let bad = "h\nh\nh\nh\nPOINTS 1 float\n\n0 0 0\nCELLS 0 0\n";
        assert!(read(bad).is_err());
    }
}
