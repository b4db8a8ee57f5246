//! Data (point-distribution) cost. Grounded on
//! `imp_meshInfo.hpp::getQuantityOfInformation` for the `N_t` term; the
//! dispersion combinator (sum of squared deviations from the mean) is this
//! crate's resolution of the open formula question — see DESIGN.md.

use crate::connectivity::Connectivity;

/// Expected number of data points "belonging" to triangle `elem`:
/// `N_t = sum over d in elem2data[elem] of 1 / |data2elem[d]|`.
pub fn quantity_of_information(conn: &Connectivity, elem: usize) -> f64 {
    if !conn.is_data_mode() {
        return 0.0;
    }
    conn.elem2data(elem)
        .connected()
        .map(|d| {
            let patch = conn.data2elem(d).len();
            if patch == 0 {
                0.0
            } else {
                1.0 / patch as f64
            }
        })
        .sum()
}

/// Penalizes heterogeneity of `{N_t}` across the triangles touched by a
/// candidate collapse: sum of squared deviations from the mean, normalized
/// by triangle count so the cost does not grow with patch size alone.
pub fn data_cost(conn: &Connectivity, elems: &[usize]) -> f64 {
    if !conn.is_data_mode() || elems.is_empty() {
        return 0.0;
    }
    let values: Vec<f64> = elems
        .iter()
        .map(|&e| quantity_of_information(conn, e))
        .collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    sum_sq / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Boundary;
    use crate::mesh::Mesh;
    use nalgebra::Point3;

    #[test]
    fn uniform_distribution_has_zero_dispersion() {
        let mut mesh = Mesh::new();
        mesh.insert_node(Point3::new(0.0, 0.0, 0.0), Boundary::Interior);
        mesh.insert_node(Point3::new(1.0, 0.0, 0.0), Boundary::Interior);
        mesh.insert_node(Point3::new(0.0, 1.0, 0.0), Boundary::Interior);
        mesh.insert_elem([0, 1, 2], 0);
        mesh.insert_elem([1, 2, 0], 0);
        let mut conn = Connectivity::build(&mesh, 2, true);
        conn.set_data_link(0, 0);
        conn.set_data_link(1, 1);
        assert_eq!(data_cost(&conn, &[0, 1]), 0.0);
    }
}
