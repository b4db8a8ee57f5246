//! Weighted combination of the geometric, data, and equilateral-quality
//! terms. Weights (w_geom, w_disp, w_equi) are spec-named but the spec only
//! formula-defines the first two; `equi_cost` below is this crate's
//! resolution of the third (see DESIGN.md Open Questions).

use nalgebra::Point3;

use crate::error::{Result, SimplifyError};
use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub geom: f64,
    pub disp: f64,
    pub equi: f64,
}

impl Weights {
    /// Weights must be non-negative and sum to 1.0 (spec's construction
    /// contract for combined-mode weights).
    pub fn validated(self) -> Result<Self> {
        let sum = self.geom + self.disp + self.equi;
        if (sum - 1.0).abs() < 1e-9 && self.geom >= 0.0 && self.disp >= 0.0 && self.equi >= 0.0 {
            Ok(self)
        } else {
            Err(SimplifyError::InvariantViolation(format!(
                "combined-cost weights must be non-negative and sum to 1.0, got \
                 geom={}, disp={}, equi={} (sum={sum})",
                self.geom, self.disp, self.equi
            )))
        }
    }
}

/// `1 - quality` summed over `elems_to_keep` as they would appear after the
/// candidate vertex (`removed` replaced by `kept_point`) is applied.
/// Quality is the standard normalized equilateral measure
/// `4*sqrt(3)*area / (e0^2+e1^2+e2^2)`, 1 for an equilateral triangle and 0
/// in the degenerate limit.
pub fn equi_cost(
    mesh: &Mesh,
    elems_to_keep: &[usize],
    removed: usize,
    kept: usize,
    kept_point: &Point3<f64>,
) -> f64 {
    if elems_to_keep.is_empty() {
        return 0.0;
    }
    let position_of = |v: usize| -> Point3<f64> {
        if v == removed || v == kept {
            *kept_point
        } else {
            mesh.node(v).point
        }
    };
    let mut total = 0.0;
    for &e in elems_to_keep {
        let verts = mesh.elem(e).verts;
        let p: [Point3<f64>; 3] = verts.map(position_of);
        total += 1.0 - triangle_quality(&p[0], &p[1], &p[2]);
    }
    total / elems_to_keep.len() as f64
}

fn triangle_quality(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let area2 = crate::geometry::triangle_double_area(a, b, c);
    let e0 = (b - a).norm_squared();
    let e1 = (c - b).norm_squared();
    let e2 = (a - c).norm_squared();
    let denom = e0 + e1 + e2;
    if denom < 1e-15 {
        return 0.0;
    }
    (2.0 * 3f64.sqrt() * area2 / denom).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equilateral_triangle_has_unit_quality() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.5, 3f64.sqrt() / 2.0, 0.0);
        assert!((triangle_quality(&a, &b, &c) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let w = Weights {
            geom: 0.5,
            disp: 0.5,
            equi: 0.5,
        };
        assert!(w.validated().is_err());
    }
}
