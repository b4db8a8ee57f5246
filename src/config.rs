//! Cost-model selection and the numerical tolerance used by the candidate
//! optimum-point solve. The default mirrors the original source's `TOLL`.

pub use crate::cost::{CostMode, Weights};
use crate::error::Result;

pub const DEFAULT_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy)]
pub struct CostConfig {
    pub mode: CostMode,
    pub projection: bool,
    pub tolerance: f64,
}

impl CostConfig {
    pub fn geometric(tolerance: f64) -> Self {
        CostConfig {
            mode: CostMode::Geometric,
            projection: false,
            tolerance,
        }
    }

    pub fn data(tolerance: f64) -> Self {
        CostConfig {
            mode: CostMode::Data,
            projection: true,
            tolerance,
        }
    }

    pub fn combined(weights: Weights, tolerance: f64) -> Result<Self> {
        let weights = weights.validated()?;
        Ok(CostConfig {
            mode: CostMode::Combined(weights),
            projection: true,
            tolerance,
        })
    }
}

/// Resolve the tolerance from an explicit override, falling back to the
/// `MESH_TOL` environment variable and then [`DEFAULT_TOLERANCE`]. Reading
/// the environment is the CLI's job; the library never does this itself
/// (spec §9's guidance against ambient process-wide state).
pub fn resolve_tolerance(explicit: Option<f64>) -> f64 {
    explicit
        .or_else(|| std::env::var("MESH_TOL").ok().and_then(|s| s.parse().ok()))
        .unwrap_or(DEFAULT_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_tolerance_wins_over_everything() {
        assert_eq!(resolve_tolerance(Some(0.5)), 0.5);
    }
}
