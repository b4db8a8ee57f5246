//! Edge-collapse simplification of triangulated surface meshes: connectivity
//! maintenance, quadric/data/combined cost models, legality checks, and data
//! re-projection driving a priority-queue-based simplification loop.

pub mod config;
pub mod connectivity;
pub mod cost;
pub mod driver;
pub mod error;
pub mod exchange;
pub mod geometry;
pub mod legality;
pub mod mesh;
pub mod projection;
pub mod spatial_index;

pub use config::CostConfig;
pub use cost::{CostMode, Weights};
pub use driver::{simplify, SimplifyReport};
pub use error::{Result, SimplifyError};
pub use mesh::Mesh;
