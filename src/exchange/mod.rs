//! Mesh file I/O dispatch, grounded on the teacher's
//! `crates/rmesh/src/exchange/mod.rs` (`MeshFormat`, `load_mesh`) pattern.

pub mod inp;
pub mod vtk;

use crate::error::{Result, SimplifyError};
use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Inp,
    Vtk,
}

impl MeshFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "inp" => Ok(MeshFormat::Inp),
            "vtk" => Ok(MeshFormat::Vtk),
            other => Err(SimplifyError::UnknownFormat {
                extension: Some(other.to_string()),
            }),
        }
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => Err(SimplifyError::UnknownFormat { extension: None }),
        }
    }
}

pub fn read_mesh(data: &str, format: MeshFormat) -> Result<Mesh> {
    let mut mesh = match format {
        MeshFormat::Inp => inp::read(data)?,
        MeshFormat::Vtk => vtk::read(data)?,
    };
    crate::mesh::assign_boundary_flags(&mut mesh);
    Ok(mesh)
}

/// Compact the mesh (dropping inactive nodes/elements) and serialize it.
pub fn write_mesh(mesh: &mut Mesh, format: MeshFormat) -> String {
    if mesh.num_nodes() != mesh.node_capacity() || mesh.num_elems() != mesh.elem_capacity() {
        mesh.refresh();
    }
    match format {
        MeshFormat::Inp => inp::write(mesh),
        MeshFormat::Vtk => vtk::write(mesh),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_and_dot_insensitively() {
        assert_eq!(MeshFormat::from_extension(".INP").unwrap(), MeshFormat::Inp);
        assert_eq!(MeshFormat::from_extension("vtk").unwrap(), MeshFormat::Vtk);
        assert!(MeshFormat::from_extension("stl").is_err());
    }
}
