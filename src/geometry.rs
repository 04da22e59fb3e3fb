//! Mesh file loading into CPU-side vertex/index data.
//!
//! Supported formats, picked by file extension:
//! - `.obj` through `tobj`, triangulated
//! - `.stl` through `stl_io`, binary and ASCII
//!
//! Every face corner becomes its own [`Vertex3d`] and indices are sequential,
//! so a mesh with `n` triangles has exactly `3n` vertices. Missing attributes
//! get defaults: normal (0, 1, 0), uv (0, 0).

use std::io::{BufRead, Read, Seek};
use std::path::{Path, PathBuf};

use crate::mesh::Vertex3d;

const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
const DEFAULT_UV: [f32; 2] = [0.0, 0.0];

/// Errors that can occur when loading mesh files.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown mesh format '{0}'")]
    UnknownFormat(String),
    #[error("OBJ parse error: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("STL parse error: {0}")]
    Stl(std::io::Error),
    #[error("mesh contains no triangles")]
    Empty,
    #[error("face corner references missing position {0}")]
    IndexOutOfRange(usize),
}

/// Decoded mesh ready for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Load a mesh file, detecting the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        let open = || {
            std::fs::File::open(path)
                .map(std::io::BufReader::new)
                .map_err(|source| GeometryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
        };

        let data = match ext.as_str() {
            "obj" => Self::parse_obj(&mut open()?)?,
            "stl" => Self::parse_stl(&mut open()?)?,
            _ => return Err(GeometryError::UnknownFormat(ext)),
        };

        log::info!(
            "loaded mesh {}: {} triangles",
            path.display(),
            data.triangle_count()
        );
        Ok(data)
    }

    /// Parse Wavefront OBJ text. All shapes are merged into one mesh.
    ///
    /// Material libraries are not needed for rendering; if one is referenced and
    /// fails to load the problem is logged as a warning.
    pub fn parse_obj<R: BufRead>(reader: &mut R) -> Result<Self, GeometryError> {
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ..Default::default()
        };
        let (models, materials) = tobj::load_obj_buf(reader, &options, |mtl_path| {
            log::debug!("skipping material library {}", mtl_path.display());
            Err(tobj::LoadError::OpenFileFailed)
        })?;
        if let Err(e) = materials {
            log::warn!("OBJ materials unavailable: {e}");
        }

        Self::flatten_obj(&models)
    }

    fn flatten_obj(models: &[tobj::Model]) -> Result<Self, GeometryError> {
        let corners: usize = models.iter().map(|m| m.mesh.indices.len()).sum();
        let mut vertices = Vec::with_capacity(corners);
        let mut defaulted_normals = 0usize;
        let mut defaulted_uvs = 0usize;

        for model in models {
            let mesh = &model.mesh;
            for (corner, &position_index) in mesh.indices.iter().enumerate() {
                let p = position_index as usize;
                let position = mesh
                    .positions
                    .get(3 * p..3 * p + 3)
                    .ok_or(GeometryError::IndexOutOfRange(p))?;

                let normal = mesh
                    .normal_indices
                    .get(corner)
                    .and_then(|&n| mesh.normals.get(3 * n as usize..3 * n as usize + 3))
                    .map(|n| [n[0], n[1], n[2]]);
                let uv = mesh
                    .texcoord_indices
                    .get(corner)
                    .and_then(|&t| mesh.texcoords.get(2 * t as usize..2 * t as usize + 2))
                    .map(|t| [t[0], t[1]]);

                defaulted_normals += usize::from(normal.is_none());
                defaulted_uvs += usize::from(uv.is_none());

                vertices.push(Vertex3d::new(
                    [position[0], position[1], position[2]],
                    normal.unwrap_or(DEFAULT_NORMAL),
                    uv.unwrap_or(DEFAULT_UV),
                ));
            }
        }

        if defaulted_normals > 0 {
            log::warn!("{defaulted_normals} face corners have no normal, using +Y");
        }
        if defaulted_uvs > 0 {
            log::warn!("{defaulted_uvs} face corners have no texture coordinate");
        }

        Self::sequential(vertices)
    }

    /// Parse an STL stream. Each corner takes its face normal; UVs are zero.
    pub fn parse_stl<R: Read + Seek>(reader: &mut R) -> Result<Self, GeometryError> {
        let stl = stl_io::read_stl(reader).map_err(GeometryError::Stl)?;

        let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
        for face in &stl.faces {
            let normal: [f32; 3] = face.normal.into();
            for &vertex_idx in &face.vertices {
                let vertex = stl
                    .vertices
                    .get(vertex_idx)
                    .ok_or(GeometryError::IndexOutOfRange(vertex_idx))?;
                let position: [f32; 3] = (*vertex).into();
                vertices.push(Vertex3d::new(position, normal, DEFAULT_UV));
            }
        }

        Self::sequential(vertices)
    }

    fn sequential(vertices: Vec<Vertex3d>) -> Result<Self, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::Empty);
        }
        let indices = (0..vertices.len() as u32).collect();
        Ok(Self { vertices, indices })
    }
}
