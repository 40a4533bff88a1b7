//! Error types for mesh operations.

use thiserror::Error;

/// Errors that can occur while building or processing a mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A face or line references a point that does not exist.
    #[error("{element} {item} references point {index}, but the mesh has {count} points")]
    IndexOutOfRange {
        /// `"face"` or `"line"`.
        element: &'static str,
        /// Position of the offending element.
        item: usize,
        /// The out-of-range point index.
        index: u32,
        /// Number of points in the mesh.
        count: usize,
    },

    /// A face has fewer than three vertices.
    #[error("face {face} has {len} vertices, at least 3 are required")]
    FaceTooSmall {
        /// Position of the offending face.
        face: usize,
        /// Number of vertices it has.
        len: usize,
    },

    /// Mesh has no points or no faces where some are required.
    #[error("mesh is empty")]
    EmptyMesh,

    /// The boundary is not a single closed cycle.
    #[error("boundary is not a single closed loop: {0}")]
    DisconnectedBoundary(String),

    /// A selection loop that cannot split the surface in two.
    #[error("invalid selection loop: {0}")]
    InvalidLoop(String),

    /// Invalid processing settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
