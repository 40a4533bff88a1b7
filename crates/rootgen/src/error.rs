//! Error types for root generation.

use rootgen_io::IoError;
use rootgen_mesh::MeshError;
use thiserror::Error;

/// Coarse classification of a [`RootError`], used by hosts to map failures
/// onto responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed mesh, landmark or settings payload.
    InputParse,
    /// Zero-length axis or coincident landmarks.
    DegenerateLandmarks,
    /// The crown boundary is not a single closed loop.
    DisconnectedBoundary,
    /// The merged point set cannot be triangulated.
    DegenerateTriangulation,
    /// Cap resolution differs from the boundary point count.
    ResolutionMismatch,
}

/// Errors that can occur while generating a root.
#[derive(Error, Debug)]
pub enum RootError {
    /// The request payload could not be parsed.
    #[error("input parse error: {0}")]
    InputParse(String),

    /// The mesh payload could not be decoded.
    #[error(transparent)]
    Io(#[from] IoError),

    /// The crown mesh violates the mesh invariants.
    #[error("invalid crown mesh: {0}")]
    Mesh(MeshError),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid generation settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Landmarks do not define a usable frame.
    #[error("degenerate landmarks: {0}")]
    DegenerateLandmarks(String),

    /// The crown boundary is not a single closed cycle.
    #[error("boundary is not a single closed loop: {0}")]
    DisconnectedBoundary(String),

    /// The closing triangulation failed.
    #[error("degenerate triangulation: {0}")]
    DegenerateTriangulation(String),

    /// The cap and the boundary ring have different point counts.
    #[error("cap resolution {cap} does not match boundary point count {boundary}")]
    ResolutionMismatch {
        /// Cap resolution.
        cap: usize,
        /// Boundary ring point count.
        boundary: usize,
    },
}

impl RootError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RootError::InputParse(_)
            | RootError::Io(_)
            | RootError::Mesh(_)
            | RootError::Json(_)
            | RootError::InvalidSettings(_) => ErrorKind::InputParse,
            RootError::DegenerateLandmarks(_) => ErrorKind::DegenerateLandmarks,
            RootError::DisconnectedBoundary(_) => ErrorKind::DisconnectedBoundary,
            RootError::DegenerateTriangulation(_) => ErrorKind::DegenerateTriangulation,
            RootError::ResolutionMismatch { .. } => ErrorKind::ResolutionMismatch,
        }
    }
}

impl From<MeshError> for RootError {
    fn from(e: MeshError) -> Self {
        match e {
            MeshError::DisconnectedBoundary(msg) => RootError::DisconnectedBoundary(msg),
            MeshError::InvalidSettings(msg) => RootError::InvalidSettings(msg),
            other => RootError::Mesh(other),
        }
    }
}

/// Result type for root generation.
pub type Result<T> = std::result::Result<T, RootError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_errors_keep_their_kind() {
        let e: RootError = MeshError::DisconnectedBoundary("two loops".into()).into();
        assert_eq!(e.kind(), ErrorKind::DisconnectedBoundary);

        let e: RootError = MeshError::EmptyMesh.into();
        assert_eq!(e.kind(), ErrorKind::InputParse);

        let e: RootError = IoError::Unsupported("appended data".into()).into();
        assert_eq!(e.kind(), ErrorKind::InputParse);
    }

    #[test]
    fn test_display() {
        let e = RootError::ResolutionMismatch { cap: 12, boundary: 40 };
        assert_eq!(
            e.to_string(),
            "cap resolution 12 does not match boundary point count 40"
        );
    }
}
