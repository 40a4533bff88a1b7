#![warn(missing_docs)]

//! Polygon mesh model and mesh-processing operations for rootgen.
//!
//! This crate is the geometry-processing layer the root synthesis pipeline
//! calls into: an indexed [`PolyMesh`] with faces and polyline edges, plus
//! the filters applied to a scanned crown before a root can be grown from
//! it (welding, smoothing, sliver cleanup, boundary extraction and
//! boundary-ring conditioning). Plane sections and loop-bounded region
//! clipping cover trimming a scan before it reaches the pipeline.
//!
//! # Example
//!
//! ```ignore
//! use rootgen_mesh::{extract_boundary, weld, BoundaryMode, PolyMesh};
//!
//! let crown: PolyMesh = // ... decoded from a .vtp upload
//! let crown = weld(&crown, 1e-6);
//! let ring = extract_boundary(&crown, &BoundaryMode::Ordered)?;
//! println!("boundary has {} points", ring.len());
//! ```

pub mod boundary;
pub mod clean;
pub mod cut;
pub mod error;
pub mod mesh;
pub mod region;
pub mod smooth;
pub mod spatial;
pub mod spline;
pub mod topology;

pub use boundary::{boundary_edges, extract_boundary, order_boundary, BoundaryLoop, BoundaryMode};
pub use clean::{clean_single_point_faces, weld};
pub use cut::plane_cut;
pub use error::{MeshError, Result};
pub use mesh::{append, PolyMesh};
pub use region::{select_loop_region, RegionSelection};
pub use smooth::{smooth, SmoothSettings};
pub use spatial::PointSet;
pub use spline::{align_seam, resample_closed_spline};
pub use topology::{EdgeKey, EdgeMap};
