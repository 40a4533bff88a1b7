#![warn(missing_docs)]

//! Wire formats for rootgen meshes.
//!
//! Two encodings are understood, matching what the dental CAD front end
//! sends and expects back:
//!
//! - VTK XML PolyData documents (`.vtp`) with inline or appended, plain or
//!   zlib-compressed arrays, optionally Base64-wrapped as a whole for
//!   transport inside JSON;
//! - a flat pair of numeric arrays: interleaved point coordinates and a
//!   count-prefixed cell list (`[3, i0, i1, i2, 3, ...]`).

pub mod error;
pub mod flat;
pub mod vtp;

pub use error::{IoError, Result};
pub use flat::FlatMesh;
pub use vtp::{read_vtp, read_vtp_base64, read_vtp_bytes, write_vtp, write_vtp_base64};
