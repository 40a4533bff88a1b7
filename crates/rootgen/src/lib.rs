#![warn(missing_docs)]

//! Synthetic tooth-root generation.
//!
//! Given a scanned crown surface and three landmarks placed on the tooth,
//! this crate grows a closed root surface below the crown: it derives the
//! root axis, radius and depth from the landmarks, extracts the crown's
//! open boundary ring, places a cap circle at the root tip, closes the
//! crown ring, an offset copy of it and the cap into one surface, and prunes
//! the flat cap that closing fabricates over the crown ring.
//!
//! # Example
//!
//! ```ignore
//! use rootgen::{generate_root, LandmarkPoints, RootSettings};
//! use rootgen_io::read_vtp;
//!
//! let crown = read_vtp(&std::fs::read_to_string("crown.vtp")?)?;
//! let landmarks = LandmarkPoints { bottom, top, radius_ref };
//! let root = generate_root(&crown, &landmarks, &RootSettings::default())?;
//! println!("root has {} faces", root.mesh.num_faces());
//! ```

pub mod cap;
pub mod closer;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod prune;
pub mod service;
pub mod settings;

pub use cap::{create_circle, ensure_resolution, Cap, CapStyle};
pub use closer::{close, loft, CloseSettings, ClosedShape, ClosingStrategy};
pub use error::{ErrorKind, Result, RootError};
pub use frame::{FrameSettings, HeightMode, LandmarkPoints, RadiusMeasure, RootFrame};
pub use pipeline::{generate_root, RootOutput};
pub use prune::prune_faces_on_loop;
pub use service::{
    decode_polydata, handle_flat, handle_json, handle_xml, FlatRootRequest, FlatRootResponse,
    PointsInfo, XmlRootRequest, XmlRootResponse,
};
pub use settings::RootSettings;
