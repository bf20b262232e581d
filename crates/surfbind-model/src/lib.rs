//! Mesh reconstruction and field binding.
//!
//! This crate provides:
//! - **Mesh** assembly from points, faces and boundary files, with face
//!   centroid reconstruction
//! - **Patch registry** keeping every boundary patch in declaration order
//! - **Field binder** slicing flat per-face arrays onto patch face ranges
//! - **Surface datasets** built from bound fields and merged with provenance

pub mod binder;
pub mod dataset;
pub mod error;
pub mod field;
pub mod geometry;
pub mod mesh;
pub mod patch;

pub use binder::{BoundSegment, Binding, FieldBinder};
pub use dataset::{
    Attribute, AttributeData, FACE_ID, PATCH_ID, SURFACE_ID, SurfaceBuilder, SurfaceDataset,
};
pub use error::{ErrorKind, ModelError, Result, read_input};
pub use field::{FieldArray, FieldValues};
pub use geometry::{face_centroid, face_centroids};
pub use mesh::{Face, Mesh, MeshStatistics, Point};
pub use patch::{Patch, PatchKind, PatchRegistry};
