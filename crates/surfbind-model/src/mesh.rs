//! Mesh data structures: points, face connectivity and boundary patches.
//!
//! A [`Mesh`] is assembled once, validated, and never mutated afterwards.
//! Sweeps share one mesh by reference across every case that lacks its own.

use std::collections::BTreeMap;
use std::path::Path;

use surfbind_inp::{CountBlock, Element};

use crate::error::{ModelError, Result, read_input};
use crate::geometry::face_centroids;
use crate::patch::PatchRegistry;

pub const POINTS_FILE: &str = "points";
pub const FACES_FILE: &str = "faces";
pub const BOUNDARY_FILE: &str = "boundary";

/// A mesh point; its identity is its position in the points list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build from a 2- or 3-component tuple; 2D points get `z = 0`.
    pub fn from_components(values: &[f64]) -> Option<Self> {
        match *values {
            [x, y] => Some(Self::new(x, y, 0.0)),
            [x, y, z] => Some(Self::new(x, y, z)),
            _ => None,
        }
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn to_vector(&self) -> nalgebra::Vector3<f64> {
        nalgebra::Vector3::new(self.x, self.y, self.z)
    }
}

/// Ordered point indices of one face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    pub points: Vec<usize>,
}

impl Face {
    pub fn new(points: Vec<usize>) -> Self {
        Self { points }
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    points: Vec<Point>,
    faces: Vec<Face>,
    patches: PatchRegistry,
    centroids: Vec<[f64; 3]>,
}

impl Mesh {
    /// Validate connectivity and patch ranges, then reconstruct centroids.
    pub fn assemble(points: Vec<Point>, faces: Vec<Face>, patches: PatchRegistry) -> Result<Self> {
        patches.validate(faces.len())?;
        let centroids = face_centroids(&points, &faces)?;
        Ok(Self {
            points,
            faces,
            patches,
            centroids,
        })
    }

    /// Load `points`, `faces` and `boundary` from a mesh directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let points_path = dir.join(POINTS_FILE);
        let faces_path = dir.join(FACES_FILE);
        let boundary_path = dir.join(BOUNDARY_FILE);

        let points = parse_points(&read_input(&points_path)?, &points_path)?;
        let faces = parse_faces(&read_input(&faces_path)?, &faces_path)?;
        let patches = PatchRegistry::parse(&read_input(&boundary_path)?, &boundary_path)?;

        log::debug!(
            "loaded mesh from {}: {} points, {} faces, {} patches",
            dir.display(),
            points.len(),
            faces.len(),
            patches.len()
        );
        Self::assemble(points, faces, patches)
    }

    /// Whether `dir` holds all three mesh files.
    pub fn exists_in(dir: impl AsRef<Path>) -> bool {
        let dir = dir.as_ref();
        [POINTS_FILE, FACES_FILE, BOUNDARY_FILE]
            .iter()
            .all(|name| dir.join(name).is_file())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn patches(&self) -> &PatchRegistry {
        &self.patches
    }

    pub fn centroids(&self) -> &[[f64; 3]] {
        &self.centroids
    }

    pub fn centroid(&self, face_id: usize) -> Option<[f64; 3]> {
        self.centroids.get(face_id).copied()
    }

    pub fn statistics(&self) -> MeshStatistics {
        let mut patch_kind_counts = BTreeMap::new();
        let mut boundary_faces = 0usize;
        for patch in self.patches.patches() {
            *patch_kind_counts.entry(patch.kind.to_string()).or_insert(0) += 1;
            boundary_faces += patch.n_faces;
        }
        MeshStatistics {
            num_points: self.points.len(),
            num_faces: self.faces.len(),
            num_patches: self.patches.len(),
            boundary_faces,
            patch_kind_counts,
        }
    }
}

/// Mesh statistics for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshStatistics {
    pub num_points: usize,
    pub num_faces: usize,
    pub num_patches: usize,
    /// Faces covered by any patch
    pub boundary_faces: usize,
    pub patch_kind_counts: BTreeMap<String, usize>,
}

impl MeshStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let mut lines = vec![
            format!("Points: {}", self.num_points),
            format!("Faces: {}", self.num_faces),
            format!("Patches: {}", self.num_patches),
            format!("Boundary faces: {}", self.boundary_faces),
        ];
        if !self.patch_kind_counts.is_empty() {
            lines.push("Patch types:".to_string());
            for (kind, count) in &self.patch_kind_counts {
                lines.push(format!("  {kind}: {count}"));
            }
        }
        lines.join("\n")
    }
}

pub fn parse_points(raw: &str, origin: &Path) -> Result<Vec<Point>> {
    let block = CountBlock::parse(raw, POINTS_FILE).map_err(|err| ModelError::parse(origin, err))?;
    block
        .elements
        .iter()
        .enumerate()
        .map(|(idx, element)| match element {
            Element::Tuple(values) => Point::from_components(values).ok_or_else(|| {
                ModelError::validation(format!(
                    "{}: point {idx} has {} components, expected 2 or 3",
                    origin.display(),
                    values.len()
                ))
            }),
            Element::Scalar(_) => Err(ModelError::validation(format!(
                "{}: point {idx} is a bare scalar",
                origin.display()
            ))),
        })
        .collect()
}

pub fn parse_faces(raw: &str, origin: &Path) -> Result<Vec<Face>> {
    let block = CountBlock::parse(raw, FACES_FILE).map_err(|err| ModelError::parse(origin, err))?;
    block
        .elements
        .iter()
        .enumerate()
        .map(|(idx, element)| {
            let Element::Tuple(values) = element else {
                return Err(ModelError::validation(format!(
                    "{}: face {idx} is a bare scalar",
                    origin.display()
                )));
            };
            values
                .iter()
                .map(|&v| as_index(v).ok_or_else(|| {
                    ModelError::validation(format!(
                        "{}: face {idx} has non-integer point index {v}",
                        origin.display()
                    ))
                }))
                .collect::<Result<Vec<_>>>()
                .map(Face::new)
        })
        .collect()
}

fn as_index(value: f64) -> Option<usize> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64)
        .then_some(value as usize)
}
