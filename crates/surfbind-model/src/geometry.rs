//! Face centroid reconstruction.
//!
//! A face's centroid is the arithmetic mean of the coordinates of the points
//! it references. This is the location assigned to every face-bound field
//! sample.

use nalgebra::Vector3;

use crate::error::{ModelError, Result};
use crate::mesh::{Face, Point};

/// Centroid of every face, in face order.
///
/// Fails when a face is empty or references a point index outside
/// `0..points.len()`.
pub fn face_centroids(points: &[Point], faces: &[Face]) -> Result<Vec<[f64; 3]>> {
    faces
        .iter()
        .enumerate()
        .map(|(face_id, face)| face_centroid(points, face, face_id))
        .collect()
}

pub fn face_centroid(points: &[Point], face: &Face, face_id: usize) -> Result<[f64; 3]> {
    if face.points.is_empty() {
        return Err(ModelError::validation(format!(
            "face {face_id} has no points"
        )));
    }

    let mut sum = Vector3::<f64>::zeros();
    for &point_id in &face.points {
        let point = points.get(point_id).ok_or_else(|| {
            ModelError::validation(format!(
                "face {face_id} references point {point_id}, but only {} points exist",
                points.len()
            ))
        })?;
        sum += point.to_vector();
    }

    let mean = sum / face.points.len() as f64;
    Ok([mean.x, mean.y, mean.z])
}
