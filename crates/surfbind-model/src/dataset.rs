//! Geometry-bound surface datasets and their merging.

use std::collections::HashMap;

use nalgebra::Vector3;

use crate::binder::{Binding, FieldBinder};
use crate::error::{ModelError, Result};
use crate::field::{FieldArray, FieldValues};
use crate::mesh::Mesh;

pub const SURFACE_ID: &str = "surface_id";
pub const PATCH_ID: &str = "patch_id";
pub const FACE_ID: &str = "face_id";

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    Float64(Vec<f64>),
    Int32(Vec<i32>),
}

impl AttributeData {
    pub fn len(&self) -> usize {
        match self {
            AttributeData::Float64(v) => v.len(),
            AttributeData::Int32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeData::Float64(_) => "float64",
            AttributeData::Int32(_) => "int32",
        }
    }

    fn zeros_like(&self, rows: usize) -> Self {
        match self {
            AttributeData::Float64(_) => AttributeData::Float64(vec![0.0; rows]),
            AttributeData::Int32(_) => AttributeData::Int32(vec![0; rows]),
        }
    }

    fn extend(&mut self, other: &AttributeData) -> bool {
        match (self, other) {
            (AttributeData::Float64(a), AttributeData::Float64(b)) => a.extend_from_slice(b),
            (AttributeData::Int32(a), AttributeData::Int32(b)) => a.extend_from_slice(b),
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub data: AttributeData,
}

impl Attribute {
    pub fn float(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: AttributeData::Float64(values),
        }
    }

    pub fn int(name: impl Into<String>, values: Vec<i32>) -> Self {
        Self {
            name: name.into(),
            data: AttributeData::Int32(values),
        }
    }
}

/// Point-cloud dataset: one row per bound face.
///
/// `provenance[row]` indexes `sources`: patch names for a single surface,
/// surface names for a combined dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDataset {
    pub name: String,
    pub coordinates: Vec<[f64; 3]>,
    pub attributes: Vec<Attribute>,
    pub sources: Vec<String>,
    pub provenance: Vec<u32>,
}

impl SurfaceDataset {
    pub fn rows(&self) -> usize {
        self.coordinates.len()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Every attribute and the provenance column must match the row count.
    pub fn validate(&self) -> Result<()> {
        let rows = self.rows();
        if self.provenance.len() != rows {
            return Err(ModelError::validation(format!(
                "dataset `{}`: provenance has {} rows, coordinates have {rows}",
                self.name,
                self.provenance.len()
            )));
        }
        if let Some(bad) = self.provenance.iter().find(|&&p| p as usize >= self.sources.len()) {
            return Err(ModelError::validation(format!(
                "dataset `{}`: provenance id {bad} has no source entry",
                self.name
            )));
        }
        for attribute in &self.attributes {
            if attribute.data.len() != rows {
                return Err(ModelError::validation(format!(
                    "dataset `{}`: attribute `{}` has {} rows, coordinates have {rows}",
                    self.name,
                    attribute.name,
                    attribute.data.len()
                )));
            }
        }
        Ok(())
    }

    /// Row-wise concatenation of `parts`. Provenance is rewritten to the part
    /// index and `sources` lists the part names. An attribute missing from
    /// some parts is zero-filled for their rows.
    pub fn concat(name: impl Into<String>, parts: &[SurfaceDataset]) -> Result<Self> {
        let name = name.into();
        let total_rows: usize = parts.iter().map(SurfaceDataset::rows).sum();

        let mut coordinates = Vec::with_capacity(total_rows);
        let mut provenance = Vec::with_capacity(total_rows);
        let mut sources = Vec::with_capacity(parts.len());
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for part in parts {
            part.validate()?;
            for attribute in &part.attributes {
                if !positions.contains_key(&attribute.name) {
                    positions.insert(attribute.name.clone(), attributes.len());
                    attributes.push(Attribute {
                        name: attribute.name.clone(),
                        data: attribute.data.zeros_like(0),
                    });
                }
            }
        }

        for (part_index, part) in parts.iter().enumerate() {
            let tag = u32::try_from(part_index).map_err(|_| {
                ModelError::validation(format!("dataset `{name}`: too many parts"))
            })?;
            sources.push(part.name.clone());
            coordinates.extend_from_slice(&part.coordinates);
            provenance.extend(std::iter::repeat_n(tag, part.rows()));

            for merged in &mut attributes {
                let fill;
                let data = match part.attribute(&merged.name) {
                    Some(own) => &own.data,
                    None => {
                        fill = merged.data.zeros_like(part.rows());
                        &fill
                    }
                };
                if !merged.data.extend(data) {
                    return Err(ModelError::validation(format!(
                        "dataset `{name}`: attribute `{}` is {} in `{}` but {} elsewhere",
                        merged.name,
                        data.type_name(),
                        part.name,
                        merged.data.type_name()
                    )));
                }
            }
        }

        let combined = SurfaceDataset {
            name,
            coordinates,
            attributes,
            sources,
            provenance,
        };
        combined.validate()?;
        Ok(combined)
    }
}

/// Assembles one surface group's dataset from a mesh and its bound fields.
///
/// Rows are the faces of the binder's patches, in binding order; every field
/// added must bind to exactly those rows.
pub struct SurfaceBuilder<'m> {
    mesh: &'m Mesh,
    name: String,
    surface_id: i32,
    binder: FieldBinder,
    plan: Binding,
    planar: bool,
    attributes: Vec<Attribute>,
}

impl<'m> SurfaceBuilder<'m> {
    pub fn new(
        mesh: &'m Mesh,
        name: impl Into<String>,
        surface_id: i32,
        binder: FieldBinder,
    ) -> Result<Self> {
        let plan = binder.plan(mesh.patches())?;
        Ok(Self {
            mesh,
            name: name.into(),
            surface_id,
            binder,
            plan,
            planar: false,
            attributes: Vec::new(),
        })
    }

    /// Force `z = 0` on every coordinate (2D cases on an extruded mesh).
    pub fn planar(mut self, planar: bool) -> Self {
        self.planar = planar;
        self
    }

    pub fn rows(&self) -> usize {
        self.plan.rows()
    }

    /// Bind `field` and add it as `attribute`. Scalars become one column,
    /// vectors become `_x`, `_y`, `_z` and `_magnitude` columns.
    pub fn add_field(&mut self, attribute: &str, field: &FieldArray) -> Result<&mut Self> {
        let binding = self.binder.bind(self.mesh.patches(), field)?;
        if binding != self.plan {
            return Err(ModelError::validation(format!(
                "field `{}` bound to different rows than surface `{}`",
                field.name, self.name
            )));
        }

        match &field.values {
            FieldValues::Scalar(values) => {
                self.attributes.push(Attribute::float(attribute, values.clone()));
            }
            FieldValues::Vector(values) => {
                let column = |axis: usize| values.iter().map(|v| v[axis]).collect::<Vec<_>>();
                let magnitude = values
                    .iter()
                    .map(|v| Vector3::new(v[0], v[1], v[2]).norm())
                    .collect::<Vec<_>>();
                self.attributes.push(Attribute::float(format!("{attribute}_x"), column(0)));
                self.attributes.push(Attribute::float(format!("{attribute}_y"), column(1)));
                self.attributes.push(Attribute::float(format!("{attribute}_z"), column(2)));
                self.attributes
                    .push(Attribute::float(format!("{attribute}_magnitude"), magnitude));
            }
        }
        Ok(self)
    }

    pub fn finish(self) -> Result<SurfaceDataset> {
        let rows = self.plan.rows();
        let mut coordinates = Vec::with_capacity(rows);
        let mut face_ids = Vec::with_capacity(rows);
        for face_id in self.plan.face_ids() {
            let mut c = self.mesh.centroid(face_id).ok_or_else(|| {
                ModelError::validation(format!("surface `{}`: face {face_id} has no centroid", self.name))
            })?;
            if self.planar {
                c[2] = 0.0;
            }
            coordinates.push(c);
            face_ids.push(i32::try_from(face_id).map_err(|_| {
                ModelError::validation(format!("face index {face_id} does not fit in int32"))
            })?);
        }

        let sources = self.plan.segments.iter().map(|s| s.patch.clone()).collect();
        let mut provenance = Vec::with_capacity(rows);
        for (idx, segment) in self.plan.segments.iter().enumerate() {
            provenance.extend(std::iter::repeat_n(idx as u32, segment.values.len()));
        }

        let patch_ids = self
            .plan
            .patch_indices()
            .map(|idx| {
                i32::try_from(idx).map_err(|_| {
                    ModelError::validation(format!("patch index {idx} does not fit in int32"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut attributes = vec![
            Attribute::int(SURFACE_ID, vec![self.surface_id; rows]),
            Attribute::int(PATCH_ID, patch_ids),
        ];
        attributes.extend(self.attributes);
        attributes.push(Attribute::int(FACE_ID, face_ids));

        let dataset = SurfaceDataset {
            name: self.name,
            coordinates,
            attributes,
            sources,
            provenance,
        };
        dataset.validate()?;
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Face, Point};
    use crate::patch::{Patch, PatchKind, PatchRegistry};

    /// Unit square in the z = 0.5 plane, one face per edge plus one interior face.
    fn mesh() -> Mesh {
        let points = vec![
            Point::new(0.0, 0.0, 0.5),
            Point::new(1.0, 0.0, 0.5),
            Point::new(1.0, 1.0, 0.5),
            Point::new(0.0, 1.0, 0.5),
        ];
        let faces = vec![
            Face::new(vec![0, 2]),
            Face::new(vec![3, 2]),
            Face::new(vec![1, 2]),
            Face::new(vec![0, 1]),
            Face::new(vec![0, 3]),
        ];
        let patches = PatchRegistry::new(vec![
            Patch::new("lid", PatchKind::Wall, 1, 1),
            Patch::new("walls", PatchKind::Wall, 3, 2),
        ])
        .expect("registry");
        Mesh::assemble(points, faces, patches).expect("mesh")
    }

    fn lid(mesh: &Mesh) -> SurfaceDataset {
        let mut builder = SurfaceBuilder::new(mesh, "moving_wall", 1, FieldBinder::new(vec!["lid".into()]))
            .expect("builder");
        builder
            .add_field("velocity", &FieldArray::vector("U", vec![[3.0, 4.0, 0.0]]))
            .expect("U")
            .add_field("pressure", &FieldArray::scalar("p", vec![0.25]))
            .expect("p");
        builder.finish().expect("dataset")
    }

    #[test]
    fn builds_rows_from_bound_faces() {
        let mesh = mesh();
        let ds = lid(&mesh);
        assert_eq!(ds.rows(), 1);
        assert_eq!(ds.coordinates[0], [0.5, 1.0, 0.5]);
        assert_eq!(ds.sources, vec!["lid".to_string()]);
        let names: Vec<_> = ds.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "surface_id",
                "patch_id",
                "velocity_x",
                "velocity_y",
                "velocity_z",
                "velocity_magnitude",
                "pressure",
                "face_id"
            ]
        );
        assert_eq!(
            ds.attribute("velocity_magnitude").map(|a| &a.data),
            Some(&AttributeData::Float64(vec![5.0]))
        );
        assert_eq!(
            ds.attribute(FACE_ID).map(|a| &a.data),
            Some(&AttributeData::Int32(vec![1]))
        );
        assert_eq!(
            ds.attribute(PATCH_ID).map(|a| &a.data),
            Some(&AttributeData::Int32(vec![0]))
        );
    }

    #[test]
    fn planar_option_zeroes_z() {
        let mesh = mesh();
        let builder = SurfaceBuilder::new(&mesh, "walls", 0, FieldBinder::new(vec!["walls".into()]))
            .expect("builder")
            .planar(true);
        let ds = builder.finish().expect("dataset");
        assert_eq!(ds.rows(), 3);
        assert!(ds.coordinates.iter().all(|c| c[2] == 0.0));
        assert_eq!(ds.coordinates[0], [1.0, 0.5, 0.0]);
    }

    #[test]
    fn rejects_field_of_wrong_length() {
        let mesh = mesh();
        let mut builder =
            SurfaceBuilder::new(&mesh, "walls", 0, FieldBinder::new(vec!["walls".into()]))
                .expect("builder");
        let err = builder
            .add_field("pressure", &FieldArray::scalar("p", vec![1.0, 2.0]))
            .err()
            .expect("should fail");
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }

    #[test]
    fn concat_tags_rows_with_part_and_pads_missing_attributes() {
        let mesh = mesh();
        let moving = lid(&mesh);
        let mut stat_builder =
            SurfaceBuilder::new(&mesh, "stationary_walls", 0, FieldBinder::new(vec!["walls".into()]))
                .expect("builder");
        stat_builder
            .add_field("pressure", &FieldArray::scalar("p", vec![1.0, 2.0, 3.0]))
            .expect("p");
        let stationary = stat_builder.finish().expect("dataset");

        let combined =
            SurfaceDataset::concat("combined", &[moving.clone(), stationary.clone()]).expect("concat");
        assert_eq!(combined.rows(), moving.rows() + stationary.rows());
        assert_eq!(combined.provenance, vec![0, 1, 1, 1]);
        assert_eq!(
            combined.sources,
            vec!["moving_wall".to_string(), "stationary_walls".to_string()]
        );
        assert_eq!(
            combined.attribute(SURFACE_ID).map(|a| &a.data),
            Some(&AttributeData::Int32(vec![1, 0, 0, 0]))
        );
        assert_eq!(
            combined.attribute("velocity_x").map(|a| &a.data),
            Some(&AttributeData::Float64(vec![3.0, 0.0, 0.0, 0.0]))
        );
        assert_eq!(
            combined.attribute("pressure").map(|a| &a.data),
            Some(&AttributeData::Float64(vec![0.25, 1.0, 2.0, 3.0]))
        );
    }

    #[test]
    fn concat_rejects_type_conflicts() {
        let a = SurfaceDataset {
            name: "a".into(),
            coordinates: vec![[0.0; 3]],
            attributes: vec![Attribute::float("x", vec![1.0])],
            sources: vec!["p".into()],
            provenance: vec![0],
        };
        let mut b = a.clone();
        b.name = "b".into();
        b.attributes = vec![Attribute::int("x", vec![1])];
        assert!(SurfaceDataset::concat("c", &[a, b]).is_err());
    }
}
