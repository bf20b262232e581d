//! Flat per-face field arrays.

use std::path::Path;

use surfbind_inp::{CountBlock, Element};

use crate::error::{ModelError, Result, read_input};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValues {
    Scalar(Vec<f64>),
    Vector(Vec<[f64; 3]>),
}

impl FieldValues {
    pub fn len(&self) -> usize {
        match self {
            FieldValues::Scalar(v) => v.len(),
            FieldValues::Vector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Samples for the faces of one or more patches, concatenated in the order
/// the patches were written. The file itself carries no face index.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArray {
    pub name: String,
    pub values: FieldValues,
}

impl FieldArray {
    pub fn scalar(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: FieldValues::Scalar(values),
        }
    }

    pub fn vector(name: impl Into<String>, values: Vec<[f64; 3]>) -> Self {
        Self {
            name: name.into(),
            values: FieldValues::Vector(values),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse a field file. Bare scalars give a scalar field; 3-tuples (or
    /// 2-tuples, padded with zero) give a vector field.
    pub fn parse(name: &str, raw: &str, origin: &Path) -> Result<Self> {
        let block = CountBlock::parse(raw, "").map_err(|err| ModelError::parse(origin, err))?;

        let Some(first) = block.elements.first() else {
            return Ok(Self::scalar(name, Vec::new()));
        };

        let values = match first {
            Element::Scalar(_) => {
                let mut out = Vec::with_capacity(block.len());
                for (idx, element) in block.elements.iter().enumerate() {
                    match element {
                        Element::Scalar(v) => out.push(*v),
                        Element::Tuple(_) => return Err(mixed(origin, idx)),
                    }
                }
                FieldValues::Scalar(out)
            }
            Element::Tuple(_) => {
                let mut out = Vec::with_capacity(block.len());
                for (idx, element) in block.elements.iter().enumerate() {
                    match element {
                        Element::Tuple(values) => match values.as_slice() {
                            [x, y] => out.push([*x, *y, 0.0]),
                            [x, y, z] => out.push([*x, *y, *z]),
                            _ => {
                                return Err(ModelError::validation(format!(
                                    "{}: sample {idx} has {} components, expected 2 or 3",
                                    origin.display(),
                                    values.len()
                                )));
                            }
                        },
                        Element::Scalar(_) => return Err(mixed(origin, idx)),
                    }
                }
                FieldValues::Vector(out)
            }
        };

        Ok(Self {
            name: name.to_string(),
            values,
        })
    }

    pub fn load(name: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::parse(name, &read_input(path)?, path)
    }
}

fn mixed(origin: &Path, idx: usize) -> ModelError {
    ModelError::validation(format!(
        "{}: sample {idx} mixes scalar and vector values",
        origin.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parses_scalar_field() {
        let field = FieldArray::parse("p", "3\n(\n0.1\n0.2\n0.3\n)\n", Path::new("p"))
            .expect("parse should succeed");
        assert_eq!(field.values, FieldValues::Scalar(vec![0.1, 0.2, 0.3]));
    }

    #[test]
    fn parses_vector_field_and_pads_planar_samples() {
        let field = FieldArray::parse("U", "2((1 0 0)(0.5 0.25))", Path::new("U"))
            .expect("parse should succeed");
        assert_eq!(
            field.values,
            FieldValues::Vector(vec![[1.0, 0.0, 0.0], [0.5, 0.25, 0.0]])
        );
    }

    #[test]
    fn rejects_mixed_samples() {
        let err = FieldArray::parse("U", "2((1 0 0) 4)", Path::new("U")).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn truncated_file_is_a_count_mismatch() {
        let err = FieldArray::parse("p", "3(1 2)", Path::new("p")).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn empty_field_is_scalar() {
        let field = FieldArray::parse("p", "0()", Path::new("p")).expect("parse should succeed");
        assert!(field.is_empty());
    }
}
