//! `.meta` descriptor schema.
//!
//! The descriptor is a small JSON document naming the payload file (relative,
//! same directory) and the byte layout of every array inside it. Payloads are
//! little-endian; coordinates are always three components per row with
//! x to the right, y up and z out of plane.

use serde::{Deserialize, Serialize};

pub const FORMAT_TAG: &str = "surfbind-pair";
pub const FORMAT_VERSION: u32 = 1;
pub const META_EXTENSION: &str = "meta";
pub const DATA_EXTENSION: &str = "data";

/// Name of the per-row provenance column written ahead of the attributes.
pub const SOURCE_COLUMN: &str = "source";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub format: String,
    pub version: u32,
    pub case: String,
    pub surface: String,
    pub rows: usize,
    /// Payload file name, relative to the descriptor's directory.
    pub payload: String,
    pub byte_order: String,
    pub coordinates: ArrayDescriptor,
    pub attributes: Vec<ArrayDescriptor>,
    /// Meaning of the ids in the `source` column.
    pub sources: Vec<SourceEntry>,
}

impl Descriptor {
    /// Bytes the payload must hold; `None` when the declared lengths overflow.
    pub fn payload_len(&self) -> Option<u64> {
        std::iter::once(&self.coordinates)
            .chain(&self.attributes)
            .try_fold(0u64, |total, a| total.checked_add(a.length))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayDescriptor {
    pub name: String,
    pub dtype: String,
    pub components: usize,
    /// Byte offset into the payload.
    pub offset: u64,
    /// Byte length in the payload.
    pub length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub id: u32,
    pub name: String,
}

/// `{case}_{surface}.meta` and `{case}_{surface}.data`.
pub fn pair_file_names(case: &str, surface: &str) -> (String, String) {
    (
        format!("{case}_{surface}.{META_EXTENSION}"),
        format!("{case}_{surface}.{DATA_EXTENSION}"),
    )
}

pub(crate) fn dtype_size(dtype: &str) -> Option<u64> {
    match dtype {
        "float64" => Some(8),
        "int32" => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_names_embed_case_and_surface() {
        assert_eq!(
            pair_file_names("Re100", "moving_wall"),
            ("Re100_moving_wall.meta".to_string(), "Re100_moving_wall.data".to_string())
        );
    }

    #[test]
    fn payload_len_sums_all_arrays() {
        let array = |name: &str, offset, length| ArrayDescriptor {
            name: name.to_string(),
            dtype: "float64".to_string(),
            components: 1,
            offset,
            length,
        };
        let desc = Descriptor {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION,
            case: "Re1".to_string(),
            surface: "s".to_string(),
            rows: 2,
            payload: "Re1_s.data".to_string(),
            byte_order: "little".to_string(),
            coordinates: array("coordinates", 0, 48),
            attributes: vec![array("p", 48, 16)],
            sources: Vec::new(),
        };
        assert_eq!(desc.payload_len(), Some(64));

        let mut huge = desc.clone();
        huge.attributes[0].length = u64::MAX;
        assert_eq!(huge.payload_len(), None);
    }
}
