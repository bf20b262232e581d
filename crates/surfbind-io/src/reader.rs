//! Reading and verifying exported pairs.

use std::fs;
use std::path::{Path, PathBuf};

use surfbind_model::{Attribute, SurfaceDataset};

use crate::descriptor::{
    ArrayDescriptor, Descriptor, FORMAT_TAG, META_EXTENSION, SOURCE_COLUMN, dtype_size,
};
use crate::error::{IoError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSummary {
    pub meta_path: PathBuf,
    pub data_path: PathBuf,
    pub case: String,
    pub surface: String,
    pub rows: usize,
    /// Arrays in the payload, coordinates included.
    pub arrays: usize,
    pub payload_bytes: u64,
}

/// Load a descriptor and its payload back into a dataset.
pub fn read_pair(meta_path: impl AsRef<Path>) -> Result<(Descriptor, SurfaceDataset)> {
    let meta_path = meta_path.as_ref();
    let (descriptor, data_path) = read_descriptor(meta_path)?;
    let payload = fs::read(&data_path)?;
    check_layout(&descriptor, &data_path, payload.len() as u64)?;

    let coordinates = read_f64(&payload, &descriptor.coordinates, &data_path)?
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    let mut provenance = Vec::new();
    let mut attributes = Vec::with_capacity(descriptor.attributes.len());
    for array in &descriptor.attributes {
        match (array.name.as_str(), array.dtype.as_str()) {
            (SOURCE_COLUMN, "int32") => {
                provenance = read_i32(&payload, array, &data_path)?
                    .into_iter()
                    .map(|v| v as u32)
                    .collect();
            }
            (_, "int32") => {
                attributes.push(Attribute::int(&array.name, read_i32(&payload, array, &data_path)?))
            }
            _ => attributes.push(Attribute::float(&array.name, read_f64(&payload, array, &data_path)?)),
        }
    }

    let dataset = SurfaceDataset {
        name: descriptor.surface.clone(),
        coordinates,
        attributes,
        sources: descriptor.sources.iter().map(|s| s.name.clone()).collect(),
        provenance,
    };
    dataset
        .validate()
        .map_err(|err| IoError::invalid(meta_path, err.to_string()))?;
    Ok((descriptor, dataset))
}

/// Check that a descriptor parses, its payload sits next to it, and every
/// array it declares lies inside a payload of exactly the declared size.
pub fn verify_pair(meta_path: impl AsRef<Path>) -> Result<PairSummary> {
    let meta_path = meta_path.as_ref();
    let (descriptor, data_path) = read_descriptor(meta_path)?;
    let payload_bytes = fs::metadata(&data_path)?.len();
    check_layout(&descriptor, &data_path, payload_bytes)?;

    Ok(PairSummary {
        meta_path: meta_path.to_path_buf(),
        data_path,
        case: descriptor.case,
        surface: descriptor.surface,
        rows: descriptor.rows,
        arrays: descriptor.attributes.len() + 1,
        payload_bytes,
    })
}

/// Verify every `.meta` file under `dir`, in path order.
pub fn verify_dir(dir: impl AsRef<Path>) -> Result<Vec<(PathBuf, Result<PairSummary>)>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(IoError::FileNotFound(dir.to_path_buf()));
    }
    let mut metas = Vec::new();
    collect_meta_files(dir, &mut metas)?;
    metas.sort();
    Ok(metas
        .into_iter()
        .map(|path| {
            let result = verify_pair(&path);
            if let Err(err) = &result {
                log::warn!("{}: {err}", path.display());
            }
            (path, result)
        })
        .collect())
}

fn collect_meta_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_meta_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == META_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}

fn read_descriptor(meta_path: &Path) -> Result<(Descriptor, PathBuf)> {
    if !meta_path.is_file() {
        return Err(IoError::FileNotFound(meta_path.to_path_buf()));
    }
    let descriptor: Descriptor = serde_json::from_slice(&fs::read(meta_path)?)?;
    if descriptor.format != FORMAT_TAG {
        return Err(IoError::invalid(
            meta_path,
            format!("unknown format tag `{}`", descriptor.format),
        ));
    }
    if descriptor.byte_order != "little" {
        return Err(IoError::invalid(
            meta_path,
            format!("unsupported byte order `{}`", descriptor.byte_order),
        ));
    }
    if descriptor.payload.is_empty() || Path::new(&descriptor.payload).components().count() != 1 {
        return Err(IoError::invalid(
            meta_path,
            format!("payload `{}` must be a file name next to the descriptor", descriptor.payload),
        ));
    }

    let data_path = meta_path.with_file_name(&descriptor.payload);
    if !data_path.is_file() {
        return Err(IoError::FileNotFound(data_path));
    }
    Ok((descriptor, data_path))
}

fn check_layout(descriptor: &Descriptor, data_path: &Path, payload_bytes: u64) -> Result<()> {
    let expected = descriptor
        .payload_len()
        .ok_or_else(|| IoError::invalid(data_path, "declared array lengths overflow"))?;
    if payload_bytes != expected {
        return Err(IoError::invalid(
            data_path,
            format!("payload holds {payload_bytes} bytes, descriptor declares {expected}"),
        ));
    }
    if descriptor.coordinates.components != 3 {
        return Err(IoError::invalid(
            data_path,
            format!("coordinates have {} components", descriptor.coordinates.components),
        ));
    }

    for array in std::iter::once(&descriptor.coordinates).chain(&descriptor.attributes) {
        let size = dtype_size(&array.dtype).ok_or_else(|| {
            IoError::invalid(data_path, format!("array `{}` has unknown type `{}`", array.name, array.dtype))
        })?;
        let want = (descriptor.rows as u64)
            .checked_mul(array.components as u64)
            .and_then(|n| n.checked_mul(size))
            .ok_or_else(|| {
                IoError::invalid(
                    data_path,
                    format!("array `{}` size overflows for {} rows", array.name, descriptor.rows),
                )
            })?;
        if array.length != want {
            return Err(IoError::invalid(
                data_path,
                format!("array `{}` is {} bytes, {want} expected for {} rows", array.name, array.length, descriptor.rows),
            ));
        }
        if array.offset.checked_add(array.length).is_none_or(|end| end > payload_bytes) {
            return Err(IoError::invalid(
                data_path,
                format!("array `{}` extends past the end of the payload", array.name),
            ));
        }
    }
    Ok(())
}

fn slice<'a>(payload: &'a [u8], array: &ArrayDescriptor, data_path: &Path) -> Result<&'a [u8]> {
    let start = usize::try_from(array.offset).ok();
    let len = usize::try_from(array.length).ok();
    start
        .zip(len)
        .and_then(|(start, len)| payload.get(start..start.checked_add(len)?))
        .ok_or_else(|| {
            IoError::invalid(
                data_path,
                format!("array `{}` extends past the end of the payload", array.name),
            )
        })
}

fn read_f64(payload: &[u8], array: &ArrayDescriptor, data_path: &Path) -> Result<Vec<f64>> {
    Ok(slice(payload, array, data_path)?
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect())
}

fn read_i32(payload: &[u8], array: &ArrayDescriptor, data_path: &Path) -> Result<Vec<i32>> {
    Ok(slice(payload, array, data_path)?
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
