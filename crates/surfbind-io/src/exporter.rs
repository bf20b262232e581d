//! Paired `.meta`/`.data` writer.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use surfbind_model::{AttributeData, ModelError, Result, SurfaceDataset};

use crate::descriptor::{
    ArrayDescriptor, Descriptor, FORMAT_TAG, FORMAT_VERSION, SOURCE_COLUMN, SourceEntry,
    pair_file_names,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPair {
    pub surface: String,
    pub meta_path: PathBuf,
    pub data_path: PathBuf,
    pub rows: usize,
}

/// Write `{case}_{dataset.name}.data` then `{case}_{dataset.name}.meta` into
/// `dir`. The same dataset always produces the same bytes.
pub fn export_dataset(
    dir: impl AsRef<Path>,
    case: &str,
    dataset: &SurfaceDataset,
) -> Result<ExportedPair> {
    let dir = dir.as_ref();
    dataset.validate()?;
    if dataset.attribute(SOURCE_COLUMN).is_some() {
        return Err(ModelError::validation(format!(
            "dataset `{}`: attribute name `{SOURCE_COLUMN}` is reserved",
            dataset.name
        )));
    }

    let (meta_name, data_name) = pair_file_names(case, &dataset.name);
    let meta_path = dir.join(&meta_name);
    let data_path = dir.join(&data_name);

    fs::create_dir_all(dir).map_err(|source| ModelError::Export {
        path: dir.to_path_buf(),
        source,
    })?;

    let (payload, descriptor) = encode(case, dataset, data_name)?;
    let meta = serde_json::to_vec_pretty(&descriptor)
        .map(|mut bytes| {
            bytes.push(b'\n');
            bytes
        })
        .map_err(|err| ModelError::Export {
            path: meta_path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, err),
        })?;

    write_atomic(&data_path, &payload).map_err(|source| ModelError::Export {
        path: data_path.clone(),
        source,
    })?;
    write_atomic(&meta_path, &meta).map_err(|source| ModelError::Export {
        path: meta_path.clone(),
        source,
    })?;

    log::debug!(
        "exported {} ({} rows, {} bytes)",
        meta_path.display(),
        dataset.rows(),
        payload.len()
    );
    Ok(ExportedPair {
        surface: dataset.name.clone(),
        meta_path,
        data_path,
        rows: dataset.rows(),
    })
}

/// One pair per surface group followed by the combined pair.
pub fn export_case(
    dir: impl AsRef<Path>,
    case: &str,
    surfaces: &[SurfaceDataset],
    combined: &SurfaceDataset,
) -> Result<Vec<ExportedPair>> {
    let dir = dir.as_ref();
    surfaces
        .iter()
        .chain(std::iter::once(combined))
        .map(|dataset| export_dataset(dir, case, dataset))
        .collect()
}

/// True when every named surface already has a descriptor in `dir`.
///
/// The descriptor is written last, so its presence implies a complete pair.
pub fn is_exported<'a>(
    dir: impl AsRef<Path>,
    case: &str,
    surfaces: impl IntoIterator<Item = &'a str>,
) -> bool {
    let dir = dir.as_ref();
    surfaces.into_iter().all(|surface| {
        let (meta_name, data_name) = pair_file_names(case, surface);
        dir.join(meta_name).is_file() && dir.join(data_name).is_file()
    })
}

fn encode(case: &str, dataset: &SurfaceDataset, payload: String) -> Result<(Vec<u8>, Descriptor)> {
    let rows = dataset.rows();
    let mut bytes = Vec::with_capacity(rows * (24 + 4 + 8 * dataset.attributes.len()));

    for c in &dataset.coordinates {
        for value in c {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    let coordinates = ArrayDescriptor {
        name: "coordinates".to_string(),
        dtype: "float64".to_string(),
        components: 3,
        offset: 0,
        length: bytes.len() as u64,
    };

    let mut attributes = Vec::with_capacity(dataset.attributes.len() + 1);

    let start = bytes.len();
    for &id in &dataset.provenance {
        let id = i32::try_from(id).map_err(|_| {
            ModelError::validation(format!("dataset `{}`: source id {id} overflows int32", dataset.name))
        })?;
        bytes.extend_from_slice(&id.to_le_bytes());
    }
    attributes.push(array(SOURCE_COLUMN, "int32", start, bytes.len()));

    for attribute in &dataset.attributes {
        let start = bytes.len();
        match &attribute.data {
            AttributeData::Float64(values) => {
                values.iter().for_each(|v| bytes.extend_from_slice(&v.to_le_bytes()));
            }
            AttributeData::Int32(values) => {
                values.iter().for_each(|v| bytes.extend_from_slice(&v.to_le_bytes()));
            }
        }
        attributes.push(array(&attribute.name, attribute.data.type_name(), start, bytes.len()));
    }

    let sources = dataset
        .sources
        .iter()
        .enumerate()
        .map(|(id, name)| SourceEntry {
            id: id as u32,
            name: name.clone(),
        })
        .collect();

    let descriptor = Descriptor {
        format: FORMAT_TAG.to_string(),
        version: FORMAT_VERSION,
        case: case.to_string(),
        surface: dataset.name.clone(),
        rows,
        payload,
        byte_order: "little".to_string(),
        coordinates,
        attributes,
        sources,
    };
    Ok((bytes, descriptor))
}

fn array(name: &str, dtype: &str, start: usize, end: usize) -> ArrayDescriptor {
    ArrayDescriptor {
        name: name.to_string(),
        dtype: dtype.to_string(),
        components: 1,
        offset: start as u64,
        length: (end - start) as u64,
    }
}

/// Write through a sibling temporary file and rename it into place, so a
/// reader never observes a partially written file under the final name.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(err) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}
