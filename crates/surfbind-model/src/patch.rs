//! Named boundary patches and their face ranges.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::ops::Range;
use std::path::Path;

use surfbind_inp::Dictionary;

use crate::error::{ModelError, Result};

/// Boundary-condition role of a patch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatchKind {
    Wall,
    Inlet,
    Outlet,
    Interior,
    /// Any other `type` word (`empty`, `patch`, `symmetryPlane`, ...).
    Other(String),
}

impl PatchKind {
    pub fn from_type_word(word: &str) -> Self {
        match word {
            "wall" => PatchKind::Wall,
            "inlet" => PatchKind::Inlet,
            "outlet" => PatchKind::Outlet,
            "interior" | "internal" => PatchKind::Interior,
            other => PatchKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PatchKind::Wall => "wall",
            PatchKind::Inlet => "inlet",
            PatchKind::Outlet => "outlet",
            PatchKind::Interior => "interior",
            PatchKind::Other(word) => word,
        }
    }
}

impl Display for PatchKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub name: String,
    pub kind: PatchKind,
    pub n_faces: usize,
    pub start_face: usize,
}

impl Patch {
    pub fn new(name: impl Into<String>, kind: PatchKind, n_faces: usize, start_face: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            n_faces,
            start_face,
        }
    }

    /// Global face indices `[startFace, startFace + nFaces)`.
    pub fn face_range(&self) -> Range<usize> {
        self.start_face..self.start_face.saturating_add(self.n_faces)
    }
}

/// Patches in file-declaration order, with lookup by name.
///
/// Declaration order matters: field files list their samples patch by patch
/// in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchRegistry {
    patches: Vec<Patch>,
    index: HashMap<String, usize>,
}

impl PatchRegistry {
    pub fn new(patches: Vec<Patch>) -> Result<Self> {
        let mut index = HashMap::with_capacity(patches.len());
        for (idx, patch) in patches.iter().enumerate() {
            if index.insert(patch.name.clone(), idx).is_some() {
                return Err(ModelError::validation(format!(
                    "patch `{}` is declared more than once",
                    patch.name
                )));
            }
        }
        Ok(Self { patches, index })
    }

    /// Parse a boundary file. Every dictionary must carry `type`, `nFaces`
    /// and `startFace`, in any order.
    pub fn parse(raw: &str, origin: &Path) -> Result<Self> {
        let dicts = Dictionary::parse_all(raw).map_err(|err| ModelError::parse(origin, err))?;
        let mut patches = Vec::with_capacity(dicts.len());
        for dict in &dicts {
            let patch = patch_from_dictionary(dict).map_err(|err| ModelError::parse(origin, err))?;
            patches.push(patch);
        }
        Self::new(patches)
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Patch> {
        self.index.get(name).map(|&idx| &self.patches[idx])
    }

    /// Declaration index of a patch.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Names of all patches of `kind`, in declaration order.
    pub fn of_kind(&self, kind: &PatchKind) -> Vec<String> {
        self.patches
            .iter()
            .filter(|p| &p.kind == kind)
            .map(|p| p.name.clone())
            .collect()
    }

    /// Check that every patch range lies within `total_faces` and that no
    /// two patch ranges overlap.
    pub fn validate(&self, total_faces: usize) -> Result<()> {
        for patch in &self.patches {
            let end = patch.start_face.checked_add(patch.n_faces);
            if end.is_none_or(|end| end > total_faces) {
                return Err(ModelError::validation(format!(
                    "patch `{}` covers faces {}..{} but the mesh has {} faces",
                    patch.name,
                    patch.start_face,
                    patch.start_face.saturating_add(patch.n_faces),
                    total_faces
                )));
            }
        }

        let mut ranges: Vec<&Patch> = self.patches.iter().filter(|p| p.n_faces > 0).collect();
        ranges.sort_by_key(|p| p.start_face);
        for pair in ranges.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.face_range().end > b.start_face {
                return Err(ModelError::validation(format!(
                    "patches `{}` ({:?}) and `{}` ({:?}) overlap",
                    a.name,
                    a.face_range(),
                    b.name,
                    b.face_range()
                )));
            }
        }

        Ok(())
    }
}

fn patch_from_dictionary(dict: &Dictionary) -> std::result::Result<Patch, surfbind_inp::ParseError> {
    let kind = PatchKind::from_type_word(dict.require_word("type")?);
    let n_faces = dict.require_usize("nFaces")?;
    let start_face = dict.require_usize("startFace")?;
    Ok(Patch::new(dict.name.clone(), kind, n_faces, start_face))
}
