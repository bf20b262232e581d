//! Positional binding of flat field arrays to patch face ranges.
//!
//! Field files carry no per-row face index. Samples are matched to faces
//! only by position: the array is the concatenation of each patch's samples
//! in the order the patches were written. The binder takes that order as an
//! explicit list of patch names; it cannot verify that the list matches the
//! writer's order, only that the lengths agree.

use std::ops::Range;

use crate::error::{ModelError, Result};
use crate::field::FieldArray;
use crate::patch::{PatchKind, PatchRegistry};

/// One patch's share of a bound array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSegment {
    pub patch: String,
    /// Declaration index of the patch in the registry.
    pub patch_index: usize,
    /// Global face indices `[startFace, startFace + nFaces)`.
    pub faces: Range<usize>,
    /// Slice of the field array assigned to `faces`.
    pub values: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub segments: Vec<BoundSegment>,
    /// Final offset into the array; equals the array length on success.
    pub consumed: usize,
}

impl Binding {
    pub fn rows(&self) -> usize {
        self.consumed
    }

    /// Global face index of every bound row, in row order.
    pub fn face_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.segments.iter().flat_map(|s| s.faces.clone())
    }

    /// Registry index of the patch owning every bound row, in row order.
    pub fn patch_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.segments
            .iter()
            .flat_map(|s| std::iter::repeat_n(s.patch_index, s.values.len()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinder {
    order: Vec<String>,
}

impl FieldBinder {
    /// Binder for patches listed in the order their samples were written.
    pub fn new(order: Vec<String>) -> Self {
        Self { order }
    }

    /// All patches of `kind`, in declaration order.
    pub fn for_kind(patches: &PatchRegistry, kind: &PatchKind) -> Self {
        Self::new(patches.of_kind(kind))
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// The binding any correctly sized array would produce.
    pub fn plan(&self, patches: &PatchRegistry) -> Result<Binding> {
        let (segments, declaration_order) = self.segments(patches)?;
        if !declaration_order {
            log::warn!(
                "binding order [{}] differs from patch declaration order; \
                 samples are assumed to follow the given order",
                self.order.join(", ")
            );
        }
        let consumed = segments.last().map_or(0, |s| s.values.end);
        Ok(Binding { segments, consumed })
    }

    /// Expected array length: the sum of `nFaces` over the ordered patches.
    pub fn expected_len(&self, patches: &PatchRegistry) -> Result<usize> {
        Ok(self.plan(patches)?.consumed)
    }

    /// Walk the ordered patches with a running offset and assign each one
    /// the next `nFaces` samples. The array must be consumed exactly.
    pub fn bind(&self, patches: &PatchRegistry, field: &FieldArray) -> Result<Binding> {
        let (segments, _) = self.segments(patches)?;
        let len = field.len();
        let consumed = segments.last().map_or(0, |s| s.values.end);

        if let Some(short) = segments.iter().find(|s| s.values.end > len) {
            return Err(ModelError::validation(format!(
                "field `{}` has {len} samples but patch `{}` needs samples {}..{} \
                 ({consumed} expected for patches [{}])",
                field.name,
                short.patch,
                short.values.start,
                short.values.end,
                self.order.join(", ")
            )));
        }
        if consumed != len {
            return Err(ModelError::validation(format!(
                "field `{}` has {len} samples but patches [{}] cover {consumed} faces",
                field.name,
                self.order.join(", ")
            )));
        }

        log::trace!(
            "bound field `{}` to {} patches ({} samples)",
            field.name,
            segments.len(),
            consumed
        );
        Ok(Binding { segments, consumed })
    }

    /// Segments in binding order, and whether that order follows declaration
    /// order.
    fn segments(&self, patches: &PatchRegistry) -> Result<(Vec<BoundSegment>, bool)> {
        let mut segments = Vec::with_capacity(self.order.len());
        let mut offset = 0usize;
        let mut last_position: Option<usize> = None;
        let mut declaration_order = true;

        for name in &self.order {
            let patch_index = patches.position(name).ok_or_else(|| {
                ModelError::validation(format!("binding order names unknown patch `{name}`"))
            })?;
            if segments.iter().any(|s: &BoundSegment| s.patch_index == patch_index) {
                return Err(ModelError::validation(format!(
                    "binding order lists patch `{name}` more than once"
                )));
            }
            if last_position.is_some_and(|last| patch_index < last) {
                declaration_order = false;
            }
            last_position = Some(patch_index);

            let patch = &patches.patches()[patch_index];
            let end = offset.checked_add(patch.n_faces).ok_or_else(|| {
                ModelError::validation(format!(
                    "patches up to `{name}` declare more faces than can be addressed"
                ))
            })?;
            segments.push(BoundSegment {
                patch: patch.name.clone(),
                patch_index,
                faces: patch.face_range(),
                values: offset..end,
            });
            offset = end;
        }

        Ok((segments, declaration_order))
    }
}
