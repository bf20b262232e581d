//! Sweep driver: resolves the shared mesh once, then runs every case through
//! the `Discovered -> Parsed -> Bound -> Exported` state machine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use surfbind_io::{SweepReport, export_case, is_exported};
use surfbind_model::{
    FieldArray, FieldBinder, Mesh, ModelError, PatchKind, SurfaceBuilder, SurfaceDataset,
};

use crate::case::{CaseFailure, CaseId, CaseOutcome, CaseState, Stage};
use crate::config::{GroupConfig, SweepConfig};
use crate::error::SweepError;
use crate::summary::SweepSummary;

/// Mesh parsed once per sweep and borrowed by every case without its own.
struct SharedMesh {
    /// Case the mesh was read from.
    label: String,
    mesh: Result<Mesh, CaseFailure>,
}

type BoundFields = Vec<(String, FieldArray)>;

#[derive(Debug, Clone)]
pub struct Sweep {
    config: SweepConfig,
    cases: Vec<CaseId>,
}

impl Sweep {
    /// Validate the configuration and enumerate the cases.
    pub fn new(config: SweepConfig) -> Result<Self, SweepError> {
        config.validate()?;
        if !config.root.is_dir() {
            return Err(SweepError::RootNotFound(config.root.clone()));
        }

        let mut cases = if config.cases.is_empty() {
            discover(&config.root, &config.case_prefix)?
        } else {
            config
                .cases
                .iter()
                .map(|label| CaseId::parse(label.clone(), &config.case_prefix))
                .collect()
        };
        cases.sort();
        cases.dedup_by(|a, b| a.label == b.label);

        if cases.is_empty() {
            return Err(SweepError::NoCases {
                root: config.root.clone(),
                prefix: config.case_prefix.clone(),
            });
        }
        Ok(Self { config, cases })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn cases(&self) -> &[CaseId] {
        &self.cases
    }

    pub fn run(&self) -> SweepSummary {
        self.run_with_cancel(&AtomicBool::new(false))
    }

    /// Run every case. Once `cancel` is raised no further case starts;
    /// cases already running finish, the rest stay `Discovered`.
    pub fn run_with_cancel(&self, cancel: &AtomicBool) -> SweepSummary {
        let report = SweepReport::start(self.config.root.display().to_string());
        log::info!(
            "sweep over {} case(s) under {}",
            self.cases.len(),
            self.config.root.display()
        );

        let shared = self.resolve_shared_mesh();
        let process = |case: &CaseId| {
            if cancel.load(Ordering::SeqCst) {
                log::debug!("{case}: not started, sweep cancelled");
                return CaseOutcome::new(case.clone());
            }
            self.process_case(case, shared.as_ref())
        };

        let outcomes: Vec<CaseOutcome> = if !self.config.parallel {
            self.cases.iter().map(process).collect()
        } else if let Some(threads) = self.config.threads {
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| self.cases.par_iter().map(process).collect()),
                Err(err) => {
                    log::warn!("cannot build a {threads}-thread pool ({err}); using the global pool");
                    self.cases.par_iter().map(process).collect()
                }
            }
        } else {
            self.cases.par_iter().map(process).collect()
        };

        let summary = SweepSummary::new(report, outcomes);
        log::info!(
            "sweep finished: {} exported, {} skipped, {} failed, {} not processed",
            summary.exported(),
            summary.skipped(),
            summary.failed(),
            summary.not_processed()
        );
        summary
    }

    fn mesh_dir(&self, label: &str) -> PathBuf {
        self.config.case_dir(label).join(&self.config.mesh_dir)
    }

    fn has_own_mesh(&self, label: &str) -> bool {
        Mesh::exists_in(self.mesh_dir(label))
    }

    /// Parse the shared mesh if any case needs it: the designated mesh case,
    /// otherwise the first case carrying a mesh.
    fn resolve_shared_mesh(&self) -> Option<SharedMesh> {
        if self.cases.iter().all(|c| self.has_own_mesh(&c.label)) {
            return None;
        }

        let source = self.config.mesh_case.clone().or_else(|| {
            self.cases
                .iter()
                .find(|c| self.has_own_mesh(&c.label))
                .map(|c| c.label.clone())
        });
        let Some(label) = source else {
            let first = self.cases.first().map_or("", |c| c.label.as_str());
            let err = ModelError::MissingFile(self.mesh_dir(first));
            log::error!("no case carries a mesh: {err}");
            return Some(SharedMesh {
                label: String::new(),
                mesh: Err(CaseFailure::new(Stage::Mesh, &err)),
            });
        };

        let dir = self.mesh_dir(&label);
        let mesh = match Mesh::load(&dir) {
            Ok(mesh) => {
                log::info!("shared mesh from {label}: {}", mesh.statistics().format());
                Ok(mesh)
            }
            Err(err) => {
                log::error!("shared mesh from {label} failed to load: {err}");
                Err(CaseFailure::new(Stage::Mesh, &err))
            }
        };
        Some(SharedMesh { label, mesh })
    }

    fn process_case(&self, case: &CaseId, shared: Option<&SharedMesh>) -> CaseOutcome {
        let mut outcome = CaseOutcome::new(case.clone());
        let label = case.label.as_str();

        let case_dir = self.config.case_dir(label);
        if !case_dir.is_dir() {
            return outcome.fail(CaseFailure::new(Stage::Discover, &ModelError::MissingFile(case_dir)));
        }

        let out_dir = self.config.output_dir(label);
        let names = self.config.surface_names();
        if !self.config.force && is_exported(&out_dir, label, names.iter().map(String::as_str)) {
            outcome.advance(CaseState::Skipped);
            log::info!("{case}: outputs present, skipped");
            return outcome;
        }

        let owned;
        let mesh = if self.has_own_mesh(label) && shared.is_none_or(|s| s.label != label) {
            match Mesh::load(self.mesh_dir(label)) {
                Ok(mesh) => {
                    owned = mesh;
                    &owned
                }
                Err(err) => return outcome.fail(CaseFailure::new(Stage::Mesh, &err)),
            }
        } else {
            match shared.map(|s| &s.mesh) {
                Some(Ok(mesh)) => mesh,
                Some(Err(failure)) => return outcome.fail(failure.clone()),
                None => {
                    let err = ModelError::MissingFile(self.mesh_dir(label));
                    return outcome.fail(CaseFailure::new(Stage::Mesh, &err));
                }
            }
        };

        let groups = self.config.surface_groups();
        let mut fields = Vec::with_capacity(groups.len());
        for group in &groups {
            match self.load_fields(case, &case_dir, group) {
                Ok(group_fields) => fields.push(group_fields),
                Err(err) => return outcome.fail(CaseFailure::new(Stage::Fields, &err)),
            }
        }
        outcome.advance(CaseState::Parsed);

        let (surfaces, combined) = match self.bind_surfaces(mesh, &groups, &fields) {
            Ok(bound) => bound,
            Err(err) => return outcome.fail(CaseFailure::new(Stage::Bind, &err)),
        };
        outcome.advance(CaseState::Bound);

        match export_case(&out_dir, label, &surfaces, &combined) {
            Ok(pairs) => {
                log::info!(
                    "{case}: exported {} pair(s), {} combined rows, to {}",
                    pairs.len(),
                    combined.rows(),
                    out_dir.display()
                );
                outcome.exported = pairs;
                outcome.advance(CaseState::Exported);
                outcome
            }
            Err(err) => outcome.fail(CaseFailure::new(Stage::Export, &err)),
        }
    }

    /// Field files of one surface group: `<case>/<fields_dir>/<group>/<file>`.
    fn load_fields(
        &self,
        case: &CaseId,
        case_dir: &Path,
        group: &GroupConfig,
    ) -> Result<BoundFields, ModelError> {
        let dir = case_dir.join(&self.config.fields_dir).join(&group.name);
        let mut fields = Vec::with_capacity(self.config.fields.len());
        for field in &self.config.fields {
            let path = dir.join(&field.file);
            if !field.required && !path.is_file() {
                log::warn!(
                    "{case}: optional field `{}` missing for `{}`, skipped",
                    field.file,
                    group.name
                );
                continue;
            }
            fields.push((field.attribute.clone(), FieldArray::load(&field.file, &path)?));
        }
        Ok(fields)
    }

    fn bind_surfaces(
        &self,
        mesh: &Mesh,
        groups: &[GroupConfig],
        fields: &[BoundFields],
    ) -> Result<(Vec<SurfaceDataset>, SurfaceDataset), ModelError> {
        let mut surfaces = Vec::with_capacity(groups.len());
        for (position, (group, group_fields)) in groups.iter().zip(fields).enumerate() {
            let binder = if group.patches.is_empty() {
                FieldBinder::for_kind(mesh.patches(), &PatchKind::Wall)
            } else {
                FieldBinder::new(group.patches.clone())
            };
            let id = group.id.unwrap_or(position as i32);
            let mut builder =
                SurfaceBuilder::new(mesh, &group.name, id, binder)?.planar(self.config.planar);
            for (attribute, field) in group_fields {
                builder.add_field(attribute, field)?;
            }
            surfaces.push(builder.finish()?);
        }
        let combined = SurfaceDataset::concat(self.config.combined_name.clone(), &surfaces)?;
        Ok((surfaces, combined))
    }
}

/// Directories under `root` whose name starts with `prefix`.
fn discover(root: &Path, prefix: &str) -> Result<Vec<CaseId>, SweepError> {
    let mut cases = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(prefix) {
            cases.push(CaseId::parse(name, prefix));
        }
    }
    log::debug!("discovered {} case(s) under {}", cases.len(), root.display());
    Ok(cases)
}
