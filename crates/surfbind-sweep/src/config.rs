//! Sweep configuration, loaded from JSON. Every field has a default.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SweepError;

/// A named, ordered list of patches whose samples were written to one set of
/// field files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    /// Patch names in the order the field writer emitted them. Empty means
    /// every wall patch in declaration order.
    #[serde(default)]
    pub patches: Vec<String>,
    /// Value of the `surface_id` attribute; defaults to the group's position.
    #[serde(default)]
    pub id: Option<i32>,
}

impl GroupConfig {
    pub fn new(name: impl Into<String>, patches: Vec<String>) -> Self {
        Self {
            name: name.into(),
            patches,
            id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// File name inside each group's field directory.
    pub file: String,
    /// Attribute name in the exported dataset.
    pub attribute: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

impl FieldConfig {
    pub fn new(file: &str, attribute: &str, required: bool) -> Self {
        Self {
            file: file.to_string(),
            attribute: attribute.to_string(),
            required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub root: PathBuf,
    /// Explicit case labels; empty means discover by `case_prefix`.
    pub cases: Vec<String>,
    pub case_prefix: String,
    /// Case whose mesh is shared with cases that have none.
    pub mesh_case: Option<String>,
    pub mesh_dir: PathBuf,
    pub fields_dir: PathBuf,
    /// Output directory root; each case writes to `<output_root>/<case>`.
    /// Defaults to the case directory itself.
    pub output_root: Option<PathBuf>,
    pub groups: Vec<GroupConfig>,
    pub fields: Vec<FieldConfig>,
    pub combined_name: String,
    /// Zero the out-of-plane coordinate (2D cases on an extruded mesh).
    pub planar: bool,
    pub parallel: bool,
    pub threads: Option<usize>,
    /// Re-export cases whose outputs already exist.
    pub force: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            cases: Vec::new(),
            case_prefix: "Re".to_string(),
            mesh_case: None,
            mesh_dir: PathBuf::from("constant/polyMesh"),
            fields_dir: PathBuf::from("surfaces"),
            output_root: None,
            groups: Vec::new(),
            fields: vec![
                FieldConfig::new("U", "velocity", true),
                FieldConfig::new("p", "pressure", true),
                FieldConfig::new("wallShearStress", "wall_shear", false),
            ],
            combined_name: "combined".to_string(),
            planar: false,
            parallel: true,
            threads: None,
            force: false,
        }
    }
}

impl SweepConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load from a JSON file. A relative `root` is resolved against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SweepError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| SweepError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: SweepConfig =
            serde_json::from_slice(&bytes).map_err(|source| SweepError::ConfigFormat {
                path: path.to_path_buf(),
                source,
            })?;
        if config.root.is_relative()
            && let Some(parent) = path.parent()
        {
            config.root = parent.join(&config.root);
        }
        Ok(config)
    }

    /// Surface groups in export order; a single `walls` group when none are
    /// configured.
    pub fn surface_groups(&self) -> Vec<GroupConfig> {
        if self.groups.is_empty() {
            vec![GroupConfig::new("walls", Vec::new())]
        } else {
            self.groups.clone()
        }
    }

    /// Names of every artifact a case produces, combined last.
    pub fn surface_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.surface_groups().into_iter().map(|g| g.name).collect();
        names.push(self.combined_name.clone());
        names
    }

    pub fn case_dir(&self, label: &str) -> PathBuf {
        self.root.join(label)
    }

    pub fn output_dir(&self, label: &str) -> PathBuf {
        match &self.output_root {
            Some(out) => out.join(label),
            None => self.case_dir(label),
        }
    }

    /// Where the sweep report goes.
    pub fn report_dir(&self) -> &Path {
        self.output_root.as_deref().unwrap_or(&self.root)
    }

    pub fn validate(&self) -> Result<(), SweepError> {
        let mut seen = HashSet::new();
        for name in self.surface_names() {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(SweepError::InvalidConfig(format!(
                    "surface name `{name}` is not a valid file name component"
                )));
            }
            if !seen.insert(name.clone()) {
                return Err(SweepError::InvalidConfig(format!(
                    "surface name `{name}` is used more than once"
                )));
            }
        }
        if self.fields.is_empty() {
            return Err(SweepError::InvalidConfig("no fields configured".to_string()));
        }
        if self.threads == Some(0) {
            return Err(SweepError::InvalidConfig("threads must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
