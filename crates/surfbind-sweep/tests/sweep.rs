mod common;

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use surfbind_io::{read_pair, verify_dir};
use surfbind_model::{AttributeData, ErrorKind};
use surfbind_sweep::{CaseState, Stage, Sweep, SweepConfig, SweepError};
use tempfile::TempDir;

use common::{FIXED_FACES, MOVING_FACES, boundary_file, cavity_config, cavity_sweep};

const LABELS: [&str; 3] = ["Re100", "Re400", "Re1000"];

fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("entry").path())
        .filter(|p| p.is_file())
        .map(|p| {
            let name = p.file_name().expect("name").to_string_lossy().into_owned();
            (name, fs::read(&p).expect("read"))
        })
        .collect();
    files.sort();
    files
}

#[test]
fn exports_every_case_against_the_shared_mesh() {
    let root = TempDir::new().expect("temp dir");
    cavity_sweep(root.path(), &LABELS);

    let sweep = Sweep::new(cavity_config(root.path())).expect("sweep");
    let labels: Vec<_> = sweep.cases().iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Re100", "Re400", "Re1000"]);

    let summary = sweep.run();
    assert!(summary.is_success(), "{}", summary.format());
    assert_eq!(summary.exported(), 3);

    for label in LABELS {
        let case_dir = root.path().join(label);
        for surface in ["moving_wall", "stationary_walls", "combined"] {
            assert!(case_dir.join(format!("{label}_{surface}.meta")).is_file());
            assert!(case_dir.join(format!("{label}_{surface}.data")).is_file());
        }
    }

    let (descriptor, combined) =
        read_pair(root.path().join("Re400").join("Re400_combined.meta")).expect("read combined");
    assert_eq!(descriptor.case, "Re400");
    assert_eq!(combined.rows(), MOVING_FACES + FIXED_FACES);
    assert_eq!(
        combined.sources,
        vec!["moving_wall".to_string(), "stationary_walls".to_string()]
    );
    assert!(combined.provenance[..MOVING_FACES].iter().all(|&p| p == 0));
    assert!(combined.provenance[MOVING_FACES..].iter().all(|&p| p == 1));
    assert!(combined.coordinates.iter().all(|c| c[2] == 0.0));

    // lid faces sit on y = 1, numbered right after the internal faces
    assert!(combined.coordinates[..MOVING_FACES].iter().all(|c| c[1] == 1.0));
    assert_eq!(combined.coordinates[0], [0.125, 1.0, 0.0]);
    assert_eq!(
        combined.attribute("face_id").map(|a| &a.data),
        Some(&AttributeData::Int32((24..24 + 16).collect()))
    );
    assert_eq!(
        combined.attribute("surface_id").map(|a| &a.data),
        Some(&AttributeData::Int32(
            std::iter::repeat_n(1, MOVING_FACES)
                .chain(std::iter::repeat_n(0, FIXED_FACES))
                .collect()
        ))
    );
    assert!(combined.attribute("velocity_magnitude").is_some());
    assert!(combined.attribute("wall_shear_x").is_none());

    let verified = verify_dir(root.path()).expect("verify");
    assert_eq!(verified.len(), 9);
    assert!(verified.iter().all(|(_, result)| result.is_ok()));
}

#[test]
fn rerun_is_skipped_and_forced_export_is_byte_identical() {
    let root = TempDir::new().expect("temp dir");
    cavity_sweep(root.path(), &LABELS);
    let config = cavity_config(root.path());

    let first = Sweep::new(config.clone()).expect("sweep").run();
    assert_eq!(first.exported(), 3);
    let before = snapshot(&root.path().join("Re1000"));

    let second = Sweep::new(config.clone()).expect("sweep").run();
    assert_eq!(second.skipped(), 3);
    assert!(second.is_success());
    assert_eq!(snapshot(&root.path().join("Re1000")), before);

    let mut forced = config;
    forced.force = true;
    let third = Sweep::new(forced).expect("sweep").run();
    assert_eq!(third.exported(), 3);
    assert_eq!(snapshot(&root.path().join("Re1000")), before);
}

#[test]
fn truncated_field_fails_only_its_case() {
    let root = TempDir::new().expect("temp dir");
    cavity_sweep(root.path(), &LABELS);
    let pressure: Vec<f64> = (0..FIXED_FACES - 1).map(|i| i as f64).collect();
    fs::write(
        root.path().join("Re400/surfaces/stationary_walls/p"),
        common::scalar_field(&pressure),
    )
    .expect("truncate");

    let summary = Sweep::new(cavity_config(root.path())).expect("sweep").run();
    assert_eq!(summary.exported(), 2);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.is_success());

    let failed = summary.outcome("Re400").expect("Re400 outcome");
    let failure = failed.failure().expect("failure");
    assert_eq!(failure.stage, Stage::Bind);
    assert_eq!(failure.kind, ErrorKind::Validation);
    assert!(!root.path().join("Re400/Re400_combined.meta").exists());

    for label in ["Re100", "Re1000"] {
        assert_eq!(summary.outcome(label).map(|o| &o.state), Some(&CaseState::Exported));
    }

    let files = summary.write_report(root.path()).expect("report");
    let text = fs::read_to_string(files.text_path).expect("report text");
    assert!(text.contains("FAILED: 1"));
    assert!(text.contains("stage=bind kind=ValidationError"));
}

#[test]
fn absurd_declared_count_fails_only_its_case() {
    let root = TempDir::new().expect("temp dir");
    cavity_sweep(root.path(), &LABELS);
    fs::write(
        root.path().join("Re400/surfaces/stationary_walls/p"),
        "18446744073709551615\n(\n1\n)\n",
    )
    .expect("corrupt count");

    let summary = Sweep::new(cavity_config(root.path())).expect("sweep").run();
    assert_eq!(summary.exported(), 2);
    assert_eq!(summary.failed(), 1);
    let failure = summary
        .outcome("Re400")
        .and_then(|o| o.failure())
        .expect("Re400 should fail");
    assert_eq!(failure.stage, Stage::Fields);
    assert_eq!(failure.kind, ErrorKind::Validation);
}

#[test]
fn missing_required_field_is_a_missing_file_failure() {
    let root = TempDir::new().expect("temp dir");
    cavity_sweep(root.path(), &LABELS);
    fs::remove_file(root.path().join("Re1000/surfaces/moving_wall/U")).expect("remove U");

    let summary = Sweep::new(cavity_config(root.path())).expect("sweep").run();
    let failure = summary
        .outcome("Re1000")
        .and_then(|o| o.failure())
        .expect("Re1000 should fail");
    assert_eq!(failure.stage, Stage::Fields);
    assert_eq!(failure.kind, ErrorKind::MissingFile);
    assert_eq!(summary.exported(), 2);
}

#[test]
fn optional_field_is_exported_when_present() {
    let root = TempDir::new().expect("temp dir");
    cavity_sweep(root.path(), &["Re100"]);
    for (group, rows) in [("moving_wall", MOVING_FACES), ("stationary_walls", FIXED_FACES)] {
        fs::write(
            root.path().join("Re100/surfaces").join(group).join("wallShearStress"),
            common::vector_field(&vec![[0.5, 0.0, 0.0]; rows]),
        )
        .expect("wallShearStress");
    }

    let summary = Sweep::new(cavity_config(root.path())).expect("sweep").run();
    assert!(summary.is_success());
    let (_, lid) = read_pair(root.path().join("Re100/Re100_moving_wall.meta")).expect("read");
    assert_eq!(
        lid.attribute("wall_shear_magnitude").map(|a| &a.data),
        Some(&AttributeData::Float64(vec![0.5; MOVING_FACES]))
    );
}

#[test]
fn broken_shared_mesh_fails_every_dependent_case() {
    let root = TempDir::new().expect("temp dir");
    cavity_sweep(root.path(), &LABELS);
    // patches run past the last face
    common::write_mesh_with_boundary(&root.path().join("Re100"), &boundary_file(30));

    let summary = Sweep::new(cavity_config(root.path())).expect("sweep").run();
    assert_eq!(summary.failed(), 3);
    for outcome in &summary.outcomes {
        let failure = outcome.failure().expect("failure");
        assert_eq!(failure.stage, Stage::Mesh);
        assert_eq!(failure.kind, ErrorKind::Validation);
    }
}

#[test]
fn case_with_own_mesh_does_not_need_the_shared_one() {
    let root = TempDir::new().expect("temp dir");
    cavity_sweep(root.path(), &["Re100", "Re400"]);
    common::write_mesh(&root.path().join("Re400"));
    common::write_mesh_with_boundary(&root.path().join("Re100"), &boundary_file(30));

    let summary = Sweep::new(cavity_config(root.path())).expect("sweep").run();
    assert_eq!(summary.outcome("Re400").map(|o| &o.state), Some(&CaseState::Exported));
    assert_eq!(
        summary.outcome("Re100").and_then(|o| o.failure()).map(|f| f.stage),
        Some(Stage::Mesh)
    );
}

#[test]
fn default_group_binds_all_wall_patches_sequentially() {
    let root = TempDir::new().expect("temp dir");
    let case_dir = root.path().join("Re10");
    common::write_mesh(&case_dir);
    common::write_group_fields(&case_dir, "walls", MOVING_FACES + FIXED_FACES, 10.0);

    let out = TempDir::new().expect("output dir");
    let mut config = SweepConfig::with_root(root.path());
    config.output_root = Some(out.path().to_path_buf());
    config.parallel = false;

    let summary = Sweep::new(config).expect("sweep").run();
    assert!(summary.is_success(), "{}", summary.format());
    let (_, walls) = read_pair(out.path().join("Re10/Re10_walls.meta")).expect("read walls");
    assert_eq!(walls.rows(), MOVING_FACES + FIXED_FACES);
    assert_eq!(walls.sources, vec!["movingWall".to_string(), "fixedWalls".to_string()]);
    assert!(walls.coordinates.iter().all(|c| c[2] == 0.05));
    assert!(out.path().join("Re10/Re10_combined.data").is_file());
}

#[test]
fn dedicated_pool_gives_the_same_bytes() {
    let a = TempDir::new().expect("temp dir");
    let b = TempDir::new().expect("temp dir");
    cavity_sweep(a.path(), &LABELS);
    cavity_sweep(b.path(), &LABELS);

    let mut pooled = cavity_config(a.path());
    pooled.threads = Some(2);
    let mut sequential = cavity_config(b.path());
    sequential.parallel = false;

    assert!(Sweep::new(pooled).expect("sweep").run().is_success());
    assert!(Sweep::new(sequential).expect("sweep").run().is_success());
    for label in LABELS {
        assert_eq!(snapshot(&a.path().join(label)), snapshot(&b.path().join(label)));
    }
}

#[test]
fn cancelled_sweep_starts_no_case() {
    let root = TempDir::new().expect("temp dir");
    cavity_sweep(root.path(), &LABELS);

    let cancel = AtomicBool::new(true);
    let summary = Sweep::new(cavity_config(root.path()))
        .expect("sweep")
        .run_with_cancel(&cancel);
    assert_eq!(summary.not_processed(), 3);
    assert!(summary.outcomes.iter().all(|o| o.state == CaseState::Discovered));
    assert!(!summary.is_success());
    assert!(!root.path().join("Re100/Re100_combined.meta").exists());
    assert!(summary.format().contains("NOT PROCESSED: 3"));
}

#[test]
fn empty_or_missing_root_is_misuse() {
    let root = TempDir::new().expect("temp dir");
    fs::create_dir_all(root.path().join("notes")).expect("unrelated dir");
    assert!(matches!(
        Sweep::new(SweepConfig::with_root(root.path())),
        Err(SweepError::NoCases { .. })
    ));
    assert!(matches!(
        Sweep::new(SweepConfig::with_root(root.path().join("absent"))),
        Err(SweepError::RootNotFound(_))
    ));
}

#[test]
fn listed_case_without_directory_fails_at_discovery() {
    let root = TempDir::new().expect("temp dir");
    cavity_sweep(root.path(), &["Re100"]);
    let mut config = cavity_config(root.path());
    config.cases = vec!["Re100".to_string(), "Re200".to_string()];

    let summary = Sweep::new(config).expect("sweep").run();
    let failure = summary
        .outcome("Re200")
        .and_then(|o| o.failure())
        .expect("Re200 should fail");
    assert_eq!(failure.stage, Stage::Discover);
    assert_eq!(failure.kind, ErrorKind::MissingFile);
    assert_eq!(summary.exported(), 1);
}
