//! Generated lid-driven cavity fixtures.
//!
//! The mesh is an `n x n` grid of cells on the unit square, extruded one
//! cell in z (0 to 0.1). Faces are ordered internal first, then the
//! `movingWall` (top, n faces), `fixedWalls` (left, right, bottom, 3n faces)
//! and `frontAndBack` (2n^2 faces, type empty) patches.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use surfbind_sweep::{GroupConfig, SweepConfig};

pub const N: usize = 4;
pub const MOVING_FACES: usize = N;
pub const FIXED_FACES: usize = 3 * N;

const HEADER: &str = "FoamFile\n{\n    version     2.0;\n    format      ascii;\n}\n";

fn point_index(i: usize, j: usize, k: usize) -> usize {
    k * (N + 1) * (N + 1) + j * (N + 1) + i
}

fn quad(out: &mut Vec<[usize; 4]>, a: usize, b: usize, c: usize, d: usize) {
    out.push([a, b, c, d]);
}

pub fn points_file() -> String {
    let mut body = String::from(HEADER);
    let _ = writeln!(body, "{}\n(", 2 * (N + 1) * (N + 1));
    for k in 0..2 {
        for j in 0..=N {
            for i in 0..=N {
                let _ = writeln!(
                    body,
                    "({} {} {})",
                    i as f64 / N as f64,
                    j as f64 / N as f64,
                    k as f64 * 0.1
                );
            }
        }
    }
    body.push_str(")\n");
    body
}

pub fn faces() -> Vec<[usize; 4]> {
    let p = point_index;
    let mut faces = Vec::new();
    for i in 1..N {
        for j in 0..N {
            quad(&mut faces, p(i, j, 0), p(i, j + 1, 0), p(i, j + 1, 1), p(i, j, 1));
        }
    }
    for j in 1..N {
        for i in 0..N {
            quad(&mut faces, p(i, j, 0), p(i + 1, j, 0), p(i + 1, j, 1), p(i, j, 1));
        }
    }
    // movingWall
    for i in 0..N {
        quad(&mut faces, p(i, N, 0), p(i, N, 1), p(i + 1, N, 1), p(i + 1, N, 0));
    }
    // fixedWalls: left, right, bottom
    for j in 0..N {
        quad(&mut faces, p(0, j, 0), p(0, j, 1), p(0, j + 1, 1), p(0, j + 1, 0));
    }
    for j in 0..N {
        quad(&mut faces, p(N, j, 0), p(N, j + 1, 0), p(N, j + 1, 1), p(N, j, 1));
    }
    for i in 0..N {
        quad(&mut faces, p(i, 0, 0), p(i + 1, 0, 0), p(i + 1, 0, 1), p(i, 0, 1));
    }
    // frontAndBack
    for k in 0..2 {
        for j in 0..N {
            for i in 0..N {
                quad(&mut faces, p(i, j, k), p(i + 1, j, k), p(i + 1, j + 1, k), p(i, j + 1, k));
            }
        }
    }
    faces
}

pub fn internal_faces() -> usize {
    2 * N * (N - 1)
}

pub fn faces_file() -> String {
    let faces = faces();
    let mut body = String::from(HEADER);
    let _ = writeln!(body, "{}\n(", faces.len());
    for [a, b, c, d] in faces {
        let _ = writeln!(body, "4({a} {b} {c} {d})");
    }
    body.push_str(")\n");
    body
}

pub fn boundary_file(moving_start: usize) -> String {
    let fixed_start = moving_start + MOVING_FACES;
    let empty_start = fixed_start + FIXED_FACES;
    format!(
        "{HEADER}\
         3\n\
         (\n\
         \x20   movingWall\n    {{\n        type            wall;\n        inGroups        List<word> 1(wall);\n        nFaces          {MOVING_FACES};\n        startFace       {moving_start};\n    }}\n\
         \x20   fixedWalls\n    {{\n        type            wall;\n        inGroups        List<word> 1(wall);\n        nFaces          {FIXED_FACES};\n        startFace       {fixed_start};\n    }}\n\
         \x20   frontAndBack\n    {{\n        type            empty;\n        inGroups        List<word> 1(empty);\n        nFaces          {};\n        startFace       {empty_start};\n    }}\n\
         )\n",
        2 * N * N
    )
}

pub fn write_mesh(case_dir: &Path) {
    write_mesh_with_boundary(case_dir, &boundary_file(internal_faces()));
}

pub fn write_mesh_with_boundary(case_dir: &Path, boundary: &str) {
    let dir = case_dir.join("constant").join("polyMesh");
    fs::create_dir_all(&dir).expect("mesh dir");
    fs::write(dir.join("points"), points_file()).expect("points");
    fs::write(dir.join("faces"), faces_file()).expect("faces");
    fs::write(dir.join("boundary"), boundary).expect("boundary");
}

pub fn scalar_field(values: &[f64]) -> String {
    let mut body = String::from(HEADER);
    let _ = writeln!(body, "{}\n(", values.len());
    for v in values {
        let _ = writeln!(body, "{v}");
    }
    body.push_str(")\n");
    body
}

pub fn vector_field(values: &[[f64; 3]]) -> String {
    let mut body = String::from(HEADER);
    let _ = writeln!(body, "{}\n(", values.len());
    for [x, y, z] in values {
        let _ = writeln!(body, "({x} {y} {z})");
    }
    body.push_str(")\n");
    body
}

/// Field files for one group with `rows` samples, scaled by `re`.
pub fn write_group_fields(case_dir: &Path, group: &str, rows: usize, re: f64) {
    let dir = case_dir.join("surfaces").join(group);
    fs::create_dir_all(&dir).expect("field dir");
    let u: Vec<[f64; 3]> = (0..rows).map(|i| [re * 1e-3, i as f64 * 0.01, 0.0]).collect();
    let p: Vec<f64> = (0..rows).map(|i| i as f64 - re * 1e-4).collect();
    fs::write(dir.join("U"), vector_field(&u)).expect("U");
    fs::write(dir.join("p"), scalar_field(&p)).expect("p");
}

pub fn write_case_fields(case_dir: &Path, re: f64) {
    write_group_fields(case_dir, "moving_wall", MOVING_FACES, re);
    write_group_fields(case_dir, "stationary_walls", FIXED_FACES, re);
}

/// `Re100` carries the mesh; the other cases only carry field files.
pub fn cavity_sweep(root: &Path, labels: &[&str]) -> Vec<PathBuf> {
    labels
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let case_dir = root.join(label);
            fs::create_dir_all(&case_dir).expect("case dir");
            if idx == 0 {
                write_mesh(&case_dir);
            }
            let re = label.trim_start_matches("Re").parse::<f64>().unwrap_or(1.0);
            write_case_fields(&case_dir, re);
            case_dir
        })
        .collect()
}

pub fn cavity_config(root: &Path) -> SweepConfig {
    let mut config = SweepConfig::with_root(root);
    config.groups = vec![
        GroupConfig {
            name: "moving_wall".to_string(),
            patches: vec!["movingWall".to_string()],
            id: Some(1),
        },
        GroupConfig {
            name: "stationary_walls".to_string(),
            patches: vec!["fixedWalls".to_string()],
            id: Some(0),
        },
    ];
    config.planar = true;
    config
}
