use std::path::Path;
use std::process::ExitCode;

use surfbind_io::verify_dir;
use surfbind_model::Mesh;
use surfbind_sweep::{Sweep, SweepConfig, SweepSummary};

fn usage() {
    eprintln!("usage: surfbind-cli <command> [options]");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  convert <sweep.json> [--force]             run a sweep from a configuration file");
    eprintln!("  convert-dir <root> [--force] [--planar]    run a sweep with the default configuration");
    eprintln!("  verify <dir>                               check every .meta/.data pair under dir");
    eprintln!("  inspect <polyMesh dir>                     print mesh and patch statistics");
}

fn print_summary(summary: &SweepSummary) {
    print!("{}", summary.format());
}

fn run_sweep(mut config: SweepConfig, flags: &[String]) -> ExitCode {
    for flag in flags {
        match flag.as_str() {
            "--force" => config.force = true,
            "--planar" => config.planar = true,
            other => {
                eprintln!("unknown option: {other}");
                usage();
                return ExitCode::from(2);
            }
        }
    }

    let sweep = match Sweep::new(config) {
        Ok(sweep) => sweep,
        Err(err) => {
            eprintln!("sweep error: {err}");
            return ExitCode::from(2);
        }
    };
    let summary = sweep.run();
    print_summary(&summary);

    match summary.write_report(sweep.config().report_dir()) {
        Ok(files) => println!("report: {}", files.text_path.display()),
        Err(err) => log::error!("cannot write sweep report: {err}"),
    }

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn verify(dir: &Path) -> ExitCode {
    let results = match verify_dir(dir) {
        Ok(results) => results,
        Err(err) => {
            eprintln!("verify error: {err}");
            return ExitCode::from(1);
        }
    };
    if results.is_empty() {
        eprintln!("no .meta files under {}", dir.display());
        return ExitCode::from(1);
    }

    let mut failed = 0usize;
    for (path, result) in &results {
        match result {
            Ok(pair) => println!(
                "OK    {} rows={} arrays={} bytes={}",
                path.display(),
                pair.rows,
                pair.arrays,
                pair.payload_bytes
            ),
            Err(err) => {
                failed += 1;
                println!("FAIL  {}: {err}", path.display());
            }
        }
    }
    println!("verified: {} ok, {failed} failed", results.len() - failed);

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn inspect(dir: &Path) -> ExitCode {
    let mesh = match Mesh::load(dir) {
        Ok(mesh) => mesh,
        Err(err) => {
            eprintln!("mesh error: {err}");
            return ExitCode::from(1);
        }
    };
    println!("{}", mesh.statistics().format());
    for patch in mesh.patches().patches() {
        println!(
            "  {:<20} {:<10} nFaces={:<8} startFace={}",
            patch.name,
            patch.kind.as_str(),
            patch.n_faces,
            patch.start_face
        );
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage();
        return ExitCode::from(2);
    }
    let target = &args[2];
    let flags = &args[3..];

    match args[1].as_str() {
        "convert" => match SweepConfig::load(target) {
            Ok(config) => run_sweep(config, flags),
            Err(err) => {
                eprintln!("config error: {err}");
                ExitCode::from(2)
            }
        },
        "convert-dir" => run_sweep(SweepConfig::with_root(target), flags),
        "verify" if flags.is_empty() => verify(Path::new(target)),
        "inspect" if flags.is_empty() => inspect(Path::new(target)),
        _ => {
            usage();
            ExitCode::from(2)
        }
    }
}
