//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `specsift` binary to verify that
//! argument parsing, exit codes, and the index/convert flows work
//! end-to-end.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("specsift").unwrap()
}

/// Minimal single-trace SPC file (new format, little endian, float y).
fn spc_bytes(y: &[f32]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(0u8);
    buf.push(0x4Bu8);
    buf.push(0u8);
    buf.push(0x80u8);
    buf.extend_from_slice(&(y.len() as u32).to_le_bytes());
    buf.extend_from_slice(&0f64.to_le_bytes());
    buf.extend_from_slice(&((y.len().saturating_sub(1)) as f64).to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.resize(512 + 32, 0);
    for v in y {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("archive"))
        .stdout(predicate::str::contains("train"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("specsift"));
}

// ---------------------------------------------------------------------------
// archive index
// ---------------------------------------------------------------------------

#[test]
fn archive_no_subcommand_errors() {
    cmd().arg("archive").assert().failure();
}

#[test]
fn index_writes_summary_json() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("archive");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.spc"), b"x").unwrap();
    fs::write(root.join("b.txt"), b"y").unwrap();

    let out = dir.path().join("index.json");
    cmd()
        .args(["archive", "index"])
        .arg(&root)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("total_files"))
        .stdout(predicate::str::contains("Wrote summary to"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["total_files"], 2);
}

// ---------------------------------------------------------------------------
// archive convert
// ---------------------------------------------------------------------------

#[test]
fn convert_missing_root_exits_2() {
    cmd()
        .args(["archive", "convert", "/nonexistent/archive"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing or not a directory"));
}

#[test]
fn convert_empty_tree_succeeds_with_notice() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("archive");
    fs::create_dir_all(&root).unwrap();

    cmd()
        .args(["archive", "convert"])
        .arg(&root)
        .arg("-o")
        .arg(dir.path().join("derived"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No .spc files found"));
}

#[test]
fn convert_writes_csv_tree() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("archive");
    let out = dir.path().join("derived");
    fs::create_dir_all(root.join("raman")).unwrap();
    fs::write(root.join("raman/t.spc"), spc_bytes(&[1.0, 2.0, 3.0])).unwrap();

    cmd()
        .args(["archive", "convert"])
        .arg(&root)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 1 SPC files, 3 rows total"));

    assert!(out.join("raman/t.csv").exists());
}

// ---------------------------------------------------------------------------
// train
// ---------------------------------------------------------------------------

#[test]
fn train_no_config_prints_template_then_fails_on_missing_data() {
    // Defaults are printed, then the run fails because the default data
    // directory does not exist here.
    cmd()
        .arg("train")
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"data_dir\""))
        .stdout(predicate::str::contains("\"models\""))
        .stderr(predicate::str::contains("No config file provided"));
}

#[test]
fn train_nonexistent_config_errors() {
    cmd()
        .args(["train", "/nonexistent/config.json"])
        .assert()
        .failure();
}

#[test]
fn train_runs_forest_on_tiny_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("spc_csv");
    for label in ["hdpe", "pvc"] {
        fs::create_dir_all(data.join(label)).unwrap();
        for i in 0..5 {
            let mut csv = String::from("x,y\n");
            let offset = if label == "hdpe" { 0.0 } else { 100.0 };
            for j in 0..10 {
                csv.push_str(&format!("{j},{}\n", offset + (i * 10 + j) as f64));
            }
            fs::write(data.join(label).join(format!("{i}.csv")), csv).unwrap();
        }
    }

    cmd()
        .arg("train")
        .arg("-d")
        .arg(&data)
        .arg("-o")
        .arg(dir.path().join("out"))
        .args(["--models", "forest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("forest: accuracy"));

    assert!(dir.path().join("out/logs/forest_report.txt").exists());
    assert!(dir.path().join("out/train_summary.json").exists());
}
