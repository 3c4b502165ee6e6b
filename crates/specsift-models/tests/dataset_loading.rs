//! Integration tests for CSV dataset loading against temp-dir fixtures.

use std::fs;
use std::path::Path;

use specsift_models::dataset::load_spectra;

fn write_csv(path: &Path, ys: &[f32]) {
    let mut content = String::from("x,y\n");
    for (i, y) in ys.iter().enumerate() {
        content.push_str(&format!("{i},{y}\n"));
    }
    fs::write(path, content).unwrap();
}

#[test]
fn loads_labels_from_folder_names() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("hdpe")).unwrap();
    fs::create_dir_all(root.join("pvc/nested")).unwrap();
    write_csv(&root.join("hdpe/a.csv"), &[1.0, 2.0, 3.0]);
    write_csv(&root.join("hdpe/b.csv"), &[4.0, 5.0]);
    write_csv(&root.join("pvc/nested/c.csv"), &[6.0]);

    let ds = load_spectra(root, 200).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.class_names(), vec!["hdpe", "pvc"]);

    let hdpe_count = ds.labels.iter().filter(|l| *l == "hdpe").count();
    assert_eq!(hdpe_count, 2);
}

#[test]
fn respects_per_label_file_cap() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("only")).unwrap();
    for i in 0..5 {
        write_csv(&root.join(format!("only/f{i}.csv")), &[i as f32]);
    }

    let ds = load_spectra(root, 2).unwrap();
    assert_eq!(ds.len(), 2);
}

#[test]
fn skips_files_without_y_column() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("mixed")).unwrap();
    write_csv(&root.join("mixed/good.csv"), &[1.0, 2.0]);
    fs::write(root.join("mixed/bad.csv"), "a,b\n1,2\n").unwrap();

    let ds = load_spectra(root, 200).unwrap();
    assert_eq!(ds.len(), 1);
    assert_eq!(ds.records[0], vec![1.0, 2.0]);
}

#[test]
fn empty_tree_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_spectra(dir.path(), 200).is_err());
}

#[test]
fn malformed_numeric_value_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("label")).unwrap();
    fs::write(root.join("label/bad.csv"), "x,y\n1,not-a-number\n").unwrap();

    let err = load_spectra(root, 200).unwrap_err();
    assert!(err.to_string().contains("not-a-number"), "{err}");
}
