//! End-to-end trainer run over a small synthetic CSV tree: two labels,
//! ten files each, checking the split size and the per-model artifacts.

use std::fs;
use std::path::Path;

use specsift_models::config::TrainConfig;
use specsift_models::trainer::run_training;

fn write_csv(path: &Path, ys: &[f32]) {
    let mut content = String::from("x,y\n");
    for (i, y) in ys.iter().enumerate() {
        content.push_str(&format!("{i},{y}\n"));
    }
    fs::write(path, content).unwrap();
}

/// Two well-separated label clusters, length-10 traces.
fn build_tree(root: &Path) {
    fs::create_dir_all(root.join("hdpe")).unwrap();
    fs::create_dir_all(root.join("pvc")).unwrap();
    for i in 0..10 {
        let base = i as f32 * 0.01;
        let rising: Vec<f32> = (0..10).map(|j| base + j as f32).collect();
        let falling: Vec<f32> = (0..10).map(|j| base + (10 - j) as f32 * 2.0).collect();
        write_csv(&root.join(format!("hdpe/h{i}.csv")), &rising);
        write_csv(&root.join(format!("pvc/p{i}.csv")), &falling);
    }
}

#[test]
fn trainer_writes_one_report_per_model() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("spc_csv");
    let out_dir = dir.path().join("out");
    build_tree(&data_dir);

    let config = TrainConfig {
        data_dir: data_dir.to_string_lossy().into_owned(),
        out_dir: out_dir.to_string_lossy().into_owned(),
        // Keep the run fast: the classical models plus one small network.
        models: vec![
            "forest".to_string(),
            "ocsvm".to_string(),
            "cnn".to_string(),
        ],
        epochs: 1,
        batch_size: 4,
        ..Default::default()
    };

    let summary = run_training(&config).unwrap();

    // 20 spectra at a 0.2 test fraction -> exactly one 16/4 split.
    assert_eq!(summary.n_spectra, 20);
    assert_eq!(summary.n_train, 16);
    assert_eq!(summary.n_test, 4);
    assert_eq!(summary.accuracies.len(), 3);
    for acc in summary.accuracies.values() {
        assert!((0.0..=1.0).contains(acc), "accuracy out of range: {acc}");
    }

    for arch in ["forest", "ocsvm", "cnn"] {
        let report = out_dir.join("logs").join(format!("{arch}_report.txt"));
        assert!(report.exists(), "missing {}", report.display());
        let text = fs::read_to_string(&report).unwrap();
        assert!(text.contains("Accuracy:"), "no accuracy line in {arch} report");
        assert!(text.contains("Confusion matrix"), "no matrix in {arch} report");

        let plot = out_dir
            .join("plots")
            .join(format!("{arch}_confusion_matrix.html"));
        assert!(plot.exists(), "missing {}", plot.display());
    }

    assert!(out_dir.join("models/forest.json").exists());
    assert!(out_dir.join("models/ocsvm.json").exists());
    assert!(out_dir.join("models/cnn.safetensors").exists());
    assert!(out_dir.join("plots/model_accuracies.html").exists());
    assert!(out_dir.join("train_summary.json").exists());
}

#[test]
fn trainer_fails_on_empty_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("empty");
    fs::create_dir_all(&data_dir).unwrap();

    let config = TrainConfig {
        data_dir: data_dir.to_string_lossy().into_owned(),
        out_dir: dir.path().join("out").to_string_lossy().into_owned(),
        ..Default::default()
    };
    assert!(run_training(&config).is_err());
}

#[test]
fn unknown_architectures_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("spc_csv");
    let out_dir = dir.path().join("out");
    build_tree(&data_dir);

    let config = TrainConfig {
        data_dir: data_dir.to_string_lossy().into_owned(),
        out_dir: out_dir.to_string_lossy().into_owned(),
        models: vec!["forest".to_string(), "perceptron9000".to_string()],
        ..Default::default()
    };

    let summary = run_training(&config).unwrap();
    assert_eq!(summary.accuracies.len(), 1);
    assert!(summary.accuracies.contains_key("forest"));
}
