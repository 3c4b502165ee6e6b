//! Training orchestration: load spectra, preprocess, split, then fit and
//! evaluate each configured model, collecting per-model reports into a
//! single results map.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::TrainConfig;
use crate::dataset::{load_spectra, train_test_split};
use crate::evaluate::{accuracy, classification_report, confusion_matrix};
use crate::models::classifier_trait::SpectrumClassifier;
use crate::models::forest::{ForestClassifier, ForestParams};
use crate::models::ocsvm::{OneClassSvm, OneClassSvmParams};
use crate::nn::cnn::CnnModel;
use crate::nn::cnn_deep::DeepCnnModel;
use crate::nn::cnn_gru::CnnGruModel;
use crate::nn::cnn_gru_embed::CnnGruEmbedModel;
use crate::nn::get_device;
use crate::nn::model_interface::{FitParams, NeuralSpectrumModel};
use crate::preprocessing::{pad_or_truncate, standardize_rows, FEATURE_WIDTH};
use crate::report::plots::{accuracy_bar_chart, confusion_heatmap, write_plot};

/// Outcome of one model's train/evaluate cycle.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub arch: String,
    pub accuracy: f64,
    pub confusion: Array2<u64>,
    pub artifact: PathBuf,
}

/// Run-level summary, also written as `train_summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSummary {
    pub trained_at: String,
    pub data_dir: String,
    pub n_spectra: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub normal_label: String,
    pub accuracies: BTreeMap<String, f64>,
}

struct OutputDirs {
    models: PathBuf,
    logs: PathBuf,
    plots: PathBuf,
}

/// Train and evaluate every model named in the configuration.
///
/// Each architecture contributes an independent entry to the results map;
/// a failure in one model is logged and does not abort the others. The
/// run fails only when nothing could be loaded or no model finished.
pub fn run_training(config: &TrainConfig) -> Result<TrainSummary> {
    let data_dir = Path::new(&config.data_dir);
    let dataset = load_spectra(data_dir, config.max_files_per_label)?;

    let x = standardize_rows(&pad_or_truncate(&dataset.records, FEATURE_WIDTH));
    let (train_idx, test_idx) =
        train_test_split(dataset.len(), config.test_fraction, config.seed);
    if train_idx.is_empty() || test_idx.is_empty() {
        bail!(
            "dataset of {} spectra is too small for a {}/{} split",
            dataset.len(),
            ((1.0 - config.test_fraction) * 100.0) as u32,
            (config.test_fraction * 100.0) as u32
        );
    }

    let class_names = dataset.class_names();
    let y_all = dataset.class_indices();

    let x_train = x.select(Axis(0), &train_idx);
    let x_test = x.select(Axis(0), &test_idx);
    let y_train: Vec<usize> = train_idx.iter().map(|&i| y_all[i]).collect();
    let y_test: Vec<usize> = test_idx.iter().map(|&i| y_all[i]).collect();

    // One-class models treat the first training example's label as normal.
    let normal_label = dataset.labels[train_idx[0]].clone();
    let normal_idx = class_names
        .iter()
        .position(|n| *n == normal_label)
        .unwrap_or(0);
    log::info!("one-class models treat '{normal_label}' as the normal class");

    let y_train_bin: Vec<usize> = y_train
        .iter()
        .map(|&c| usize::from(c == normal_idx))
        .collect();
    let y_test_bin: Vec<usize> = y_test
        .iter()
        .map(|&c| usize::from(c == normal_idx))
        .collect();
    let binary_names = vec!["other".to_string(), normal_label.clone()];

    let dirs = OutputDirs {
        models: Path::new(&config.out_dir).join("models"),
        logs: Path::new(&config.out_dir).join("logs"),
        plots: Path::new(&config.out_dir).join("plots"),
    };
    for dir in [&dirs.models, &dirs.logs, &dirs.plots] {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    let device = get_device(&config.device)?;
    let fit_params = FitParams {
        epochs: config.epochs,
        batch_size: config.batch_size,
        learning_rate: config.learning_rate,
        seed: config.seed,
    };

    let mut reports: BTreeMap<String, ModelReport> = BTreeMap::new();
    for arch in &config.models {
        log::info!("training {arch}");
        let result = match arch.as_str() {
            "cnn_deep" => DeepCnnModel::new(device.clone()).and_then(|model| {
                train_neural(model, &x_train, &y_train_bin, &x_test, &y_test_bin,
                    &fit_params, &binary_names, &dirs)
            }),
            "cnn" => CnnModel::new(device.clone()).and_then(|model| {
                train_neural(model, &x_train, &y_train_bin, &x_test, &y_test_bin,
                    &fit_params, &binary_names, &dirs)
            }),
            "cnn_gru" => CnnGruModel::new(device.clone()).and_then(|model| {
                train_neural(model, &x_train, &y_train_bin, &x_test, &y_test_bin,
                    &fit_params, &binary_names, &dirs)
            }),
            "cnn_gru_embed" => CnnGruEmbedModel::new(device.clone()).and_then(|model| {
                train_neural(model, &x_train, &y_train_bin, &x_test, &y_test_bin,
                    &fit_params, &binary_names, &dirs)
            }),
            "forest" => train_forest(
                &x_train, &y_train, &x_test, &y_test, config.seed, &class_names, &dirs,
            ),
            "ocsvm" => train_ocsvm(
                &x_train, &y_train_bin, &x_test, &y_test_bin, &binary_names, &dirs,
            ),
            other => {
                log::warn!("unknown model architecture '{other}', skipping");
                continue;
            }
        };

        match result {
            Ok(report) => {
                log::info!("{arch}: accuracy {:.4}", report.accuracy);
                reports.insert(arch.clone(), report);
            }
            Err(e) => log::error!("training {arch} failed: {e:#}"),
        }
    }

    if reports.is_empty() {
        bail!("no model finished training");
    }

    let accuracies: BTreeMap<String, f64> = reports
        .iter()
        .map(|(arch, report)| (arch.clone(), report.accuracy))
        .collect();

    let chart = accuracy_bar_chart(&accuracies, "Model Accuracies");
    write_plot(&chart, &dirs.plots.join("model_accuracies.html"))?;

    let summary = TrainSummary {
        trained_at: chrono::Utc::now().to_rfc3339(),
        data_dir: config.data_dir.clone(),
        n_spectra: dataset.len(),
        n_train: train_idx.len(),
        n_test: test_idx.len(),
        normal_label,
        accuracies,
    };
    let summary_path = Path::new(&config.out_dir).join("train_summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("writing {}", summary_path.display()))?;
    log::info!("wrote run summary to {}", summary_path.display());

    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
fn train_neural<M: NeuralSpectrumModel>(
    mut model: M,
    x_train: &Array2<f32>,
    y_train_bin: &[usize],
    x_test: &Array2<f32>,
    y_test_bin: &[usize],
    fit_params: &FitParams,
    class_names: &[String],
    dirs: &OutputDirs,
) -> Result<ModelReport> {
    let targets: Vec<f32> = y_train_bin.iter().map(|&v| v as f32).collect();
    model.fit(x_train, &targets, fit_params)?;

    let pred = model.predict(x_test, fit_params.batch_size)?;

    let artifact = dirs.models.join(format!("{}.safetensors", model.arch()));
    model.save(&artifact)?;

    finish_report(model.arch(), y_test_bin, &pred, class_names, artifact, dirs)
}

fn train_forest(
    x_train: &Array2<f32>,
    y_train: &[usize],
    x_test: &Array2<f32>,
    y_test: &[usize],
    seed: u64,
    class_names: &[String],
    dirs: &OutputDirs,
) -> Result<ModelReport> {
    let mut forest = ForestClassifier::new(ForestParams {
        seed,
        ..Default::default()
    });
    let x_train_f64 = x_train.mapv(|v| v as f64);
    let x_test_f64 = x_test.mapv(|v| v as f64);

    forest.fit(&x_train_f64, y_train)?;
    let pred = forest.predict(&x_test_f64)?;

    let artifact = dirs.models.join("forest.json");
    forest.save(&artifact)?;

    finish_report("forest", y_test, &pred, class_names, artifact, dirs)
}

fn train_ocsvm(
    x_train: &Array2<f32>,
    y_train_bin: &[usize],
    x_test: &Array2<f32>,
    y_test_bin: &[usize],
    class_names: &[String],
    dirs: &OutputDirs,
) -> Result<ModelReport> {
    let normal_rows: Vec<usize> = y_train_bin
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| (v == 1).then_some(i))
        .collect();
    if normal_rows.is_empty() {
        bail!("no normal-class examples in the training split");
    }

    let x_normal = x_train.select(Axis(0), &normal_rows).mapv(|v| v as f64);
    let x_test_f64 = x_test.mapv(|v| v as f64);

    let mut model = OneClassSvm::new(OneClassSvmParams::default());
    model.fit(&x_normal)?;

    let pred: Vec<usize> = model
        .predict(&x_test_f64)?
        .into_iter()
        .map(usize::from)
        .collect();

    let artifact = dirs.models.join("ocsvm.json");
    model.save(&artifact)?;

    finish_report("ocsvm", y_test_bin, &pred, class_names, artifact, dirs)
}

fn finish_report(
    arch: &str,
    truth: &[usize],
    pred: &[usize],
    class_names: &[String],
    artifact: PathBuf,
    dirs: &OutputDirs,
) -> Result<ModelReport> {
    let acc = accuracy(truth, pred);
    let matrix = confusion_matrix(truth, pred, class_names.len());

    let report_path = dirs.logs.join(format!("{arch}_report.txt"));
    fs::write(&report_path, classification_report(truth, pred, class_names))
        .with_context(|| format!("writing {}", report_path.display()))?;

    let plot = confusion_heatmap(&matrix, class_names, &format!("{arch} confusion matrix"));
    write_plot(&plot, &dirs.plots.join(format!("{arch}_confusion_matrix.html")))?;

    Ok(ModelReport {
        arch: arch.to_string(),
        accuracy: acc,
        confusion: matrix,
        artifact,
    })
}
