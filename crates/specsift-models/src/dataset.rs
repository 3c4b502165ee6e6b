//! Loading converted spectra from a tree of per-label CSV directories.
//!
//! Each immediate subdirectory of the data root is one label; every CSV
//! underneath it contributes the values of its `y` column as one raw
//! spectrum. Files without a `y` column are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

/// Default cap on CSV files loaded per label directory.
pub const DEFAULT_MAX_FILES_PER_LABEL: usize = 200;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("no CSV spectra with a 'y' column found under {0}")]
    Empty(PathBuf),
    #[error("{path}: row {row}: cannot parse '{value}' as a number")]
    BadValue {
        path: PathBuf,
        row: usize,
        value: String,
    },
}

/// Raw spectra plus their folder-derived labels, in load order.
#[derive(Debug, Clone)]
pub struct SpectraDataset {
    pub records: Vec<Vec<f32>>,
    pub labels: Vec<String>,
}

impl SpectraDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct labels, sorted; use the position in this list as the
    /// class index.
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.labels.clone();
        names.sort();
        names.dedup();
        names
    }

    /// Labels as indices into [`Self::class_names`].
    pub fn class_indices(&self) -> Vec<usize> {
        let names = self.class_names();
        self.labels
            .iter()
            .map(|l| names.iter().position(|n| n == l).unwrap_or(0))
            .collect()
    }
}

/// Load up to `max_files_per_label` spectra per label directory.
pub fn load_spectra(data_dir: &Path, max_files_per_label: usize) -> Result<SpectraDataset> {
    let mut label_dirs: Vec<(String, PathBuf)> = fs::read_dir(data_dir)
        .with_context(|| format!("reading data directory {}", data_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| {
            (
                entry.file_name().to_string_lossy().into_owned(),
                entry.path(),
            )
        })
        .collect();
    label_dirs.sort();

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for (label, dir) in &label_dirs {
        let mut count = 0;
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_csv = entry
                .path()
                .extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if !is_csv {
                continue;
            }
            files.push((label.clone(), entry.path().to_path_buf()));
            count += 1;
            if count >= max_files_per_label {
                break;
            }
        }
    }

    let loaded: Vec<Result<Option<(String, Vec<f32>)>>> = files
        .par_iter()
        .map(|(label, path)| {
            read_y_column(path).map(|opt| opt.map(|values| (label.clone(), values)))
        })
        .collect();

    let mut records = Vec::new();
    let mut labels = Vec::new();
    for loaded_file in loaded {
        match loaded_file? {
            Some((label, values)) => {
                labels.push(label);
                records.push(values);
            }
            None => {}
        }
    }

    if records.is_empty() {
        return Err(DatasetError::Empty(data_dir.to_path_buf()).into());
    }

    log::info!(
        "loaded {} spectra across {} labels from {}",
        records.len(),
        label_dirs.len(),
        data_dir.display()
    );

    Ok(SpectraDataset { records, labels })
}

/// Read the `y` column of one CSV; `None` when the column is absent.
fn read_y_column(path: &Path) -> Result<Option<Vec<f32>>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .clone();

    let y_idx = match headers.iter().position(|h| h == "y") {
        Some(idx) => idx,
        None => {
            log::debug!("{}: no 'y' column, skipping", path.display());
            return Ok(None);
        }
    };

    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        let field = record.get(y_idx).unwrap_or("");
        let value: f32 = field.trim().parse().map_err(|_| DatasetError::BadValue {
            path: path.to_path_buf(),
            row: row + 1,
            value: field.to_string(),
        })?;
        values.push(value);
    }
    Ok(Some(values))
}

/// Shuffle `0..n` with a seeded generator and split off the test set.
///
/// The test set size is `ceil(n * test_fraction)`, so 20 samples at 0.2
/// yield exactly 4 test rows. Returns `(train, test)` index lists.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.min(n);
    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    (train, test)
}
