//! SPC to CSV conversion.
//!
//! Walks an archive tree for `.spc` files, parses each, and writes one
//! `x,y` CSV per input at the mirrored relative path under the output
//! root. Sample extraction runs an ordered list of strategies and keeps
//! the first that yields rows.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::spc::{self, SpcFile, TXYXYS};

/// Default cap on converted files per run.
pub const DEFAULT_FILE_LIMIT: usize = 10;

/// How (x, y) pairs are pulled out of a parsed file. Tried in the order
/// given by [`EXTRACT_ORDER`]; the first strategy producing rows wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStrategy {
    /// Every subfile zipped against the shared x axis, concatenated.
    Flattened,
    /// Each subfile zipped against its own x array (TXYXYS files).
    PerSubfile,
    /// The single top-level trace against the header x axis.
    HeaderXy,
}

pub const EXTRACT_ORDER: [ExtractStrategy; 3] = [
    ExtractStrategy::Flattened,
    ExtractStrategy::PerSubfile,
    ExtractStrategy::HeaderXy,
];

/// Result of a conversion run. "No matching files" is a distinct, non-error
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    NoFilesFound,
    Converted { files: usize, rows: usize },
}

/// Extract (x, y) rows with a single strategy. `None` means the strategy
/// does not apply to this file.
pub fn extract_with(spc: &SpcFile, strategy: ExtractStrategy) -> Option<Vec<(f64, f64)>> {
    match strategy {
        ExtractStrategy::Flattened => {
            if spc.subfiles.len() < 2 {
                return None;
            }
            let x = spc.shared_x()?;
            let mut rows = Vec::new();
            for sub in &spc.subfiles {
                rows.extend(x.iter().copied().zip(sub.y.iter().copied()));
            }
            Some(rows)
        }
        ExtractStrategy::PerSubfile => {
            if !spc.header.has_flag(TXYXYS) {
                return None;
            }
            let mut rows = Vec::new();
            for sub in &spc.subfiles {
                let x = sub.x.as_ref()?;
                rows.extend(x.iter().copied().zip(sub.y.iter().copied()));
            }
            Some(rows)
        }
        ExtractStrategy::HeaderXy => {
            let x = spc.shared_x()?;
            let sub = spc.subfiles.first()?;
            Some(x.iter().copied().zip(sub.y.iter().copied()).collect())
        }
    }
}

/// Run the strategy chain and return the first non-empty row set.
pub fn extract_rows(spc: &SpcFile) -> Vec<(f64, f64)> {
    for strategy in EXTRACT_ORDER {
        if let Some(rows) = extract_with(spc, strategy) {
            if !rows.is_empty() {
                log::debug!("extracted {} rows via {:?}", rows.len(), strategy);
                return rows;
            }
        }
    }
    Vec::new()
}

/// Find up to `limit` `.spc` files under `root`, in walk order.
pub fn find_spc_files(root: &Path, limit: usize) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_spc = entry
            .path()
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case("spc"))
            .unwrap_or(false);
        if is_spc {
            paths.push(entry.path().to_path_buf());
            if paths.len() >= limit {
                break;
            }
        }
    }
    Ok(paths)
}

/// Convert one file, writing its CSV at the mirrored relative path under
/// `out_root`. Returns the output path and row count.
///
/// A file the parser rejects degrades to an empty CSV (header only) rather
/// than aborting the run.
pub fn convert_one(path: &Path, root: &Path, out_root: &Path) -> Result<(PathBuf, usize)> {
    let data =
        fs::read(path).with_context(|| format!("reading SPC file {}", path.display()))?;

    let rows = match spc::parse(&data) {
        Ok(spc) => extract_rows(&spc),
        Err(e) => {
            log::warn!("failed to parse {}: {}; writing empty table", path.display(), e);
            Vec::new()
        }
    };

    let rel = path.strip_prefix(root).unwrap_or(path);
    let out_path = out_root.join(rel).with_extension("csv");
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(&out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    writer.write_record(["x", "y"])?;
    for (x, y) in &rows {
        writer.serialize((x, y))?;
    }
    writer.flush()?;

    Ok((out_path, rows.len()))
}

/// Convert up to `limit` `.spc` files under `root` into `out_root`.
pub fn convert_tree(root: &Path, out_root: &Path, limit: usize) -> Result<ConvertOutcome> {
    let files = find_spc_files(root, limit)?;
    if files.is_empty() {
        return Ok(ConvertOutcome::NoFilesFound);
    }

    let mut total_rows = 0;
    for path in &files {
        let (out_path, rows) = convert_one(path, root, out_root)?;
        log::info!(
            "converted {} -> {} ({} rows)",
            path.display(),
            out_path.display(),
            rows
        );
        total_rows += rows;
    }

    Ok(ConvertOutcome::Converted {
        files: files.len(),
        rows: total_rows,
    })
}
