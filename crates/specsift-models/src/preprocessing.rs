//! Spectrum preprocessing: fixed-width shaping and per-row
//! standardization.
//!
//! Every raw `y` trace is padded or truncated to [`FEATURE_WIDTH`]
//! samples and then z-scored against its own mean and standard deviation,
//! so each spectrum is comparable regardless of acquisition scale.

use ndarray::Array2;

/// Fixed feature-vector width every spectrum is shaped to.
pub const FEATURE_WIDTH: usize = 600;

/// Guard against division by zero for constant rows.
const EPSILON: f32 = 1e-8;

/// Shape ragged rows into a dense matrix: rows longer than `width` are
/// truncated, shorter rows are zero-padded on the right.
pub fn pad_or_truncate(rows: &[Vec<f32>], width: usize) -> Array2<f32> {
    let mut out = Array2::<f32>::zeros((rows.len(), width));
    for (i, row) in rows.iter().enumerate() {
        let n = row.len().min(width);
        for (j, v) in row[..n].iter().enumerate() {
            out[(i, j)] = *v;
        }
    }
    out
}

/// Z-score each row against its own mean and standard deviation.
///
/// A constant row (zero variance) maps to all zeros.
pub fn standardize_rows(x: &Array2<f32>) -> Array2<f32> {
    let mut out = x.clone();
    let ncols = out.ncols();
    if ncols == 0 {
        return out;
    }
    for mut row in out.rows_mut() {
        let n = ncols as f32;
        let mean = row.iter().sum::<f32>() / n;
        let var = row.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
        let std = var.sqrt() + EPSILON;
        row.mapv_inplace(|v| (v - mean) / std);
    }
    out
}
