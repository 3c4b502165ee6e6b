//! Plotly figures for the training run: per-model confusion-matrix
//! heatmaps and the cross-model accuracy bar chart, written as
//! standalone HTML files.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array2;
use plotly::layout::{Axis, Layout};
use plotly::{Bar, HeatMap, Plot};

/// Confusion-matrix heatmap with truth on the y axis.
pub fn confusion_heatmap(matrix: &Array2<u64>, class_names: &[String], title: &str) -> Plot {
    let z: Vec<Vec<f64>> = matrix
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|&v| v as f64).collect())
        .collect();

    let trace = HeatMap::new(class_names.to_vec(), class_names.to_vec(), z);

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Predicted"))
        .y_axis(Axis::new().title("True"));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    plot
}

/// Bar chart of per-model accuracies, annotated with the scores.
pub fn accuracy_bar_chart(accuracies: &BTreeMap<String, f64>, title: &str) -> Plot {
    let names: Vec<String> = accuracies.keys().cloned().collect();
    let scores: Vec<f64> = accuracies.values().copied().collect();
    let labels: Vec<String> = scores.iter().map(|s| format!("{s:.2}")).collect();

    let trace = Bar::new(names, scores).text_array(labels);

    let layout = Layout::new()
        .title(title)
        .y_axis(Axis::new().title("Accuracy").range(vec![0.0, 1.0]));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    plot
}

/// Write a figure as a standalone HTML file.
pub fn write_plot(plot: &Plot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating plot directory {}", parent.display()))?;
    }
    plot.write_html(path);
    Ok(())
}
