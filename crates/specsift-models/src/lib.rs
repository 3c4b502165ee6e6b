//! specsift-models: classifiers and anomaly detectors for converted
//! spectra.
//!
//! This crate loads the per-label CSV trees produced by specsift-archive,
//! shapes each spectrum into a fixed-width standardized feature vector,
//! and trains a suite of models — a bagged decision-tree forest, a
//! one-class SVM, and several candle-based CNN/GRU architectures — writing
//! accuracy reports, confusion-matrix plots, and model weights per run.

pub mod config;
pub mod dataset;
pub mod evaluate;
pub mod models;
pub mod nn;
pub mod preprocessing;
pub mod report;
pub mod trainer;
