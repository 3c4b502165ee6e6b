//! specsift-archive: indexing and conversion for spectroscopy archives.
//!
//! Provides a directory indexer that summarizes an archive tree as JSON,
//! a reader for the Galactic/GRAMS SPC binary format, and a converter
//! that mirrors `.spc` files into per-file `x,y` CSV tables for the
//! model-training crate.

pub mod convert;
pub mod index;
pub mod spc;
