//! Archive indexing: walk a directory tree, tally files by extension and
//! folder, and sample the head bytes of the most common extensions.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use walkdir::WalkDir;

/// Bytes read from the start of each sampled file.
const SAMPLE_HEAD_LEN: usize = 512;
/// Bytes kept when the head is not text and falls back to hex.
const SAMPLE_HEX_LEN: usize = 64;
/// Number of extensions to sample.
const SAMPLE_EXTENSIONS: usize = 5;
/// Files sampled per extension.
const SAMPLES_PER_EXTENSION: usize = 3;

/// Placeholder extension for files without one.
const NO_EXTENSION: &str = "<noext>";

/// Head sample for one file. Exactly one of `head_text`, `head_hex`, or
/// `error` is populated.
#[derive(Debug, Clone, Serialize)]
pub struct SampleEntry {
    pub path: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The full index document. Count maps keep their insertion order
/// (descending count, then name) when serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    pub root: String,
    pub total_files: u64,
    pub by_extension: Map<String, Value>,
    pub by_folder: Map<String, Value>,
    pub samples: Map<String, Value>,
}

impl ArchiveSummary {
    /// Top extensions as (name, count), in serialized order.
    pub fn top_extensions(&self, limit: usize) -> Vec<(String, u64)> {
        self.by_extension
            .iter()
            .take(limit)
            .map(|(k, v)| (k.clone(), v.as_u64().unwrap_or(0)))
            .collect()
    }
}

/// Walk `root` and build the index summary.
///
/// Per-file read failures while sampling are recorded in the entry's
/// `error` field; traversal errors are logged and skipped.
pub fn index_archive(root: &Path) -> Result<ArchiveSummary> {
    let mut files: Vec<(PathBuf, String)> = Vec::new();
    let mut ext_counts: HashMap<String, u64> = HashMap::new();
    let mut folder_counts: HashMap<String, u64> = HashMap::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let ext = extension_of(entry.path());
        *ext_counts.entry(ext.clone()).or_insert(0) += 1;

        let folder = entry
            .path()
            .parent()
            .and_then(|p| p.strip_prefix(root).ok())
            .map(|p| {
                if p.as_os_str().is_empty() {
                    ".".to_string()
                } else {
                    p.to_string_lossy().into_owned()
                }
            })
            .unwrap_or_else(|| ".".to_string());
        *folder_counts.entry(folder).or_insert(0) += 1;

        files.push((entry.path().to_path_buf(), ext));
    }

    let total_files = files.len() as u64;
    let by_extension = sorted_counts(ext_counts);
    let by_folder = sorted_counts(folder_counts);

    // Sample up to three files for each of the most common extensions, in
    // walk order.
    let mut samples: Map<String, Value> = Map::new();
    let mut picked: HashMap<String, usize> = HashMap::new();
    let top: Vec<String> = by_extension
        .keys()
        .take(SAMPLE_EXTENSIONS)
        .cloned()
        .collect();
    for ext in &top {
        samples.insert(ext.clone(), Value::Array(Vec::new()));
    }

    for (path, ext) in &files {
        if !samples.contains_key(ext) {
            continue;
        }
        let count = picked.entry(ext.clone()).or_insert(0);
        if *count >= SAMPLES_PER_EXTENSION {
            continue;
        }
        let entry = sample_file(path, root);
        if let Some(Value::Array(list)) = samples.get_mut(ext) {
            list.push(serde_json::to_value(entry).context("serializing sample entry")?);
        }
        *count += 1;
    }

    Ok(ArchiveSummary {
        root: root.display().to_string(),
        total_files,
        by_extension,
        by_folder,
        samples,
    })
}

/// Write the summary as pretty JSON.
pub fn write_summary(summary: &ArchiveSummary, out_path: &Path) -> Result<()> {
    let file = File::create(out_path)
        .with_context(|| format!("creating index output {}", out_path.display()))?;
    serde_json::to_writer_pretty(file, summary).context("serializing archive index")?;
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_else(|| NO_EXTENSION.to_string())
}

/// Order counts by descending count, then ascending name.
fn sorted_counts(counts: HashMap<String, u64>) -> Map<String, Value> {
    let mut pairs: Vec<(String, u64)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect()
}

fn sample_file(path: &Path, root: &Path) -> SampleEntry {
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned();

    let mut entry = SampleEntry {
        path: rel,
        size_bytes: 0,
        head_text: None,
        head_hex: None,
        error: None,
    };

    match read_head(path) {
        Ok((size, head)) => {
            entry.size_bytes = size;
            match std::str::from_utf8(&head) {
                Ok(text) => entry.head_text = Some(text.to_string()),
                Err(_) => {
                    let hex: String = head
                        .iter()
                        .take(SAMPLE_HEX_LEN)
                        .map(|b| format!("{:02x}", b))
                        .collect();
                    entry.head_hex = Some(hex);
                }
            }
        }
        Err(e) => entry.error = Some(e.to_string()),
    }

    entry
}

fn read_head(path: &Path) -> std::io::Result<(u64, Vec<u8>)> {
    let size = std::fs::metadata(path)?.len();
    let mut file = File::open(path)?;
    let mut head = vec![0u8; SAMPLE_HEAD_LEN.min(size as usize)];
    file.read_exact(&mut head)?;
    Ok((size, head))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(extension_of(Path::new("a/b/TRACE.SPC")), ".spc");
        assert_eq!(extension_of(Path::new("a/b/README")), NO_EXTENSION);
    }

    #[test]
    fn counts_sorted_by_count_then_name() {
        let mut counts = HashMap::new();
        counts.insert(".csv".to_string(), 2);
        counts.insert(".spc".to_string(), 5);
        counts.insert(".txt".to_string(), 2);

        let sorted = sorted_counts(counts);
        let keys: Vec<&String> = sorted.keys().collect();
        assert_eq!(keys, vec![".spc", ".csv", ".txt"]);
    }
}
