// src/store/manifest.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, io::Write, path::Path, path::PathBuf};
use tempfile::NamedTempFile;

use super::SavedTable;
use crate::config::RoundingMode;
use crate::prep::JoinStats;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Summary of one pipeline run, written next to the tables it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub rounding: RoundingMode,
    pub tables: Vec<SavedTable>,
    /// Join name → row accounting (matched / dropped on either side).
    pub joins: BTreeMap<String, JoinStats>,
}

impl RunManifest {
    pub fn new(rounding: RoundingMode) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            rounding,
            tables: Vec::new(),
            joins: BTreeMap::new(),
        }
    }

    pub fn record_table(&mut self, saved: SavedTable) {
        self.tables.push(saved);
    }

    pub fn record_join(&mut self, name: &str, stats: JoinStats) {
        self.joins.insert(name.to_string(), stats);
    }

    /// Stamp the finish time and write `manifest.json` into `dir` (temp file + rename).
    pub fn finish<P: AsRef<Path>>(&mut self, dir: P) -> Result<PathBuf> {
        self.finished_at = Some(Utc::now());

        let dir = dir.as_ref();
        let path = dir.join(MANIFEST_FILE);
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp manifest in {}", dir.display()))?;

        // pretty-print with a trailing newline
        serde_json::to_writer_pretty(&mut tmp, &*self).context("serializing manifest")?;
        tmp.write_all(b"\n")?;
        tmp.persist(&path)
            .with_context(|| format!("renaming manifest into {}", path.display()))?;
        Ok(path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        serde_json::from_reader(f).with_context(|| format!("parsing {}", path.display()))
    }
}
