// src/storage/local.rs

//! Local filesystem artifact writer.
//!
//! Writes the merged course list and the run summary as JSON. Writes are
//! atomic (temp file, then rename) so a crash mid-write never leaves a
//! truncated artifact behind.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::{OutputConfig, RunSummary};

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    results_path: PathBuf,
    summary_path: PathBuf,
}

impl LocalStorage {
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            results_path: PathBuf::from(&output.results_path),
            summary_path: PathBuf::from(&output.summary_path),
        }
    }

    /// Persist one run: the course list and the full summary.
    ///
    /// Called for failed runs too; a `success:false` summary is an artifact
    /// like any other.
    pub async fn write_run(&self, summary: &RunSummary) -> Result<()> {
        self.write_json(&self.results_path, &summary.subjects).await?;
        self.write_json(&self.summary_path, summary).await?;
        log::info!(
            "Wrote {} subjects to {} (summary: {})",
            summary.subjects.len(),
            self.results_path.display(),
            self.summary_path.display()
        );
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        Self::ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn ensure_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}
