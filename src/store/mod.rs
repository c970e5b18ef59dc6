// src/store/mod.rs

pub mod manifest;

pub use manifest::RunManifest;

use anyhow::{Context, Result};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use crate::config::OutputFormat;

/// A table persisted by `TableStore::save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTable {
    pub name: String,
    pub rows: usize,
    pub files: Vec<PathBuf>,
}

/// Writes finalized stage tables under fixed names, one file per configured format.
pub struct TableStore {
    dir: PathBuf,
    formats: Vec<OutputFormat>,
}

impl TableStore {
    pub fn new(dir: impl Into<PathBuf>, formats: &[OutputFormat]) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        // first mention of each format, in configured order
        let mut unique: Vec<OutputFormat> = Vec::with_capacity(formats.len());
        for &f in formats {
            if !unique.contains(&f) {
                unique.push(f);
            }
        }
        Ok(Self {
            dir,
            formats: unique,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str, format: OutputFormat) -> PathBuf {
        self.dir.join(format!("{}.{}", name, format.extension()))
    }

    /// Write `batch` once per format. Each file is written to a temp file in the output
    /// directory and renamed into place.
    #[instrument(level = "info", skip(self, batch), fields(rows = batch.num_rows()))]
    pub fn save(&self, name: &str, batch: &RecordBatch) -> Result<SavedTable> {
        let mut files = Vec::with_capacity(self.formats.len());
        for &format in &self.formats {
            let path = self.path_for(name, format);
            let tmp = NamedTempFile::new_in(&self.dir)
                .with_context(|| format!("creating temp file in {}", self.dir.display()))?;
            let file = tmp.as_file().try_clone().context("cloning temp file handle")?;
            match format {
                OutputFormat::Parquet => write_parquet(file, batch),
                OutputFormat::Csv => write_csv(file, batch),
            }
            .with_context(|| format!("writing {}", path.display()))?;
            tmp.persist(&path)
                .with_context(|| format!("moving table into {}", path.display()))?;

            let bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            info!(table = name, path = %path.display(), bytes, "saved table");
            files.push(path);
        }

        Ok(SavedTable {
            name: name.to_string(),
            rows: batch.num_rows(),
            files,
        })
    }
}

fn write_parquet(file: File, batch: &RecordBatch) -> Result<()> {
    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .build();

    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), Some(props)).context("creating parquet writer")?;
    writer.write(batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(file: File, batch: &RecordBatch) -> Result<()> {
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch).context("writing batch to csv")?;
    let mut file = writer.into_inner();
    file.flush().context("flushing csv")?;
    file.sync_all().context("syncing csv")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::sync::Arc;

    fn sample() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("state_name", DataType::Utf8, false),
            Field::new("terminal_case_count", DataType::Float64, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["alabama", "alaska"])) as ArrayRef,
                Arc::new(Float64Array::from(vec![Some(5000.0), None])) as ArrayRef,
            ],
        )
        .unwrap()
    }

    #[test]
    fn saves_parquet_and_csv() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = TableStore::new(dir.path(), &[OutputFormat::Parquet, OutputFormat::Csv])?;
        let saved = store.save("term_case_counts", &sample())?;

        assert_eq!(saved.rows, 2);
        assert_eq!(saved.files.len(), 2);

        let parquet_path = store.path_for("term_case_counts", OutputFormat::Parquet);
        let reader =
            ParquetRecordBatchReaderBuilder::try_new(File::open(&parquet_path)?)?.build()?;
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 2);
        assert_eq!(batches[0].schema().field(1).name(), "terminal_case_count");
        assert_eq!(batches[0].column(1).null_count(), 1);

        let csv = fs::read_to_string(store.path_for("term_case_counts", OutputFormat::Csv))?;
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("state_name,terminal_case_count"));
        assert!(lines.next().is_some_and(|l| l.starts_with("alabama,5000")));

        // no temp files left behind
        let leftovers = fs::read_dir(dir.path())?.count();
        assert_eq!(leftovers, 2);
        Ok(())
    }

    #[test]
    fn repeated_formats_are_written_once() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = TableStore::new(
            dir.path(),
            &[OutputFormat::Csv, OutputFormat::Parquet, OutputFormat::Csv],
        )?;
        let saved = store.save("state_population", &sample())?;

        assert_eq!(
            saved.files,
            vec![
                store.path_for("state_population", OutputFormat::Csv),
                store.path_for("state_population", OutputFormat::Parquet),
            ]
        );
        assert_eq!(fs::read_dir(dir.path())?.count(), 2);
        Ok(())
    }
}
