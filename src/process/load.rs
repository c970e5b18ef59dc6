// src/process/load.rs

use anyhow::{anyhow, Context, Result};
use arrow::{compute::concat_batches, csv::ReaderBuilder, record_batch::RecordBatch};
use std::{fs, io::Cursor, path::Path};
use tracing::{debug, instrument, warn};

use crate::schema::raw_string_schema;

const BATCH_SIZE: usize = 8_192;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Load a raw CSV extract from disk as an all-Utf8 table.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_csv_table<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let batch =
        parse_csv_table(&bytes).with_context(|| format!("parsing CSV {}", path.display()))?;
    debug!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "loaded raw table"
    );
    Ok(batch)
}

/// Parse CSV bytes (header row first) into one all-Utf8 RecordBatch.
pub fn parse_csv_table(bytes: &[u8]) -> Result<RecordBatch> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    // headers first, so every column can be read as text
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(bytes));
    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(anyhow!("CSV has no header row"));
    }

    let schema = raw_string_schema(&headers);
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .with_quote(b'"')
        .with_delimiter(b',')
        .build(Cursor::new(bytes))
        .context("creating CSV reader")?;

    let mut batches = Vec::new();
    for (idx, batch) in reader.enumerate() {
        match batch {
            Ok(b) => batches.push(b),
            Err(e) => {
                warn!(batch = idx, expected_fields = headers.len(), "CSV parsing failed");
                return Err(e).context("reading CSV batch");
            }
        }
    }

    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    concat_batches(&schema, &batches).context("concatenating CSV batches")
}
