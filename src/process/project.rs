// src/process/project.rs

use arrow::{array::ArrayRef, record_batch::RecordBatch};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{PrepError, Result};
use crate::process::{
    convert::{clean_text, coerce_to_f64},
    names::clean_names,
};
use crate::schema::{build_arrow_schema, FieldKind, FieldSpec};

/// Cleaned header name → column index of `batch`.
pub fn header_index(batch: &RecordBatch) -> HashMap<String, usize> {
    let raw: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    clean_names(&raw)
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect()
}

/// Resolve every spec against the cleaned headers.
///
/// Returns the source column index per spec, or one `SchemaMismatch` naming every
/// canonical field with no matching alias.
pub fn resolve_fields(
    index: &HashMap<String, usize>,
    specs: &[FieldSpec],
    stage: &'static str,
) -> Result<Vec<usize>> {
    let mut resolved = Vec::with_capacity(specs.len());
    let mut missing = Vec::new();
    for spec in specs {
        match spec.aliases.iter().find_map(|a| index.get(*a)) {
            Some(&i) => resolved.push(i),
            None => missing.push(spec.name.to_string()),
        }
    }
    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(PrepError::SchemaMismatch { stage, missing })
    }
}

/// Normalize headers, keep only the columns named by `specs` (in spec order, under their
/// canonical names) and coerce Number fields to Float64.
pub fn project(
    batch: &RecordBatch,
    specs: &[FieldSpec],
    stage: &'static str,
) -> Result<RecordBatch> {
    let index = header_index(batch);
    let sources = resolve_fields(&index, specs, stage)?;

    let mut cols: Vec<ArrayRef> = Vec::with_capacity(specs.len());
    for (spec, &src) in specs.iter().zip(&sources) {
        let arr = batch.column(src);
        match spec.kind {
            FieldKind::Text => cols.push(clean_text(arr)),
            FieldKind::Number => {
                let coerced = coerce_to_f64(arr);
                if coerced.failed > 0 {
                    debug!(
                        stage,
                        field = spec.name,
                        nulls = coerced.failed,
                        "non-numeric cells coerced to null"
                    );
                }
                cols.push(coerced.array);
            }
        }
    }

    RecordBatch::try_new(build_arrow_schema(specs), cols).map_err(Into::into)
}
