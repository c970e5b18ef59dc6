// src/prep/occupation.rs

use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    datatypes::{DataType, Field, Float64Type, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::Result;
use crate::prep::stage_name;
use crate::process::project;
use crate::schema::{
    mapping::{occupation_fields, DATA_SCOPE, JOBS_PER_1000, SHARE_OF_WORKFORCE},
    Scope,
};

/// Clean one occupation extract of the given scope.
///
/// State and metro tables gain `share_of_workforce = jobs_per_1000 / 10`; national
/// tables gain a leading constant `data_scope` column instead.
#[instrument(level = "info", skip(raw), fields(scope = scope.as_str(), rows = raw.num_rows()))]
pub fn normalize_occupations(raw: &RecordBatch, scope: Scope) -> Result<RecordBatch> {
    let projected = project(raw, occupation_fields(scope), stage_name(scope))?;
    let out = match scope {
        Scope::State | Scope::Metro => with_share_of_workforce(&projected)?,
        Scope::National => with_data_scope(&projected, scope)?,
    };
    info!(rows = out.num_rows(), columns = out.num_columns(), "normalized occupations");
    Ok(out)
}

pub fn normalize_state_occupations(raw: &RecordBatch) -> Result<RecordBatch> {
    normalize_occupations(raw, Scope::State)
}

pub fn normalize_metro_occupations(raw: &RecordBatch) -> Result<RecordBatch> {
    normalize_occupations(raw, Scope::Metro)
}

pub fn normalize_national_occupations(raw: &RecordBatch) -> Result<RecordBatch> {
    normalize_occupations(raw, Scope::National)
}

/// Append `share_of_workforce` (jobs per 100 workers); nulls propagate.
fn with_share_of_workforce(batch: &RecordBatch) -> Result<RecordBatch> {
    let idx = batch.schema().index_of(JOBS_PER_1000)?;
    let jobs = batch
        .column(idx)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| {
            ArrowError::SchemaError(format!("{} is not a Float64 column", JOBS_PER_1000))
        })?;
    let share: Float64Array = jobs.unary::<_, Float64Type>(|v| v / 10.0);

    let mut fields: Vec<Field> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    fields.push(Field::new(SHARE_OF_WORKFORCE, DataType::Float64, true));

    let mut cols = batch.columns().to_vec();
    cols.push(Arc::new(share) as ArrayRef);

    RecordBatch::try_new(Arc::new(Schema::new(fields)), cols).map_err(Into::into)
}

fn with_data_scope(batch: &RecordBatch, scope: Scope) -> Result<RecordBatch> {
    let scope_col = StringArray::from(vec![scope.as_str(); batch.num_rows()]);

    let mut fields = vec![Field::new(DATA_SCOPE, DataType::Utf8, false)];
    fields.extend(batch.schema().fields().iter().map(|f| f.as_ref().clone()));

    let mut cols: Vec<ArrayRef> = vec![Arc::new(scope_col)];
    cols.extend(batch.columns().iter().cloned());

    RecordBatch::try_new(Arc::new(Schema::new(fields)), cols).map_err(Into::into)
}
