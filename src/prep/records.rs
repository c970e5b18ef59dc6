// src/prep/records.rs

use arrow::{
    array::{ArrayRef, Float64Array, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

/// One population estimate as returned by the census service, before reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPopulation {
    pub geoid: String,
    pub name: String,
    pub estimate: f64,
}

/// One entry of the state reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCode {
    pub state_abbrev: String,
    pub state_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePopulation {
    /// Two-digit state FIPS code as the census API returns it.
    pub geoid: String,
    pub state_abbrev: String,
    /// Normalized join key.
    pub state_name: String,
    pub population_estimate_2018: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseCount {
    /// Normalized join key.
    pub state_name: String,
    pub terminal_case_count: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedStateRecord {
    pub geoid: String,
    pub state_abbrev: String,
    pub state_name: String,
    pub case_count: Option<f64>,
    pub population_2018: f64,
    pub cases_per_100k: Option<i64>,
}

/// Row counts of an inner join, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    pub matched: usize,
    /// Left rows with no counterpart on the right.
    pub unmatched_left: usize,
    /// Right rows with no counterpart on the left.
    pub unmatched_right: usize,
    /// Left rows ignored because an earlier row carried the same key.
    #[serde(default)]
    pub duplicate_left: usize,
    /// Right rows ignored because an earlier row carried the same key.
    pub duplicate_right: usize,
}

fn utf8(name: &str) -> Field {
    Field::new(name, DataType::Utf8, false)
}

pub fn state_population_batch(rows: &[StatePopulation]) -> Result<RecordBatch> {
    let schema = Schema::new(vec![
        utf8("geoid"),
        utf8("state_abbrev"),
        utf8("state_name"),
        Field::new("population_estimate_2018", DataType::Float64, false),
    ]);
    let cols: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.geoid))),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| &r.state_abbrev),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| &r.state_name),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.population_estimate_2018),
        )),
    ];
    RecordBatch::try_new(Arc::new(schema), cols).map_err(Into::into)
}

pub fn case_count_batch(rows: &[CaseCount]) -> Result<RecordBatch> {
    let schema = Schema::new(vec![
        utf8("state_name"),
        Field::new("terminal_case_count", DataType::Float64, true),
    ]);
    let cols: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| &r.state_name),
        )),
        Arc::new(Float64Array::from(
            rows.iter()
                .map(|r| r.terminal_case_count)
                .collect::<Vec<_>>(),
        )),
    ];
    RecordBatch::try_new(Arc::new(schema), cols).map_err(Into::into)
}

pub fn joined_batch(rows: &[JoinedStateRecord]) -> Result<RecordBatch> {
    let schema = Schema::new(vec![
        utf8("geoid"),
        utf8("state_abbrev"),
        utf8("state_name"),
        Field::new("case_count", DataType::Float64, true),
        Field::new("population_2018", DataType::Float64, false),
        Field::new("cases_per_100k", DataType::Int64, true),
    ]);
    let cols: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.geoid))),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| &r.state_abbrev),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| &r.state_name),
        )),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.case_count).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.population_2018),
        )),
        Arc::new(Int64Array::from(
            rows.iter().map(|r| r.cases_per_100k).collect::<Vec<_>>(),
        )),
    ];
    RecordBatch::try_new(Arc::new(schema), cols).map_err(Into::into)
}
