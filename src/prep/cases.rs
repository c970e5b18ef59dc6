// src/prep/cases.rs

use arrow::{
    array::{Array, Float64Array, StringArray},
    record_batch::RecordBatch,
};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::config::CaseConfig;
use crate::error::{PrepError, Result};
use crate::prep::records::CaseCount;
use crate::prep::CASE_COUNT_STAGE;
use crate::process::{
    clean_name, convert::coerce_to_f64, normalize_state_name, project::header_index,
};
use crate::schema::mapping::{
    CASE_COUNT_ALIASES, CASE_NAME_ALIASES, STATE_NAME, TERMINAL_CASE_COUNT,
};

/// Pick the source column for a field: a configured override if given, else the first alias.
fn find_column(
    index: &HashMap<String, usize>,
    configured: Option<&str>,
    aliases: &[&str],
) -> Option<usize> {
    match configured {
        Some(name) => index.get(&clean_name(name)).copied(),
        None => aliases.iter().find_map(|a| index.get(*a)).copied(),
    }
}

/// Clean a raw case-count extract into one `CaseCount` per row.
///
/// The region column becomes the normalized `state_name` join key and the latest-count
/// column becomes `terminal_case_count` (null when not numeric). Rows with a blank name
/// cannot be joined and are skipped.
#[instrument(level = "info", skip(raw, cfg), fields(rows = raw.num_rows()))]
pub fn load_case_counts(raw: &RecordBatch, cfg: &CaseConfig) -> Result<Vec<CaseCount>> {
    let index = header_index(raw);
    let name_idx = find_column(&index, cfg.name_column.as_deref(), CASE_NAME_ALIASES);
    let count_idx = find_column(&index, cfg.count_column.as_deref(), CASE_COUNT_ALIASES);

    let (name_idx, count_idx) = match (name_idx, count_idx) {
        (Some(n), Some(c)) => (n, c),
        (n, c) => {
            let mut missing = Vec::new();
            if n.is_none() {
                missing.push(STATE_NAME.to_string());
            }
            if c.is_none() {
                missing.push(TERMINAL_CASE_COUNT.to_string());
            }
            return Err(PrepError::SchemaMismatch {
                stage: CASE_COUNT_STAGE,
                missing,
            });
        }
    };

    let names = raw
        .column(name_idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            arrow::error::ArrowError::SchemaError(format!("{} is not a text column", STATE_NAME))
        })?;
    let coerced = coerce_to_f64(raw.column(count_idx));
    if coerced.failed > 0 {
        debug!(nulls = coerced.failed, "non-numeric case counts coerced to null");
    }
    let counts = coerced
        .array
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| {
            arrow::error::ArrowError::SchemaError(format!(
                "{} did not coerce to Float64",
                TERMINAL_CASE_COUNT
            ))
        })?;

    let mut rows = Vec::with_capacity(raw.num_rows());
    let mut blank = 0usize;
    for i in 0..raw.num_rows() {
        let state_name = if names.is_null(i) {
            String::new()
        } else {
            normalize_state_name(names.value(i))
        };
        if state_name.is_empty() {
            blank += 1;
            continue;
        }
        let terminal_case_count = (!counts.is_null(i)).then(|| counts.value(i));
        rows.push(CaseCount {
            state_name,
            terminal_case_count,
        });
    }
    if blank > 0 {
        debug!(blank, "skipped rows without a state name");
    }

    info!(rows = rows.len(), "loaded case counts");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::parse_csv_table;

    #[test]
    fn region_and_count_columns_are_renamed() -> anyhow::Result<()> {
        let csv = "\
Province_State,Country_Region,Confirmed,Deaths
Alabama ,US,\"5,000\",100
 NEW YORK,US,n/a,0
,US,12,0
";
        let rows = load_case_counts(&parse_csv_table(csv.as_bytes())?, &CaseConfig::default())?;
        assert_eq!(
            rows,
            vec![
                CaseCount {
                    state_name: "alabama".into(),
                    terminal_case_count: Some(5000.0),
                },
                CaseCount {
                    state_name: "new york".into(),
                    terminal_case_count: None,
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn configured_latest_column_wins() -> anyhow::Result<()> {
        let csv = "\
State,4/1/20,4/2/20
Alaska,133,143
";
        let cfg = CaseConfig {
            name_column: None,
            count_column: Some("4/2/20".into()),
        };
        let rows = load_case_counts(&parse_csv_table(csv.as_bytes())?, &cfg)?;
        assert_eq!(rows[0].terminal_case_count, Some(143.0));
        Ok(())
    }

    #[test]
    fn missing_columns_are_a_schema_mismatch() -> anyhow::Result<()> {
        let csv = "Country,Deaths\nUS,1\n";
        let err =
            load_case_counts(&parse_csv_table(csv.as_bytes())?, &CaseConfig::default()).unwrap_err();
        match err {
            PrepError::SchemaMismatch { stage, missing } => {
                assert_eq!(stage, CASE_COUNT_STAGE);
                assert_eq!(missing, vec![STATE_NAME, TERMINAL_CASE_COUNT]);
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }
}
