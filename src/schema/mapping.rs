//! Source header → canonical field tables for every stage.
//!
//! Aliases are cleaned header names (see `process::names::clean_name`), so `TOT_EMP`,
//! `Tot_Emp` and `tot_emp` all resolve through the single alias `tot_emp`.

use super::types::{FieldSpec, Scope};

pub const SHARE_OF_WORKFORCE: &str = "share_of_workforce";
pub const JOBS_PER_1000: &str = "jobs_per_1000";
pub const DATA_SCOPE: &str = "data_scope";

pub const STATE_NAME: &str = "state_name";
pub const TERMINAL_CASE_COUNT: &str = "terminal_case_count";

const OCCUPATION_FIELDS: [FieldSpec; 3] = [
    FieldSpec::text("occupation_code", &["occ_code"]),
    FieldSpec::text("occupation_title", &["occ_title"]),
    FieldSpec::text("occupation_group", &["o_group", "occ_group"]),
];

const TOTAL_EMPLOYMENT: FieldSpec = FieldSpec::number("total_employment", &["tot_emp"]);
const JOBS_1000: FieldSpec = FieldSpec::number(JOBS_PER_1000, &["jobs_1000"]);
const MEAN_HOURLY: FieldSpec = FieldSpec::number("mean_hourly_wage", &["h_mean"]);
const MEAN_ANNUAL: FieldSpec = FieldSpec::number("mean_annual_wage", &["a_mean"]);

pub const STATE_OCCUPATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("area_code", &["area"]),
    FieldSpec::text("state_abbrev", &["st", "prim_state"]),
    FieldSpec::text(STATE_NAME, &["state", "area_title"]),
    OCCUPATION_FIELDS[0],
    OCCUPATION_FIELDS[1],
    OCCUPATION_FIELDS[2],
    TOTAL_EMPLOYMENT,
    JOBS_1000,
    MEAN_HOURLY,
    MEAN_ANNUAL,
];

pub const METRO_OCCUPATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("prim_state", &["prim_state"]),
    FieldSpec::text("area_code", &["area"]),
    FieldSpec::text("area_name", &["area_title", "area_name"]),
    OCCUPATION_FIELDS[0],
    OCCUPATION_FIELDS[1],
    OCCUPATION_FIELDS[2],
    TOTAL_EMPLOYMENT,
    JOBS_1000,
    MEAN_HOURLY,
    MEAN_ANNUAL,
];

pub const NATIONAL_OCCUPATION_FIELDS: &[FieldSpec] = &[
    OCCUPATION_FIELDS[0],
    OCCUPATION_FIELDS[1],
    OCCUPATION_FIELDS[2],
    TOTAL_EMPLOYMENT,
    MEAN_HOURLY,
    MEAN_ANNUAL,
];

pub const CASE_NAME_ALIASES: &[&str] = &["province_state", "state", "state_name", "region", "name"];
pub const CASE_COUNT_ALIASES: &[&str] =
    &["confirmed", "cases", "tot_cases", "total_cases", "case_count"];

/// Field table for an occupation extract of the given scope.
pub fn occupation_fields(scope: Scope) -> &'static [FieldSpec] {
    match scope {
        Scope::State => STATE_OCCUPATION_FIELDS,
        Scope::Metro => METRO_OCCUPATION_FIELDS,
        Scope::National => NATIONAL_OCCUPATION_FIELDS,
    }
}
