// src/prep/mod.rs

pub mod cases;
pub mod join;
pub mod occupation;
pub mod population;
pub mod records;

pub use cases::load_case_counts;
pub use join::{cases_per_100k, join_population_cases, JoinOutcome};
pub use occupation::{
    normalize_metro_occupations, normalize_national_occupations, normalize_occupations,
    normalize_state_occupations,
};
pub use population::{reconcile_population, resolve_population, PopulationResolution};
pub use records::{CaseCount, JoinStats, JoinedStateRecord, StatePopulation};

use crate::schema::Scope;

/// Fixed output table names; each stage reports errors under its table name.
pub const STATE_OCCUPATIONS: &str = "state_occupations";
pub const METRO_OCCUPATIONS: &str = "metro_occupations";
pub const NATIONAL_OCCUPATIONS: &str = "national_occupations";
pub const STATE_POPULATION: &str = "state_population";
pub const CASE_COUNT_STAGE: &str = "term_case_counts";
pub const STATE_POPULATION_CASES: &str = "state_population_cases";

pub fn stage_name(scope: Scope) -> &'static str {
    match scope {
        Scope::State => STATE_OCCUPATIONS,
        Scope::Metro => METRO_OCCUPATIONS,
        Scope::National => NATIONAL_OCCUPATIONS,
    }
}
