// src/prep/join.rs

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

use crate::config::RoundingMode;
use crate::prep::records::{CaseCount, JoinStats, JoinedStateRecord, StatePopulation};

const PER: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub rows: Vec<JoinedStateRecord>,
    pub stats: JoinStats,
}

/// Cases per 100k residents, rounded with `mode`.
///
/// Null when the count is missing or the population is zero. The multiplication happens
/// before the division so exact ties such as 2.5 stay exact.
pub fn cases_per_100k(
    case_count: Option<f64>,
    population: f64,
    mode: RoundingMode,
) -> Option<i64> {
    let cases = case_count?;
    if population == 0.0 {
        return None;
    }
    let rate = cases * PER / population;
    rate.is_finite().then(|| mode.round(rate) as i64)
}

/// Inner-join population and case counts on the normalized state name.
///
/// Output follows population order. A state present on only one side is dropped;
/// repeated rows for one state keep the first on either side.
#[instrument(level = "info", skip_all, fields(population = population.len(), cases = cases.len()))]
pub fn join_population_cases(
    population: &[StatePopulation],
    cases: &[CaseCount],
    mode: RoundingMode,
) -> JoinOutcome {
    let mut stats = JoinStats::default();

    let mut by_name: HashMap<&str, &CaseCount> = HashMap::with_capacity(cases.len());
    for c in cases {
        if by_name.contains_key(c.state_name.as_str()) {
            stats.duplicate_right += 1;
            continue;
        }
        by_name.insert(c.state_name.as_str(), c);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(population.len());
    let mut used: HashSet<&str> = HashSet::with_capacity(population.len());
    let mut rows = Vec::with_capacity(population.len().min(by_name.len()));
    for p in population {
        if !seen.insert(p.state_name.as_str()) {
            stats.duplicate_left += 1;
            debug!(state_name = %p.state_name, "repeated population row; dropped");
            continue;
        }
        let Some(c) = by_name.get(p.state_name.as_str()) else {
            stats.unmatched_left += 1;
            debug!(state_name = %p.state_name, "no case count; dropped");
            continue;
        };
        stats.matched += 1;
        used.insert(c.state_name.as_str());
        rows.push(JoinedStateRecord {
            geoid: p.geoid.clone(),
            state_abbrev: p.state_abbrev.clone(),
            state_name: p.state_name.clone(),
            case_count: c.terminal_case_count,
            population_2018: p.population_estimate_2018,
            cases_per_100k: cases_per_100k(
                c.terminal_case_count,
                p.population_estimate_2018,
                mode,
            ),
        });
    }
    for name in by_name.keys().filter(|k| !used.contains(*k)) {
        stats.unmatched_right += 1;
        debug!(state_name = %name, "no population estimate; dropped");
    }

    info!(
        matched = stats.matched,
        unmatched_population = stats.unmatched_left,
        unmatched_cases = stats.unmatched_right,
        duplicate_population = stats.duplicate_left,
        duplicate_cases = stats.duplicate_right,
        "joined population with case counts"
    );
    JoinOutcome { rows, stats }
}
