// src/prep/population.rs

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::fetch::PopulationSource;
use crate::prep::records::{JoinStats, RawPopulation, StateCode, StatePopulation};
use crate::process::normalize_state_name;

/// Territory present in the census response but never joined downstream.
pub const EXCLUDED_TERRITORY: &str = "puerto rico";

#[derive(Debug, Clone, PartialEq)]
pub struct PopulationResolution {
    pub rows: Vec<StatePopulation>,
    pub stats: JoinStats,
}

/// Retrieve estimates and the state reference list, then reconcile them.
///
/// Retrieval errors are returned as-is; nothing is retried here.
#[instrument(level = "info", skip(source))]
pub async fn resolve_population<S: PopulationSource>(source: &S) -> Result<PopulationResolution> {
    let (raw, codes) = tokio::try_join!(source.state_population(), source.state_codes())?;
    info!(
        estimates = raw.len(),
        reference = codes.len(),
        "retrieved population inputs"
    );
    Ok(reconcile_population(&raw, &codes))
}

/// Normalize names on both sides, drop Puerto Rico, inner-join on the normalized name.
pub fn reconcile_population(raw: &[RawPopulation], codes: &[StateCode]) -> PopulationResolution {
    let mut stats = JoinStats::default();

    let mut abbrev_by_name: HashMap<String, &str> = HashMap::with_capacity(codes.len());
    for code in codes {
        let key = normalize_state_name(&code.state_name);
        if abbrev_by_name.contains_key(&key) {
            stats.duplicate_right += 1;
            continue;
        }
        abbrev_by_name.insert(key, code.state_abbrev.trim());
    }

    let mut used: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut rows = Vec::with_capacity(raw.len());
    for r in raw {
        let state_name = normalize_state_name(&r.name);
        if state_name == EXCLUDED_TERRITORY {
            debug!(geoid = %r.geoid, "dropping excluded territory");
            continue;
        }
        if !seen.insert(state_name.clone()) {
            stats.duplicate_left += 1;
            debug!(state_name = %state_name, geoid = %r.geoid, "repeated estimate; dropped");
            continue;
        }
        match abbrev_by_name.get(&state_name) {
            Some(abbrev) => {
                stats.matched += 1;
                rows.push(StatePopulation {
                    geoid: r.geoid.trim().to_string(),
                    state_abbrev: abbrev.to_string(),
                    state_name: state_name.clone(),
                    population_estimate_2018: r.estimate,
                });
                used.insert(state_name);
            }
            None => {
                stats.unmatched_left += 1;
                debug!(state_name = %state_name, "no reference entry; dropped");
            }
        }
    }
    stats.unmatched_right = abbrev_by_name
        .keys()
        .filter(|k| !used.contains(*k))
        .count();

    info!(
        matched = stats.matched,
        unmatched_estimates = stats.unmatched_left,
        unused_reference = stats.unmatched_right,
        duplicate_estimates = stats.duplicate_left,
        "reconciled state population"
    );
    PopulationResolution { rows, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;

    fn est(geoid: &str, name: &str, estimate: f64) -> RawPopulation {
        RawPopulation {
            geoid: geoid.into(),
            name: name.into(),
            estimate,
        }
    }

    fn code(abbrev: &str, name: &str) -> StateCode {
        StateCode {
            state_abbrev: abbrev.into(),
            state_name: name.into(),
        }
    }

    struct StaticSource {
        raw: Vec<RawPopulation>,
        codes: Vec<StateCode>,
        fail: bool,
    }

    impl PopulationSource for StaticSource {
        async fn state_population(&self) -> Result<Vec<RawPopulation>> {
            if self.fail {
                return Err(PrepError::retrieval("memory://population", "unreachable"));
            }
            Ok(self.raw.clone())
        }

        async fn state_codes(&self) -> Result<Vec<StateCode>> {
            Ok(self.codes.clone())
        }
    }

    #[test]
    fn puerto_rico_never_survives() {
        let raw = vec![
            est("01", "Alabama", 4_887_871.0),
            est("72", " Puerto Rico ", 3_195_153.0),
            est("72", "PUERTO RICO", 3_195_153.0),
        ];
        let codes = vec![code("AL", "Alabama"), code("PR", "Puerto Rico")];
        let out = reconcile_population(&raw, &codes);

        assert_eq!(out.rows.len(), 1);
        assert!(out.rows.iter().all(|r| r.state_name != EXCLUDED_TERRITORY));
        assert_eq!(out.stats.unmatched_right, 1);
    }

    #[test]
    fn names_join_regardless_of_case_and_whitespace() {
        let raw = vec![est("06", " California ", 39_557_045.0)];
        let codes = vec![code("CA", "california")];
        let out = reconcile_population(&raw, &codes);

        assert_eq!(
            out.rows,
            vec![StatePopulation {
                geoid: "06".into(),
                state_abbrev: "CA".into(),
                state_name: "california".into(),
                population_estimate_2018: 39_557_045.0,
            }]
        );
        assert_eq!(out.stats.matched, 1);
    }

    #[test]
    fn unmatched_estimates_are_dropped_and_counted() {
        let raw = vec![
            est("01", "Alabama", 4_887_871.0),
            est("99", "Atlantis", 1.0),
        ];
        let codes = vec![
            code("AL", "Alabama"),
            code("GU", "Guam"),
            code("AL", "ALABAMA"),
        ];
        let out = reconcile_population(&raw, &codes);

        assert_eq!(out.rows.len(), 1);
        assert_eq!(
            out.stats,
            JoinStats {
                matched: 1,
                unmatched_left: 1,
                unmatched_right: 1,
                duplicate_left: 0,
                duplicate_right: 1,
            }
        );
    }

    #[test]
    fn repeated_estimates_keep_the_first() {
        let raw = vec![
            est("01", "Alabama", 4_887_871.0),
            est("01", " ALABAMA ", 1.0),
        ];
        let out = reconcile_population(&raw, &[code("AL", "Alabama")]);

        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].population_estimate_2018, 4_887_871.0);
        assert_eq!(out.stats.matched, 1);
        assert_eq!(out.stats.duplicate_left, 1);
    }

    #[tokio::test]
    async fn resolver_uses_the_source() -> anyhow::Result<()> {
        let source = StaticSource {
            raw: vec![est("02", "Alaska", 737_438.0)],
            codes: vec![code("AK", "Alaska")],
            fail: false,
        };
        let out = resolve_population(&source).await?;
        assert_eq!(out.rows[0].state_abbrev, "AK");
        Ok(())
    }

    #[tokio::test]
    async fn retrieval_failure_aborts_the_stage() {
        let source = StaticSource {
            raw: vec![],
            codes: vec![],
            fail: true,
        };
        let err = resolve_population(&source).await.unwrap_err();
        assert!(matches!(err, PrepError::Retrieval { .. }));
    }
}
