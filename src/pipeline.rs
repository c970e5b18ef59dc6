// src/pipeline.rs

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use std::path::PathBuf;
use tokio::task;
use tracing::{info, instrument};

use crate::config::{CaseConfig, InputPaths, PipelineConfig};
use crate::fetch::{CensusClient, PopulationSource};
use crate::prep::{
    self,
    records::{case_count_batch, joined_batch, state_population_batch},
    JoinStats,
};
use crate::process::load_csv_table;
use crate::schema::Scope;
use crate::store::{RunManifest, TableStore};

/// Every stage's finalized table, computed but not yet persisted.
pub struct PreparedTables {
    /// (output name, table) in a fixed order.
    pub tables: Vec<(&'static str, RecordBatch)>,
    pub population_stats: JoinStats,
    pub join_stats: JoinStats,
}

/// Run the whole pipeline against the configured census service.
pub async fn run(cfg: &PipelineConfig) -> Result<RunManifest> {
    let source = CensusClient::new(cfg.census.clone())?;
    run_with_source(cfg, &source).await
}

/// Compute every table, then persist them. Nothing is written if any stage fails.
#[instrument(level = "info", skip_all, fields(out = %cfg.output.dir.display()))]
pub async fn run_with_source<S: PopulationSource>(
    cfg: &PipelineConfig,
    source: &S,
) -> Result<RunManifest> {
    let mut manifest = RunManifest::new(cfg.rounding);
    let prepared = prepare(cfg, source).await?;

    let store = TableStore::new(&cfg.output.dir, &cfg.output.formats)?;
    for (name, batch) in &prepared.tables {
        let saved = store
            .save(name, batch)
            .with_context(|| format!("saving {}", name))?;
        manifest.record_table(saved);
    }
    manifest.record_join(prep::STATE_POPULATION, prepared.population_stats);
    manifest.record_join(prep::STATE_POPULATION_CASES, prepared.join_stats);

    let path = manifest.finish(store.dir())?;
    info!(manifest = %path.display(), tables = manifest.tables.len(), "run complete");
    Ok(manifest)
}

/// Run all stages. The occupation leaves and the case loader go to the blocking pool while
/// the population retrieval runs on the async side; the join waits for both of its inputs.
pub async fn prepare<S: PopulationSource>(
    cfg: &PipelineConfig,
    source: &S,
) -> Result<PreparedTables> {
    let occupation_inputs = cfg.inputs.clone();
    let occupations_task = task::spawn_blocking(move || prepare_occupations(&occupation_inputs));

    let case_path = cfg.inputs.case_counts.clone();
    let case_cfg = cfg.cases.clone();
    let cases_task = task::spawn_blocking(move || prepare_cases(case_path, &case_cfg));

    let (occupations, population, cases) = tokio::try_join!(
        async { occupations_task.await? },
        async {
            prep::resolve_population(source)
                .await
                .context("resolving state population")
        },
        async { cases_task.await? },
    )?;

    let joined = prep::join_population_cases(&population.rows, &cases, cfg.rounding);

    let mut tables = occupations;
    tables.push((
        prep::STATE_POPULATION,
        state_population_batch(&population.rows)?,
    ));
    tables.push((prep::CASE_COUNT_STAGE, case_count_batch(&cases)?));
    tables.push((prep::STATE_POPULATION_CASES, joined_batch(&joined.rows)?));

    Ok(PreparedTables {
        tables,
        population_stats: population.stats,
        join_stats: joined.stats,
    })
}

/// Normalize the three occupation extracts in parallel.
pub fn prepare_occupations(inputs: &InputPaths) -> Result<Vec<(&'static str, RecordBatch)>> {
    let jobs = vec![
        (Scope::State, inputs.state_occupations.clone()),
        (Scope::Metro, inputs.metro_occupations.clone()),
        (Scope::National, inputs.national_occupations.clone()),
    ];
    jobs.into_par_iter()
        .map(|(scope, path)| {
            let stage = prep::stage_name(scope);
            let raw = load_csv_table(&path).with_context(|| format!("loading {}", stage))?;
            let table = prep::normalize_occupations(&raw, scope)
                .with_context(|| format!("normalizing {}", stage))?;
            Ok((stage, table))
        })
        .collect()
}

fn prepare_cases(path: PathBuf, cfg: &CaseConfig) -> Result<Vec<prep::CaseCount>> {
    let raw = load_csv_table(&path).context("loading case counts")?;
    prep::load_case_counts(&raw, cfg).context("cleaning case counts")
}
