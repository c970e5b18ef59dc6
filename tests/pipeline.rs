use anyhow::Result;
use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use stateprep::{
    config::{OutputFormat, PipelineConfig},
    fetch::PopulationSource,
    pipeline,
    prep::records::{RawPopulation, StateCode},
    store::{manifest::MANIFEST_FILE, RunManifest},
    PrepError,
};
use std::{fs, fs::File, path::Path};
use tempfile::TempDir;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const STATE_CSV: &str = "\
AREA,ST,STATE,OCC_CODE,OCC_TITLE,O_GROUP,TOT_EMP,EMP_PRSE,JOBS_1000,H_MEAN,A_MEAN
01,AL,Alabama,00-0000,All Occupations,total,\"1,956,350\",0.4,1000.000,22.34,46450
02,AK,Alaska,11-0000,Management Occupations,major,**,1.1,55.5,50.22,104460
";

const METRO_CSV: &str = "\
PRIM_STATE,AREA,AREA_TITLE,OCC_CODE,OCC_TITLE,O_GROUP,TOT_EMP,JOBS_1000,H_MEAN,A_MEAN
TX,10180,\"Abilene, TX\",00-0000,All Occupations,total,68010,1000.0,20.47,42580
";

const NATIONAL_CSV: &str = "\
OCC_CODE,OCC_TITLE,O_GROUP,TOT_EMP,H_MEAN,A_MEAN
00-0000,All Occupations,total,146875480,25.72,53490
";

const CASES_CSV: &str = "\
Province_State,Confirmed
Alabama,5000
 california ,\"10,000\"
Diamond Princess,49
";

struct FixtureSource;

impl PopulationSource for FixtureSource {
    async fn state_population(&self) -> stateprep::Result<Vec<RawPopulation>> {
        Ok(vec![
            RawPopulation {
                geoid: "01".into(),
                name: "Alabama".into(),
                estimate: 4_887_871.0,
            },
            RawPopulation {
                geoid: "06".into(),
                name: " California ".into(),
                estimate: 39_557_045.0,
            },
            RawPopulation {
                geoid: "02".into(),
                name: "Alaska".into(),
                estimate: 737_438.0,
            },
            RawPopulation {
                geoid: "72".into(),
                name: "Puerto Rico".into(),
                estimate: 3_195_153.0,
            },
        ])
    }

    async fn state_codes(&self) -> stateprep::Result<Vec<StateCode>> {
        Ok([("AL", "Alabama"), ("AK", "Alaska"), ("CA", "california"), ("PR", "Puerto Rico")]
            .into_iter()
            .map(|(a, n)| StateCode {
                state_abbrev: a.into(),
                state_name: n.into(),
            })
            .collect())
    }
}

fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,stateprep=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn fixture_config(dir: &Path, state_csv: &str) -> Result<PipelineConfig> {
    let mut cfg = PipelineConfig::default();
    let write = |name: &str, body: &str| -> Result<std::path::PathBuf> {
        let p = dir.join(name);
        fs::write(&p, body)?;
        Ok(p)
    };
    cfg.inputs.state_occupations = write("state.csv", state_csv)?;
    cfg.inputs.metro_occupations = write("metro.csv", METRO_CSV)?;
    cfg.inputs.national_occupations = write("national.csv", NATIONAL_CSV)?;
    cfg.inputs.case_counts = write("cases.csv", CASES_CSV)?;
    cfg.output.dir = dir.join("out");
    cfg.output.formats = vec![OutputFormat::Parquet, OutputFormat::Csv];
    Ok(cfg)
}

fn read_table(path: &Path) -> Result<arrow::record_batch::RecordBatch> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let schema = batches[0].schema();
    Ok(arrow::compute::concat_batches(&schema, &batches)?)
}

#[tokio::test]
async fn end_to_end_writes_every_table() -> Result<()> {
    init_test_logging();
    let dir = TempDir::new()?;
    let cfg = fixture_config(dir.path(), STATE_CSV)?;

    let manifest = pipeline::run_with_source(&cfg, &FixtureSource).await?;

    let names: Vec<&str> = manifest.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "state_occupations",
            "metro_occupations",
            "national_occupations",
            "state_population",
            "term_case_counts",
            "state_population_cases",
        ]
    );
    for t in &manifest.tables {
        assert_eq!(t.files.len(), 2);
        assert!(t.files.iter().all(|f| f.exists()), "{}", t.name);
    }

    // population: Puerto Rico gone, names normalized
    let pop = read_table(&cfg.output.dir.join("state_population.parquet"))?;
    assert_eq!(pop.num_rows(), 3);
    let pop_names = pop
        .column(2)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert!(pop_names.iter().all(|n| n != Some("puerto rico")));
    assert_eq!(pop_names.value(1), "california");

    // joined: inner join of {alabama, california, alaska} with {alabama, california, diamond princess}
    let joined = read_table(&cfg.output.dir.join("state_population_cases.parquet"))?;
    assert_eq!(joined.num_rows(), 2);
    let abbrevs = joined
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(abbrevs.value(0), "AL");
    assert_eq!(abbrevs.value(1), "CA");
    let rate = joined
        .column(5)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(rate.value(0), 102);
    assert_eq!(rate.value(1), 25); // 10000 / 39557045 * 1e5 = 25.28

    // state occupations: placeholder kept as null, share derived
    let occ = read_table(&cfg.output.dir.join("state_occupations.parquet"))?;
    assert_eq!(occ.num_rows(), 2);
    let emp = occ
        .column(occ.schema().index_of("total_employment")?)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert!(emp.is_null(1));
    let share = occ
        .column(occ.schema().index_of("share_of_workforce")?)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(share.value(1), 5.55);

    let national = read_table(&cfg.output.dir.join("national_occupations.parquet"))?;
    assert!(national.schema().index_of("share_of_workforce").is_err());

    // manifest carries join diagnostics
    let on_disk = RunManifest::load(cfg.output.dir.join(MANIFEST_FILE))?;
    let stats = on_disk.joins["state_population_cases"];
    assert_eq!(stats.matched, 2);
    assert_eq!(stats.unmatched_left, 1);
    assert_eq!(stats.unmatched_right, 1);
    assert_eq!(on_disk.joins["state_population"].matched, 3);
    Ok(())
}

#[tokio::test]
async fn schema_mismatch_aborts_before_anything_is_written() -> Result<()> {
    init_test_logging();
    let dir = TempDir::new()?;
    let broken = STATE_CSV.replacen("JOBS_1000", "SOMETHING_ELSE", 1);
    let cfg = fixture_config(dir.path(), &broken)?;

    let err = pipeline::run_with_source(&cfg, &FixtureSource)
        .await
        .unwrap_err();
    let mismatch = err
        .chain()
        .find_map(|e| e.downcast_ref::<PrepError>())
        .expect("PrepError in chain");
    assert!(matches!(mismatch, PrepError::SchemaMismatch { .. }));
    assert!(!cfg.output.dir.exists());
    Ok(())
}
