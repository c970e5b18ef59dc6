use anyhow::{Context, Result};
use arrow::array::Array;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use stateprep::store::{manifest::MANIFEST_FILE, RunManifest};
use std::{env, fs::File, path::Path, process::exit};

fn main() {
    // Expect exactly one CLI argument: a persisted table or an output directory.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <TABLE.parquet | OUTPUT_DIR>", args[0]);
        exit(1);
    }
    let path = Path::new(&args[1]);
    let res = if path.is_dir() {
        inspect_manifest(&path.join(MANIFEST_FILE))
    } else {
        inspect_table(path)
    };
    if let Err(e) = res {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Print schema, row count and per-column null counts of one persisted table.
fn inspect_table(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of {}", path.display()))?;
    let num_row_groups = builder.metadata().num_row_groups();
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let mut rows = 0usize;
    let mut nulls = vec![0usize; schema.fields().len()];
    for batch in reader {
        let batch = batch?;
        rows += batch.num_rows();
        for (i, col) in batch.columns().iter().enumerate() {
            nulls[i] += col.null_count();
        }
    }

    println!("=== Table: {} ===", path.display());
    println!("Total rows:           {}", rows);
    println!("Number of row groups: {}", num_row_groups);
    println!();
    println!("=== Columns ===");
    for (field, n) in schema.fields().iter().zip(&nulls) {
        println!(
            "- {:<24} | {:<8} | nulls: {}",
            field.name(),
            format!("{}", field.data_type()),
            n
        );
    }
    Ok(())
}

/// Print the run manifest: tables written and join diagnostics.
fn inspect_manifest(path: &Path) -> Result<()> {
    let manifest = RunManifest::load(path)?;
    println!("=== Run {} ===", manifest.started_at);
    if let Some(done) = manifest.finished_at {
        println!("Finished:  {}", done);
    }
    println!("Rounding:  {:?}", manifest.rounding);
    println!();
    println!("=== Tables ===");
    for t in &manifest.tables {
        println!("- {:<24} | rows: {}", t.name, t.rows);
        for f in &t.files {
            println!("    {}", f.display());
        }
    }
    println!();
    println!("=== Joins ===");
    for (name, s) in &manifest.joins {
        println!(
            "- {:<24} | matched: {} | dropped left: {} | dropped right: {} | duplicates: {}/{}",
            name,
            s.matched,
            s.unmatched_left,
            s.unmatched_right,
            s.duplicate_left,
            s.duplicate_right
        );
    }
    Ok(())
}
