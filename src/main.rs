use anyhow::Result;
use stateprep::{pipeline, PipelineConfig};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const CONFIG_ENV: &str = "STATEPREP_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load configuration ───────────────────────────────────────
    let cfg = match env::args().nth(1).or_else(|| env::var(CONFIG_ENV).ok()) {
        Some(path) => {
            info!(config = %path, "loading configuration");
            PipelineConfig::load(&path)?
        }
        None => {
            warn!("no config given; using defaults");
            PipelineConfig::default()
        }
    }
    .with_env();

    // ─── 3) prepare + persist every table ────────────────────────────
    let manifest = pipeline::run(&cfg).await?;
    for table in &manifest.tables {
        info!(table = %table.name, rows = table.rows, "written");
    }
    for (join, stats) in &manifest.joins {
        info!(
            join = %join,
            matched = stats.matched,
            dropped_left = stats.unmatched_left,
            dropped_right = stats.unmatched_right,
            "join summary"
        );
    }

    info!("all done");
    Ok(())
}
