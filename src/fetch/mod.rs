// src/fetch/mod.rs

pub mod census;

pub use census::CensusClient;

use crate::error::Result;
use crate::prep::records::{RawPopulation, StateCode};

/// Remote statistical data the population stage depends on.
///
/// Implementations own transport concerns (timeouts, retries); callers treat any error
/// as a fatal retrieval failure.
#[allow(async_fn_in_trait)]
pub trait PopulationSource {
    /// Per-state population estimates: census geo id, display name, estimate.
    async fn state_population(&self) -> Result<Vec<RawPopulation>>;

    /// Reference list of state abbreviations and names.
    async fn state_codes(&self) -> Result<Vec<StateCode>>;
}
