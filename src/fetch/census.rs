// src/fetch/census.rs

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::{io::Cursor, time::Duration};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::PopulationSource;
use crate::config::CensusConfig;
use crate::error::{PrepError, Result};
use crate::prep::records::{RawPopulation, StateCode};
use crate::process::utils::parse_number;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the census data API and its state reference file.
#[derive(Debug, Clone)]
pub struct CensusClient {
    client: Client,
    cfg: CensusConfig,
}

/// Origin + path only, so API keys never reach logs or error messages.
fn redact(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}

impl CensusClient {
    pub fn new(cfg: CensusConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PrepError::retrieval(&cfg.base_url, e))?;
        Ok(Self { client, cfg })
    }

    /// `{base}/{year}/acs/{survey}?get=NAME,{variable}&for=state:*[&key=...]`
    pub fn estimates_url(&self) -> Result<Url> {
        let raw = format!(
            "{}/{}/acs/{}",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.year,
            self.cfg.survey
        );
        let mut url = Url::parse(&raw).map_err(|e| PrepError::retrieval(&raw, e))?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("get", &format!("NAME,{}", self.cfg.variable));
            q.append_pair("for", "state:*");
            if let Some(key) = &self.cfg.api_key {
                q.append_pair("key", key);
            }
        }
        Ok(url)
    }

    async fn get_text_core(&self, url: &Url) -> Result<String> {
        debug!(url = %redact(url), "fetching");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PrepError::retrieval(redact(url), e.without_url()))?
            .error_for_status()
            .map_err(|e| PrepError::retrieval(redact(url), e.without_url()))?;
        resp.text()
            .await
            .map_err(|e| PrepError::retrieval(redact(url), e.without_url()))
    }

    async fn get_text_with_retry(&self, url: &Url) -> Result<String> {
        let mut attempts = 0;
        loop {
            match self.get_text_core(url).await {
                Ok(t) => return Ok(t),
                Err(e) if attempts < self.cfg.max_retries => {
                    attempts += 1;
                    let backoff = self.cfg.initial_backoff_ms * 2u64.pow(attempts - 1);
                    warn!(
                        url = %redact(url),
                        attempt = attempts,
                        delay_ms = backoff,
                        error = %e,
                        "Retrying"
                    );
                    sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    error!(url = %redact(url), error = %e, "Exhausted retries");
                    return Err(e);
                }
            }
        }
    }
}

impl PopulationSource for CensusClient {
    #[instrument(level = "info", skip(self), fields(year = self.cfg.year, survey = %self.cfg.survey))]
    async fn state_population(&self) -> Result<Vec<RawPopulation>> {
        let url = self.estimates_url()?;
        let body = self.get_text_with_retry(&url).await?;
        let rows = parse_estimates(&body, &self.cfg.variable, &redact(&url))?;
        info!(rows = rows.len(), "retrieved state population estimates");
        Ok(rows)
    }

    #[instrument(level = "info", skip(self))]
    async fn state_codes(&self) -> Result<Vec<StateCode>> {
        let url = Url::parse(&self.cfg.state_codes_url)
            .map_err(|e| PrepError::retrieval(&self.cfg.state_codes_url, e))?;
        let body = self.get_text_with_retry(&url).await?;
        let codes = parse_state_codes(&body, &redact(&url))?;
        info!(rows = codes.len(), "retrieved state reference list");
        Ok(codes)
    }
}

fn cell_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse the census API's array-of-arrays body; the first row is the header.
pub fn parse_estimates(body: &str, variable: &str, source: &str) -> Result<Vec<RawPopulation>> {
    let table: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| PrepError::retrieval(source, format!("malformed JSON: {}", e)))?;
    let mut rows = table.into_iter();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| PrepError::retrieval(source, "empty response"))?
        .iter()
        .map(|v| cell_text(v).unwrap_or_default())
        .collect();

    let col = |name: &str| {
        header.iter().position(|h| h == name).ok_or_else(|| {
            PrepError::retrieval(source, format!("response has no {} column", name))
        })
    };
    let (name_idx, est_idx, geo_idx) = (col("NAME")?, col(variable)?, col("state")?);

    rows.enumerate()
        .map(|(i, row)| {
            let get = |idx: usize| row.get(idx).and_then(cell_text);
            let missing =
                |what: &str| PrepError::retrieval(source, format!("row {} has no {}", i + 1, what));
            let name = get(name_idx).ok_or_else(|| missing("NAME"))?;
            let geoid = get(geo_idx).ok_or_else(|| missing("state"))?;
            let estimate = get(est_idx)
                .as_deref()
                .and_then(parse_number)
                .ok_or_else(|| {
                    PrepError::retrieval(source, format!("non-numeric estimate for {}", name))
                })?;
            Ok(RawPopulation {
                geoid,
                name,
                estimate,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct StateCodeRow {
    #[serde(rename = "STUSAB")]
    abbrev: String,
    #[serde(rename = "STATE_NAME")]
    name: String,
}

/// Parse the pipe-delimited state reference file.
pub fn parse_state_codes(body: &str, source: &str) -> Result<Vec<StateCode>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(body.as_bytes()));

    let codes = rdr
        .deserialize::<StateCodeRow>()
        .map(|r| {
            r.map(|row| StateCode {
                state_abbrev: row.abbrev,
                state_name: row.name,
            })
            .map_err(|e| PrepError::retrieval(source, format!("malformed reference list: {}", e)))
        })
        .collect::<Result<Vec<_>>>()?;

    if codes.is_empty() {
        return Err(PrepError::retrieval(source, "empty reference list"));
    }
    Ok(codes)
}
