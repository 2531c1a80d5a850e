// ========================================================================================
//
//                             VARIANT ANNOTATION LOOKUP
//
// ========================================================================================
//
// The only network-facing part of the tool. The resolver talks to the service through
// the `VariantLookup` trait, which keeps the classification logic testable against
// canned JSON and lets the pipeline run without a network in tests.

use crate::config::LookupConfig;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use itertools::Itertools;
use reqwest::blocking::Client;
use serde_json::Value;
use std::io::IsTerminal;
use std::time::Duration;
use thiserror::Error;

const HTTP_USER_AGENT: &str = concat!("rsid-genes/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("could not build the HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request for batch {batch} to {endpoint} failed: {source}")]
    Transport {
        batch: usize,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("batch {batch} was rejected by {endpoint} (status={status}): {body}")]
    Status {
        batch: usize,
        endpoint: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("batch {batch} returned invalid JSON: {source}")]
    InvalidJson {
        batch: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("batch {batch} returned a JSON {found} where a list of results was expected")]
    UnexpectedPayload { batch: usize, found: &'static str },
}

/// A batch annotation service for variant identifiers.
pub trait VariantLookup {
    /// Queries every identifier in `ids` against the `scopes` namespace and returns the
    /// raw per-hit results. An identifier may produce zero, one or several results.
    fn query_many(&self, ids: &[String], scopes: &str) -> Result<Vec<Value>, LookupError>;
}

/// Blocking client for the MyVariant.info `query` endpoint.
pub struct MyVariantClient {
    client: Client,
    endpoint: String,
    fields: String,
    batch_size: usize,
}

impl MyVariantClient {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .user_agent(HTTP_USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(LookupError::Client)?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            fields: config.fields.iter().join(","),
            batch_size: config.batch_size.max(1),
        })
    }

    fn query_batch(&self, batch: usize, ids: &[String], scopes: &str) -> Result<Vec<Value>, LookupError> {
        let query = ids.iter().join(",");
        let mut form = vec![("q", query.as_str()), ("scopes", scopes)];
        if !self.fields.is_empty() {
            form.push(("fields", self.fields.as_str()));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .map_err(|source| LookupError::Transport {
                batch,
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| LookupError::Transport {
            batch,
            endpoint: self.endpoint.clone(),
            source,
        })?;
        if !status.is_success() {
            return Err(LookupError::Status {
                batch,
                endpoint: self.endpoint.clone(),
                status,
                body: body.trim().to_string(),
            });
        }

        parse_batch_response(batch, &body)
    }
}

impl VariantLookup for MyVariantClient {
    fn query_many(&self, ids: &[String], scopes: &str) -> Result<Vec<Value>, LookupError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let num_batches = ids.len().div_ceil(self.batch_size);
        log::info!(
            "Querying {} identifiers in {} batch(es) against {}",
            ids.len(),
            num_batches,
            self.endpoint
        );
        let pb = create_progress_bar(num_batches as u64, "querying variant annotations");

        let mut results = Vec::with_capacity(ids.len());
        for (batch, chunk) in ids.chunks(self.batch_size).enumerate() {
            let batch_results = self.query_batch(batch + 1, chunk, scopes)?;
            log::debug!(
                "Batch {}/{}: {} identifiers, {} results",
                batch + 1,
                num_batches,
                chunk.len(),
                batch_results.len()
            );
            results.extend(batch_results);
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(results)
    }
}

/// Parses one batch body. The service answers a batch query with a JSON list; any
/// other shape (typically an error object) fails the whole run.
pub fn parse_batch_response(batch: usize, body: &str) -> Result<Vec<Value>, LookupError> {
    let value: Value =
        serde_json::from_str(body).map_err(|source| LookupError::InvalidJson { batch, source })?;
    match value {
        Value::Array(results) => Ok(results),
        other => Err(LookupError::UnexpectedPayload {
            batch,
            found: json_kind(&other),
        }),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let draw_target = if std::io::stderr().is_terminal() {
        ProgressDrawTarget::stderr_with_hz(20)
    } else {
        ProgressDrawTarget::hidden()
    };

    let pb = ProgressBar::with_draw_target(Some(len), draw_target);
    let style = ProgressStyle::with_template(
        "> [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches {msg}",
    )
    .map(|style| style.progress_chars("█▉▊▋▌▍▎▏  "))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message.to_string());

    pb
}
