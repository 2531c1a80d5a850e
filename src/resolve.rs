// ========================================================================================
//
//                          IDENTIFIER → GENE RESOLUTION
//
// ========================================================================================
//
// Turns raw lookup results into the `ResultMap` consumed by the rewriter. Each result
// is classified exactly once, in a fixed priority order; anything that is not a usable
// gene mapping or intergenic annotation is logged and dropped, leaving its identifier
// unresolved.

use crate::lookup::{LookupError, VariantLookup, json_kind};
use crate::types::{GeneMapping, IdentifierSet, ResultMap};
use serde_json::{Map, Value};
use std::fmt;

/// The primary annotation namespace of a result.
const PRIMARY_NAMESPACE: &str = "dbsnp";
const GENE_FIELD: &str = "gene";
const QUERY_FIELD: &str = "query";

// ========================================================================================
//                                 CLASSIFICATION
// ========================================================================================

/// Why a result did not produce an entry. These are per-identifier conditions, not
/// run failures.
#[derive(Debug, Clone, PartialEq)]
pub enum Discard {
    /// The result is not a JSON object.
    NotARecord(Value),
    /// The service reported an error for this query.
    Error(Value),
    /// The identifier is unknown to the service.
    NotFound(Value),
    /// The result has no `dbsnp` namespace.
    MissingNamespace(Value),
    /// The result does not say which identifier it answers.
    MissingQuery(Value),
    /// An intergenic result without any gene name annotation.
    MissingIntergenicName { query: String },
    /// `dbsnp.gene` is neither a gene record nor a list of them.
    MalformedGene { query: String, found: &'static str },
}

impl fmt::Display for Discard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discard::NotARecord(value) => write!(f, "Result is not a record: {value}"),
            Discard::Error(error) => write!(f, "Error: {error}"),
            Discard::NotFound(value) => write!(f, "Not found: {value}"),
            Discard::MissingNamespace(value) => write!(f, "No {PRIMARY_NAMESPACE}: {value}"),
            Discard::MissingQuery(value) => write!(f, "No {QUERY_FIELD}: {value}"),
            Discard::MissingIntergenicName { query } => {
                write!(f, "Intergenic SNP {query} has no gene name annotation")
            }
            Discard::MalformedGene { query, found } => {
                write!(f, "SNP {query} has a {PRIMARY_NAMESPACE}.{GENE_FIELD} {found} instead of gene records")
            }
        }
    }
}

/// The classification of a single lookup result.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Discarded(Discard),
    Intergenic { query: String, marker: String },
    Genes { query: String, genes: GeneMapping },
}

/// Classifies one lookup result. The checks run in a fixed order and the first one
/// that applies decides the outcome.
pub fn classify(result: &Value) -> Outcome {
    let Some(record) = result.as_object() else {
        return Outcome::Discarded(Discard::NotARecord(result.clone()));
    };
    if let Some(error) = record.get("error") {
        return Outcome::Discarded(Discard::Error(error.clone()));
    }
    if let Some(notfound) = record.get("notfound") {
        // Report the identifier when there is one; the flag alone says little.
        let reported = record.get(QUERY_FIELD).unwrap_or(notfound);
        return Outcome::Discarded(Discard::NotFound(reported.clone()));
    }
    let Some(namespace) = record.get(PRIMARY_NAMESPACE).and_then(Value::as_object) else {
        return Outcome::Discarded(Discard::MissingNamespace(result.clone()));
    };
    let Some(query) = record.get(QUERY_FIELD).and_then(Value::as_str) else {
        return Outcome::Discarded(Discard::MissingQuery(result.clone()));
    };
    let query = query.to_string();

    match namespace.get(GENE_FIELD) {
        None => match intergenic_marker(record) {
            Some(marker) => Outcome::Intergenic { query, marker },
            None => Outcome::Discarded(Discard::MissingIntergenicName { query }),
        },
        Some(Value::Object(gene)) => {
            let mut genes = GeneMapping::new();
            add_gene(&mut genes, gene, &query);
            Outcome::Genes { query, genes }
        }
        Some(Value::Array(list)) => {
            let mut genes = GeneMapping::new();
            for entry in list {
                match entry.as_object() {
                    Some(gene) => add_gene(&mut genes, gene, &query),
                    None => log::warn!(
                        "Skipping non-record gene entry for {query}: {entry}"
                    ),
                }
            }
            Outcome::Genes { query, genes }
        }
        Some(other) => Outcome::Discarded(Discard::MalformedGene {
            query,
            found: json_kind(other),
        }),
    }
}

/// Extracts `snpeff.ann.genename` and converts its dash-joined form to a comma-joined
/// one. `ann` may be a single annotation or a list; the first annotation carrying a
/// gene name wins.
fn intergenic_marker(record: &Map<String, Value>) -> Option<String> {
    let ann = record.get("snpeff")?.get("ann")?;
    let genename = match ann {
        Value::Array(annotations) => annotations
            .iter()
            .find_map(|a| a.get("genename").and_then(Value::as_str)),
        single => single.get("genename").and_then(Value::as_str),
    }?;
    Some(genename.replace('-', ","))
}

fn add_gene(genes: &mut GeneMapping, gene: &Map<String, Value>, query: &str) {
    let Some(symbol) = gene.get("symbol").and_then(Value::as_str) else {
        log::warn!("Skipping gene record without a symbol for {query}: {gene:?}");
        return;
    };
    let id = match gene.get("geneid") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    genes.insert(symbol, id);
}

// ========================================================================================
//                                   RESOLUTION
// ========================================================================================

/// Folds classified results into a `ResultMap`, logging every discarded and intergenic
/// result, then the full map.
pub fn build_result_map<I>(results: I) -> ResultMap
where
    I: IntoIterator<Item = Value>,
{
    let mut map = ResultMap::new();
    let mut discarded = 0usize;

    for result in results {
        match classify(&result) {
            Outcome::Discarded(reason) => {
                discarded += 1;
                log::warn!("{reason}");
            }
            Outcome::Intergenic { query, marker } => {
                log::info!("Intergenic SNP {query} found!");
                map.set_intergenic(&query, marker);
            }
            Outcome::Genes { query, genes } => {
                if genes.is_empty() {
                    log::warn!("SNP {query} lists genes but none carry a symbol");
                }
                map.add_genes(&query, genes);
            }
        }
    }

    for (identifier, entry) in map.sorted_entries() {
        log::info!("{identifier} : {entry}");
    }
    if discarded > 0 {
        log::warn!("{discarded} lookup results were discarded");
    }

    map
}

/// Resolves every identifier with one batch query and builds the result map.
pub fn resolve_identifiers<L: VariantLookup + ?Sized>(
    lookup: &L,
    identifiers: &IdentifierSet,
    scopes: &str,
) -> Result<ResultMap, LookupError> {
    let ids: Vec<String> = identifiers.iter().cloned().collect();
    let results = lookup.query_many(&ids, scopes)?;
    log::info!(
        "Received {} lookup results for {} identifiers",
        results.len(),
        ids.len()
    );

    let map = build_result_map(results);
    if map.is_empty() && !identifiers.is_empty() {
        log::warn!("None of the {} identifiers could be resolved", identifiers.len());
        return Ok(map);
    }
    let unresolved = identifiers.iter().filter(|id| !map.contains(id)).count();
    if unresolved > 0 {
        log::warn!("{unresolved} identifiers could not be resolved");
    }
    Ok(map)
}
