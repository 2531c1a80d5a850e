// ========================================================================================
//
//                                  EDGE REWRITING
//
// ========================================================================================
//
// The second pass over the edge file. Every record's identifier list is replaced by
// the genes it resolved to, and the weight becomes the number of distinct genes.
// Records are streamed straight to the output; the first failure stops the pass and
// leaves whatever was already written in place.

use crate::types::{
    EdgeRecord, LABEL_SEPARATOR, OUTPUT_COLUMNS, ResolutionEntry, ResultMap, split_label,
};
use ahash::AHashSet;
use serde::Deserialize;
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to read record {record}: {source}")]
    Read {
        record: u64,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write the output file: {0}")]
    Write(#[source] csv::Error),
    #[error("failed to flush the output file: {0}")]
    Flush(#[from] std::io::Error),
    #[error(
        "identifier '{identifier}' in record {record} (Id '{edge_id}') was never resolved to a gene"
    )]
    UnresolvedIdentifier {
        identifier: String,
        record: u64,
        edge_id: String,
    },
}

/// An identifier with no entry in the result map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedIdentifier(pub String);

/// Counts reported after a successful rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub records: u64,
    pub total_weight: u64,
}

/// The input columns the rewrite needs. Anything else in the file, including the old
/// `Weight`, is ignored.
#[derive(Debug, Deserialize)]
struct InputEdge {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Target")]
    target: String,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Label")]
    label: String,
}

/// Maps one `Label` cell to its de-duplicated gene list, in order of first appearance.
///
/// Gene symbols are listed bare; intergenic markers are wrapped in parentheses. Both
/// share one seen-set keyed by the string as the result map stores it (the symbol, or
/// the marker without parentheses).
pub fn rewrite_label(
    label: &str,
    results: &ResultMap,
) -> Result<Vec<String>, UnresolvedIdentifier> {
    let mut genes = Vec::new();
    let mut seen: AHashSet<&str> = AHashSet::new();

    for identifier in split_label(label) {
        let entry = results
            .get(identifier)
            .ok_or_else(|| UnresolvedIdentifier(identifier.to_string()))?;
        match entry {
            ResolutionEntry::GeneMapping(mapping) => {
                for symbol in mapping.symbols() {
                    if seen.insert(symbol) {
                        genes.push(symbol.to_string());
                    }
                }
            }
            ResolutionEntry::Intergenic(marker) => {
                if seen.insert(marker.as_str()) {
                    genes.push(format!("({marker})"));
                }
            }
        }
    }

    Ok(genes)
}

/// Reads edge records from `input` and writes the rewritten records to `output`,
/// header first, in input order.
pub fn rewrite_edges<R: Read, W: Write>(
    input: R,
    output: W,
    results: &ResultMap,
) -> Result<RewriteSummary, RewriteError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input);
    // The header is written explicitly so that an input without records still
    // produces it.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);
    writer
        .write_record(OUTPUT_COLUMNS)
        .map_err(RewriteError::Write)?;

    let mut summary = RewriteSummary::default();
    for (index, row) in reader.deserialize::<InputEdge>().enumerate() {
        let record = index as u64 + 1;
        let edge = row.map_err(|source| RewriteError::Read { record, source })?;

        let genes = rewrite_label(&edge.label, results).map_err(|UnresolvedIdentifier(identifier)| {
            RewriteError::UnresolvedIdentifier {
                identifier,
                record,
                edge_id: edge.id.clone(),
            }
        })?;

        let weight = genes.len();
        let out = EdgeRecord {
            source: edge.source,
            target: edge.target,
            kind: edge.kind,
            id: edge.id,
            label: genes.join(LABEL_SEPARATOR),
            weight,
        };
        writer.serialize(&out).map_err(RewriteError::Write)?;

        summary.records = record;
        summary.total_weight += weight as u64;
    }

    writer.flush()?;
    log::info!(
        "Rewrote {} records ({} gene assignments in total)",
        summary.records,
        summary.total_weight
    );
    Ok(summary)
}
