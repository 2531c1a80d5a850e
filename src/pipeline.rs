// ========================================================================================
//
//                                THE REWRITE PIPELINE
//
// ========================================================================================
//
// Drives the three stages in order on a single input file handle:
//
// 1. Collect every distinct identifier from the `Label` column.
// 2. Resolve them with one batch lookup into a `ResultMap`.
// 3. Rewind the input and stream the rewritten records to the output file.
//
// The `ResultMap` is owned here and only ever lent out read-only to the rewriter.

use crate::collect::{self, CollectError};
use crate::lookup::{LookupError, VariantLookup};
use crate::resolve;
use crate::rewrite::{self, RewriteError};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ========================================================================================
//                          Public API, context & error handling
// ========================================================================================

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

impl PipelineError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Distinct identifiers found in the input.
    pub identifiers: usize,
    /// Identifiers that resolved to genes or an intergenic marker.
    pub resolved: usize,
    /// Edge records written.
    pub records: u64,
}

/// Rewrites the edge file at `input` into `output`, resolving identifiers through
/// `lookup` in the `scopes` namespace.
pub fn run<L: VariantLookup + ?Sized>(
    input: &Path,
    output: &Path,
    lookup: &L,
    scopes: &str,
) -> Result<RunSummary, PipelineError> {
    let mut input_file = File::open(input).map_err(PipelineError::io(input))?;

    // --- Pass 1: Collect ---
    let identifiers = collect::collect_identifiers(BufReader::new(&mut input_file))?;
    eprintln!(
        "> Found {} distinct identifiers in {}",
        identifiers.len(),
        input.display()
    );

    // --- Resolve ---
    let results = resolve::resolve_identifiers(lookup, &identifiers, scopes)?;
    eprintln!(
        "> Resolved {}/{} identifiers",
        results.len(),
        identifiers.len()
    );

    // --- Pass 2: Rewrite ---
    input_file.rewind().map_err(PipelineError::io(input))?;
    let output_file = File::create(output).map_err(PipelineError::io(output))?;
    let summary = rewrite::rewrite_edges(
        BufReader::new(&mut input_file),
        BufWriter::new(output_file),
        &results,
    )?;
    eprintln!(
        "> Wrote {} edges to {}",
        summary.records,
        output.display()
    );

    Ok(RunSummary {
        identifiers: identifiers.len(),
        resolved: results.len(),
        records: summary.records,
    })
}
