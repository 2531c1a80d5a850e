// ========================================================================================
//
//                               IDENTIFIER COLLECTION
//
// ========================================================================================
//
// The first pass over the edge file. It only looks at the `Label` column and gathers
// every distinct identifier, so the resolver can ask for all of them at once.

use crate::types::{IdentifierSet, LABEL_COLUMN, split_label};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to read the edge file: {0}")]
    Csv(#[from] csv::Error),
    #[error("the edge file has no 'Label' column in its header")]
    MissingLabelColumn,
    #[error("record {record} has no 'Label' value")]
    MissingLabel { record: u64 },
}

/// Reads every record and returns the distinct identifiers found in the `Label`
/// column. Tokens are taken verbatim from splitting on commas.
pub fn collect_identifiers<R: Read>(input: R) -> Result<IdentifierSet, CollectError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input);

    let label_index = reader
        .headers()?
        .iter()
        .position(|name| name == LABEL_COLUMN)
        .ok_or(CollectError::MissingLabelColumn)?;

    let mut identifiers = IdentifierSet::new();
    let mut record = csv::StringRecord::new();
    let mut record_number = 0u64;
    while reader.read_record(&mut record)? {
        record_number += 1;
        let label = record.get(label_index).ok_or(CollectError::MissingLabel {
            record: record_number,
        })?;
        for identifier in split_label(label) {
            if !identifiers.contains(identifier) {
                identifiers.insert(identifier.to_string());
            }
        }
    }

    log::debug!(
        "Collected {} distinct identifiers from {} records",
        identifiers.len(),
        record_number
    );
    Ok(identifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_distinct_tokens_across_records() {
        let csv = "Source,Target,Type,Id,Label,Weight\n\
                   a,b,Undirected,0,\"rs1,rs2\",2\n\
                   b,c,Undirected,1,\"rs2,rs3,rs1\",3\n\
                   c,d,Undirected,2,rs4,1\n";
        let ids = collect_identifiers(csv.as_bytes()).unwrap();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        assert_eq!(ids, vec!["rs1", "rs2", "rs3", "rs4"]);
    }

    #[test]
    fn whitespace_is_part_of_the_identifier() {
        let csv = "Label\n\"rs1, rs1\"\n";
        let ids = collect_identifiers(csv.as_bytes()).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("rs1"));
        assert!(ids.contains(" rs1"));
    }

    #[test]
    fn label_column_can_be_anywhere() {
        let csv = "Label,Id\nrs7,0\n";
        let ids = collect_identifiers(csv.as_bytes()).unwrap();
        assert!(ids.contains("rs7"));
    }

    #[test]
    fn missing_label_column_is_rejected() {
        let csv = "Source,Target,Type,Id\na,b,Undirected,0\n";
        let err = collect_identifiers(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CollectError::MissingLabelColumn), "got {err:?}");
    }

    #[test]
    fn short_record_reports_its_position() {
        let csv = "Id,Label\n0,rs1\n1\n";
        let err = collect_identifiers(csv.as_bytes()).unwrap_err();
        match err {
            CollectError::MissingLabel { record } => assert_eq!(record, 2),
            other => panic!("Expected MissingLabel, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_with_header_collects_nothing() {
        let ids = collect_identifiers("Label\n".as_bytes()).unwrap();
        assert!(ids.is_empty());
    }
}
