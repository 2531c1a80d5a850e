// ========================================================================================
//
//                       CORE DATA TYPES FOR THE RSID-GENES PIPELINE
//
// ========================================================================================
//
// This module is the canonical dictionary for the data structures that cross the
// boundaries between the three stages (`collect`, `resolve`, `rewrite`).
//
// This file is ONLY for types that are SHARED BETWEEN FILES, not types that only are used in one file.

use ahash::AHashMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// The separator between identifiers in a `Label` cell, and between genes in the
/// rewritten `Label`.
pub const LABEL_SEPARATOR: &str = ",";

/// The name of the input column holding the identifier list.
pub const LABEL_COLUMN: &str = "Label";

/// The distinct identifiers of an input file. Ordered, so that lookup batches are
/// deterministic from run to run.
pub type IdentifierSet = BTreeSet<String>;

/// Splits a `Label` cell into its identifiers, in order. No trimming is done:
/// whitespace around a token is part of the identifier.
pub fn split_label(label: &str) -> impl Iterator<Item = &str> {
    label.split(LABEL_SEPARATOR)
}

// ========================================================================================
//                                  RESOLUTION ENTRIES
// ========================================================================================

/// One gene attached to a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRef {
    pub symbol: String,
    pub id: String,
}

/// A symbol → id mapping that iterates in first-insertion order.
///
/// A variant maps to a handful of genes at most, so a linear scan is all the
/// indexing this needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneMapping {
    genes: Vec<GeneRef>,
}

impl GeneMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a gene. An existing symbol keeps its position and takes the new id.
    pub fn insert(&mut self, symbol: impl Into<String>, id: impl Into<String>) {
        let symbol = symbol.into();
        let id = id.into();
        match self.genes.iter_mut().find(|gene| gene.symbol == symbol) {
            Some(existing) => existing.id = id,
            None => self.genes.push(GeneRef { symbol, id }),
        }
    }

    /// Folds another mapping into this one, with the same rules as `insert`.
    pub fn merge(&mut self, other: GeneMapping) {
        for gene in other.genes {
            self.insert(gene.symbol, gene.id);
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.genes
            .iter()
            .find(|gene| gene.symbol == symbol)
            .map(|gene| gene.id.as_str())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.genes.iter().map(|gene| gene.symbol.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneRef> {
        self.genes.iter()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

impl<S: Into<String>, I: Into<String>> FromIterator<(S, I)> for GeneMapping {
    fn from_iter<T: IntoIterator<Item = (S, I)>>(iter: T) -> Self {
        let mut mapping = GeneMapping::new();
        for (symbol, id) in iter {
            mapping.insert(symbol, id);
        }
        mapping
    }
}

impl fmt::Display for GeneMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, gene) in self.genes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", gene.symbol, gene.id)?;
        }
        write!(f, "}}")
    }
}

/// What a single identifier resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionEntry {
    /// The variant lies inside one or more known genes.
    GeneMapping(GeneMapping),
    /// The variant lies between genes. Holds the comma-joined names of the
    /// neighbouring genes.
    Intergenic(String),
}

impl fmt::Display for ResolutionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionEntry::GeneMapping(mapping) => write!(f, "{mapping}"),
            ResolutionEntry::Intergenic(marker) => write!(f, "{marker}"),
        }
    }
}

// ========================================================================================
//                                     RESULT MAP
// ========================================================================================

/// Identifier → resolution, produced once by the resolver and read by the rewriter.
#[derive(Debug, Clone, Default)]
pub struct ResultMap {
    entries: AHashMap<String, ResolutionEntry>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds genes for an identifier. Genes accumulate into an existing mapping; an
    /// existing intergenic marker is replaced.
    pub fn add_genes(&mut self, identifier: &str, genes: GeneMapping) {
        match self.entries.get_mut(identifier) {
            Some(ResolutionEntry::GeneMapping(existing)) => existing.merge(genes),
            _ => {
                self.entries
                    .insert(identifier.to_string(), ResolutionEntry::GeneMapping(genes));
            }
        }
    }

    /// Records an identifier as intergenic, replacing whatever was there.
    pub fn set_intergenic(&mut self, identifier: &str, marker: String) {
        self.entries
            .insert(identifier.to_string(), ResolutionEntry::Intergenic(marker));
    }

    pub fn get(&self, identifier: &str) -> Option<&ResolutionEntry> {
        self.entries.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by identifier, for stable diagnostics.
    pub fn sorted_entries(&self) -> Vec<(&str, &ResolutionEntry)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(id, entry)| (id.as_str(), entry))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

// ========================================================================================
//                                    EDGE RECORDS
// ========================================================================================

/// The fixed output columns, in order.
pub const OUTPUT_COLUMNS: [&str; 6] = ["Source", "Target", "Type", "Id", "Label", "Weight"];

/// One rewritten edge. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeRecord {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Target")]
    pub target: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Weight")]
    pub weight: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_label_keeps_order_and_whitespace() {
        let tokens: Vec<&str> = split_label("rs1, rs2,rs1").collect();
        assert_eq!(tokens, vec!["rs1", " rs2", "rs1"]);
    }

    #[test]
    fn split_label_of_empty_cell_yields_one_empty_token() {
        let tokens: Vec<&str> = split_label("").collect();
        assert_eq!(tokens, vec![""]);
    }

    #[test]
    fn gene_mapping_update_keeps_first_position() {
        let mut mapping: GeneMapping = [("BRCA1", "672"), ("NBR2", "10230")].into_iter().collect();
        mapping.insert("BRCA1", "999");

        let symbols: Vec<&str> = mapping.symbols().collect();
        assert_eq!(symbols, vec!["BRCA1", "NBR2"]);
        assert_eq!(mapping.len(), 2);
        assert!(!mapping.is_empty());
        assert!(GeneMapping::new().is_empty());
        assert_eq!(mapping.get("BRCA1"), Some("999"));
        assert_eq!(mapping.to_string(), "{BRCA1: 999, NBR2: 10230}");
    }

    #[test]
    fn add_genes_accumulates_and_replaces_intergenic() {
        let mut map = ResultMap::new();
        assert!(map.is_empty());
        map.add_genes("rs1", [("A", "1")].into_iter().collect());
        map.add_genes("rs1", [("B", "2")].into_iter().collect());
        map.set_intergenic("rs2", "LOC1,LOC2".to_string());
        map.add_genes("rs2", [("C", "3")].into_iter().collect());

        match map.get("rs1") {
            Some(ResolutionEntry::GeneMapping(m)) => {
                assert_eq!(m.symbols().collect::<Vec<_>>(), vec!["A", "B"])
            }
            other => panic!("expected gene mapping, got {other:?}"),
        }
        assert!(matches!(map.get("rs2"), Some(ResolutionEntry::GeneMapping(_))));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn sorted_entries_orders_by_identifier() {
        let mut map = ResultMap::new();
        map.set_intergenic("rs9", "X".to_string());
        map.set_intergenic("rs10", "Y".to_string());
        map.set_intergenic("rs1", "Z".to_string());
        let ids: Vec<&str> = map.sorted_entries().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["rs1", "rs10", "rs9"]);
    }
}
