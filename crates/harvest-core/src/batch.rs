//! Batch-wide accumulation of per-document results.

use std::collections::HashMap;

use crate::links::ExtractedLink;
use crate::structure::PaperInfo;

/// Everything harvested from one successfully processed PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResult {
    pub filename: String,
    pub info: PaperInfo,
    pub links: Vec<ExtractedLink>,
}

#[derive(Debug, Clone)]
struct DocumentEntry {
    filename: String,
    figure_count: usize,
    links: Vec<ExtractedLink>,
}

/// Results of a batch run, in processing order.
///
/// Figure counts and link lists are keyed by filename and always recorded
/// together. Recording the same filename twice replaces both in place
/// (keeping the original position) while appending a second abstract.
#[derive(Debug, Clone, Default)]
pub struct BatchAccumulator {
    abstracts: Vec<String>,
    documents: Vec<DocumentEntry>,
    index: HashMap<String, usize>,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: DocumentResult) {
        let DocumentResult {
            filename,
            info,
            links,
        } = result;
        self.abstracts.push(info.abstract_text);

        if let Some(&slot) = self.index.get(&filename) {
            let entry = &mut self.documents[slot];
            entry.figure_count = info.figure_count;
            entry.links = links;
            return;
        }
        self.index.insert(filename.clone(), self.documents.len());
        self.documents.push(DocumentEntry {
            filename,
            figure_count: info.figure_count,
            links,
        });
    }

    /// Abstracts in processing order, one per recorded document.
    pub fn abstracts(&self) -> &[String] {
        &self.abstracts
    }

    /// `(filename, figure count)` pairs in first-insertion order.
    pub fn figure_counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.documents
            .iter()
            .map(|d| (d.filename.as_str(), d.figure_count))
    }

    /// Every link of every document, flattened document by document.
    pub fn links(&self) -> impl Iterator<Item = &ExtractedLink> {
        self.documents.iter().flat_map(|d| d.links.iter())
    }

    /// Number of distinct documents recorded.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn total_figures(&self) -> usize {
        self.documents.iter().map(|d| d.figure_count).sum()
    }

    pub fn total_links(&self) -> usize {
        self.documents.iter().map(|d| d.links.len()).sum()
    }
}
