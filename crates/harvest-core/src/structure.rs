//! Abstract and figure extraction from a parsed TEI document.

use crate::tei::TeiDocument;

/// Per-document facts pulled from the TEI header and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperInfo {
    pub abstract_text: String,
    pub figure_count: usize,
}

/// Concatenate every `<abstract>` in document order.
///
/// Within one abstract the non-blank text nodes are trimmed and joined with a
/// single space; the abstracts themselves are joined with no separator.
pub fn extract_abstract(doc: &TeiDocument) -> String {
    doc.find_all("abstract")
        .map(|abstract_el| {
            abstract_el
                .itertext()
                .into_iter()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Number of `<figure>` elements anywhere below the root, tables included
/// (GROBID encodes them as `<figure type="table">`).
pub fn count_figures(doc: &TeiDocument) -> usize {
    doc.find_all("figure").count()
}

pub fn extract_paper_info(doc: &TeiDocument) -> PaperInfo {
    PaperInfo {
        abstract_text: extract_abstract(doc),
        figure_count: count_figures(doc),
    }
}
