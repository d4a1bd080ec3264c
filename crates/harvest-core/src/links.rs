//! URL harvesting from the five searchable regions of a TEI document.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tei::TeiDocument;

/// Logical region of a paper that is scanned for links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Summary,
    Content,
    References,
    Annotations,
    Tables,
}

impl Section {
    /// Scan order. Links are reported section by section in this order.
    pub const ALL: [Section; 5] = [
        Section::Summary,
        Section::Content,
        Section::References,
        Section::Annotations,
        Section::Tables,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Summary => "summary",
            Section::Content => "content",
            Section::References => "references",
            Section::Annotations => "annotations",
            Section::Tables => "tables",
        }
    }

    /// TEI element whose subtrees make up this section.
    pub fn tei_tag(self) -> &'static str {
        match self {
            Section::Summary => "abstract",
            Section::Content => "body",
            Section::References => "listBibl",
            Section::Annotations => "note",
            Section::Tables => "table",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One URL found in one section of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub document: String,
    pub section: Section,
    pub url: String,
}

// Stops at whitespace, angle brackets and quotes only, so trailing
// punctuation stays attached to the URL.
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+|www\.[^\s<>"']+"#).unwrap());

/// All URL-like substrings of `text`, left to right.
pub fn find_urls(text: &str) -> Vec<&str> {
    URL_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Harvest links from every section of `doc`, tagging them with `document`.
///
/// Each matching element's text nodes are concatenated with no separator
/// before matching, so text split across inline markup is rejoined.
pub fn harvest_links(doc: &TeiDocument, document: &str) -> Vec<ExtractedLink> {
    let mut links = Vec::new();
    for section in Section::ALL {
        for element in doc.find_all(section.tei_tag()) {
            let text: String = element.itertext().concat();
            for url in find_urls(text.trim()) {
                links.push(ExtractedLink {
                    document: document.to_string(),
                    section,
                    url: url.to_string(),
                });
            }
        }
    }
    links
}
