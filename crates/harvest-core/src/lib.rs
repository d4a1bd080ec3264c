//! Core of grobid-harvest: TEI parsing, abstract/figure extraction, link
//! harvesting and the batch driver that feeds PDFs through GROBID.

pub mod batch;
pub mod config_file;
pub mod links;
pub mod pipeline;
pub mod service;
pub mod structure;
pub mod tei;

// Re-export for convenience
pub use batch::{BatchAccumulator, DocumentResult};
pub use links::{ExtractedLink, Section, find_urls, harvest_links};
pub use pipeline::{
    BatchError, BatchEvent, BatchOptions, BatchOutcome, SkippedDocument, discover_pdfs,
    document_name, process_document, run_batch,
};
pub use service::{DEFAULT_GROBID_URL, ExtractionService, GrobidClient, ServiceError};
pub use structure::{PaperInfo, count_figures, extract_abstract, extract_paper_info};
pub use tei::{TEI_NS, TeiDocument, TeiError};
