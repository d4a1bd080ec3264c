//! Document-structure extraction service seam and its implementations.

pub mod grobid;
pub mod mock;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use thiserror::Error;

pub use grobid::{DEFAULT_GROBID_URL, GrobidClient};

#[derive(Error, Debug)]
pub enum ServiceError {
    /// The service answered with anything other than 200 OK.
    #[error("service returned HTTP {status}")]
    Status { status: u16 },
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read PDF: {0}")]
    Io(#[from] std::io::Error),
}

/// A service that turns a PDF into TEI-XML.
pub trait ExtractionService: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Submit one PDF and return the TEI response body.
    fn process_pdf<'a>(
        &'a self,
        pdf_path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<String, ServiceError>> + Send + 'a>>;
}
