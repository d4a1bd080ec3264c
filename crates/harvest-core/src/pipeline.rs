//! Batch driver: enumerate PDFs, send each to the extraction service, parse
//! the TEI, and accumulate results.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::batch::{BatchAccumulator, DocumentResult};
use crate::links::harvest_links;
use crate::service::{ExtractionService, ServiceError};
use crate::structure::extract_paper_info;
use crate::tei::{TeiDocument, TeiError};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to list input directory {}: {source}", path.display())]
    ListInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{filename}: {source}")]
    Service {
        filename: String,
        #[source]
        source: ServiceError,
    },
    #[error("{filename}: malformed TEI response: {source}")]
    Tei {
        filename: String,
        #[source]
        source: TeiError,
    },
    #[error("failed to save TEI for {filename}: {source}")]
    SaveTei {
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

/// Knobs for [`run_batch`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum number of service calls in flight. Responses are still
    /// consumed in input order.
    pub concurrency: usize,
    /// If set, every TEI response is written here before it is parsed.
    pub tei_dir: Option<PathBuf>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            tei_dir: None,
        }
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        index: usize,
        total: usize,
        filename: String,
    },
    Processed {
        index: usize,
        total: usize,
        filename: String,
        figure_count: usize,
        link_count: usize,
    },
    Skipped {
        index: usize,
        total: usize,
        filename: String,
        status: u16,
    },
}

/// A document the service refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub filename: String,
    pub status: u16,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub accumulator: BatchAccumulator,
    pub skipped: Vec<SkippedDocument>,
    /// The run was cancelled before every input was handled.
    pub cancelled: bool,
}

/// File name used to identify a document in reports.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Regular files in `dir` whose name ends in `.pdf`, sorted by file name.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let list_err = |source| BatchError::ListInput {
        path: dir.to_path_buf(),
        source,
    };
    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if path.is_file() && document_name(&path).ends_with(".pdf") {
            pdfs.push(path);
        }
    }
    pdfs.sort_by_key(|p| document_name(p));
    Ok(pdfs)
}

/// Parse one TEI response and harvest everything the reports need.
pub fn process_document(filename: &str, tei_xml: &str) -> Result<DocumentResult, TeiError> {
    let doc = TeiDocument::parse(tei_xml)?;
    Ok(DocumentResult {
        filename: filename.to_string(),
        info: extract_paper_info(&doc),
        links: harvest_links(&doc, filename),
    })
}

async fn save_tei(dir: &Path, pdf_path: &Path, tei_xml: &str) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let target = dir.join(format!("{stem}.tei.xml"));
    tokio::fs::write(&target, tei_xml).await?;
    Ok(target)
}

/// Run every PDF in `pdfs` through `service` and accumulate the results.
///
/// A non-200 answer skips that document. A malformed TEI body, an unreadable
/// PDF, or a transport failure aborts the whole batch. Cancelling stops
/// issuing requests and returns what has been accumulated so far.
pub async fn run_batch<S, F>(
    service: &S,
    pdfs: &[PathBuf],
    options: &BatchOptions,
    progress: F,
    cancel: CancellationToken,
) -> Result<BatchOutcome, BatchError>
where
    S: ExtractionService + ?Sized,
    F: Fn(BatchEvent),
{
    let total = pdfs.len();
    let progress = &progress;

    let responses = futures_util::stream::iter(pdfs.iter().enumerate())
        .map(|(index, path)| async move {
            let filename = document_name(path);
            tracing::info!(service = service.name(), file = %path.display(), "processing");
            progress(BatchEvent::Started {
                index,
                total,
                filename: filename.clone(),
            });
            let response = service.process_pdf(path).await;
            (index, path, filename, response)
        })
        .buffered(options.concurrency.max(1));
    let mut responses = std::pin::pin!(responses);

    let mut outcome = BatchOutcome::default();
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                outcome.cancelled = true;
                break;
            }
            next = responses.next() => next,
        };
        let Some((index, path, filename, response)) = next else {
            break;
        };

        let tei_xml = match response {
            Ok(body) => body,
            Err(ServiceError::Status { status }) => {
                tracing::warn!(file = %path.display(), status, "service rejected document, skipping");
                progress(BatchEvent::Skipped {
                    index,
                    total,
                    filename: filename.clone(),
                    status,
                });
                outcome.skipped.push(SkippedDocument { filename, status });
                continue;
            }
            Err(source) => return Err(BatchError::Service { filename, source }),
        };

        if let Some(dir) = &options.tei_dir {
            let saved = save_tei(dir, path, &tei_xml)
                .await
                .map_err(|source| BatchError::SaveTei {
                    filename: filename.clone(),
                    source,
                })?;
            tracing::debug!(path = %saved.display(), "saved TEI response");
        }

        let result = process_document(&filename, &tei_xml).map_err(|source| BatchError::Tei {
            filename: filename.clone(),
            source,
        })?;
        tracing::debug!(
            file = %filename,
            figures = result.info.figure_count,
            links = result.links.len(),
            "extracted"
        );
        progress(BatchEvent::Processed {
            index,
            total,
            filename,
            figure_count: result.info.figure_count,
            link_count: result.links.len(),
        });
        outcome.accumulator.record(result);
    }

    tracing::info!(
        processed = outcome.accumulator.len(),
        skipped = outcome.skipped.len(),
        figures = outcome.accumulator.total_figures(),
        links = outcome.accumulator.total_links(),
        cancelled = outcome.cancelled,
        "batch complete"
    );
    Ok(outcome)
}
