use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

use super::{ExtractionService, ServiceError};

/// Full-text endpoint of a GROBID server on its default port.
pub const DEFAULT_GROBID_URL: &str = "http://localhost:8070/api/processFulltextDocument";

/// Client for GROBID's `processFulltextDocument` endpoint.
///
/// Each PDF is uploaded as multipart field `input` with
/// `teiCoordinates=figure`, so figure elements carry page coordinates.
#[derive(Debug, Clone)]
pub struct GrobidClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl GrobidClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout: None,
        }
    }

    /// Per-request timeout. `None` waits for as long as GROBID takes.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `<base>/api/isalive` for the configured endpoint.
    pub fn health_url(&self) -> String {
        match self.endpoint.find("/api/") {
            Some(idx) => format!("{}/api/isalive", &self.endpoint[..idx]),
            None => format!("{}/api/isalive", self.endpoint.trim_end_matches('/')),
        }
    }

    /// Ask GROBID whether it is up. Transport failures are errors; a reachable
    /// server that answers with a non-success status is reported as `false`.
    pub async fn is_alive(&self) -> Result<bool, ServiceError> {
        let resp = self
            .client
            .get(self.health_url())
            .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Upload one PDF and return the TEI-XML body of a 200 response.
    pub async fn submit(&self, pdf_path: &Path) -> Result<String, ServiceError> {
        let bytes = tokio::fs::read(pdf_path).await?;
        let file_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input.pdf".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new()
            .part("input", part)
            .text("teiCoordinates", "figure");

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ServiceError::Status {
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

impl ExtractionService for GrobidClient {
    fn name(&self) -> &str {
        "GROBID"
    }

    fn process_pdf<'a>(
        &'a self,
        pdf_path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<String, ServiceError>> + Send + 'a>> {
        Box::pin(self.submit(pdf_path))
    }
}
