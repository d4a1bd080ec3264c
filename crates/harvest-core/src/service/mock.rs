//! In-process stand-in for GROBID used by the batch tests.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{ExtractionService, ServiceError};

/// A configurable canned answer for [`MockService`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// 200 OK with this TEI body.
    Tei(String),
    /// Any other HTTP status.
    Status(u16),
    /// The PDF could not be read.
    Unreadable,
}

/// A hand-rolled [`ExtractionService`] keyed by PDF file name.
///
/// Files without a registered response get the fallback. Calls are counted
/// and their file names recorded in call order.
pub struct MockService {
    responses: HashMap<String, MockResponse>,
    fallback: MockResponse,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl MockService {
    pub fn new(fallback: MockResponse) -> Self {
        Self {
            responses: HashMap::new(),
            fallback,
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Register the response for one file name.
    pub fn respond(mut self, file_name: &str, response: MockResponse) -> Self {
        self.responses.insert(file_name.to_string(), response);
        self
    }

    /// Simulated latency for one file name.
    pub fn with_delay(mut self, file_name: &str, delay: Duration) -> Self {
        self.delays.insert(file_name.to_string(), delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// File names in the order the service was called.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl ExtractionService for MockService {
    fn name(&self) -> &str {
        "mock"
    }

    fn process_pdf<'a>(
        &'a self,
        pdf_path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<String, ServiceError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let file_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(file_name.clone());
        }
        let response = self
            .responses
            .get(&file_name)
            .unwrap_or(&self.fallback)
            .clone();
        let delay = self.delays.get(&file_name).copied();

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            match response {
                MockResponse::Tei(body) => Ok(body),
                MockResponse::Status(status) => Err(ServiceError::Status { status }),
                MockResponse::Unreadable => Err(ServiceError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    file_name,
                ))),
            }
        })
    }
}
