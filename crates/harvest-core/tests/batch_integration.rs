//! Integration tests for [`run_batch`] driven by [`MockService`], so no
//! GROBID server is needed.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use harvest_core::service::mock::{MockResponse, MockService};
use harvest_core::{
    BatchError, BatchEvent, BatchOptions, Section, SkippedDocument, TEI_NS, run_batch,
};
use tokio_util::sync::CancellationToken;

fn tei(abstract_text: &str, figures: usize, body: &str) -> String {
    let figures = "<figure/>".repeat(figures);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="{TEI_NS}">
  <teiHeader><profileDesc><abstract><div><p>{abstract_text}</p></div></abstract></profileDesc></teiHeader>
  <text><body>{figures}<p>{body}</p></body></text>
</TEI>"#
    )
}

fn pdfs(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(|n| PathBuf::from("papers").join(n)).collect()
}

#[tokio::test]
async fn failed_service_call_is_skipped() {
    let service = MockService::new(MockResponse::Tei(tei("Generic.", 1, "")))
        .respond("one.pdf", MockResponse::Tei(tei("First.", 2, "http://one.org")))
        .respond("two.pdf", MockResponse::Status(500))
        .respond("three.pdf", MockResponse::Tei(tei("Third.", 0, "")));

    let outcome = run_batch(
        &service,
        &pdfs(&["one.pdf", "two.pdf", "three.pdf"]),
        &BatchOptions::default(),
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let acc = &outcome.accumulator;
    let counts: Vec<_> = acc.figure_counts().collect();
    assert_eq!(counts, vec![("one.pdf", 2), ("three.pdf", 0)]);
    assert_eq!(acc.abstracts(), &["First.", "Third."]);
    assert!(acc.links().all(|l| l.document != "two.pdf"));
    assert_eq!(
        outcome.skipped,
        vec![SkippedDocument {
            filename: "two.pdf".into(),
            status: 500
        }]
    );
    assert!(!outcome.cancelled);
    assert_eq!(service.call_count(), 3);
}

#[tokio::test]
async fn links_are_tagged_with_document_and_section() {
    let service = MockService::new(MockResponse::Tei(tei(
        "Code at https://github.com/x/y.",
        0,
        "see www.example.org",
    )));
    let outcome = run_batch(
        &service,
        &pdfs(&["paper.pdf"]),
        &BatchOptions::default(),
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let links: Vec<_> = outcome
        .accumulator
        .links()
        .map(|l| (l.document.as_str(), l.section, l.url.as_str()))
        .collect();
    assert_eq!(
        links,
        vec![
            ("paper.pdf", Section::Summary, "https://github.com/x/y."),
            ("paper.pdf", Section::Content, "www.example.org"),
        ]
    );
}

#[tokio::test]
async fn malformed_tei_halts_the_batch() {
    let service = MockService::new(MockResponse::Tei(tei("Fine.", 1, "")))
        .respond("bad.pdf", MockResponse::Tei("<TEI><abstract>".to_string()));

    let err = run_batch(
        &service,
        &pdfs(&["a.pdf", "bad.pdf", "c.pdf"]),
        &BatchOptions::default(),
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BatchError::Tei { ref filename, .. } if filename == "bad.pdf"));
    assert_eq!(service.calls(), vec!["a.pdf", "bad.pdf"]);
}

#[tokio::test]
async fn unreadable_pdf_is_fatal() {
    let service = MockService::new(MockResponse::Unreadable);
    let err = run_batch(
        &service,
        &pdfs(&["gone.pdf"]),
        &BatchOptions::default(),
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BatchError::Service { .. }));
}

#[tokio::test]
async fn empty_batch_produces_empty_outcome() {
    let service = MockService::new(MockResponse::Status(500));
    let outcome = run_batch(
        &service,
        &[],
        &BatchOptions::default(),
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert!(outcome.accumulator.is_empty());
    assert!(outcome.skipped.is_empty());
    assert_eq!(service.call_count(), 0);
}

#[tokio::test]
async fn concurrent_run_keeps_input_order() {
    let service = MockService::new(MockResponse::Tei(tei("Fast.", 1, "")))
        .respond("a.pdf", MockResponse::Tei(tei("Slow.", 3, "")))
        .with_delay("a.pdf", Duration::from_millis(50));

    let outcome = run_batch(
        &service,
        &pdfs(&["a.pdf", "b.pdf", "c.pdf"]),
        &BatchOptions {
            concurrency: 3,
            ..BatchOptions::default()
        },
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let counts: Vec<_> = outcome.accumulator.figure_counts().collect();
    assert_eq!(counts, vec![("a.pdf", 3), ("b.pdf", 1), ("c.pdf", 1)]);
    assert_eq!(outcome.accumulator.abstracts(), &["Slow.", "Fast.", "Fast."]);
}

#[tokio::test]
async fn cancelled_batch_returns_partial_results() {
    let service = MockService::new(MockResponse::Tei(tei("Done.", 1, "")));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = run_batch(
        &service,
        &pdfs(&["a.pdf", "b.pdf"]),
        &BatchOptions::default(),
        |_| {},
        cancel,
    )
    .await
    .unwrap();

    assert!(outcome.cancelled);
    assert!(outcome.accumulator.is_empty());
}

#[tokio::test]
async fn progress_events_follow_each_document() {
    let service = MockService::new(MockResponse::Tei(tei("x", 2, "http://a.b")))
        .respond("b.pdf", MockResponse::Status(503));
    let events = Mutex::new(Vec::new());

    run_batch(
        &service,
        &pdfs(&["a.pdf", "b.pdf"]),
        &BatchOptions::default(),
        |event| {
            let line = match event {
                BatchEvent::Started { index, total, filename } => {
                    format!("start {}/{} {}", index + 1, total, filename)
                }
                BatchEvent::Processed {
                    filename,
                    figure_count,
                    link_count,
                    ..
                } => format!("done {filename} {figure_count} {link_count}"),
                BatchEvent::Skipped { filename, status, .. } => {
                    format!("skip {filename} {status}")
                }
            };
            events.lock().unwrap().push(line);
        },
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        events.into_inner().unwrap(),
        vec![
            "start 1/2 a.pdf",
            "done a.pdf 2 1",
            "start 2/2 b.pdf",
            "skip b.pdf 503",
        ]
    );
}

#[tokio::test]
async fn tei_responses_are_saved_before_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let tei_dir = dir.path().join("tei");
    let service = MockService::new(MockResponse::Tei(tei("Kept.", 0, "")))
        .respond("broken.pdf", MockResponse::Tei("not xml".to_string()));

    let result = run_batch(
        &service,
        &pdfs(&["good.pdf", "broken.pdf"]),
        &BatchOptions {
            tei_dir: Some(tei_dir.clone()),
            ..BatchOptions::default()
        },
        |_| {},
        CancellationToken::new(),
    )
    .await;

    assert!(result.is_err());
    let saved = std::fs::read_to_string(tei_dir.join("good.tei.xml")).unwrap();
    assert!(saved.contains("Kept."));
    assert_eq!(
        std::fs::read_to_string(tei_dir.join("broken.tei.xml")).unwrap(),
        "not xml"
    );
}
