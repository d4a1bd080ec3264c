//! [`GrobidClient`] against an in-process axum server that speaks the
//! relevant slice of the GROBID REST API.

use axum::Router;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::{get, post};
use harvest_core::{
    BatchOptions, ExtractionService, GrobidClient, ServiceError, TEI_NS, discover_pdfs, run_batch,
};
use tokio_util::sync::CancellationToken;

/// Echo what was uploaded back inside a TEI abstract.
async fn fulltext(mut multipart: Multipart) -> (StatusCode, String) {
    let mut upload: Option<(String, usize)> = None;
    let mut coordinates = String::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string).unwrap_or_default();
        match name.as_deref() {
            Some("input") => {
                let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
                upload = Some((file_name, len));
            }
            Some("teiCoordinates") => coordinates = field.text().await.unwrap_or_default(),
            _ => {}
        }
    }
    let Some((file_name, len)) = upload else {
        return (StatusCode::BAD_REQUEST, "missing input".to_string());
    };
    if file_name == "reject.pdf" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
    }
    let body = format!(
        r#"<TEI xmlns="{TEI_NS}"><teiHeader><profileDesc><abstract><p>{file_name} {len} {coordinates}</p></abstract></profileDesc></teiHeader><text><body><figure/></body></text></TEI>"#
    );
    (StatusCode::OK, body)
}

async fn spawn_grobid() -> String {
    let app = Router::new()
        .route("/api/processFulltextDocument", post(fulltext))
        .route("/api/isalive", get(|| async { "true" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn unused_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/processFulltextDocument")
}

#[tokio::test]
async fn uploads_pdf_as_multipart_with_figure_coordinates() {
    let base = spawn_grobid().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("paper.pdf");
    std::fs::write(&pdf, b"%PDF-1.4 fake").unwrap();

    let client = GrobidClient::new(format!("{base}/api/processFulltextDocument"));
    let tei = client.process_pdf(&pdf).await.unwrap();
    assert!(tei.contains("paper.pdf 13 figure"), "{tei}");
}

#[tokio::test]
async fn non_200_is_a_status_error() {
    let base = spawn_grobid().await;
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("reject.pdf");
    std::fs::write(&pdf, b"%PDF").unwrap();

    let client = GrobidClient::new(format!("{base}/api/processFulltextDocument"));
    let err = client.submit(&pdf).await.unwrap_err();
    assert!(matches!(err, ServiceError::Status { status: 500 }), "{err:?}");
}

#[tokio::test]
async fn missing_pdf_is_an_io_error() {
    let base = spawn_grobid().await;
    let client = GrobidClient::new(format!("{base}/api/processFulltextDocument"));
    let err = client
        .submit(std::path::Path::new("/definitely/not/here.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Io(_)), "{err:?}");
}

#[tokio::test]
async fn health_check() {
    let base = spawn_grobid().await;
    let client = GrobidClient::new(format!("{base}/api/processFulltextDocument"));
    assert!(client.is_alive().await.unwrap());

    let down = GrobidClient::new(unused_port_url().await);
    assert!(down.is_alive().await.is_err());
}

#[tokio::test]
async fn unreachable_service_is_an_http_error() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("a.pdf");
    std::fs::write(&pdf, b"%PDF").unwrap();

    let client = GrobidClient::new(unused_port_url().await);
    let err = client.submit(&pdf).await.unwrap_err();
    assert!(matches!(err, ServiceError::Http(_)), "{err:?}");
}

#[tokio::test]
async fn end_to_end_directory_batch() {
    let base = spawn_grobid().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.pdf"), b"%PDF-b").unwrap();
    std::fs::write(dir.path().join("reject.pdf"), b"%PDF-r").unwrap();
    std::fs::write(dir.path().join("a.pdf"), b"%PDF-a").unwrap();
    std::fs::write(dir.path().join("readme.md"), b"# not a pdf").unwrap();

    let client = GrobidClient::new(format!("{base}/api/processFulltextDocument"));
    let pdfs = discover_pdfs(dir.path()).unwrap();
    let outcome = run_batch(
        &client,
        &pdfs,
        &BatchOptions::default(),
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let counts: Vec<_> = outcome.accumulator.figure_counts().collect();
    assert_eq!(counts, vec![("a.pdf", 1), ("b.pdf", 1)]);
    assert_eq!(
        outcome.accumulator.abstracts(),
        &["a.pdf 6 figure", "b.pdf 6 figure"]
    );
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].filename, "reject.pdf");
}
