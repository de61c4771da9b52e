mod common;

use common::{create_test_dir, forms};
use std::time::Duration;
use uscis_forms::utils::compute_hash;
use uscis_forms::{Catalog, Downloader, HttpClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PDF_BODY: &str = "%PDF-1.7 test document";

async fn serve(server: &MockServer, route: &str, status: u16, body: &str, mime: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body.to_string(), mime))
        .mount(server)
        .await;
}

fn downloader() -> Downloader {
    Downloader::new(HttpClient::new(Duration::from_secs(5)), Duration::ZERO)
}

fn selection(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[tokio::test]
async fn test_batch_with_one_non_pdf_response() {
    let server = MockServer::start().await;
    serve(&server, "/i-765.pdf", 200, PDF_BODY, "application/pdf").await;
    serve(&server, "/i-130.pdf", 200, PDF_BODY, "application/pdf").await;
    serve(&server, "/i-485.pdf", 200, "<html>moved</html>", "text/html").await;

    let base = server.uri();
    let (i765, i130, i485) = (
        format!("{base}/i-765.pdf"),
        format!("{base}/i-130.pdf"),
        format!("{base}/i-485.pdf"),
    );
    let catalog = Catalog::with_forms(forms(&[
        ("I-765", i765.as_str()),
        ("I-130", i130.as_str()),
        ("I-485", i485.as_str()),
    ]));

    let temp_dir = create_test_dir();
    let report = downloader()
        .download(&selection(&["I-765", "I-485", "I-130"]), &catalog, temp_dir.path())
        .await
        .expect("Batch should run");

    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].identifier, "I-485");
    assert!(report.failed[0].message.starts_with("I-485 failed:"));
    assert!(!report.is_complete_success());

    assert!(temp_dir.path().join("I-765.pdf").exists());
    assert!(temp_dir.path().join("I-130.pdf").exists());
    assert!(!temp_dir.path().join("I-485.pdf").exists());
}

#[tokio::test]
async fn test_downloaded_file_contents_and_hash() {
    let server = MockServer::start().await;
    serve(&server, "/i-90.pdf", 200, PDF_BODY, "application/pdf; charset=binary").await;

    let url = format!("{}/i-90.pdf", server.uri());
    let catalog = Catalog::with_forms(forms(&[("I-90", url.as_str())]));
    let temp_dir = create_test_dir();
    let target = temp_dir.path().join("nested").join("forms");

    let report = downloader()
        .download(&selection(&["I-90"]), &catalog, &target)
        .await
        .unwrap();

    assert!(report.is_complete_success());
    let form = &report.succeeded[0];
    assert_eq!(form.path, target.join("I-90.pdf"));
    assert_eq!(form.sha256, compute_hash(PDF_BODY));
    assert_eq!(tokio::fs::read_to_string(&form.path).await.unwrap(), PDF_BODY);
}

#[tokio::test]
async fn test_http_error_status_is_isolated() {
    let server = MockServer::start().await;
    serve(&server, "/ok.pdf", 200, PDF_BODY, "application/pdf").await;
    serve(&server, "/missing.pdf", 404, "not found", "text/plain").await;

    let base = server.uri();
    let (missing, ok) = (format!("{base}/missing.pdf"), format!("{base}/ok.pdf"));
    let catalog = Catalog::with_forms(forms(&[("I-1", missing.as_str()), ("I-2", ok.as_str())]));
    let temp_dir = create_test_dir();

    let report = downloader()
        .download(&selection(&["I-1", "I-2"]), &catalog, temp_dir.path())
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].message, "I-1 failed: HTTP status 404");
    assert_eq!(report.succeeded[0].identifier, "I-2");
    assert_eq!(
        report.summary(),
        "Download finished with 1 error(s); 1 succeeded."
    );
}
