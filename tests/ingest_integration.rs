//! Integration tests for the ingest engine: EDGAR and IR-page locators
//! served by a mock server, real files written to a temp directory.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use finsight_core::companies::company_by_ticker;
use finsight_core::fetch::{FetchClient, FetchOptions, RateLimiter};
use finsight_core::filing::{
    EdgarLocator, FilingLocator, FilingTarget, IrPageLocator, Quarter, enumerate_targets,
};
use finsight_core::ingest::{
    ContentPolicy, FilingOutcome, FilingStatus, IngestEngine, IngestReport, IngestSettings,
};
use serde_json::json;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

const NVDA_SUBMISSIONS: &str = "/submissions/CIK0001045810.json";
const PDF_BODY: &[u8] = b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n";
const HTML_BODY: &str = "<html><body><h1>Form 10-Q</h1><p>Revenue rose.</p></body></html>";

// ==================== Helper Functions ====================

fn fast_settings(policy: ContentPolicy) -> IngestSettings {
    let fetch = FetchOptions::default()
        .with_max_retries(2)
        .with_initial_delay(Duration::from_millis(10));
    IngestSettings::new(fetch, policy)
}

fn edgar_locator(server: &MockServer, client: &FetchClient) -> Box<dyn FilingLocator> {
    Box::new(EdgarLocator::with_base_urls(
        client.clone(),
        FetchOptions::default().with_max_retries(1),
        format!("{}/submissions", server.uri()),
        format!("{}/Archives", server.uri()),
    ))
}

fn nvda_targets(quarters: &[Quarter]) -> Vec<FilingTarget> {
    let nvda = company_by_ticker("NVDA").unwrap();
    enumerate_targets(&[nvda], &[2024], quarters)
}

async fn mount_nvda_submissions(server: &MockServer) {
    let submissions = json!({
        "cik": "1045810",
        "name": "NVIDIA CORP",
        "filings": {
            "recent": {
                "accessionNumber": [
                    "0001045810-24-000316",
                    "0001045810-24-000264",
                    "0001045810-24-000124"
                ],
                "filingDate": ["2024-11-20", "2024-08-28", "2024-05-29"],
                "form": ["10-Q", "10-Q", "10-Q"],
                "primaryDocument": ["nvda-q3.htm", "nvda-q2.pdf", "nvda-q1.htm"]
            }
        }
    });
    Mock::given(method("GET"))
        .and(path(NVDA_SUBMISSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(submissions))
        .mount(server)
        .await;
}

async fn run(
    engine: &IngestEngine,
    targets: Vec<FilingTarget>,
    locators: Vec<Box<dyn FilingLocator>>,
    client: &FetchClient,
    dir: &Path,
) -> IngestReport {
    engine.run(targets, locators, client, dir).await.unwrap()
}

// ==================== Mixed Outcome Tests ====================

#[tokio::test]
async fn test_mixed_outcomes_are_isolated_and_ordered() {
    let server = require_mock_server!();
    mount_nvda_submissions(&server).await;
    Mock::given(method("GET"))
        .and(path("/Archives/1045810/000104581024000124/nvda-q1.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HTML_BODY))
        .mount(&server)
        .await;
    // Q2 claims to be a PDF but is plain text
    Mock::given(method("GET"))
        .and(path("/Archives/1045810/000104581024000264/nvda-q2.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_string("quarterly summary"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Archives/1045810/000104581024000316/nvda-q3.htm"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = FetchClient::new();
    let engine = IngestEngine::new(
        4,
        fast_settings(ContentPolicy::Flag),
        Arc::new(RateLimiter::disabled()),
    )
    .unwrap();
    let targets = nvda_targets(&[Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Fy]);

    let report = run(
        &engine,
        targets,
        vec![edgar_locator(&server, &client)],
        &client,
        dir.path(),
    )
    .await;

    let labels: Vec<_> = report
        .outcomes
        .iter()
        .map(|o| (o.quarter, o.status.label()))
        .collect();
    assert_eq!(
        labels,
        vec![
            (Quarter::Q1, "stored"),
            (Quarter::Q2, "rejected"),
            (Quarter::Q3, "failed"),
            (Quarter::Fy, "not_found"),
        ]
    );
    assert_eq!(report.summary.total(), 4);
    assert_eq!(report.summary.stored, 1);
    assert!(report.has_failures());

    match &report.outcomes[0].status {
        FilingStatus::Stored {
            path,
            bytes,
            detected_type,
            sha256,
            warnings,
        } => {
            assert_eq!(path, &dir.path().join("2024_Q1_NVDA.htm"));
            assert_eq!(std::fs::read_to_string(path).unwrap(), HTML_BODY);
            assert_eq!(*bytes, HTML_BODY.len() as u64);
            assert_eq!(*detected_type, Some("text/html"));
            assert_eq!(sha256, &format!("{:x}", Sha256::digest(HTML_BODY.as_bytes())));
            assert!(warnings.is_empty());
        }
        other => panic!("expected stored outcome, got {other:?}"),
    }
    assert_eq!(report.outcomes[0].locator, Some("edgar"));

    match &report.outcomes[1].status {
        FilingStatus::Rejected { reason, .. } => assert!(reason.contains("mismatch")),
        other => panic!("expected rejected outcome, got {other:?}"),
    }
    assert!(!dir.path().join("2024_Q2_NVDA.pdf").exists());

    match &report.outcomes[2].status {
        FilingStatus::Failed { kind, .. } => assert_eq!(*kind, "client_error"),
        other => panic!("expected failed outcome, got {other:?}"),
    }
    assert!(report.outcomes[3].source_url.is_none());
}

// ==================== Content Policy Tests ====================

async fn mount_scripted_q1(server: &MockServer) {
    mount_nvda_submissions(server).await;
    Mock::given(method("GET"))
        .and(path("/Archives/1045810/000104581024000124/nvda-q1.htm"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><script>track()</script>Revenue</html>"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_flag_policy_stores_unsafe_content_with_warnings() {
    let server = require_mock_server!();
    mount_scripted_q1(&server).await;
    let dir = TempDir::new().unwrap();
    let client = FetchClient::new();
    let engine = IngestEngine::new(
        1,
        fast_settings(ContentPolicy::Flag),
        Arc::new(RateLimiter::disabled()),
    )
    .unwrap();

    let report = run(
        &engine,
        nvda_targets(&[Quarter::Q1]),
        vec![edgar_locator(&server, &client)],
        &client,
        dir.path(),
    )
    .await;

    match &report.outcomes[0].status {
        FilingStatus::Stored { warnings, path, .. } => {
            assert_eq!(warnings.len(), 1);
            assert!(path.exists());
        }
        other => panic!("expected stored outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reject_policy_refuses_unsafe_content() {
    let server = require_mock_server!();
    mount_scripted_q1(&server).await;
    let dir = TempDir::new().unwrap();
    let client = FetchClient::new();
    let engine = IngestEngine::new(
        1,
        fast_settings(ContentPolicy::Reject),
        Arc::new(RateLimiter::disabled()),
    )
    .unwrap();

    let report = run(
        &engine,
        nvda_targets(&[Quarter::Q1]),
        vec![edgar_locator(&server, &client)],
        &client,
        dir.path(),
    )
    .await;

    match &report.outcomes[0].status {
        FilingStatus::Rejected { warnings, .. } => assert!(!warnings.is_empty()),
        other => panic!("expected rejected outcome, got {other:?}"),
    }
    assert!(!dir.path().join("2024_Q1_NVDA.htm").exists());
    assert!(!report.has_failures());
}

// ==================== Locator Chain Tests ====================

#[tokio::test]
async fn test_company_without_cik_falls_back_to_ir_page() {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/ir/financials"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<ul>
                 <li><a href="/docs/skh-q4-2023.pdf">Q4 2023 Earnings Release</a></li>
                 <li><a href="/docs/skh-q1-2024.pdf">Q1 2024 Earnings Release</a></li>
               </ul>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/skh-q1-2024.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PDF_BODY.to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = FetchClient::new();
    let locators: Vec<Box<dyn FilingLocator>> = vec![
        edgar_locator(&server, &client),
        Box::new(
            IrPageLocator::new(client.clone(), FetchOptions::default())
                .with_page_url(format!("{}/ir/financials", server.uri())),
        ),
    ];
    let skh = company_by_ticker("SKH").unwrap();
    assert!(skh.sec_cik.is_none());

    let engine = IngestEngine::new(
        2,
        fast_settings(ContentPolicy::Flag),
        Arc::new(RateLimiter::disabled()),
    )
    .unwrap();
    let report = run(
        &engine,
        enumerate_targets(&[skh], &[2024], &[Quarter::Q1]),
        locators,
        &client,
        dir.path(),
    )
    .await;

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.locator, Some("ir_page"));
    assert_eq!(
        outcome.source_url.as_deref(),
        Some(format!("{}/docs/skh-q1-2024.pdf", server.uri()).as_str())
    );
    assert_eq!(outcome.status.label(), "stored");
    assert_eq!(
        std::fs::read(dir.path().join("2024_Q1_SKH.pdf")).unwrap(),
        PDF_BODY
    );
}

#[tokio::test]
async fn test_broken_submissions_index_fails_target_as_locate_error() {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path(NVDA_SUBMISSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = FetchClient::new();
    let engine = IngestEngine::new(
        1,
        fast_settings(ContentPolicy::Flag),
        Arc::new(RateLimiter::disabled()),
    )
    .unwrap();
    let report = run(
        &engine,
        nvda_targets(&[Quarter::Q1]),
        vec![edgar_locator(&server, &client)],
        &client,
        dir.path(),
    )
    .await;

    match &report.outcomes[0].status {
        FilingStatus::Failed { kind, error } => {
            assert_eq!(*kind, "locate_error");
            assert!(error.contains(NVDA_SUBMISSIONS));
        }
        other => panic!("expected failed outcome, got {other:?}"),
    }
}

// ==================== Manifest Tests ====================

#[tokio::test]
async fn test_manifest_records_every_outcome() {
    let server = require_mock_server!();
    mount_nvda_submissions(&server).await;
    Mock::given(method("GET"))
        .and(path("/Archives/1045810/000104581024000124/nvda-q1.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HTML_BODY))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = FetchClient::new();
    let progress = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&progress);
    let engine = IngestEngine::new(
        2,
        fast_settings(ContentPolicy::Flag),
        Arc::new(RateLimiter::disabled()),
    )
    .unwrap()
    .with_progress(Arc::new(move |_: &FilingOutcome| {
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    let report = run(
        &engine,
        nvda_targets(&[Quarter::Q1, Quarter::Fy]),
        vec![edgar_locator(&server, &client)],
        &client,
        dir.path(),
    )
    .await;
    let manifest_path = dir.path().join("manifest.json");
    report.write_manifest(&manifest_path).await.unwrap();

    assert_eq!(progress.load(Ordering::SeqCst), 2);
    let manifest: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["summary"]["stored"], 1);
    assert_eq!(manifest["summary"]["not_found"], 1);
    assert_eq!(manifest["outcomes"][0]["ticker"], "NVDA");
    assert_eq!(manifest["outcomes"][0]["quarter"], "Q1");
    assert_eq!(manifest["outcomes"][0]["status"], "stored");
    assert_eq!(manifest["outcomes"][0]["locator"], "edgar");
    assert_eq!(manifest["outcomes"][1]["quarter"], "FY");
    assert_eq!(manifest["outcomes"][1]["status"], "not_found");
}
