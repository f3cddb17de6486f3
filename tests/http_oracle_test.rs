//! Integration tests for the HTTP oracle against a mock lab

mod common;

use common::{test_config, Lab};
use tiresias::error::ErrorKind;
use tiresias::http::{HttpOracle, Oracle};
use tiresias::logger::{LogLevel, Logger};
use tiresias::models::StatusClass;
use tiresias::recon::catalog::Engine;
use tiresias::recon::{Pipeline, PipelineOptions};
use tiresias::report;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Serves `lab` behind `/filter?category=...`
async fn mount_lab(server: &MockServer, lab: Lab) {
    Mock::given(method("GET"))
        .and(path("/filter"))
        .respond_with(move |req: &Request| {
            let value = req
                .url
                .query_pairs()
                .find(|(key, _)| key == "category")
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default();
            let (status, body) = lab.respond(&value);
            ResponseTemplate::new(status).set_body_string(body)
        })
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_status_and_body_pass_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("category", "Gifts'"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let oracle = HttpOracle::from_config(&config).expect("Failed to create oracle");

    let result = oracle
        .probe(&format!("{}/filter?category=Gifts%27", mock_server.uri()))
        .await
        .expect("probe");

    assert_eq!(result.status, 500);
    assert_eq!(result.class(), StatusClass::ServerError);
    assert_eq!(result.body, b"Internal Server Error");
    assert_eq!(oracle.request_count(), 1);
}

#[tokio::test]
async fn test_custom_headers_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("x-lab-session", "abc123"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .with_priority(10)
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri());
    config
        .headers
        .insert("X-Lab-Session".to_string(), "abc123".to_string());
    let oracle = HttpOracle::from_config(&config).expect("Failed to create oracle");

    let result = oracle.probe(&mock_server.uri()).await.expect("probe");
    assert!(result.is_success());
}

#[tokio::test]
async fn test_redirects_not_followed_when_disabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/filter"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/login"))
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri());
    config.follow_redirects = false;
    let oracle = HttpOracle::from_config(&config).expect("Failed to create oracle");

    let result = oracle
        .probe(&format!("{}/filter?category=Gifts", mock_server.uri()))
        .await
        .expect("probe");
    assert_eq!(result.status, 302);
    assert_eq!(result.class(), StatusClass::Other);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let config = test_config("http://127.0.0.1:1");
    let oracle = HttpOracle::from_config(&config).expect("Failed to create oracle");

    let err = oracle
        .probe("http://127.0.0.1:1/filter?category=Gifts%27")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(oracle.request_count(), 1, "failed probes are not retried");
}

#[tokio::test]
async fn test_invalid_proxy_is_config_error() {
    let mut config = test_config("http://lab");
    config.proxy = Some("not a proxy".to_string());
    let err = HttpOracle::from_config(&config).err().expect("proxy rejected");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_full_pipeline_over_http() {
    let mock_server = MockServer::start().await;
    let lab = Lab::mysql();
    mount_lab(&mock_server, lab.clone()).await;

    let config = test_config(&mock_server.uri());
    let base_url = config.base_url().expect("base url");
    assert_eq!(base_url, format!("{}/filter?category=Gifts", mock_server.uri()));

    let oracle = HttpOracle::from_config(&config).expect("Failed to create oracle");
    let pipeline = Pipeline::new(
        &oracle,
        Logger::new(LogLevel::Fatal),
        PipelineOptions::from_config(&config),
    );

    let report = pipeline.run(&base_url).await.expect("pipeline run");

    assert_eq!(report.state.comment_token.as_deref(), Some("-- "));
    assert_eq!(report.state.column_count, Some(3));
    assert_eq!(report.state.signature.map(|s| s.engine), Some(Engine::Mysql));
    assert_eq!(report.state.table_name.as_deref(), Some(lab.table));
    assert_eq!(
        report.state.extracted.as_ref().map(|e| e.value.as_str()),
        Some("s3cr3t-9x")
    );
    assert_eq!(report.probes, oracle.request_count());

    let output = std::env::temp_dir().join(format!("tiresias-report-{}.json", std::process::id()));
    report::json::export(&report, &output).expect("export");
    let written = std::fs::read_to_string(&output).expect("report file");
    let _ = std::fs::remove_file(&output);
    assert!(written.contains("s3cr3t-9x"));
    assert!(written.contains("\"column_count\": 3"));
}

#[tokio::test]
async fn test_hash_comment_over_http() {
    let mock_server = MockServer::start().await;
    mount_lab(
        &mock_server,
        Lab {
            tokens: vec!["#"],
            ..Lab::mysql()
        },
    )
    .await;

    let config = test_config(&mock_server.uri());
    let oracle = HttpOracle::from_config(&config).expect("Failed to create oracle");
    let report = Pipeline::new(
        &oracle,
        Logger::new(LogLevel::Fatal),
        PipelineOptions::from_config(&config),
    )
    .run(&config.base_url().expect("base url"))
    .await
    .expect("pipeline run");

    assert_eq!(report.state.comment_token.as_deref(), Some("#"));
    assert!(report.state.extracted.is_some());
}
