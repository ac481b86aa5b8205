//! End-to-end reconciliation passes against mocked Spaceship and IP services

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spaceship_ddns::dns_provider::DnsProvider;
use spaceship_ddns::ip_source::HttpIpSource;
use spaceship_ddns::reconciler::Reconciler;
use spaceship_ddns::spaceship::SpaceshipClient;
use spaceship_ddns::DdnsError;

const DOMAIN: &str = "example.com";
const RECORDS_PATH: &str = "/api/v1/dns/records/example.com";
const TIMEOUT: Duration = Duration::from_secs(5);

fn client(server: &MockServer) -> SpaceshipClient {
    SpaceshipClient::with_endpoint(
        &format!("{}/api/v1/dns/records", server.uri()),
        "test-key",
        "test-secret",
        TIMEOUT,
    )
    .expect("client")
}

async fn ip_service(address: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(address))
        .mount(&server)
        .await;
    server
}

fn reconciler(registrar: &MockServer, ip_url: &str, names: &[&str]) -> Reconciler {
    Reconciler::new(
        DOMAIN,
        names.iter().map(|n| n.to_string()).collect(),
        Arc::new(client(registrar)),
        Arc::new(HttpIpSource::new(ip_url, TIMEOUT).expect("ip source")),
    )
}

async fn mount_listing(server: &MockServer, items: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .and(query_param("take", "500"))
        .and(query_param("skip", "0"))
        .and(header("X-API-Key", "test-key"))
        .and(header("X-API-Secret", "test-secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "items": items, "total": 1 })),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn put_body(name: &str, address: &str) -> serde_json::Value {
    json!({
        "force": true,
        "items": [{"type": "A", "name": name, "address": address, "ttl": 1800}]
    })
}

fn delete_body(name: &str, address: &str) -> serde_json::Value {
    json!([{"type": "A", "name": name, "address": address}])
}

#[tokio::test]
async fn update_existing_and_create_missing() {
    let registrar = MockServer::start().await;
    let ip = ip_service("5.6.7.8\n").await;

    mount_listing(
        &registrar,
        json!([{"type": "A", "name": "@", "address": "1.2.3.4", "ttl": 1800}]),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path(RECORDS_PATH))
        .and(header("content-type", "application/json"))
        .and(body_json(delete_body("@", "1.2.3.4")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&registrar)
        .await;
    Mock::given(method("PUT"))
        .and(path(RECORDS_PATH))
        .and(body_json(put_body("@", "5.6.7.8")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&registrar)
        .await;
    Mock::given(method("PUT"))
        .and(path(RECORDS_PATH))
        .and(body_json(put_body("www", "5.6.7.8")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&registrar)
        .await;

    let report = reconciler(&registrar, &ip.uri(), &["@", "www"])
        .run_pass()
        .await
        .expect("pass");

    assert_eq!(report.updated, vec!["@"]);
    assert_eq!(report.created, vec!["www"]);
    assert!(report.failed.is_empty());

    let methods: Vec<String> = registrar
        .received_requests()
        .await
        .expect("recording enabled")
        .iter()
        .map(|r| r.method.to_string())
        .collect();
    assert_eq!(methods, vec!["GET", "DELETE", "PUT", "PUT"]);
}

#[tokio::test]
async fn correct_record_issues_no_mutations() {
    let registrar = MockServer::start().await;
    let ip = ip_service("5.6.7.8").await;

    mount_listing(
        &registrar,
        json!([{"type": "A", "name": "@", "address": "5.6.7.8", "ttl": 1800}]),
    )
    .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&registrar)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&registrar)
        .await;

    let report = reconciler(&registrar, &ip.uri(), &["@"])
        .run_pass()
        .await
        .expect("pass");
    assert_eq!(report.unchanged, vec!["@"]);
}

#[tokio::test]
async fn non_a_record_is_left_alone() {
    let registrar = MockServer::start().await;
    let ip = ip_service("5.6.7.8").await;

    mount_listing(
        &registrar,
        json!([{
            "type": "MX",
            "name": "mail",
            "exchange": "mx.example.net",
            "preference": 10,
            "ttl": 3600
        }]),
    )
    .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&registrar)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&registrar)
        .await;

    let report = reconciler(&registrar, &ip.uri(), &["mail"])
        .run_pass()
        .await
        .expect("pass");
    assert_eq!(report.skipped, vec!["mail"]);
}

#[tokio::test]
async fn ip_discovery_failure_makes_no_registrar_calls() {
    let registrar = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&registrar)
        .await;

    // Nothing listens on port 1
    let err = reconciler(&registrar, "http://127.0.0.1:1/", &["@"])
        .run_pass()
        .await
        .expect_err("discovery must fail");
    assert!(matches!(err, DdnsError::IpDiscovery(_)), "got {err}");
}

#[tokio::test]
async fn ip_service_error_status_is_discovery_failure() {
    let registrar = MockServer::start().await;
    let ip = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&ip)
        .await;

    let err = reconciler(&registrar, &ip.uri(), &["@"])
        .run_pass()
        .await
        .expect_err("discovery must fail");
    assert!(matches!(err, DdnsError::IpDiscovery(ref m) if m.contains("503")));
}

#[tokio::test]
async fn malformed_listing_aborts_before_mutations() {
    let registrar = MockServer::start().await;
    let ip = ip_service("5.6.7.8").await;

    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"items\": [ oops"))
        .expect(1)
        .mount(&registrar)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&registrar)
        .await;

    let err = reconciler(&registrar, &ip.uri(), &["@", "www"])
        .run_pass()
        .await
        .expect_err("listing must fail");
    assert!(matches!(err, DdnsError::Protocol { operation: "list", .. }));
}

#[tokio::test]
async fn listing_without_items_is_protocol_error() {
    let registrar = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0})))
        .mount(&registrar)
        .await;

    let err = client(&registrar)
        .list_records(DOMAIN)
        .await
        .expect_err("items missing");
    assert!(matches!(err, DdnsError::Protocol { .. }));
}

#[tokio::test]
async fn listing_error_status_is_transport_error() {
    let registrar = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"detail\":\"bad key\"}"))
        .mount(&registrar)
        .await;

    let err = client(&registrar)
        .list_records(DOMAIN)
        .await
        .expect_err("unauthorized");
    match err {
        DdnsError::Transport { status, body, .. } => {
            assert_eq!(status, Some(401));
            assert!(body.contains("bad key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn listing_parse_keeps_record_fields() {
    let registrar = MockServer::start().await;
    mount_listing(
        &registrar,
        json!([
            {"type": "A", "name": "@", "address": "1.2.3.4", "ttl": 1800},
            {"type": "AAAA", "name": "v6", "address": "2001:db8::1", "ttl": 600},
            {"type": "TXT", "name": "_dmarc", "value": "v=DMARC1; p=none", "ttl": 3600}
        ]),
    )
    .await;

    let records = client(&registrar).list_records(DOMAIN).await.expect("list");
    assert_eq!(records.len(), 3);

    let apex = &records["@"];
    assert_eq!(apex.record_type, "A");
    assert_eq!(apex.address.as_deref(), Some("1.2.3.4"));
    assert_eq!(apex.ttl, Some(1800));

    let v6 = &records["v6"];
    assert_eq!(v6.record_type, "AAAA");
    assert_eq!(v6.address.as_deref(), Some("2001:db8::1"));
    assert_eq!(v6.ttl, Some(600));

    let txt = &records["_dmarc"];
    assert_eq!(txt.address, None);
    assert_eq!(txt.extra["value"], "v=DMARC1; p=none");
}

#[tokio::test]
async fn failed_delete_surfaces_status_and_skips_add() {
    let registrar = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&registrar)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&registrar)
        .await;

    let err = client(&registrar)
        .update_record(DOMAIN, "@", "1.2.3.4", "5.6.7.8")
        .await
        .expect_err("delete fails");
    assert_eq!(err.status(), Some(500));
    assert!(matches!(err, DdnsError::Transport { operation: "delete", .. }));
}

#[tokio::test]
async fn failed_add_is_isolated_to_its_name() {
    let registrar = MockServer::start().await;
    let ip = ip_service("5.6.7.8").await;

    mount_listing(&registrar, json!([])).await;
    Mock::given(method("PUT"))
        .and(body_json(put_body("www", "5.6.7.8")))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid"))
        .expect(1)
        .mount(&registrar)
        .await;
    Mock::given(method("PUT"))
        .and(body_json(put_body("api", "5.6.7.8")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&registrar)
        .await;

    let report = reconciler(&registrar, &ip.uri(), &["www", "api"])
        .run_pass()
        .await
        .expect("pass");
    assert_eq!(report.created, vec!["api"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].1.status(), Some(422));

    let err = report.into_result().expect_err("partial failure");
    assert!(matches!(err, DdnsError::PartialFailure { total: 2, .. }));
}

#[tokio::test]
async fn trailing_dot_domain_reaches_zone_endpoint() {
    use spaceship_ddns::cli::Args;
    use spaceship_ddns::config::Config;

    let args = Args {
        domain: Some("example.com.".to_string()),
        api_key: Some("test-key".to_string()),
        api_secret: Some("test-secret".to_string()),
        names: vec!["@".to_string()],
        ..Args::default()
    };
    let cfg = Config::resolve(&args, |_| None, None).expect("config");

    let registrar = MockServer::start().await;
    mount_listing(&registrar, json!([])).await;

    let records = client(&registrar)
        .list_records(&cfg.domain)
        .await
        .expect("list");
    assert!(records.is_empty());
}
