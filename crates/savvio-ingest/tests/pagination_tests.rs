//! Pagination tests against a mock HTTP server
//!
//! Verifies request counts and record order for the supported page shapes,
//! the `has_more` flag, the full-page heuristic and the page cap.

mod common;

use savvio_ingest::api::ApiClient;
use savvio_ingest::IngestError;
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

async fn mount_page(server: &MockServer, endpoint: &str, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn ids(records: &[savvio_common::Record]) -> Vec<i64> {
    records.iter().map(|r| r["id"].as_i64().expect("numeric id")).collect()
}

#[tokio::test]
async fn test_short_last_page_ends_fetch() {
    // R = 5 records, P = 2: ceil(5 / 2) = 3 requests
    let server = MockServer::start().await;
    mount_page(&server, "/financial", 1, json!([{"id": 1}, {"id": 2}])).await;
    mount_page(&server, "/financial", 2, json!([{"id": 3}, {"id": 4}])).await;
    mount_page(&server, "/financial", 3, json!([{"id": 5}])).await;

    let client = ApiClient::new(common::api_config(&server.uri())).unwrap();
    let records = client.fetch_with_pagination("/financial", &[], 2, None).await.unwrap();

    assert_eq!(ids(&records), [1, 2, 3, 4, 5]);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_exact_multiple_needs_one_empty_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/financial", 1, json!([{"id": 1}, {"id": 2}])).await;
    mount_page(&server, "/financial", 2, json!([{"id": 3}, {"id": 4}])).await;
    mount_page(&server, "/financial", 3, json!([])).await;

    let client = ApiClient::new(common::api_config(&server.uri())).unwrap();
    let records = client.fetch_with_pagination("/financial", &[], 2, None).await.unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_has_more_flag_continues_short_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/v1/financial", 1, json!([{"id": 1}, {"id": 2}])).await;
    mount_page(&server, "/v1/financial", 2, json!({"data": [{"id": 3}], "has_more": true})).await;
    mount_page(&server, "/v1/financial", 3, json!([])).await;

    let client = ApiClient::new(common::api_config(&format!("{}/v1", server.uri()))).unwrap();
    let records = client.fetch_with_pagination("/financial", &[], 2, None).await.unwrap();

    assert_eq!(ids(&records), [1, 2, 3]);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_results_shape_and_camel_case_flag() {
    let server = MockServer::start().await;
    mount_page(&server, "/reviews", 1, json!({"results": [{"id": 1}], "hasMore": true})).await;
    mount_page(&server, "/reviews", 2, json!({"results": [{"id": 2}], "hasMore": false})).await;

    let client = ApiClient::new(common::api_config(&server.uri())).unwrap();
    let records = client.fetch_with_pagination("/reviews", &[], 10, None).await.unwrap();

    assert_eq!(ids(&records), [1, 2]);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_null_data_page_ends_fetch() {
    let server = MockServer::start().await;
    mount_page(&server, "/financial", 1, json!({"data": [{"id": 1}, {"id": 2}]})).await;
    mount_page(&server, "/financial", 2, json!({"data": null, "has_more": false})).await;

    let client = ApiClient::new(common::api_config(&server.uri())).unwrap();
    let records = client.fetch_with_pagination("/financial", &[], 2, None).await.unwrap();

    assert_eq!(ids(&records), [1, 2]);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_null_data_page_ends_fetch_with_page_size_one() {
    let server = MockServer::start().await;
    mount_page(&server, "/reviews", 1, json!({"data": [{"id": 1}]})).await;
    mount_page(&server, "/reviews", 2, json!({"data": null})).await;

    let client = ApiClient::new(common::api_config(&server.uri())).unwrap();
    let records = client.fetch_with_pagination("/reviews", &[], 1, None).await.unwrap();

    assert_eq!(ids(&records), [1]);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_non_array_data_is_invalid_shape() {
    let server = MockServer::start().await;
    mount_page(&server, "/products", 1, json!({"data": {"id": 1}})).await;

    let client = ApiClient::new(common::api_config(&server.uri())).unwrap();
    let err = client.fetch_with_pagination("/products", &[], 10, None).await.unwrap_err();

    assert!(matches!(err, IngestError::InvalidShape(ref msg) if msg.contains("/products page 1")));
}

#[tokio::test]
async fn test_max_pages_caps_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&server)
        .await;

    let client = ApiClient::new(common::api_config(&server.uri())).unwrap();
    let records = client.fetch_with_pagination("/products", &[], 2, Some(2)).await.unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_caller_params_and_custom_names_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("category", "kitchen"))
        .and(query_param("p", "1"))
        .and(query_param("per_page", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = common::api_config(&server.uri());
    config.pagination.page_param = "p".to_string();
    config.pagination.limit_param = "per_page".to_string();
    let client = ApiClient::new(config).unwrap();

    let params = vec![("category".to_string(), "kitchen".to_string())];
    let records = client.fetch_with_pagination("/products", &params, 50, None).await.unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_single_object_page_is_one_record() {
    let server = MockServer::start().await;
    mount_page(&server, "/financial", 1, json!({"id": 9, "summary": true})).await;

    let client = ApiClient::new(common::api_config(&server.uri())).unwrap();
    let records = client.fetch_with_pagination("/financial", &[], 100, None).await.unwrap();

    assert_eq!(ids(&records), [9]);
}

#[tokio::test]
async fn test_non_object_records_are_invalid_shape() {
    let server = MockServer::start().await;
    mount_page(&server, "/financial", 1, json!([1, 2, 3])).await;

    let client = ApiClient::new(common::api_config(&server.uri())).unwrap();
    let err = client.fetch_with_pagination("/financial", &[], 100, None).await.unwrap_err();

    assert!(matches!(err, IngestError::InvalidShape(ref msg) if msg.contains("/financial page 1")));
}

#[tokio::test]
async fn test_failing_page_aborts_fetch() {
    let server = MockServer::start().await;
    mount_page(&server, "/financial", 1, json!([{"id": 1}, {"id": 2}])).await;
    Mock::given(method("GET"))
        .and(path("/financial"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let client = ApiClient::new(common::api_config(&server.uri())).unwrap();
    let (logs, _guard) = common::capture_logs();
    let err = client.fetch_with_pagination("/financial", &[], 2, None).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(logs
        .lines_at("ERROR")
        .iter()
        .any(|line| line.contains("Failed to fetch page 2") && line.contains("page=2")));
}
