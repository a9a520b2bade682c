//! VStar pipeline over the Blob REST API
//!
//! A wiremock server stands in for the storage account; listing pages are
//! served as `List Blobs` XML with a `NextMarker` between them.

mod common;

use adrev_server::db::{RecordingExecutor, SqlParam};
use adrev_server::ingest::framework::RetryPolicy;
use adrev_server::ingest::vstar::{self, PROCEDURES};
use adrev_server::ingest::VStarConfig;
use adrev_server::storage::{BlobStore, BlobStoreConfig, ObjectStore};
use chrono::NaiveDate;
use common::{init_tracing, marked_filenames, text_param, VSTAR_HEADER};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTAINER: &str = "reports";
const SAS: &str = "sv=2022-11-02&sig=test-signature";

fn listing(names: &[&str], next_marker: Option<&str>) -> String {
    let blobs: String = names
        .iter()
        .map(|name| {
            format!(
                "<Blob><Name>{}</Name><Properties>\
                 <Last-Modified>Fri, 15 Mar 2024 06:00:00 GMT</Last-Modified>\
                 <Content-Length>512</Content-Length></Properties></Blob>",
                name
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><EnumerationResults ContainerName="{}"><Blobs>{}</Blobs><NextMarker>{}</NextMarker></EnumerationResults>"#,
        CONTAINER,
        blobs,
        next_marker.unwrap_or_default()
    )
}

fn export(rows: &[&str]) -> String {
    let mut content = String::from(VSTAR_HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content
}

async fn storage_account() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", CONTAINER)))
        .and(query_param("comp", "list"))
        .and(query_param("marker", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &["daily/vstar_2024-03-15.csv"],
            None,
        )))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", CONTAINER)))
        .and(query_param("comp", "list"))
        .and(query_param("restype", "container"))
        .and(query_param("sig", "test-signature"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &["daily/vstar_2024-03-13.csv", "daily/vstar_2024-03-14.csv"],
            Some("page-2"),
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{}/daily/vstar_2024-03-14.csv", CONTAINER)))
        .respond_with(ResponseTemplate::new(200).set_body_string(export(&[
            "2024-03-14,Adrev,V-1,Main St Gym,Acme,C-5,Spring Push,CR-2,Spot 15s,\"1,200\",\"3,400\",17.00,5.00",
            "2024-03-14,Other Network,V-2,Mall,Acme,C-5,Spring Push,CR-2,Spot 15s,10,20,1.00,5.00",
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{}/daily/vstar_2024-03-15.csv", CONTAINER)))
        .respond_with(ResponseTemplate::new(500).set_body_string("InternalError"))
        .mount(&server)
        .await;

    server
}

fn blob_store(server: &MockServer) -> BlobStore {
    BlobStore::with_client(
        reqwest::Client::new(),
        BlobStoreConfig::new(server.uri(), CONTAINER, format!("?{}", SAS)),
    )
}

#[tokio::test]
async fn test_listing_follows_next_marker() {
    let server = storage_account().await;
    let store = blob_store(&server);

    let first = store.list_page("daily/", 2, None).await.unwrap();
    assert_eq!(first.objects.len(), 2);
    assert_eq!(first.objects[0].container, CONTAINER);
    assert_eq!(first.continuation.as_deref(), Some("page-2"));

    let second = store.list_page("daily/", 2, first.continuation).await.unwrap();
    assert_eq!(second.objects.len(), 1);
    assert_eq!(second.objects[0].key, "daily/vstar_2024-03-15.csv");
    assert!(second.continuation.is_none());
}

#[tokio::test]
async fn test_download_error_status_is_transport() {
    let server = storage_account().await;
    let store = blob_store(&server);

    let err = store.download("daily/vstar_2024-03-15.csv").await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_vstar_run_against_blob_api() {
    init_tracing();
    let server = storage_account().await;

    let executor = Arc::new(
        RecordingExecutor::new()
            .with_text_rows(PROCEDURES.get_filenames, vec!["daily/vstar_2024-03-13.csv".into()]),
    );
    let config = VStarConfig {
        prefix: "daily/".into(),
        ..VStarConfig::default()
    };

    let outcome = vstar::build_pipeline(
        &config,
        Arc::new(blob_store(&server)),
        executor.clone(),
        2,
        RetryPolicy::none(),
    )
    .run_once()
    .await
    .unwrap();

    assert_eq!(outcome.stats.objects_listed, 3);
    assert_eq!(outcome.stats.objects_skipped, 1);
    assert_eq!(outcome.stats.objects_processed, 1);
    assert_eq!(outcome.stats.objects_failed, 1);
    assert_eq!(outcome.stats.rows_rejected, 1);

    let upserts = executor.calls_to(PROCEDURES.upsert);
    assert_eq!(upserts.len(), 1);
    assert_eq!(
        upserts[0].param("ReportDate"),
        Some(&SqlParam::Date(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()))
    );
    assert_eq!(text_param(&upserts[0], "Spots"), "1200");
    assert_eq!(text_param(&upserts[0], "Impressions"), "3400");

    assert_eq!(
        marked_filenames(&executor, PROCEDURES.set_filename),
        vec!["daily/vstar_2024-03-14.csv".to_string()]
    );
    assert_eq!(executor.count(PROCEDURES.commit_catchup), 1);
}
