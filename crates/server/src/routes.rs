use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use flowlog::ingest::IngestStatus;
use flowlog::{IngestionReport, QueryFilterBuilder};

use crate::error::{panic_response, ApiError, ApiResult};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the archive itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = if state.config.server.enable_cors {
        let origins = state
            .config
            .server
            .cors_origins
            .iter()
            .filter_map(|s| s.parse::<axum::http::HeaderValue>().ok())
            .collect::<Vec<_>>();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
    };

    let request_timeout = Duration::from_secs(state.config.server.write_timeout_secs);
    let body_limit = state
        .flowlog
        .ingest
        .max_archive_bytes
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/process-tgz/", post(process_tgz_handler))
        .route("/search-logs/", get(search_logs_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(cors),
        )
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// POST /process-tgz/: ingest the archive sent in multipart field `file`
async fn process_tgz_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<IngestionReport>)> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Upload is not multipart: {}", e);
        ApiError::MissingUpload
    })?;
    let archive = read_upload(&mut multipart).await?.ok_or(ApiError::MissingUpload)?;

    info!(bytes = archive.len(), "Received archive upload");

    // awaited in place: a request dropped by the timeout layer never reaches the bulk insert
    let report = state.ingestor.ingest(archive).await;

    let status = match report.status() {
        IngestStatus::Created => StatusCode::CREATED,
        IngestStatus::PartialContent => StatusCode::PARTIAL_CONTENT,
    };
    Ok((status, Json(report)))
}

async fn read_upload(multipart: &mut Multipart) -> ApiResult<Option<Bytes>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            return Ok(Some(field.bytes().await?));
        }
    }
    Ok(None)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    searchstring: String,
    #[serde(rename = "EarliestTime")]
    earliest_time: Option<String>,
    #[serde(rename = "LatestTime")]
    latest_time: Option<String>,
}

/// GET /search-logs/: filter stored records
async fn search_logs_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let filter = QueryFilterBuilder::global().build(
        &params.searchstring,
        params.earliest_time.as_deref(),
        params.latest_time.as_deref(),
    )?;

    let records = state.store.filter_query(&filter).await?;
    debug!(%filter, matches = records.len(), "Search complete");

    if records.is_empty() {
        return Ok(Json(json!({ "status": "success", "message": "No results found" })));
    }

    Ok(Json(json!({
        "status": "success",
        "message": "results found",
        "results": records,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::io::Write;
    use std::pin::Pin;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use flowlog::conf::FlowlogConfig;
    use flowlog::store::StoreError;
    use flowlog::{FlowRecord, MemoryStore, QueryFilter, RecordStore};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::ServerConfig;

    const BOUNDARY: &str = "flowlog-test-boundary";
    const LINE: &str =
        "2 1 x eni-abc 10.0.0.1 10.0.0.2 443 49152 6 10 123456789012 1000 2000 ACCEPT OK";

    fn app() -> Router {
        router(AppState::new(ServerConfig::default(), FlowlogConfig::default()))
    }

    fn tgz(files: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        let mut encoder = builder.into_inner().unwrap();
        encoder.flush().unwrap();
        encoder.finish().unwrap()
    }

    fn upload(field: &str, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"logs.tgz\"\r\n\
             Content-Type: application/gzip\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/process-tgz/")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_upload_then_search() {
        let app = app();
        let archive = tgz(&[("a.log", LINE.as_bytes())]);

        let (status, body) = send(&app, upload("file", &archive)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["valid_entries"], 1);
        assert_eq!(body["files_processed"], 1);

        let (status, body) = send(&app, get("/search-logs/?searchstring=account_id=123456789012,protocol=6")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "results found");
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["srcaddr"], "10.0.0.1");
        assert_eq!(results[0]["log_status"], "OK");

        let (_, metrics) = send(&app, get("/metrics")).await;
        assert_eq!(metrics["lines_accepted"], 1);
    }

    #[tokio::test]
    async fn test_undecodable_member_is_partial_content() {
        let archive = tgz(&[("bad.log", b"\xff\xfe\xfd"), ("good.log", LINE.as_bytes())]);
        let (status, body) = send(&app(), upload("file", &archive)).await;

        assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(body["ignored_lines"].as_array().unwrap().len(), 1);
        assert_eq!(body["valid_entries"], 1);
    }

    #[tokio::test]
    async fn test_missing_file_field() {
        let (status, body) = send(&app(), upload("attachment", b"whatever")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please upload a .tgz file");
    }

    #[tokio::test]
    async fn test_non_multipart_upload() {
        let request = Request::builder()
            .method("POST")
            .uri("/process-tgz/")
            .body(Body::from("plain body"))
            .unwrap();
        let (status, body) = send(&app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please upload a .tgz file");
    }

    #[tokio::test]
    async fn test_corrupt_archive_reported_in_body() {
        let (status, body) = send(&app(), upload("file", b"not a tarball")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
        assert_eq!(body["valid_entries"], 0);
    }

    #[tokio::test]
    async fn test_search_validation_errors() {
        let (status, body) = send(
            &app(),
            get("/search-logs/?searchstring=foo=bar,srcport=http&EarliestTime=20&LatestTime=10"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"]["search_params"][0].as_str().unwrap().contains("'foo'"));
        assert_eq!(body["message"]["srcport"][0], "Invalid value for 'srcport', must be an integer.");
        assert_eq!(body["message"]["time"][0], "Start time must be before end time.");
    }

    #[tokio::test]
    async fn test_search_no_results() {
        let (status, body) = send(&app(), get("/search-logs/?searchstring=protocol=17")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "No results found");
        assert!(body.get("results").is_none());
    }

    #[tokio::test]
    async fn test_search_empty_time_bounds_ignored() {
        let (status, _) = send(&app(), get("/search-logs/?searchstring=&EarliestTime=&LatestTime=")).await;
        assert_eq!(status, StatusCode::OK);
    }

    struct DownStore;

    impl RecordStore for DownStore {
        fn bulk_insert(
            &self,
            _records: Vec<FlowRecord>,
        ) -> Pin<Box<dyn Future<Output = Result<usize, StoreError>> + Send + '_>> {
            Box::pin(async { Err(StoreError::Unavailable("connection refused".into())) })
        }

        fn filter_query<'a>(
            &'a self,
            _filter: &'a QueryFilter,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<FlowRecord>, StoreError>> + Send + 'a>> {
            Box::pin(async { Err(StoreError::Unavailable("connection refused".into())) })
        }
    }

    #[tokio::test]
    async fn test_store_failure_on_search() {
        let state = AppState::with_store(ServerConfig::default(), FlowlogConfig::default(), Arc::new(DownStore));
        let (status, body) = send(&router(state), get("/search-logs/")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_store_failure_on_upload_is_reported() {
        let state = AppState::with_store(ServerConfig::default(), FlowlogConfig::default(), Arc::new(DownStore));
        let archive = tgz(&[("a.log", LINE.as_bytes())]);
        let (status, body) = send(&router(state), upload("file", &archive)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["valid_entries"], 0);
        assert!(body["errors"][0]["error"].as_str().unwrap().contains("connection refused"));
    }

    /// Holds every batch for two seconds before handing it to `inner`.
    struct SlowStore {
        inner: Arc<MemoryStore>,
    }

    impl RecordStore for SlowStore {
        fn bulk_insert(
            &self,
            records: Vec<FlowRecord>,
        ) -> Pin<Box<dyn Future<Output = Result<usize, StoreError>> + Send + '_>> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                self.inner.bulk_insert(records).await
            })
        }

        fn filter_query<'a>(
            &'a self,
            filter: &'a QueryFilter,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<FlowRecord>, StoreError>> + Send + 'a>> {
            self.inner.filter_query(filter)
        }
    }

    #[tokio::test]
    async fn test_timed_out_upload_writes_nothing() {
        let inner = Arc::new(MemoryStore::new());
        let mut config = ServerConfig::default();
        config.server.write_timeout_secs = 1;
        let store = SlowStore { inner: Arc::clone(&inner) };
        let app = router(AppState::with_store(config, FlowlogConfig::default(), Arc::new(store)));

        let archive = tgz(&[("a.log", LINE.as_bytes())]);
        let response = app.oneshot(upload("file", &archive)).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        // past the point where a detached insert would have landed
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(inner.is_empty().await);
    }

    struct PanickingStore;

    impl RecordStore for PanickingStore {
        fn bulk_insert(
            &self,
            records: Vec<FlowRecord>,
        ) -> Pin<Box<dyn Future<Output = Result<usize, StoreError>> + Send + '_>> {
            Box::pin(async move { Ok(records.len()) })
        }

        fn filter_query<'a>(
            &'a self,
            _filter: &'a QueryFilter,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<FlowRecord>, StoreError>> + Send + 'a>> {
            panic!("index corrupted")
        }
    }

    #[tokio::test]
    async fn test_handler_panic_is_internal_error() {
        let state = AppState::with_store(ServerConfig::default(), FlowlogConfig::default(), Arc::new(PanickingStore));
        let (status, body) = send(&router(state), get("/search-logs/")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["details"], "index corrupted");
    }
}
