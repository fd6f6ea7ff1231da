//! HTTP Server for the reconciliation API.
//!
//! Each request runs its own independent reconciliation; nothing is shared
//! between requests except the log broadcaster.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                            |
//! |--------|-----------------------|----------------------------------------|
//! | GET    | `/health`             | Health check                           |
//! | POST   | `/api/reports/manual` | Upload state + CDC CSVs, get a report  |
//! | GET    | `/api/logs`           | SSE stream for real-time logs          |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, ReportQuery, ReportResponse};
use crate::config::ServerConfig;
use crate::error::{PipelineError, ServerError};
use crate::reconcile::{reconcile_bytes, ReconcileOptions};

/// Multipart field holding the state export.
pub const SOURCE_FIELD: &str = "source_file";
/// Multipart field holding the CDC export.
pub const REFERENCE_FIELD: &str = "reference_file";

type ApiError = (StatusCode, Json<Value>);

/// Build the application router.
pub fn router(config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/reports/manual", post(manual_report))
        .route("/api/logs", get(sse_logs))
        // Two files per request
        .layer(DefaultBodyLimit::max(config.max_upload_bytes.saturating_mul(2)))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(&config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 caserecon server running on http://localhost:{}", config.port);
    println!("   POST /api/reports/manual - Upload state + CDC CSV files");
    println!("   GET  /api/logs           - SSE log stream");
    println!("   GET  /health             - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "caserecon",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "manualReport": "POST /api/reports/manual",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Manual report endpoint: both files are uploaded by the caller.
async fn manual_report(
    Query(query): Query<ReportQuery>,
    mut multipart: Multipart,
) -> Result<Json<ReportResponse>, ApiError> {
    let mut source: Option<Vec<u8>> = None;
    let mut reference: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| reject(ServerError::BadRequest(format!("Multipart error: {}", e))))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != SOURCE_FIELD && name != REFERENCE_FIELD {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| reject(ServerError::BadRequest(format!("Read error: {}", e))))?
            .to_vec();

        if name == SOURCE_FIELD {
            source = Some(bytes);
        } else {
            reference = Some(bytes);
        }
    }

    let source = source.ok_or_else(|| {
        reject(ServerError::BadRequest(format!("No {} provided", SOURCE_FIELD)))
    })?;
    let reference = reference.ok_or_else(|| {
        reject(ServerError::BadRequest(format!("No {} provided", REFERENCE_FIELD)))
    })?;

    log_info(format!(
        "📄 New manual report: source {} bytes, reference {} bytes",
        source.len(),
        reference.len()
    ));

    let options = ReconcileOptions::from(query);
    let report = tokio::task::spawn_blocking(move || reconcile_bytes(&source, &reference, options))
        .await
        .map_err(|e| reject(ServerError::Internal(e.to_string())))?
        .map_err(|e| reject(ServerError::Pipeline(e)))?;

    Ok(Json(ReportResponse::from(report)))
}

/// Status code for a failed request.
pub fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Csv(_) | PipelineError::Input(_)) => {
            StatusCode::BAD_REQUEST
        }
        ServerError::Pipeline(PipelineError::Reconcile(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ServerError) -> ApiError {
    log_error(err.to_string());
    (status_for(&err), Json(error_response(&err.to_string())))
}
