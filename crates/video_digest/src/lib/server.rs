use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use digest_store::{FetchError, FsDocumentStore};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;

use crate::{
    error::PipelineFailure,
    processor::Pipeline,
    toolchain::Toolchain,
    types::{SummarizationRequest, SummarizeBody, SummarizeResponse, DOWNLOAD_ROUTE_PREFIX},
};

/// Shared, immutable server state
pub struct AppState<P> {
    pub pipeline: Arc<P>,
    pub documents: FsDocumentStore,
    pub toolchain: Toolchain,
}

impl<P> AppState<P> {
    pub fn new(pipeline: P, documents: FsDocumentStore, toolchain: Toolchain) -> Self {
        AppState {
            pipeline: Arc::new(pipeline),
            documents,
            toolchain,
        }
    }
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        AppState {
            pipeline: Arc::clone(&self.pipeline),
            documents: self.documents.clone(),
            toolchain: self.toolchain,
        }
    }
}

#[derive(Debug)]
pub enum HttpError {
    DependencyUnavailable { missing: Vec<&'static str> },
    BadRequest { message: String },
    Stage(PipelineFailure),
    Forbidden,
    NotFound,
    Internal { message: String },
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, stage, message) = match self {
            HttpError::DependencyUnavailable { missing } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Some("dependency"),
                format!(
                    "Server dependency unavailable: {}. Check the server installation.",
                    missing.join(", ")
                ),
            ),
            HttpError::BadRequest { message } => (StatusCode::BAD_REQUEST, Some("input"), message),
            HttpError::Stage(failure) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Some(failure.stage.as_str()),
                failure.public_message().to_string(),
            ),
            HttpError::Forbidden => (StatusCode::FORBIDDEN, None, "Access denied".to_string()),
            HttpError::NotFound => (StatusCode::NOT_FOUND, None, "PDF not found".to_string()),
            HttpError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, None, message),
        };

        let body = match stage {
            Some(stage) => json!({ "error": message, "stage": stage }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<FetchError> for HttpError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Forbidden(name) => {
                tracing::warn!(file_name = %name, "Blocked document access outside the output directory");
                HttpError::Forbidden
            }
            FetchError::NotFound(name) => {
                tracing::debug!(file_name = %name, "Requested document does not exist");
                HttpError::NotFound
            }
            FetchError::Io(e) => {
                tracing::error!(error = ?e, "Failed to read document");
                HttpError::Internal {
                    message: "Failed to read the PDF".to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    toolchain: Toolchain,
}

pub fn router<P>(state: AppState<P>) -> Router
where
    P: Pipeline + Send + Sync + 'static,
{
    Router::new()
        .route("/api/summarize", post(summarize::<P>))
        .route(
            &format!("{DOWNLOAD_ROUTE_PREFIX}/{{filename}}"),
            get(download_pdf::<P>),
        )
        .route("/health", get(health::<P>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves `router` on `listener` until Ctrl-C
pub async fn serve(listener: TcpListener, router: Router) -> anyhow::Result<()> {
    tracing::info!(addr = ?listener.local_addr()?, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "Server error"))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tracing::instrument(skip_all)]
async fn summarize<P>(
    State(state): State<AppState<P>>,
    body: Result<Json<SummarizeBody>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, HttpError>
where
    P: Pipeline + Send + Sync + 'static,
{
    if !state.toolchain.is_ready() {
        let missing = state.toolchain.missing();
        tracing::error!(?missing, "Refusing request, required tools are missing");
        return Err(HttpError::DependencyUnavailable { missing });
    }

    let Json(body) = body.map_err(|e| {
        tracing::warn!(error = %e, "Rejected request body");
        HttpError::BadRequest {
            message: "Request body must be JSON with a \"url\" field".to_string(),
        }
    })?;
    let request = SummarizationRequest::try_from(body).map_err(|e| HttpError::BadRequest {
        message: e.to_string(),
    })?;

    let output = state
        .pipeline
        .run(&request)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Summarization request failed"))
        .map_err(HttpError::Stage)?;

    if output.rendering_failed() {
        tracing::warn!("Returning summary without a PDF");
    }

    Ok(Json(output.into()))
}

#[tracing::instrument(skip_all, fields(%filename))]
async fn download_pdf<P>(
    State(state): State<AppState<P>>,
    Path(filename): Path<String>,
) -> Result<Response, HttpError>
where
    P: Pipeline + Send + Sync + 'static,
{
    let document = state.documents.open(&filename).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        document.file_name.replace(['"', '\\'], "_")
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, document.len)
        .body(Body::from_stream(ReaderStream::new(document.file)))
        .map_err(|e| {
            tracing::error!(error = ?e, "Failed to build download response");
            HttpError::Internal {
                message: "Failed to send the PDF".to_string(),
            }
        })
}

async fn health<P>(State(state): State<AppState<P>>) -> impl IntoResponse
where
    P: Pipeline + Send + Sync + 'static,
{
    Json(HealthResponse {
        status: "ok",
        toolchain: state.toolchain,
    })
}
