//! Route handlers and shared state for the HTTP service.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream;
use redstone_spec::{
    Cancelled, ErrorKind, NoopReporter, PipelineError, ProgressEvent, ProgressReporter,
    SchematicFormat,
};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};

use super::types::{
    CleanupResponse, DownloadQuery, ErrorResponse, FormField, HealthResponse, ListResponse,
    PreviewResponse, UploadForm,
};
use crate::config::RedstoneConfig;
use crate::pipeline::{AudioInput, Pipeline};
use crate::store::ResultStore;

/// Progress events buffered per generation before the pipeline waits.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 16;

/// State shared by every request. Nothing in it is mutated per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RedstoneConfig>,
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<ResultStore>,
    /// One permit per concurrently running pipeline.
    pub jobs: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: RedstoneConfig, store: ResultStore) -> Result<Self, PipelineError> {
        let pipeline = Pipeline::new(&config)?;
        let jobs = Semaphore::new(config.server.max_concurrent_jobs.max(1));
        Ok(Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            store: Arc::new(store),
            jobs: Arc::new(jobs),
        })
    }
}

/// Builds the router with every route and the upload limit.
pub fn router(state: AppState) -> Router {
    let limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/preview", post(preview))
        .route("/preview-audio/:file_id", get(preview_audio))
        .route("/generate", post(generate))
        .route("/download/:file_id", get(download))
        .route("/list", get(list))
        .route("/cleanup", post(cleanup))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// HTTP status for a pipeline failure.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Decode | ErrorKind::Parameter => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Analysis | ErrorKind::LayoutOverflow | ErrorKind::Serialization => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::Cancelled | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A failed request, rendered as JSON.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = status_for(err.kind);
        if status.is_server_error() {
            error!(code = err.code, error = %err, "request failed");
        } else {
            debug!(code = err.code, error = %err, "request rejected");
        }
        Self {
            status,
            body: ErrorResponse::from_pipeline(&err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Sends progress into a bounded channel from a blocking worker thread.
///
/// A full channel blocks the pipeline until the response stream catches up;
/// a dropped receiver means the client is gone.
pub struct ChannelReporter {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: ProgressEvent) -> Result<(), Cancelled> {
        self.tx.blocking_send(event).map_err(|_| Cancelled)
    }
}

/// Runs blocking work off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, PipelineError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PipelineError::internal(format!("worker task failed: {}", e)))?
}

/// Reads every multipart field into memory.
async fn read_fields(mut multipart: Multipart) -> Result<Vec<FormField>, ApiError> {
    let rejected = |e: axum::extract::multipart::MultipartError| ApiError {
        status: e.status(),
        body: ErrorResponse::new("SERVE_001", format!("invalid upload: {}", e.body_text())),
    };

    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(rejected)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(rejected)?;
        fields.push(FormField {
            name,
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(fields)
}

async fn read_upload(state: &AppState, multipart: Multipart) -> Result<UploadForm, ApiError> {
    let fields = read_fields(multipart).await?;
    Ok(UploadForm::from_fields(fields, &state.config.transform)?)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// `POST /preview`: renders the transformed melody and stores the WAV.
pub async fn preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PreviewResponse>, ApiError> {
    let form = read_upload(&state, multipart).await?;
    let permit = state
        .jobs
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| PipelineError::internal("job limiter closed"))?;

    let (pipeline, store) = (state.pipeline.clone(), state.store.clone());
    let response = run_blocking(move || {
        let _permit = permit;
        let input = AudioInput::new(&form.audio, form.hint.as_deref());
        let previewed = pipeline.preview(input, &form.params, &NoopReporter)?;
        let file_id = store.new_file_id(&form.audio, &form.params);
        store
            .save_preview(&file_id, &previewed.wav)
            .map_err(PipelineError::from_backend)?;

        Ok(PreviewResponse {
            success: true,
            audio_url: format!("/preview-audio/{}", file_id),
            file_id,
            notes: previewed.sequence.len(),
            duration: previewed.duration_seconds,
            sample_rate: previewed.sample_rate,
            message: format!(
                "preview of {} notes, {:.1}s",
                previewed.sequence.len(),
                previewed.duration_seconds
            ),
        })
    })
    .await?;

    info!(file_id = %response.file_id, notes = response.notes, "preview ready");
    Ok(Json(response))
}

/// `GET /preview-audio/{file_id}`.
pub async fn preview_audio(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let store = state.store.clone();
    let wav = run_blocking(move || store.open_preview(&file_id).map_err(PipelineError::from_backend))
        .await?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav).into_response())
}

/// `POST /generate`: streams progress events, ending with the terminal event.
///
/// Request errors are reported as a plain JSON error before the stream
/// starts; pipeline errors arrive as the terminal `Failed` event.
pub async fn generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_upload(&state, multipart).await?;
    let name = form
        .name
        .clone()
        .unwrap_or_else(|| state.config.output.name.clone());

    let (tx, rx) = mpsc::channel::<ProgressEvent>(PROGRESS_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let Ok(permit) = state.jobs.clone().acquire_owned().await else {
            let _ = tx.send(ProgressEvent::failed("internal error")).await;
            return;
        };
        let (pipeline, store) = (state.pipeline.clone(), state.store.clone());
        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let reporter = ChannelReporter::new(tx);
            let input = AudioInput::new(&form.audio, form.hint.as_deref());
            pipeline.generate_and_store(&store, input, &name, &form.params, &reporter)
        })
        .await;

        match result {
            Ok(Ok(meta)) => info!(file_id = %meta.file_id, notes = meta.stats.notes, "generation complete"),
            Ok(Err(e)) if e.kind == ErrorKind::Cancelled => warn!("generation cancelled by client"),
            Ok(Err(_)) => {}
            Err(e) => error!(error = %e, "generation worker panicked"),
        }
    });

    let events = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok::<_, Infallible>(event.to_line()), rx))
    });

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(events),
    )
        .into_response())
}

/// `GET /download/{file_id}?format=`.
pub async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        Some(raw) => raw.parse::<SchematicFormat>().map_err(PipelineError::from)?,
        None => SchematicFormat::Litematic,
    };

    let store = state.store.clone();
    let download = run_blocking(move || {
        store
            .open_file(&file_id, format)
            .map_err(PipelineError::from_backend)
    })
    .await?;

    let disposition = format!("attachment; filename=\"{}\"", download.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response())
}

/// `GET /list`.
pub async fn list(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let store = state.store.clone();
    let files = run_blocking(move || store.list().map_err(PipelineError::from_backend)).await?;
    Ok(Json(ListResponse {
        success: true,
        files,
    }))
}

/// `POST /cleanup`: applies the retention policy now.
pub async fn cleanup(State(state): State<AppState>) -> Result<Json<CleanupResponse>, ApiError> {
    let store = state.store.clone();
    let retention = state.config.retention();
    let report =
        run_blocking(move || store.cleanup(retention).map_err(PipelineError::from_backend)).await?;
    Ok(Json(report.into()))
}
