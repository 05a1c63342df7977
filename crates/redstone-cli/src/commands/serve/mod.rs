//! HTTP service for browser front-ends.
//!
//! ## Routes
//!
//! - `POST /preview`: multipart upload, returns JSON with an `audio_url`
//! - `GET /preview-audio/{file_id}`: the rendered preview WAV
//! - `POST /generate`: multipart upload, streams progress events
//! - `GET /download/{file_id}?format=litematic|schematic`
//! - `GET /list`, `POST /cleanup`, `GET /health`
//!
//! ## Progress stream
//!
//! `/generate` answers with a body of `data: <json>\n\n` frames:
//!
//! ```text
//! data: {"progress":5,"message":"reading audio"}
//! ...
//! data: {"complete":true,"success":true,"stats":{...},"projection":{...},"file_id":"..."}
//! ```
//!
//! Uploads carry the audio in the `audio` field and the transform parameters
//! in `pitch`, `octave`, `speed`, `density`, `max_notes` and `auto_tune`.

mod handler;
mod types;


use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::RedstoneConfig;
use crate::store::ResultStore;

pub use handler::{router, status_for, AppState, ChannelReporter, PROGRESS_CHANNEL_CAPACITY};
pub use types::{ErrorResponse, FormField, UploadForm};

/// How often the retention policy runs in the background.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Run the HTTP service until Ctrl-C.
///
/// # Returns
/// Exit code: 0 on clean shutdown, 1 on error
pub fn run(config: RedstoneConfig) -> Result<ExitCode> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(async move {
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        serve(listener, config, shutdown_signal()).await?;
        Ok(ExitCode::SUCCESS)
    })
}

/// Serves on `listener` until `shutdown` resolves, then drains open requests.
pub async fn serve<F>(listener: TcpListener, config: RedstoneConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = ResultStore::open(&config.server.store_dir).with_context(|| {
        format!(
            "Failed to open result store at {}",
            config.server.store_dir.display()
        )
    })?;
    let state = AppState::new(config, store).context("Invalid service configuration")?;

    let addr = listener.local_addr().context("Listener has no address")?;
    info!(
        %addr,
        store = %state.store.root().display(),
        max_jobs = state.config.server.max_concurrent_jobs,
        "listening"
    );
    eprintln!("Redstone Music server listening on http://{}", addr);
    eprintln!("Press Ctrl+C to shutdown");

    let janitor = tokio::spawn(run_cleanup(state.clone()));

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    janitor.abort();
    info!("server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => eprintln!("\nShutting down..."),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await
        }
    }
}

/// Applies the retention policy every [`CLEANUP_INTERVAL`].
async fn run_cleanup(state: AppState) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
    loop {
        interval.tick().await;
        let store = state.store.clone();
        let retention = state.config.retention();
        match tokio::task::spawn_blocking(move || store.cleanup(retention)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(error = %e, "scheduled cleanup failed"),
            Err(e) => warn!(error = %e, "scheduled cleanup panicked"),
        }
    }
}
