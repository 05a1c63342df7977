//! Result store and HTTP service tests.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p redstone-tests --test store_serve
//! ```

use std::cell::RefCell;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use redstone_cli::commands::serve::serve;
use redstone_cli::pipeline::AudioInput;
use redstone_cli::{Pipeline, RedstoneConfig, ResultStore};
use redstone_spec::{
    Cancelled, ErrorKind, ProgressEvent, ProgressReporter, SchematicFormat, TransformParameters,
};
use redstone_tests::{c_major_arpeggio, compute_hash};

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<ProgressEvent>>,
}

impl ProgressReporter for Recorder {
    fn report(&self, event: ProgressEvent) -> Result<(), Cancelled> {
        self.events.borrow_mut().push(event);
        Ok(())
    }
}

// ============================================================================
// Result store
// ============================================================================

#[test]
fn test_generate_store_download_cleanup() {
    let tmp = TempDir::new().unwrap();
    let store = ResultStore::open(tmp.path()).unwrap();
    let pipeline = Pipeline::new(&RedstoneConfig::default()).unwrap();
    let wav = c_major_arpeggio();
    let recorder = Recorder::default();

    let meta = pipeline
        .generate_and_store(
            &store,
            AudioInput::new(&wav, Some("wav")),
            "stored",
            &TransformParameters::default(),
            &recorder,
        )
        .unwrap();

    let events = recorder.events.into_inner();
    match events.last() {
        Some(ProgressEvent::Complete { file_id, files, .. }) => {
            assert_eq!(file_id, &meta.file_id);
            assert_eq!(files, &vec!["litematic".to_string(), "schematic".to_string()]);
        }
        other => panic!("expected completion, got {:?}", other),
    }

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "stored");
    assert_eq!(listed[0].stats.notes, 3);

    for format in SchematicFormat::ALL {
        let download = store.open_file(&meta.file_id, format).unwrap();
        assert_eq!(download.file_name, format!("stored.{}", format.extension()));
        assert_eq!(compute_hash(&download.bytes), meta.file(format).unwrap().hash);
    }

    let report = store
        .cleanup_before(chrono::Utc::now() + chrono::Duration::hours(1))
        .unwrap();
    assert_eq!(report.entries, 1);
    assert!(store.list().unwrap().is_empty());

    let err = store
        .open_file(&meta.file_id, SchematicFormat::Litematic)
        .unwrap_err();
    assert_eq!(redstone_spec::BackendError::kind(&err), ErrorKind::NotFound);
}

#[test]
fn test_file_ids_are_unique() {
    let tmp = TempDir::new().unwrap();
    let store = ResultStore::open(tmp.path()).unwrap();
    let params = TransformParameters::default();
    let a = store.new_file_id(b"same input", &params);
    let b = store.new_file_id(b"same input", &params);
    assert_ne!(a, b);
    assert_eq!(a.len(), 16);
}

// ============================================================================
// HTTP
// ============================================================================

async fn request(addr: std::net::SocketAddr, method: &str, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let head = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        method, path
    );
    stream.write_all(head.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_service_routes() {
    let tmp = TempDir::new().unwrap();
    let mut config = RedstoneConfig::default();
    config.server.store_dir = tmp.path().join("store");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, config, async move {
        let _ = stop_rx.await;
    }));

    let (status, body) = request(addr, "GET", "/health").await;
    assert_eq!(status, 200);
    assert!(body.contains("\"status\":\"ok\""), "{}", body);

    let (status, body) = request(addr, "GET", "/list").await;
    assert_eq!(status, 200);
    assert!(body.contains("\"files\":[]"), "{}", body);

    let (status, body) = request(addr, "GET", "/download/0123456789abcdef").await;
    assert_eq!(status, 404);
    assert!(body.contains("\"success\":false"), "{}", body);

    let (status, _) = request(addr, "GET", "/download/0123456789abcdef?format=zip").await;
    assert_eq!(status, 400);

    let (status, body) = request(addr, "POST", "/cleanup").await;
    assert_eq!(status, 200);
    assert!(body.contains("\"removed_entries\":0"), "{}", body);

    let (status, _) = request(addr, "GET", "/no-such-route").await;
    assert_eq!(status, 404);

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
