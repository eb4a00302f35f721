//! HTTP front door of the server.
//!
//! `/status` upgrades to a WebSocket quote stream, `/stock` serves the
//! dashboard file and every other path is a 404. Connections are handled as
//! tasks on the tokio runtime, so a client that stalls during its request or
//! handshake holds nothing but its own task.
use crate::model::coordinator::CoordinatorHandle;
use crate::stream::stream_quotes;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use log::{info, warn};
use quote_common::Result;
use quote_common::net::{STATUS_PATH, STOCK_PATH};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeFile;
use tower_http::timeout::TimeoutLayer;

/// Longest a plain HTTP request may take to produce its response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// What every request handler needs.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Where new subscribers are registered.
    pub coordinator: CoordinatorHandle,
    /// Capacity of each subscriber queue.
    pub queue_capacity: usize,
}

/// Routes of the server, with `index` served on `/stock`.
pub fn router(state: AppState, index: PathBuf) -> Router {
    Router::new()
        .route(STATUS_PATH, get(status_handler))
        .route_service(STOCK_PATH, ServeFile::new(index))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

/// Serve `app` on `listener` until the process ends.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    info!("HTTP/WebSocket server is started on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn status_handler(
    upgrade: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    match upgrade {
        Ok(ws) => ws
            .on_upgrade(move |socket| stream_quotes(socket, state.coordinator, state.queue_capacity))
            .into_response(),
        Err(rejection) => {
            warn!("Rejected {} request without WebSocket upgrade: {}", STATUS_PATH, rejection);
            rejection.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::coordinator::BroadcastCoordinator;
    use crate::model::quote_generator::QuoteGenerator;
    use crate::model::subscriber::OverflowPolicy;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use crossbeam_channel::{Sender, unbounded};
    use quote_common::QuoteBatch;
    use quote_common::quote::batch_from_json;
    use std::io::{ErrorKind, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Instant;
    use tower::ServiceExt;
    use tungstenite::Message;

    fn app(index: PathBuf) -> (Router, Sender<QuoteBatch>) {
        let (batch_tx, batch_rx) = unbounded::<QuoteBatch>();
        let coordinator = BroadcastCoordinator::new(OverflowPolicy::DropOldest).spawn(batch_rx);
        let state = AppState {
            coordinator,
            queue_capacity: 1,
        };
        (router(state, index), batch_tx)
    }

    async fn start_server() -> (SocketAddr, Sender<QuoteBatch>) {
        let (app, batches) = app(PathBuf::from("unused.html"));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, app));
        (addr, batches)
    }

    fn get_request(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    /// Connect to `/status` and keep feeding `expected` until one frame arrives.
    fn receive_one_batch(addr: SocketAddr, batches: &Sender<QuoteBatch>, expected: &QuoteBatch) -> String {
        let stream = TcpStream::connect(addr).unwrap();
        let (mut socket, _response) =
            tungstenite::client(format!("ws://{}{}", addr, STATUS_PATH), stream).unwrap();
        socket
            .get_ref()
            .set_read_timeout(Some(Duration::from_millis(50)))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let text = loop {
            assert!(Instant::now() < deadline, "no batch received");
            // Registration happens on the server side; keep feeding until it lands.
            batches.send(expected.clone()).unwrap();
            match socket.read() {
                Ok(Message::Text(text)) => break text,
                Ok(_) => {}
                Err(tungstenite::Error::Io(e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) => panic!("read failed: {e}"),
            }
        };
        let _ = socket.close(None);
        text
    }

    #[tokio::test]
    async fn serves_dashboard_on_stock() {
        let dir = std::env::temp_dir().join(format!("quote_server_page_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let index = dir.join("index.html");
        std::fs::write(&index, "<html>quotes</html>").unwrap();
        let (app, _batches) = app(index);

        let response = app.oneshot(get_request(STOCK_PATH)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"), "{content_type}");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<html>quotes</html>");
    }

    #[tokio::test]
    async fn unknown_path_and_missing_file_are_not_found() {
        let (app, _batches) = app(PathBuf::from("does/not/exist.html"));

        let unknown = app.clone().oneshot(get_request("/nope")).await.unwrap();
        let missing = app.oneshot(get_request(STOCK_PATH)).await.unwrap();

        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_without_upgrade_is_rejected() {
        let (app, _batches) = app(PathBuf::from("unused.html"));

        let response = app.oneshot(get_request(STATUS_PATH)).await.unwrap();

        assert!(response.status().is_client_error(), "{}", response.status());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn websocket_client_receives_batches() {
        let (addr, batches) = start_server().await;
        let expected = QuoteGenerator::seeded(21).generate();

        let text = tokio::task::spawn_blocking({
            let expected = expected.clone();
            move || receive_one_batch(addr, &batches, &expected)
        })
        .await
        .unwrap();

        assert_eq!(batch_from_json(&text).unwrap(), expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stalled_handshake_does_not_block_other_clients() {
        let (addr, batches) = start_server().await;
        let expected = QuoteGenerator::seeded(22).generate();

        let text = tokio::task::spawn_blocking({
            let expected = expected.clone();
            move || {
                // Half a request line, never finished.
                let mut stalled = TcpStream::connect(addr).unwrap();
                stalled.write_all(b"GET /status HTTP/1.1\r\nHost: lo").unwrap();
                let text = receive_one_batch(addr, &batches, &expected);
                drop(stalled);
                text
            }
        })
        .await
        .unwrap();

        assert_eq!(batch_from_json(&text).unwrap(), expected);
    }
}
