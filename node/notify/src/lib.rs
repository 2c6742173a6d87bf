use axum::{extract::State, http::StatusCode, routing::post, Router};
use std::time::Duration;
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::trace::TraceLayer;

/// Grace period given to in-flight requests when the receiver is asked to stop.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(1);

#[derive(Clone)]
struct AppState {
    inbound: mpsc::Sender<[String; 4]>,
}

/// Runs the HTTP endpoint the upstream execution node POSTs new work to, until
/// `shutdown` resolves. Accepts only POST of a JSON array of four hex strings;
/// anything else is rejected with a response but never crashes the receiver.
pub async fn serve(
    listen: std::net::SocketAddr,
    inbound: mpsc::Sender<[String; 4]>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let state = AppState { inbound };
    let app = Router::new().route("/", post(handle_notify)).layer(TraceLayer::new_for_http()).with_state(state);

    let listener = TcpListener::bind(listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tokio::time::sleep(SHUTDOWN_GRACE_PERIOD).await;
        })
        .await
}

async fn handle_notify(State(state): State<AppState>, body: String) -> StatusCode {
    match serde_json::from_str::<[String; 4]>(&body) {
        Ok(tuple) => {
            tracing::debug!(header = %tuple[0], block = %tuple[3], "received work notification");
            let _ = state.inbound.try_send(tuple);
            StatusCode::OK
        }
        Err(error) => {
            tracing::warn!(%error, "discarding malformed work notification");
            StatusCode::BAD_REQUEST
        }
    }
}
