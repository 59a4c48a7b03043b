//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a live browse connection.
//! Each connection owns one `BrowseSession` and pushes fresh results whenever
//! the visitor changes the tab, a filter, or the page.

use crate::web::{
    debounce::Debouncer,
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, BrowseSession, Refresh},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::Utc;
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New browse connection established.");

    // The sender is shared with debounced tasks, so it lives behind an Arc<Mutex<>>.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));
    let session_lock = Arc::new(Mutex::new(BrowseSession::default()));
    let mut debouncer = Debouncer::new(app_state.config.search_debounce);

    // --- 1. Initial results ---
    if !send_results(&app_state, &session_lock, &ws_sender, None).await {
        error!("Failed to send initial results.");
        return;
    }

    // --- 2. Main Message Loop ---
    loop {
        if let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_text_message(
                        text.as_str(),
                        &app_state,
                        &session_lock,
                        &ws_sender,
                        &mut debouncer,
                    )
                    .await;
                }
                Message::Close(_) => {
                    info!("Client sent close message.");
                    break;
                }
                _ => {}
            }
        } else {
            info!("Client disconnected.");
            break;
        }
    }

    // --- 3. Cleanup ---
    debouncer.cancel();
    info!("Browse connection closed.");
}

/// Applies one client message to the session and refreshes the results.
async fn handle_text_message(
    text: &str,
    app_state: &Arc<AppState>,
    session_lock: &Arc<Mutex<BrowseSession>>,
    ws_sender: &WsSender,
    debouncer: &mut Debouncer,
) {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            let err_msg = ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            };
            send(ws_sender, &err_msg).await;
            return;
        }
    };

    debug!("Applying client message: {:?}", client_msg);
    // A newer change always supersedes a pending search refresh.
    debouncer.cancel();
    let (refresh, revision) = {
        let mut session = session_lock.lock().await;
        let refresh = session.apply(client_msg);
        (refresh, session.revision)
    };

    match refresh {
        Refresh::Immediate => {
            if !send_results(app_state, session_lock, ws_sender, None).await {
                error!("Failed to send results.");
            }
        }
        Refresh::Debounced => {
            let app_state = app_state.clone();
            let session_lock = session_lock.clone();
            let ws_sender = ws_sender.clone();
            debouncer.schedule(async move {
                if !send_results(&app_state, &session_lock, &ws_sender, Some(revision)).await {
                    error!("Failed to send debounced results.");
                }
            });
        }
    }
}

/// Computes results from the session as it is now and sends them.
///
/// With `revision`, nothing is sent if a later change has been applied. The
/// session stays locked until the send completes, so a newer change cannot
/// overtake it.
async fn send_results(
    app_state: &AppState,
    session_lock: &Mutex<BrowseSession>,
    ws_sender: &WsSender,
    revision: Option<u64>,
) -> bool {
    let mut session = session_lock.lock().await;
    let now = Utc::now();
    let results = match revision {
        Some(revision) => match session.results_if_current(revision, &app_state.catalog, now) {
            Some(results) => results,
            None => {
                debug!("Dropping results for superseded revision {}.", revision);
                return true;
            }
        },
        None => session.results(&app_state.catalog, now),
    };
    send(ws_sender, &results).await
}

async fn send(ws_sender: &WsSender, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {:?}", e);
            return false;
        }
    };
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_ok()
}
