use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{Semaphore, watch};
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::http::connection::Connection;
use crate::session::SessionRegistry;

/// Accepts connections until `shutdown` flips to `true`.
///
/// Each connection runs in its own task, which waits for a permit from
/// `pool` before touching the socket; at most `pool`-many connections are
/// served at once. Accept errors are logged and the loop keeps going.
pub async fn accept_loop(
    listener: TcpListener,
    pool: Arc<Semaphore>,
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => accepted,
        };

        let (socket, peer) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to accept connection");
                continue;
            }
        };
        tracing::debug!(%peer, "Accepted connection");

        let pool = Arc::clone(&pool);
        let dispatcher = Arc::clone(&dispatcher);
        let sessions = Arc::clone(&sessions);
        tokio::spawn(async move {
            let Ok(_permit) = pool.acquire_owned().await else {
                return;
            };
            let mut conn = Connection::new(socket, peer, dispatcher, sessions);
            if let Err(e) = conn.run().await {
                tracing::error!(%peer, "Connection error: {:#}", e);
            }
        });
    }

    info!("Accept loop stopped");
}

/// Periodically drops expired sessions until `shutdown` flips to `true`.
pub async fn sweep_loop(
    sessions: Arc<SessionRegistry>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let removed = sessions.sweep().await;
                if removed > 0 {
                    info!(removed, "Expired sessions swept");
                }
            }
        }
    }
}
