//! Server lifecycle.
//!
//! A [`Server`] owns the listening socket, the connection pool and the
//! session registry. It moves between two states:
//!
//! ```text
//!   stopped ──start()──► running ──stop()──► stopped
//! ```
//!
//! Both transitions are idempotent.

pub mod listener;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, Semaphore, watch};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::dispatch::{Dispatcher, TemplateExecutor, WorkerCatalog};
use crate::session::SessionRegistry;
use crate::workers::builtin_catalog;

pub struct Server {
    config: Config,
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionRegistry>,
    running: Mutex<Option<Running>>,
}

struct Running {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
    sweep_task: JoinHandle<()>,
}

impl Server {
    /// Builds a server with the built-in workers.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_catalog(config, builtin_catalog())
    }

    pub fn with_catalog(config: Config, catalog: WorkerCatalog) -> anyhow::Result<Self> {
        config.validate()?;
        let dispatcher = Dispatcher::new(&config.dispatch, catalog, Arc::new(TemplateExecutor))?;
        let sessions = SessionRegistry::new(config.session.timeout(), config.server.domain.clone());

        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
            sessions: Arc::new(sessions),
            running: Mutex::new(None),
        })
    }

    /// Binds the listener and starts the accept loop and session sweeper.
    ///
    /// Returns the bound address. Calling it on a running server returns the
    /// existing address without doing anything else.
    pub async fn start(&self) -> anyhow::Result<SocketAddr> {
        let mut running = self.running.lock().await;
        if let Some(state) = running.as_ref() {
            return Ok(state.local_addr);
        }

        let listener = TcpListener::bind(&self.config.server.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.server.listen_addr))?;
        let local_addr = listener.local_addr()?;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let pool = Arc::new(Semaphore::new(self.config.server.pool_size));

        let accept_task = tokio::spawn(listener::accept_loop(
            listener,
            pool,
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.sessions),
            shutdown_rx.clone(),
        ));
        let sweep_task = tokio::spawn(listener::sweep_loop(
            Arc::clone(&self.sessions),
            self.config.session.sweep_interval(),
            shutdown_rx,
        ));

        tracing::info!(
            addr = %local_addr,
            pool_size = self.config.server.pool_size,
            "Listening"
        );

        *running = Some(Running {
            local_addr,
            shutdown,
            accept_task,
            sweep_task,
        });

        Ok(local_addr)
    }

    /// Stops accepting connections and the sweeper. Connections already
    /// being served run to completion.
    pub async fn stop(&self) {
        let Some(state) = self.running.lock().await.take() else {
            return;
        };

        let _ = state.shutdown.send(true);
        if let Err(e) = state.accept_task.await {
            tracing::warn!(error = %e, "Accept loop ended abnormally");
        }
        if let Err(e) = state.sweep_task.await {
            tracing::warn!(error = %e, "Session sweeper ended abnormally");
        }

        tracing::info!(addr = %state.local_addr, "Server stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|state| state.local_addr)
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
