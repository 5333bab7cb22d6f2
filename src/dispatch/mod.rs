//! Request path resolution.
//!
//! The [`Dispatcher`] turns a path into a worker call, a script run or a
//! static file, in that order of precedence:
//!
//! ```text
//!   path ──► private prefix? (external calls only) ──► not found
//!     │
//!     ├──► registered worker ("/hello")           ──► Worker::handle
//!     ├──► extension prefix ("/ext/EchoParams")   ──► fresh worker from catalog
//!     └──► document root
//!            ├── escapes the root / missing / not a file ──► not found
//!            ├── script extension ──► ScriptExecutor::execute
//!            └── anything else    ──► streamed bytes, mime from the table
//! ```
//!
//! Every not-found cause produces the same [`DispatchError::NotFound`], so a
//! client cannot tell a root escape from a missing file.

pub mod script;
pub mod worker;

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;

use crate::config::DispatchConfig;
use crate::http::context::{ContextError, ResponseContext};
use crate::http::mime::MimeTable;

pub use script::{ScriptExecutor, TemplateExecutor};
pub use worker::{Worker, WorkerCatalog, WorkerFactory, WorkerFuture};

const STREAM_CHUNK: usize = 8192;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("resource not found")]
    NotFound,
    #[error("request processing failed: {0:#}")]
    Failed(#[from] anyhow::Error),
}

impl DispatchError {
    /// Classifies a worker or script failure. A not-found raised by an
    /// internal redispatch anywhere down the cause chain stays a not-found.
    fn from_handler(e: anyhow::Error) -> Self {
        let not_found = e
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<DispatchError>(), Some(DispatchError::NotFound)));
        if not_found {
            DispatchError::NotFound
        } else {
            DispatchError::Failed(e)
        }
    }
}

impl From<ContextError> for DispatchError {
    fn from(e: ContextError) -> Self {
        DispatchError::Failed(e.into())
    }
}

type DispatchFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + 'a>>;

pub struct Dispatcher {
    document_root: PathBuf,
    workers: HashMap<String, Arc<dyn Worker>>,
    catalog: WorkerCatalog,
    extension_prefix: String,
    private_prefix: String,
    script_extension: String,
    mime_types: MimeTable,
    scripts: Arc<dyn ScriptExecutor>,
}

impl Dispatcher {
    /// Builds a dispatcher from configuration.
    ///
    /// The document root must exist. Every configured worker must name an
    /// implementation known to `catalog`.
    pub fn new(
        config: &DispatchConfig,
        catalog: WorkerCatalog,
        scripts: Arc<dyn ScriptExecutor>,
    ) -> anyhow::Result<Self> {
        let document_root = std::fs::canonicalize(&config.document_root).with_context(|| {
            format!(
                "Document root {} is not accessible",
                config.document_root.display()
            )
        })?;

        if !document_root.is_dir() {
            anyhow::bail!("Document root {} is not a directory", document_root.display());
        }

        let mut workers: HashMap<String, Arc<dyn Worker>> = HashMap::new();
        for (path, name) in &config.workers {
            let worker = catalog
                .create(name)
                .with_context(|| format!("Unknown worker implementation {name:?} for {path}"))?;
            workers.insert(path.clone(), Arc::from(worker));
        }

        tracing::info!(
            root = %document_root.display(),
            workers = workers.len(),
            "Dispatcher ready"
        );

        Ok(Self {
            document_root,
            workers,
            catalog,
            extension_prefix: config.extension_prefix.clone(),
            private_prefix: config.private_prefix.clone(),
            script_extension: config.script_extension.to_ascii_lowercase(),
            mime_types: MimeTable::new(&config.mime_types),
            scripts,
        })
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    /// Resolves `path` and produces the response into `ctx`.
    ///
    /// `external` is `true` for the client-triggered call and `false` for a
    /// redispatch made by a worker or script; only external calls are kept
    /// out of the private subtree.
    pub fn dispatch<'a>(
        &'a self,
        ctx: &'a mut ResponseContext,
        path: &'a str,
        external: bool,
    ) -> DispatchFuture<'a> {
        Box::pin(async move {
            if external && self.is_private(path) {
                tracing::debug!(path, "Private path requested externally");
                return Err(DispatchError::NotFound);
            }

            if let Some(worker) = self.workers.get(path) {
                tracing::debug!(path, "Dispatching to registered worker");
                return worker.handle(ctx).await.map_err(DispatchError::from_handler);
            }

            if let Some(name) = path.strip_prefix(self.extension_prefix.as_str()) {
                let Some(worker) = self.catalog.create(name) else {
                    tracing::debug!(path, name, "No such worker implementation");
                    return Err(DispatchError::NotFound);
                };
                tracing::debug!(path, name, "Dispatching to extension worker");
                return worker.handle(ctx).await.map_err(DispatchError::from_handler);
            }

            let file = self.resolve_file(path, external).await?;

            if self.is_script(&file) {
                let source = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("Failed to read script {}", file.display()))?;
                tracing::debug!(path, "Executing script");
                return self
                    .scripts
                    .execute(&source, ctx)
                    .await
                    .map_err(DispatchError::from_handler);
            }

            self.stream_file(&file, ctx).await
        })
    }

    /// Maps `path` to a regular file inside the document root.
    pub async fn resolve_file(&self, path: &str, external: bool) -> Result<PathBuf, DispatchError> {
        let relative = path.trim_start_matches('/');
        let candidate = self.document_root.join(relative);

        let mut target = self.contained(&candidate).await?;

        if tokio::fs::metadata(&target)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            target = self.contained(&target.join("index.html")).await?;
        }

        if external && self.private_root().is_some_and(|private| target.starts_with(private)) {
            tracing::debug!(path, "Private file requested externally");
            return Err(DispatchError::NotFound);
        }

        match tokio::fs::metadata(&target).await {
            Ok(meta) if meta.is_file() => Ok(target),
            _ => Err(DispatchError::NotFound),
        }
    }

    /// Canonicalizes `candidate` and checks it still lies under the root.
    async fn contained(&self, candidate: &Path) -> Result<PathBuf, DispatchError> {
        let Ok(target) = tokio::fs::canonicalize(candidate).await else {
            return Err(DispatchError::NotFound);
        };

        if !target.starts_with(&self.document_root) {
            tracing::warn!(
                requested = %candidate.display(),
                "Path escapes the document root"
            );
            return Err(DispatchError::NotFound);
        }

        Ok(target)
    }

    fn is_private(&self, path: &str) -> bool {
        let prefix = self.private_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return false;
        }
        path == prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    fn private_root(&self) -> Option<PathBuf> {
        let relative = self.private_prefix.trim_matches('/');
        if relative.is_empty() {
            return None;
        }
        Some(self.document_root.join(relative))
    }

    fn is_script(&self, file: &Path) -> bool {
        file.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.script_extension))
    }

    async fn stream_file(&self, file: &Path, ctx: &mut ResponseContext) -> Result<(), DispatchError> {
        let mut handle = match tokio::fs::File::open(file).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::debug!(file = %file.display(), error = %e, "Unreadable file");
                return Err(DispatchError::NotFound);
            }
        };

        ctx.set_mime_type(self.mime_types.lookup(file))?;

        let mut buf = vec![0u8; STREAM_CHUNK];
        let mut sent_any = false;
        loop {
            let n = handle
                .read(&mut buf)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            if n == 0 {
                break;
            }
            ctx.write(&buf[..n]).await?;
            sent_any = true;
        }

        if !sent_any {
            ctx.commit().await?;
        }

        Ok(())
    }
}
