use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::dispatch::{DispatchError, Dispatcher};
use crate::http::cookie::Cookie;
use crate::http::response::StatusCode;
use crate::http::writer::{HeadParts, serialize_error, serialize_head};
use crate::session::SharedAttributes;

/// Output sink of one response, usually the write half of a socket.
pub type Output = Box<dyn AsyncWrite + Send + Sync + Unpin>;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("response header already committed")]
    HeaderCommitted,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-request response state.
///
/// Status, mime type, encoding and cookies can be changed until the header
/// block is committed, which happens explicitly through [`commit`] or on the
/// first body write. After that every header mutator fails with
/// [`ContextError::HeaderCommitted`].
///
/// Parameters come in three scopes:
/// - request parameters from the query string (read-only),
/// - persistent parameters backed by the session attribute map,
/// - temporary parameters that live only as long as this context.
///
/// [`commit`]: ResponseContext::commit
pub struct ResponseContext {
    output: Output,
    status_code: u16,
    status_text: String,
    mime_type: String,
    encoding: String,
    cookies: Vec<Cookie>,
    header_committed: bool,
    parameters: HashMap<String, String>,
    persistent_parameters: SharedAttributes,
    temporary_parameters: HashMap<String, String>,
    dispatcher: Option<Arc<Dispatcher>>,
}

impl ResponseContext {
    pub fn new(
        output: Output,
        parameters: HashMap<String, String>,
        persistent_parameters: SharedAttributes,
        cookies: Vec<Cookie>,
    ) -> Self {
        Self {
            output,
            status_code: StatusCode::Ok.as_u16(),
            status_text: StatusCode::Ok.reason_phrase().to_string(),
            mime_type: "text/html".to_string(),
            encoding: "UTF-8".to_string(),
            cookies,
            header_committed: false,
            parameters,
            persistent_parameters,
            temporary_parameters: HashMap::new(),
            dispatcher: None,
        }
    }

    /// Enables [`dispatch`](ResponseContext::dispatch) through `dispatcher`.
    pub fn with_dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    fn ensure_uncommitted(&self) -> Result<(), ContextError> {
        if self.header_committed {
            return Err(ContextError::HeaderCommitted);
        }
        Ok(())
    }

    pub fn set_status_code(&mut self, code: u16) -> Result<(), ContextError> {
        self.ensure_uncommitted()?;
        self.status_code = code;
        Ok(())
    }

    pub fn set_status_text(&mut self, text: impl Into<String>) -> Result<(), ContextError> {
        self.ensure_uncommitted()?;
        self.status_text = text.into();
        Ok(())
    }

    pub fn set_status(&mut self, status: StatusCode) -> Result<(), ContextError> {
        self.set_status_code(status.as_u16())?;
        self.set_status_text(status.reason_phrase())
    }

    pub fn set_mime_type(&mut self, mime_type: impl Into<String>) -> Result<(), ContextError> {
        self.ensure_uncommitted()?;
        self.mime_type = mime_type.into();
        Ok(())
    }

    pub fn set_encoding(&mut self, encoding: impl Into<String>) -> Result<(), ContextError> {
        self.ensure_uncommitted()?;
        self.encoding = encoding.into();
        Ok(())
    }

    pub fn add_cookie(&mut self, cookie: Cookie) -> Result<(), ContextError> {
        self.ensure_uncommitted()?;
        self.cookies.push(cookie);
        Ok(())
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn is_header_committed(&self) -> bool {
        self.header_committed
    }

    /// Writes the header block. Does nothing if it was already written.
    pub async fn commit(&mut self) -> Result<(), ContextError> {
        if self.header_committed {
            return Ok(());
        }

        let head = serialize_head(&HeadParts {
            status_code: self.status_code,
            status_text: &self.status_text,
            mime_type: &self.mime_type,
            encoding: &self.encoding,
            cookies: &self.cookies,
        });

        // Flag first: a failed write must not let a second header through
        self.header_committed = true;
        self.output.write_all(&head).await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Writes body bytes, committing the header block first if needed.
    pub async fn write(&mut self, data: &[u8]) -> Result<(), ContextError> {
        self.commit().await?;
        self.output.write_all(data).await?;
        self.output.flush().await?;
        Ok(())
    }

    pub async fn write_str(&mut self, text: &str) -> Result<(), ContextError> {
        self.write(text.as_bytes()).await
    }

    /// Replaces the whole response with a short plain-text error.
    pub async fn send_error(&mut self, status: StatusCode) -> Result<(), ContextError> {
        self.ensure_uncommitted()?;
        self.header_committed = true;
        self.output.write_all(&serialize_error(status)).await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Flushes and shuts down the output.
    pub async fn finish(&mut self) -> Result<(), ContextError> {
        self.output.flush().await?;
        self.output.shutdown().await?;
        Ok(())
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.keys().cloned().collect()
    }

    pub fn temporary_parameter(&self, name: &str) -> Option<&str> {
        self.temporary_parameters.get(name).map(String::as_str)
    }

    pub fn set_temporary_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.temporary_parameters.insert(name.into(), value.into());
    }

    pub fn remove_temporary_parameter(&mut self, name: &str) -> Option<String> {
        self.temporary_parameters.remove(name)
    }

    pub fn temporary_parameter_names(&self) -> Vec<String> {
        self.temporary_parameters.keys().cloned().collect()
    }

    pub async fn persistent_parameter(&self, name: &str) -> Option<String> {
        self.persistent_parameters.read().await.get(name).cloned()
    }

    pub async fn set_persistent_parameter(&self, name: impl Into<String>, value: impl Into<String>) {
        self.persistent_parameters
            .write()
            .await
            .insert(name.into(), value.into());
    }

    pub async fn remove_persistent_parameter(&self, name: &str) -> Option<String> {
        self.persistent_parameters.write().await.remove(name)
    }

    pub async fn persistent_parameter_names(&self) -> Vec<String> {
        self.persistent_parameters.read().await.keys().cloned().collect()
    }

    /// Forwards this response to another path as an internal call, so private
    /// resources are reachable.
    pub async fn dispatch(&mut self, path: &str) -> Result<(), DispatchError> {
        let dispatcher = self
            .dispatcher
            .clone()
            .ok_or_else(|| DispatchError::Failed(anyhow::anyhow!("no dispatcher attached")))?;
        dispatcher.dispatch(self, path, false).await
    }
}
