use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::dispatch::{DispatchError, Dispatcher};
use crate::http::context::ResponseContext;
use crate::http::parser::{ParseError, parse_request, read_request_head};
use crate::http::request::Request;
use crate::http::response::StatusCode;
use crate::http::writer::serialize_error;
use crate::session::SessionRegistry;

/// One accepted client connection, served exactly once and then closed.
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: Option<BufWriter<OwnedWriteHalf>>,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionRegistry>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Dispatching(Request),
    Closed,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        dispatcher: Arc<Dispatcher>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: Some(BufWriter::new(write_half)),
            peer,
            dispatcher,
            sessions,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await {
                        Ok(Some(req)) => ConnectionState::Dispatching(req),
                        Ok(None) => {
                            tracing::debug!(peer = %self.peer, "Connection closed without a request");
                            ConnectionState::Closed
                        }
                        Err(e) => {
                            tracing::info!(peer = %self.peer, error = %e, "Rejecting malformed request");
                            self.reject(StatusCode::BadRequest).await?;
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Dispatching(req) => {
                    self.serve(req).await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> Result<Option<Request>, ParseError> {
        let Some(lines) = read_request_head(&mut self.reader).await? else {
            return Ok(None);
        };
        parse_request(&lines).map(Some)
    }

    /// Writes a bare error response straight to the socket.
    async fn reject(&mut self, status: StatusCode) -> anyhow::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.write_all(&serialize_error(status)).await?;
            writer.flush().await?;
            writer.shutdown().await?;
        }
        Ok(())
    }

    async fn serve(&mut self, req: Request) -> anyhow::Result<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };

        let resolved = self
            .sessions
            .resolve(req.headers_named("Cookie"), req.host())
            .await;

        tracing::info!(
            peer = %self.peer,
            method = req.method.as_str(),
            path = %req.path,
            sid = resolved.session.id(),
            new_session = resolved.is_new(),
            "Request"
        );

        let mut ctx = ResponseContext::new(
            Box::new(writer),
            req.query_parameters,
            resolved.session.attributes(),
            resolved.cookie.into_iter().collect(),
        )
        .with_dispatcher(Arc::clone(&self.dispatcher));

        match self.dispatcher.dispatch(&mut ctx, &req.path, true).await {
            Ok(()) => {}
            Err(DispatchError::NotFound) => {
                tracing::debug!(peer = %self.peer, path = %req.path, "Not found");
                if !ctx.is_header_committed() {
                    ctx.send_error(StatusCode::NotFound).await?;
                }
            }
            Err(DispatchError::Failed(e)) => {
                return Err(e.context(format!("{} {} failed", req.method.as_str(), req.path)));
            }
        }

        ctx.finish().await?;
        Ok(())
    }
}
