use std::collections::HashMap;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::request::{Method, Request, SUPPORTED_VERSIONS};

const CR: u8 = b'\r';
const LF: u8 = b'\n';

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("empty request")]
    EmptyRequest,
    #[error("connection closed before end of request head")]
    Incomplete,
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(String),
    #[error("request head exceeds {} bytes", MAX_HEAD_BYTES)]
    HeadTooLarge,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Position inside a possible head terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    SawCr,
    SawCrLf,
    SawCrLfCr,
    /// A bare LF, for clients that never send CR
    SawLf,
}

/// Byte state machine that accumulates a request head until `CRLFCRLF` or
/// `LFLF`. CR bytes are dropped, everything else is kept.
#[derive(Debug)]
pub struct HeadScanner {
    state: ScanState,
    buffer: BytesMut,
}

impl Default for HeadScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Scanning,
            buffer: BytesMut::with_capacity(1024),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Feeds one byte. Returns `true` once the terminator is complete.
    pub fn feed(&mut self, byte: u8) -> bool {
        if byte != CR {
            self.buffer.extend_from_slice(&[byte]);
        }

        let (next, done) = match (self.state, byte) {
            (ScanState::Scanning, CR) => (ScanState::SawCr, false),
            (ScanState::Scanning, LF) => (ScanState::SawLf, false),
            (ScanState::SawCr, LF) => (ScanState::SawCrLf, false),
            (ScanState::SawCrLf, CR) => (ScanState::SawCrLfCr, false),
            (ScanState::SawCrLfCr, LF) => (ScanState::Scanning, true),
            (ScanState::SawLf, LF) => (ScanState::Scanning, true),
            _ => (ScanState::Scanning, false),
        };

        self.state = next;
        done
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Splits the accumulated head into lines, dropping trailing blank ones.
    pub fn into_lines(self) -> Vec<String> {
        let text = String::from_utf8_lossy(&self.buffer);
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines
    }
}

/// Upper bound on the raw bytes of one request head.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Reads exactly one request head from `reader`.
///
/// Returns `Ok(None)` if the stream closes before a single byte arrives.
/// Heads longer than [`MAX_HEAD_BYTES`] fail with `HeadTooLarge`.
pub async fn read_request_head<R>(reader: &mut R) -> Result<Option<Vec<String>>, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut scanner = HeadScanner::new();
    let mut seen = 0usize;
    let mut chunk = [0u8; 1];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            if seen == 0 {
                return Ok(None);
            }
            return Err(ParseError::Incomplete);
        }

        seen += 1;
        if seen > MAX_HEAD_BYTES {
            return Err(ParseError::HeadTooLarge);
        }
        if scanner.feed(chunk[0]) {
            return Ok(Some(scanner.into_lines()));
        }
    }
}

/// Builds a `Request` from the lines of a head.
pub fn parse_request(lines: &[String]) -> Result<Request, ParseError> {
    let first = lines.first().ok_or(ParseError::EmptyRequest)?;
    if first.is_empty() {
        return Err(ParseError::EmptyRequest);
    }

    let parts: Vec<&str> = first.split(' ').collect();
    let [method_str, target, version] = parts.as_slice() else {
        return Err(ParseError::MalformedRequestLine(first.clone()));
    };

    let method = Method::from_str(method_str)
        .ok_or_else(|| ParseError::UnsupportedMethod(method_str.to_string()))?;

    if !SUPPORTED_VERSIONS.contains(version) {
        return Err(ParseError::UnsupportedVersion(version.to_string()));
    }

    if target.is_empty() {
        return Err(ParseError::MalformedRequestLine(first.clone()));
    }

    let (path, query_parameters) = parse_target(target);

    let headers = lines[1..]
        .iter()
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    Ok(Request {
        method,
        version: version.to_string(),
        path,
        query_parameters,
        headers,
    })
}

/// Splits a request target into its path and decoded query parameters.
///
/// Pairs without `=` are dropped.
pub fn parse_target(target: &str) -> (String, HashMap<String, String>) {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    let mut params = HashMap::new();
    for pair in query.unwrap_or("").split('&') {
        if !pair.contains('=') {
            continue;
        }
        if let Some((key, value)) = url::form_urlencoded::parse(pair.as_bytes()).next() {
            params.insert(key.into_owned(), value.into_owned());
        }
    }

    (path.to_string(), params)
}
