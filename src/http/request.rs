use std::collections::HashMap;

/// HTTP request methods.
///
/// Only the retrieval verb is served; anything else is rejected by the parser
/// before a `Request` is ever built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
}

/// Protocol versions accepted on the request line.
pub const SUPPORTED_VERSIONS: [&str; 2] = ["HTTP/1.0", "HTTP/1.1"];

impl Method {
    /// Parses an HTTP method, ignoring ASCII case.
    ///
    /// # Example
    ///
    /// ```
    /// # use wicket::http::request::Method;
    /// assert_eq!(Method::from_str("get"), Some(Method::GET));
    /// assert_eq!(Method::from_str("POST"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::GET),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
        }
    }
}

/// Parsed view of one request head. Built once per connection and dropped
/// when the response is done.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// `HTTP/1.0` or `HTTP/1.1`
    pub version: String,
    /// Target path without the query string
    pub path: String,
    /// Decoded `key=value` pairs from the query string
    pub query_parameters: HashMap<String, String>,
    /// Header lines in arrival order; names keep their original case
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every header with the given name, in arrival order.
    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn host(&self) -> Option<&str> {
        self.header("Host")
    }
}
