use crate::http::cookie::Cookie;
use crate::http::response::StatusCode;

pub const HTTP_VERSION: &str = "HTTP/1.1";
pub const SERVER_NAME: &str = "wicket";

/// Everything that goes into the header block of a normal response.
pub struct HeadParts<'a> {
    pub status_code: u16,
    pub status_text: &'a str,
    pub mime_type: &'a str,
    pub encoding: &'a str,
    pub cookies: &'a [Cookie],
}

/// Serializes the status line, `Content-Type`, one `Set-Cookie` per cookie
/// and the terminating blank line.
pub fn serialize_head(parts: &HeadParts<'_>) -> Vec<u8> {
    let mut buf = String::with_capacity(128);

    buf.push_str(&format!(
        "{} {} {}\r\n",
        HTTP_VERSION, parts.status_code, parts.status_text
    ));

    buf.push_str("Content-Type: ");
    buf.push_str(parts.mime_type);
    if parts.mime_type.starts_with("text/") {
        buf.push_str("; charset=");
        buf.push_str(parts.encoding);
    }
    buf.push_str("\r\n");

    for cookie in parts.cookies {
        buf.push_str(&format!("Set-Cookie: {}\r\n", cookie));
    }

    // Header/body separator
    buf.push_str("\r\n");

    buf.into_bytes()
}

/// Serializes a complete error response with the reduced header set.
pub fn serialize_error(status: StatusCode) -> Vec<u8> {
    format!(
        "{version} {code} {text}\r\n\
         Server: {server}\r\n\
         Content-Type: text/plain;charset=UTF-8\r\n\
         Connection: close\r\n\
         \r\n\
         {code} {text}\n",
        version = HTTP_VERSION,
        code = status.as_u16(),
        text = status.reason_phrase(),
        server = SERVER_NAME,
    )
    .into_bytes()
}
