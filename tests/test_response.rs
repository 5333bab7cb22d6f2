use std::collections::HashMap;
use std::path::Path;

use wicket::http::cookie::Cookie;
use wicket::http::mime::{DEFAULT_MIME_TYPE, MimeTable};
use wicket::http::response::StatusCode;
use wicket::http::writer::{HeadParts, serialize_error, serialize_head};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_serialize_head_with_cookies() {
    let cookies = vec![
        Cookie::new("sid", "ABC").domain("localhost").path("/").http_only(),
        Cookie::new("theme", "dark"),
    ];
    let head = serialize_head(&HeadParts {
        status_code: 200,
        status_text: "OK",
        mime_type: "text/html",
        encoding: "UTF-8",
        cookies: &cookies,
    });

    assert_eq!(
        String::from_utf8(head).unwrap(),
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=UTF-8\r\n\
         Set-Cookie: sid=\"ABC\"; Domain=localhost; Path=/; HttpOnly\r\n\
         Set-Cookie: theme=\"dark\"\r\n\
         \r\n"
    );
}

#[test]
fn test_serialize_head_binary_mime() {
    let head = serialize_head(&HeadParts {
        status_code: 200,
        status_text: "OK",
        mime_type: "application/pdf",
        encoding: "UTF-8",
        cookies: &[],
    });

    assert_eq!(
        String::from_utf8(head).unwrap(),
        "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\n\r\n"
    );
}

#[test]
fn test_serialize_error() {
    let text = String::from_utf8(serialize_error(StatusCode::BadRequest)).unwrap();
    let (head, body) = text.split_once("\r\n\r\n").unwrap();

    assert_eq!(
        head,
        "HTTP/1.1 400 Bad Request\r\n\
         Server: wicket\r\n\
         Content-Type: text/plain;charset=UTF-8\r\n\
         Connection: close"
    );
    assert_eq!(body, "400 Bad Request\n");
}

#[test]
fn test_mime_lookup() {
    let mut types = HashMap::new();
    types.insert("html".to_string(), "text/html".to_string());
    types.insert(".PNG".to_string(), "image/png".to_string());
    let table = MimeTable::new(&types);

    assert_eq!(table.lookup(Path::new("/a/index.html")), "text/html");
    assert_eq!(table.lookup(Path::new("/a/INDEX.HTML")), "text/html");
    assert_eq!(table.lookup(Path::new("logo.png")), "image/png");
    assert_eq!(table.lookup(Path::new("archive.tar.gz")), DEFAULT_MIME_TYPE);
    assert_eq!(table.lookup(Path::new("README")), DEFAULT_MIME_TYPE);
}
