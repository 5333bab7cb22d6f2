mod common;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use wicket::config::Config;
use wicket::server::Server;

use common::document_root;

fn config(tag: &str) -> Config {
    let mut cfg = Config::default();
    cfg.server.listen_addr = "127.0.0.1:0".to_string();
    cfg.server.pool_size = 4;
    cfg.dispatch.document_root = document_root(tag);
    cfg
}

async fn started(tag: &str) -> (Server, SocketAddr) {
    let server = Server::new(config(tag)).unwrap();
    let addr = server.start().await.unwrap();
    (server, addr)
}

async fn send(addr: SocketAddr, raw: &[u8]) -> String {
    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(raw).await.unwrap();

    let mut buf = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut buf))
        .await
        .expect("response timed out")
        .unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

fn status_line(response: &str) -> &str {
    response.lines().next().unwrap_or("")
}

fn session_id(response: &str) -> Option<String> {
    response
        .lines()
        .find_map(|l| l.strip_prefix("Set-Cookie: sid=\""))
        .and_then(|rest| rest.split('"').next())
        .map(str::to_string)
}

#[tokio::test]
async fn test_worker_forwarding_to_missing_resource_is_404() {
    let cfg = config("srv-home-missing");
    std::fs::remove_file(cfg.dispatch.document_root.join("private/home.smscr")).unwrap();
    let server = Server::new(cfg).unwrap();
    let addr = server.start().await.unwrap();

    let response = send(addr, b"GET /home HTTP/1.1\r\n\r\n").await;

    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");
    assert!(response.ends_with("404 Not Found\n"));

    server.stop().await;
}

#[test]
fn test_zero_pool_is_rejected() {
    let mut cfg = config("srv-zero-pool");
    cfg.server.pool_size = 0;

    let err = Server::new(cfg).err().expect("zero pool must be rejected");
    assert!(err.to_string().contains("pool_size"));
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let (server, addr) = started("srv-missing").await;

    let response = send(addr, b"GET /missing.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");
    assert!(response.contains("Content-Type: text/plain;charset=UTF-8"));
    assert!(response.contains("Connection: close"));
    server.stop().await;
}

#[tokio::test]
async fn test_root_escape_is_404() {
    let (server, addr) = started("srv-escape").await;

    let response = send(addr, b"GET /../../etc/passwd HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");
    assert!(!response.contains("root:"));

    let response = send(addr, b"GET /../outside.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");
    assert!(!response.contains("outside the root"));

    server.stop().await;
}

#[tokio::test]
async fn test_session_cookie_round_trip() {
    let (server, addr) = started("srv-session").await;

    let first = send(addr, b"GET /counter HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(status_line(&first), "HTTP/1.1 200 OK");
    assert!(first.contains("visits: 1"));
    let sid = session_id(&first).expect("first response sets a sid cookie");
    assert!(first.contains("Domain=localhost; Path=/; HttpOnly"));

    let replay = format!("GET /counter HTTP/1.1\r\nHost: localhost\r\nCookie: sid=\"{sid}\"\r\n\r\n");
    let second = send(addr, replay.as_bytes()).await;
    assert!(second.contains("visits: 2"));
    assert!(session_id(&second).is_none());

    // Persistent parameters set by the worker are visible to scripts
    let script = format!("GET /visits.smscr HTTP/1.1\r\nCookie: sid={sid}\r\n\r\n");
    let third = send(addr, script.as_bytes()).await;
    assert_eq!(status_line(&third), "HTTP/1.1 200 OK");
    assert!(third.ends_with("visits=2"));

    assert!(server.sessions().get(&sid).await.is_some());
    server.stop().await;
}

#[tokio::test]
async fn test_unsupported_method_is_400() {
    let (server, addr) = started("srv-method").await;

    let response = send(addr, b"FOO /x HTTP/1.1\r\n\r\n").await;

    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");
    assert!(!response.contains("Set-Cookie"));
    assert!(server.sessions().is_empty().await);
    server.stop().await;
}

#[tokio::test]
async fn test_bad_version_and_garbage_are_400() {
    let (server, addr) = started("srv-garbage").await;

    let response = send(addr, b"GET / HTTP/3\r\n\r\n").await;
    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");

    let response = send(addr, b"\r\n\r\n").await;
    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");

    server.stop().await;
}

#[tokio::test]
async fn test_worker_preferred_over_static_file() {
    let (server, addr) = started("srv-worker").await;

    let response = send(addr, b"GET /hello?name=Zed HTTP/1.1\r\n\r\n").await;

    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    assert!(response.contains("Hello, Zed!"));
    assert!(!response.contains("static hello file"));
    server.stop().await;
}

#[tokio::test]
async fn test_lf_only_client_is_served() {
    let (server, addr) = started("srv-lf").await;

    let response = send(addr, b"get /notes.txt HTTP/1.0\n\n").await;

    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    assert!(response.ends_with("plain notes"));
    server.stop().await;
}

#[tokio::test]
async fn test_private_path_hidden_from_clients() {
    let (server, addr) = started("srv-private").await;

    let response = send(addr, b"GET /private/secret.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");

    let response = send(addr, b"GET /home HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    assert!(response.contains("background-color: #7F7F7F"));

    server.stop().await;
}

#[tokio::test]
async fn test_silent_client_gets_no_response() {
    let (server, addr) = started("srv-silent").await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.shutdown().await.unwrap();
    let mut buf = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut buf))
        .await
        .unwrap()
        .unwrap();

    assert!(buf.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let server = Server::new(config("srv-lifecycle")).unwrap();
    assert!(!server.is_running().await);

    let addr = server.start().await.unwrap();
    let again = server.start().await.unwrap();
    assert_eq!(addr, again);
    assert!(server.is_running().await);
    assert_eq!(server.local_addr().await, Some(addr));

    server.stop().await;
    server.stop().await;
    assert!(!server.is_running().await);
    assert_eq!(server.local_addr().await, None);

    // Listener is closed once stopped
    assert!(TcpStream::connect(addr).await.is_err());

    // And the server can run again
    let addr = server.start().await.unwrap();
    let response = send(addr, b"GET /notes.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients_beyond_pool_size() {
    let (server, addr) = started("srv-pool").await;

    let mut tasks = Vec::new();
    for i in 0..12 {
        tasks.push(tokio::spawn(async move {
            let raw = format!("GET /hello?name=c{i} HTTP/1.1\r\n\r\n");
            send(addr, raw.as_bytes()).await
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let response = task.await.unwrap();
        assert!(response.contains(&format!("Hello, c{i}!")));
    }

    assert_eq!(server.sessions().len().await, 12);
    server.stop().await;
}
