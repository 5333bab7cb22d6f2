#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, DuplexStream};
use tokio::sync::RwLock;

use wicket::config::DispatchConfig;
use wicket::http::context::ResponseContext;
use wicket::session::SharedAttributes;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh, empty directory under the system temp dir.
pub fn temp_dir(tag: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "wicket-{}-{}-{}",
        tag,
        std::process::id(),
        n
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Document root with a handful of files used across tests:
///
/// ```text
/// <tmp>/
///   outside.txt          (sibling of the root, must never be served)
///   root/
///     index.html
///     hello              (same name as the /hello worker)
///     notes.txt
///     data.bin
///     empty.txt
///     page.smscr
///     visits.smscr
///     docs/index.html
///     private/home.smscr
///     private/secret.txt
/// ```
pub fn document_root(tag: &str) -> PathBuf {
    let base = temp_dir(tag);
    write_file(&base, "outside.txt", "outside the root");

    let root = base.join("root");
    write_file(&root, "index.html", "<h1>index</h1>");
    write_file(&root, "hello", "static hello file");
    write_file(&root, "notes.txt", "plain notes");
    write_file(&root, "data.bin", "\u{1}\u{2}\u{3}");
    write_file(&root, "empty.txt", "");
    write_file(&root, "page.smscr", "<p>Hi {{name}}</p>");
    write_file(&root, "visits.smscr", "visits={{visits}}");
    write_file(&root, "docs/index.html", "<h1>docs</h1>");
    write_file(
        &root,
        "private/home.smscr",
        "<body style=\"background-color: #{{background}}\">updated={{updated}}</body>",
    );
    write_file(&root, "private/secret.txt", "top secret");
    root
}

pub fn dispatch_config(root: &Path) -> DispatchConfig {
    DispatchConfig {
        document_root: root.to_path_buf(),
        ..DispatchConfig::default()
    }
}

pub fn attributes() -> SharedAttributes {
    Arc::new(RwLock::new(HashMap::new()))
}

pub fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Context writing into an in-memory pipe; read the other end with
/// [`read_all`] after dropping the context.
pub fn pipe_context(parameters: HashMap<String, String>) -> (ResponseContext, DuplexStream) {
    let (ours, theirs) = tokio::io::duplex(1 << 20);
    let ctx = ResponseContext::new(Box::new(ours), parameters, attributes(), Vec::new());
    (ctx, theirs)
}

pub async fn read_all(mut stream: DuplexStream) -> String {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}
