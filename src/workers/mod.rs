//! Workers shipped with the server.
//!
//! Each one is registered in [`builtin_catalog`] under its type name, which is
//! the name configuration and `/ext/<Name>` paths refer to.

pub mod counter;
pub mod echo;
pub mod hello;
pub mod home;

use crate::dispatch::{Worker, WorkerCatalog};

pub use counter::VisitCounter;
pub use echo::EchoParams;
pub use hello::HelloWorker;
pub use home::{BackgroundColor, Home};

pub fn builtin_catalog() -> WorkerCatalog {
    WorkerCatalog::new()
        .with("HelloWorker", || Box::new(HelloWorker) as Box<dyn Worker>)
        .with("EchoParams", || Box::new(EchoParams) as Box<dyn Worker>)
        .with("VisitCounter", || Box::new(VisitCounter) as Box<dyn Worker>)
        .with("Home", || Box::new(Home) as Box<dyn Worker>)
        .with("BackgroundColor", || Box::new(BackgroundColor) as Box<dyn Worker>)
}

/// Escapes text for inclusion in HTML.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
