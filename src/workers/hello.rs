use crate::dispatch::{Worker, WorkerFuture};
use crate::http::context::ResponseContext;
use crate::workers::escape_html;

/// Greets the `name` request parameter, or the world.
#[derive(Debug, Default, Clone, Copy)]
pub struct HelloWorker;

impl Worker for HelloWorker {
    fn handle<'a>(&'a self, ctx: &'a mut ResponseContext) -> WorkerFuture<'a> {
        Box::pin(async move {
            let name = ctx.parameter("name").unwrap_or("world");
            let page = format!(
                "<html><body><h1>Hello, {}!</h1><p>Your name has {} characters.</p></body></html>",
                escape_html(name),
                name.chars().count()
            );

            ctx.set_mime_type("text/html")?;
            ctx.write_str(&page).await?;
            Ok(())
        })
    }
}
