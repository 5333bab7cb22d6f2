use crate::dispatch::{Worker, WorkerFuture};
use crate::http::context::ResponseContext;
use crate::workers::escape_html;

/// Renders the request parameters as an HTML table, sorted by name.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoParams;

impl Worker for EchoParams {
    fn handle<'a>(&'a self, ctx: &'a mut ResponseContext) -> WorkerFuture<'a> {
        Box::pin(async move {
            let mut names = ctx.parameter_names();
            names.sort();

            let mut page = String::from("<html><body><table border=\"1\">\n");
            page.push_str("<tr><th>Name</th><th>Value</th></tr>\n");
            for name in &names {
                let value = ctx.parameter(name).unwrap_or_default();
                page.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td></tr>\n",
                    escape_html(name),
                    escape_html(value)
                ));
            }
            page.push_str("</table></body></html>\n");

            ctx.write_str(&page).await?;
            Ok(())
        })
    }
}
