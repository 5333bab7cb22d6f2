use crate::dispatch::worker::WorkerFuture;
use crate::http::context::ResponseContext;

/// Runs a script resource against a response.
///
/// The scripting language itself lives outside this crate; the dispatcher
/// only reads the script text and hands it over together with the context.
pub trait ScriptExecutor: Send + Sync {
    fn execute<'a>(&'a self, source: &'a str, ctx: &'a mut ResponseContext) -> WorkerFuture<'a>;
}

/// Minimal executor that fills `{{name}}` placeholders.
///
/// A name is looked up in the temporary, then persistent, then request
/// parameters; a missing name renders as an empty string. Unterminated
/// placeholders are written as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateExecutor;

impl TemplateExecutor {
    pub async fn render(&self, source: &str, ctx: &ResponseContext) -> String {
        let mut out = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find("}}") else {
                out.push_str(&rest[start..]);
                return out;
            };

            let name = after[..end].trim();
            if let Some(value) = lookup(ctx, name).await {
                out.push_str(&value);
            }
            rest = &after[end + 2..];
        }

        out.push_str(rest);
        out
    }
}

async fn lookup(ctx: &ResponseContext, name: &str) -> Option<String> {
    if let Some(value) = ctx.temporary_parameter(name) {
        return Some(value.to_string());
    }
    if let Some(value) = ctx.persistent_parameter(name).await {
        return Some(value);
    }
    ctx.parameter(name).map(str::to_string)
}

impl ScriptExecutor for TemplateExecutor {
    fn execute<'a>(&'a self, source: &'a str, ctx: &'a mut ResponseContext) -> WorkerFuture<'a> {
        Box::pin(async move {
            let page = self.render(source, ctx).await;
            ctx.write_str(&page).await?;
            Ok(())
        })
    }
}
