use crate::dispatch::{Worker, WorkerFuture};
use crate::http::context::ResponseContext;

pub const VISITS_PARAMETER: &str = "visits";

/// Counts requests per session in the `visits` persistent parameter.
#[derive(Debug, Default, Clone, Copy)]
pub struct VisitCounter;

impl Worker for VisitCounter {
    fn handle<'a>(&'a self, ctx: &'a mut ResponseContext) -> WorkerFuture<'a> {
        Box::pin(async move {
            let visits = ctx
                .persistent_parameter(VISITS_PARAMETER)
                .await
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
                + 1;
            ctx.set_persistent_parameter(VISITS_PARAMETER, visits.to_string())
                .await;

            ctx.set_mime_type("text/plain")?;
            ctx.write_str(&format!("visits: {}\n", visits)).await?;
            Ok(())
        })
    }
}
