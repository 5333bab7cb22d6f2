use anyhow::Context;

use crate::dispatch::{Worker, WorkerFuture};
use crate::http::context::ResponseContext;

pub const BGCOLOR_PARAMETER: &str = "bgcolor";
pub const DEFAULT_BGCOLOR: &str = "7F7F7F";
pub const HOME_SCRIPT: &str = "/private/home.smscr";

/// Renders the private home page with the session's background colour.
#[derive(Debug, Default, Clone, Copy)]
pub struct Home;

impl Worker for Home {
    fn handle<'a>(&'a self, ctx: &'a mut ResponseContext) -> WorkerFuture<'a> {
        Box::pin(async move {
            let color = ctx
                .persistent_parameter(BGCOLOR_PARAMETER)
                .await
                .unwrap_or_else(|| DEFAULT_BGCOLOR.to_string());
            ctx.set_temporary_parameter("background", color);

            ctx.dispatch(HOME_SCRIPT)
                .await
                .context("home page rendering failed")
        })
    }
}

/// Stores the `bgcolor` request parameter for the session, then shows `/home`.
///
/// Values that are not six hex digits are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct BackgroundColor;

impl Worker for BackgroundColor {
    fn handle<'a>(&'a self, ctx: &'a mut ResponseContext) -> WorkerFuture<'a> {
        Box::pin(async move {
            let requested = ctx.parameter(BGCOLOR_PARAMETER).map(str::to_string);
            let updated = match requested {
                Some(color) if is_hex_color(&color) => {
                    ctx.set_persistent_parameter(BGCOLOR_PARAMETER, color.to_ascii_uppercase())
                        .await;
                    true
                }
                _ => false,
            };
            ctx.set_temporary_parameter("updated", if updated { "yes" } else { "no" });

            ctx.dispatch("/home")
                .await
                .context("redirect to home failed")
        })
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit())
}
