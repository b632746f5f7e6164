//! Lint command - run the linter over the source tree

use crate::config::Workspace;
use crate::engine::create_engine;
use crate::error::SlipwayResult;
use crate::ui::{self, UiContext};
use crate::verify;

/// Execute the lint command
pub async fn execute(ws: &Workspace) -> SlipwayResult<()> {
    let ctx = UiContext::detect();
    let engine = create_engine(&ws.config);

    verify::run_lint(engine.as_ref(), ws, &ctx).await?;

    ui::outro_success(&ctx, "No lint violations");
    Ok(())
}
