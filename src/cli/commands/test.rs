//! Test command - run the suite inside a development image

use crate::cli::args::TestArgs;
use crate::config::Workspace;
use crate::engine::create_engine;
use crate::error::SlipwayResult;
use crate::ui::{self, UiContext};
use crate::verify;

/// Execute the test command
pub async fn execute(args: TestArgs, ws: &Workspace) -> SlipwayResult<()> {
    let ctx = UiContext::detect();
    let engine = create_engine(&ws.config);

    verify::run_tests(
        engine.as_ref(),
        ws,
        &ctx,
        args.path.as_deref(),
        &args.args,
    )
    .await?;

    ui::outro_success(&ctx, "Tests passed");
    Ok(())
}
