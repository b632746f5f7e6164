//! Serve command - rebuild if stale, then compose the service set

use crate::cli::args::ServeArgs;
use crate::config::Workspace;
use crate::engine::create_engine;
use crate::error::SlipwayResult;
use crate::manifest::BuildMode;
use crate::orchestrate::{BuildTarget, Composer, Orchestrator};
use crate::ui::{self, UiContext};

/// Execute the serve command
pub async fn execute(args: ServeArgs, ws: &Workspace) -> SlipwayResult<()> {
    let ctx = UiContext::detect();
    let engine = create_engine(&ws.config);
    let mode = BuildMode::from_dev_flag(args.dev);

    ui::intro(&ctx, "Slipway serve");

    let orchestrator = Orchestrator::new(engine.as_ref(), ws, &ctx);
    let images = orchestrator.build(&BuildTarget::Serve, mode).await?;

    if images.is_empty() {
        ui::step_info(&ctx, "Images fresh, skipping build");
    }

    let composer = Composer::new(engine.as_ref(), ws, &ctx);
    composer.up(mode).await?;

    ui::outro_success(&ctx, "All services stopped");
    Ok(())
}
