//! Build command - assemble service images unconditionally

use crate::cli::args::BuildArgs;
use crate::config::Workspace;
use crate::engine::create_engine;
use crate::error::SlipwayResult;
use crate::manifest::BuildMode;
use crate::orchestrate::{BuildTarget, Orchestrator};
use crate::ui::{self, UiContext};

/// Execute the build command
pub async fn execute(args: BuildArgs, ws: &Workspace) -> SlipwayResult<()> {
    let ctx = UiContext::detect();
    let engine = create_engine(&ws.config);
    let mode = BuildMode::from_dev_flag(args.dev);

    let target = match args.service {
        Some(name) => BuildTarget::Service(name),
        None => BuildTarget::All,
    };

    let orchestrator = Orchestrator::new(engine.as_ref(), ws, &ctx);
    let images = orchestrator.build(&target, mode).await?;

    ui::outro_success(
        &ctx,
        &format!("Built {} image(s) in {} mode", images.len(), mode),
    );
    Ok(())
}
