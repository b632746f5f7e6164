//! Out-of-band verification tasks
//!
//! The test and lint runners execute inside a development-mode image of
//! the verify service, with the working tree mounted over the baked
//! source so they always see current code. Both are independent of build
//! state: neither consults nor updates the staleness marker.

use crate::config::Workspace;
use crate::engine::{ContainerEngine, RunSpec};
use crate::error::{SlipwayError, SlipwayResult};
use crate::manifest::BuildMode;
use crate::stage;
use crate::ui::{self, BuildProgress, UiContext};
use std::path::Path;
use tracing::debug;

/// Run the test suite with an optional path filter and extra arguments.
///
/// Produces the pass/fail result on exit status; the coverage report comes
/// from the configured test command itself.
pub async fn run_tests(
    engine: &dyn ContainerEngine,
    ws: &Workspace,
    ctx: &UiContext,
    path: Option<&Path>,
    extra_args: &[String],
) -> SlipwayResult<()> {
    let mut command = ws.config.verify.test_command.clone();
    if let Some(path) = path {
        command.push(path.to_string_lossy().into_owned());
    }
    command.extend(extra_args.iter().cloned());

    let code = run_in_dev_image(engine, ws, ctx, command).await?;
    if code != 0 {
        return Err(SlipwayError::TestsFailed(code));
    }
    Ok(())
}

/// Run the linter over the whole source tree.
pub async fn run_lint(
    engine: &dyn ContainerEngine,
    ws: &Workspace,
    ctx: &UiContext,
) -> SlipwayResult<()> {
    let command = ws.config.verify.lint_command.clone();

    let code = run_in_dev_image(engine, ws, ctx, command).await?;
    if code != 0 {
        return Err(SlipwayError::LintFailed(code));
    }
    Ok(())
}

/// Assemble the verify service in development mode and run a command in it
/// with inherited stdio.
async fn run_in_dev_image(
    engine: &dyn ContainerEngine,
    ws: &Workspace,
    ctx: &UiContext,
    command: Vec<String>,
) -> SlipwayResult<i32> {
    if !engine.is_available().await {
        return Err(SlipwayError::EngineNotFound {
            binary: engine.engine_name().to_string(),
        });
    }

    let service = ws.verify_service()?;
    debug!("Verification host service: {}", service.name);

    let progress = BuildProgress::new(ctx, &service.name);
    let image = stage::assemble(engine, ws, service, BuildMode::Development, &|line| {
        progress.on_line(line)
    })
    .await;
    progress.finish();
    let image = image?;
    ui::step_ok_detail(ctx, "Image ready", &image.tag);

    let workdir = ws.config.build.workdir.clone();
    let spec = RunSpec {
        image: image.tag,
        volumes: vec![format!("{}:{}", ws.root.display(), workdir)],
        workdir: Some(workdir),
        command,
        ..RunSpec::default()
    };

    engine.run_attached(&spec).await
}
