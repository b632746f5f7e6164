//! Stage assembly
//!
//! Resolves the manifest set for the requested mode, renders the two-stage
//! Containerfile for a service, and drives the engine build. The rendered
//! recipe lives in a scratch directory under the project state dir and is
//! removed after the build.

pub mod render;

pub use render::{BuildStage, BuiltPrefix, ContextManifest, RuntimeStage};

use crate::config::{ServiceConfig, Workspace};
use crate::engine::{build_error_output, ContainerEngine};
use crate::error::{SlipwayError, SlipwayResult};
use crate::manifest::{self, BuildMode, ManifestRef};
use crate::state::BuildRecipe;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// A successfully assembled image
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pub service: String,
    pub tag: String,
    pub mode: BuildMode,
}

/// The build recipe for this workspace: the project file plus every
/// manifest that exists. Consulted by the staleness tracker.
pub fn recipe(ws: &Workspace) -> BuildRecipe {
    BuildRecipe::new(ws.recipe_file(), manifest::input_files(&ws.manifest_dir()))
}

/// Assemble one service image for a mode.
///
/// Any manifest or stage failure aborts the assembly; the caller decides
/// what that means for the staleness marker. No partial image is tagged as
/// complete, that atomicity comes from the engine's layer-commit semantics.
pub async fn assemble(
    engine: &dyn ContainerEngine,
    ws: &Workspace,
    service: &ServiceConfig,
    mode: BuildMode,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> SlipwayResult<ImageHandle> {
    let manifests = manifest::resolve(mode, &ws.manifest_dir())?;
    let context = ws.root.join(&service.context);
    let context_manifests = context_manifests(&manifests, &context, &service.name)?;

    let containerfile = render::render_containerfile(&ws.config.build, service, &context_manifests)?;

    let build_dir = ws.builds_dir().join(uuid::Uuid::new_v4().to_string());
    fs::create_dir_all(&build_dir)
        .await
        .map_err(|e| SlipwayError::io("creating build directory", e))?;

    let recipe_path = build_dir.join("Containerfile");
    fs::write(&recipe_path, &containerfile)
        .await
        .map_err(|e| SlipwayError::io(format!("writing {}", recipe_path.display()), e))?;

    let tag = ws.config.build.image_tag(&service.name, mode);
    debug!("Assembling {} ({} mode)", tag, mode);

    let status = engine
        .build_image(&context, &recipe_path, &tag, on_output)
        .await;

    // Clean up the rendered recipe (best-effort)
    let _ = fs::remove_dir_all(&build_dir).await;

    let status = status?;
    if !status.success {
        return Err(SlipwayError::StageBuildFailure {
            service: service.name.clone(),
            output: build_error_output(&status.output),
        });
    }

    Ok(ImageHandle {
        service: service.name.clone(),
        tag,
        mode,
    })
}

/// Re-address resolved manifests relative to the service's build context.
///
/// Manifests must live inside the context, otherwise the engine cannot
/// COPY them during the build stage.
fn context_manifests(
    manifests: &[ManifestRef],
    context: &Path,
    service: &str,
) -> SlipwayResult<Vec<ContextManifest>> {
    manifests
        .iter()
        .map(|m| {
            let rel = m.path.strip_prefix(context).map_err(|_| {
                SlipwayError::User(format!(
                    "manifest {} is outside the build context of service {}",
                    m.path.display(),
                    service
                ))
            })?;
            Ok(ContextManifest {
                kind: m.kind,
                context_path: rel.to_string_lossy().into_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestKind;
    use std::path::PathBuf;

    #[test]
    fn manifests_rebased_onto_context() {
        let refs = vec![ManifestRef {
            kind: ManifestKind::Main,
            path: PathBuf::from("/proj/requirements/main.txt"),
        }];

        let rebased = context_manifests(&refs, Path::new("/proj"), "ingest").unwrap();
        assert_eq!(rebased[0].context_path, "requirements/main.txt");
    }

    #[test]
    fn dot_context_components_are_normalized() {
        let refs = vec![ManifestRef {
            kind: ManifestKind::Main,
            path: PathBuf::from("/proj/requirements/main.txt"),
        }];

        // The assembler joins the project root with a "." context
        let rebased = context_manifests(&refs, Path::new("/proj/."), "ingest").unwrap();
        assert_eq!(rebased[0].context_path, "requirements/main.txt");
    }

    #[test]
    fn manifest_outside_context_is_rejected() {
        let refs = vec![ManifestRef {
            kind: ManifestKind::Main,
            path: PathBuf::from("/proj/requirements/main.txt"),
        }];

        let result = context_manifests(&refs, Path::new("/proj/services/ingest"), "ingest");
        assert!(matches!(result, Err(SlipwayError::User(_))));
    }

    #[test]
    fn recipe_uses_project_file() {
        let ws = Workspace::new(PathBuf::from("/proj"), crate::config::Config::default());
        let recipe = recipe(&ws);
        assert_eq!(recipe.recipe_file, PathBuf::from("/proj/slipway.toml"));
    }
}
