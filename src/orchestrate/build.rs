//! Build orchestration
//!
//! The orchestrator is the sole caller of the staleness tracker and, per
//! service, of the stage assembler. Explicit build requests are
//! authoritative and bypass the staleness check; serve consults it and
//! rebuilds before composing. The marker is updated only after every
//! service in the pass built successfully, so a failed pass leaves the
//! prior state intact.

use crate::config::{ServiceConfig, Workspace};
use crate::engine::ContainerEngine;
use crate::error::{SlipwayError, SlipwayResult};
use crate::manifest::BuildMode;
use crate::stage::{self, ImageHandle};
use crate::state::StalenessMarker;
use crate::ui::{self, BuildProgress, UiContext};
use tracing::{debug, info};

/// What a build invocation covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildTarget {
    /// Every declared service, unconditionally
    All,
    /// One service, unconditionally; the shared marker stays untouched
    Service(String),
    /// Rebuild only if stale, on behalf of serve
    Serve,
}

/// Drives staleness checks, per-service assembly, and the marker barrier
pub struct Orchestrator<'a> {
    engine: &'a dyn ContainerEngine,
    ws: &'a Workspace,
    ctx: &'a UiContext,
}

impl<'a> Orchestrator<'a> {
    pub fn new(engine: &'a dyn ContainerEngine, ws: &'a Workspace, ctx: &'a UiContext) -> Self {
        Self { engine, ws, ctx }
    }

    /// The staleness marker for this workspace
    pub fn marker(&self) -> StalenessMarker {
        StalenessMarker::new(self.ws.marker_path())
    }

    /// Build the requested target. Returns the images built; empty when a
    /// serve target found everything fresh.
    pub async fn build(
        &self,
        target: &BuildTarget,
        mode: BuildMode,
    ) -> SlipwayResult<Vec<ImageHandle>> {
        if self.ws.config.services.is_empty() {
            return Err(SlipwayError::NoServices);
        }

        match target {
            BuildTarget::Service(name) => {
                let service = self
                    .ws
                    .service(name)
                    .ok_or_else(|| SlipwayError::ServiceUnknown(name.clone()))?;
                self.ensure_engine().await?;
                // The marker asserts freshness for the whole service set,
                // which a single-service build cannot claim.
                self.build_services(&[service], mode).await
            }
            BuildTarget::All => {
                self.ensure_engine().await?;
                let services: Vec<&ServiceConfig> = self.ws.config.services.iter().collect();
                let images = self.build_services(&services, mode).await?;
                self.marker().mark_fresh().await?;
                Ok(images)
            }
            BuildTarget::Serve => {
                let recipe = stage::recipe(self.ws);
                let marker = self.marker();
                if !marker.is_stale(&recipe) {
                    debug!("Marker newer than all inputs, skipping build");
                    return Ok(vec![]);
                }
                info!("Inputs changed since last build, rebuilding all services");

                self.ensure_engine().await?;
                let services: Vec<&ServiceConfig> = self.ws.config.services.iter().collect();
                let images = self.build_services(&services, mode).await?;
                marker.mark_fresh().await?;
                Ok(images)
            }
        }
    }

    async fn ensure_engine(&self) -> SlipwayResult<()> {
        if self.engine.is_available().await {
            Ok(())
        } else {
            Err(SlipwayError::EngineNotFound {
                binary: self.engine.engine_name().to_string(),
            })
        }
    }

    /// Sequential per-service assembly. The first failure aborts the whole
    /// pass; the caller never marks fresh in that case.
    async fn build_services(
        &self,
        services: &[&ServiceConfig],
        mode: BuildMode,
    ) -> SlipwayResult<Vec<ImageHandle>> {
        let mut images = Vec::with_capacity(services.len());

        for service in services {
            let progress = BuildProgress::new(self.ctx, &service.name);
            let result = stage::assemble(self.engine, self.ws, service, mode, &|line| {
                progress.on_line(line)
            })
            .await;
            progress.finish();

            match result {
                Ok(image) => {
                    ui::step_ok_detail(self.ctx, &format!("Built {}", service.name), &image.tag);
                    images.push(image);
                }
                Err(e) => {
                    ui::step_error(self.ctx, &format!("Build failed for {}", service.name));
                    return Err(e);
                }
            }
        }

        Ok(images)
    }
}
