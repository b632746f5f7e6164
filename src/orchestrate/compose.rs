//! Service composition
//!
//! Starts the declared services as one unit on a shared network and blocks
//! until an operator interrupt or the first unexpected service exit. The
//! composer never restarts a service; restart policy belongs to whoever
//! invokes slipway again.

use crate::config::{ServiceConfig, Workspace};
use crate::engine::{ContainerEngine, RunSpec};
use crate::error::{SlipwayError, SlipwayResult};
use crate::manifest::BuildMode;
use crate::ui::{self, TaskSpinner, UiContext};
use tracing::debug;

/// Runs the service set as a single logical unit
pub struct Composer<'a> {
    engine: &'a dyn ContainerEngine,
    ws: &'a Workspace,
    ctx: &'a UiContext,
}

impl<'a> Composer<'a> {
    pub fn new(engine: &'a dyn ContainerEngine, ws: &'a Workspace, ctx: &'a UiContext) -> Self {
        Self { engine, ws, ctx }
    }

    /// The shared network all services join
    fn network_name(&self) -> String {
        self.ws
            .config
            .engine
            .network
            .clone()
            .unwrap_or_else(|| format!("{}-net", self.ws.config.build.image_prefix))
    }

    fn run_spec(&self, service: &ServiceConfig, mode: BuildMode, network: &str) -> RunSpec {
        let mut env: Vec<(String, String)> = service
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.sort();

        RunSpec {
            image: self.ws.config.build.image_tag(&service.name, mode),
            name: Some(self.ws.config.build.container_name(&service.name)),
            network: Some(network.to_string()),
            network_alias: Some(service.name.clone()),
            env,
            ports: service.ports.clone(),
            volumes: vec![],
            workdir: None,
            command: vec![],
        }
    }

    /// Start all services and block until interrupted or a service exits.
    ///
    /// An unexpected exit of any one service stops the rest and surfaces a
    /// `ComposeFailure` naming it. Ctrl-C terminates all services cleanly
    /// and returns success.
    pub async fn up(&self, mode: BuildMode) -> SlipwayResult<()> {
        let services = &self.ws.config.services;
        if services.is_empty() {
            return Err(SlipwayError::NoServices);
        }

        let network = self.network_name();
        let mut spinner = TaskSpinner::new(self.ctx);
        spinner.start(&format!("Preparing network {}...", network));
        match self.engine.ensure_network(&network).await {
            Ok(()) => spinner.stop(&format!("Network {} ready", network)),
            Err(e) => {
                spinner.stop_error("Network setup failed");
                return Err(e);
            }
        }
        debug!("Composing {} services on {}", services.len(), network);

        let mut started: Vec<(String, String)> = Vec::new();
        for service in services {
            let spec = self.run_spec(service, mode, &network);
            // Clear any leftover container from a previous run
            if let Some(ref name) = spec.name {
                let _ = self.engine.remove(name).await;
            }

            match self.engine.run_detached(&spec).await {
                Ok(id) => {
                    let short = &id[..12.min(id.len())];
                    ui::step_ok_detail(self.ctx, &format!("Started {}", service.name), short);
                    started.push((service.name.clone(), id));
                }
                Err(e) => {
                    self.stop_all(&started).await;
                    return Err(e);
                }
            }
        }

        ui::step_info(self.ctx, "Services running, press Ctrl-C to stop");

        let waiters: Vec<_> = started
            .iter()
            .map(|(name, id)| {
                let engine = self.engine;
                let name = name.clone();
                let id = id.clone();
                Box::pin(async move { (name, engine.wait(&id).await) })
            })
            .collect();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                ui::step_info(self.ctx, "Stopping services...");
                self.stop_all(&started).await;
                Ok(())
            }
            (exited, _, _) = futures_util::future::select_all(waiters) => {
                let (service, result) = exited;
                ui::step_error(self.ctx, &format!("Service {} exited", service));
                self.stop_all(&started).await;
                Err(SlipwayError::ComposeFailure {
                    service,
                    code: result.unwrap_or(-1),
                })
            }
        }
    }

    /// Stop and remove every started container, newest first (best-effort)
    async fn stop_all(&self, started: &[(String, String)]) {
        for (service, id) in started.iter().rev() {
            if let Err(e) = self.engine.stop(id).await {
                ui::step_warn(self.ctx, &format!("Failed to stop {}: {}", service, e));
            }
            let _ = self.engine.remove(id).await;
        }
    }
}
