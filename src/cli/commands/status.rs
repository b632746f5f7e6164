//! Status command - check engine, manifests, and build freshness

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Workspace;
use crate::engine::create_engine;
use crate::error::SlipwayResult;
use crate::manifest::ManifestKind;
use crate::stage;
use crate::state::StalenessMarker;
use console::{style, Emoji};
use serde::Serialize;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

#[derive(Debug, Serialize)]
struct EngineStatus {
    binary: String,
    available: bool,
    version: Option<String>,
}

#[derive(Debug, Serialize)]
struct ManifestStatus {
    name: String,
    path: String,
    present: bool,
}

#[derive(Debug, Serialize)]
struct MarkerStatus {
    present: bool,
    stale: bool,
    built_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    engine: EngineStatus,
    manifests: Vec<ManifestStatus>,
    marker: MarkerStatus,
    services: Vec<String>,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, ws: &Workspace) -> SlipwayResult<()> {
    let report = gather(ws).await;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => print_table(&report),
    }

    Ok(())
}

async fn gather(ws: &Workspace) -> StatusReport {
    let engine = create_engine(&ws.config);
    let available = engine.is_available().await;
    let version = if available {
        engine.version().await.ok()
    } else {
        None
    };

    let manifest_dir = ws.manifest_dir();
    let manifests = ManifestKind::all()
        .iter()
        .map(|kind| {
            let path = manifest_dir.join(kind.file_name());
            ManifestStatus {
                name: kind.to_string(),
                present: path.is_file(),
                path: path.display().to_string(),
            }
        })
        .collect();

    let marker = StalenessMarker::new(ws.marker_path());
    let marker_status = MarkerStatus {
        present: marker.exists(),
        stale: marker.is_stale(&stage::recipe(ws)),
        built_at: marker.built_at().map(|t| t.to_rfc3339()),
    };

    StatusReport {
        engine: EngineStatus {
            binary: ws.config.engine.binary.clone(),
            available,
            version,
        },
        manifests,
        marker: marker_status,
        services: ws.config.services.iter().map(|s| s.name.clone()).collect(),
    }
}

fn print_table(report: &StatusReport) {
    println!("{}", style("Slipway Status").bold().cyan());

    println!();
    println!("{}", style("Engine:").bold());
    if report.engine.available {
        let version = report.engine.version.as_deref().unwrap_or("unknown");
        println!("  {} {} ({})", CHECK, report.engine.binary, version);
    } else {
        println!(
            "  {} {} - {}",
            CROSS,
            report.engine.binary,
            style("not available").red()
        );
    }

    println!();
    println!("{}", style("Manifests:").bold());
    for manifest in &report.manifests {
        if manifest.present {
            println!("  {} {} ({})", CHECK, manifest.name, manifest.path);
        } else {
            println!(
                "  {} {} - {}",
                WARN,
                manifest.name,
                style("missing").yellow()
            );
        }
    }

    println!();
    println!("{}", style("Build state:").bold());
    match (&report.marker.built_at, report.marker.stale) {
        (Some(built_at), false) => {
            println!("  {} {} (built {})", CHECK, style("fresh").green(), built_at);
        }
        (Some(built_at), true) => {
            println!(
                "  {} {} (inputs changed since {})",
                WARN,
                style("stale").yellow(),
                built_at
            );
        }
        (None, _) => {
            println!("  {} {}", WARN, style("never built").yellow());
        }
    }

    println!();
    println!("{}", style("Services:").bold());
    for service in &report.services {
        println!("  {} {}", CHECK, service);
    }
}
