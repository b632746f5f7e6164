//! Two-stage image recipe rendering
//!
//! The build stage installs the resolved dependency manifests into an
//! isolated prefix; the runtime stage starts from the same minimal base and
//! copies only that prefix plus the service source, so build-only tooling
//! never reaches a production image. The handoff between the stages is the
//! typed `BuiltPrefix`.

use crate::config::schema::{BuildConfig, ServiceConfig};
use crate::error::SlipwayResult;
use crate::manifest::ManifestKind;

/// A manifest addressed relative to the service's build context
#[derive(Debug, Clone)]
pub struct ContextManifest {
    pub kind: ManifestKind,
    pub context_path: String,
}

/// The artifact a build stage hands to the runtime stage: the named stage
/// and the prefix directory it populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrefix {
    pub stage: String,
    pub path: String,
}

/// First phase: isolated prefix, packaging toolchain, manifest installs,
/// cache purge.
pub struct BuildStage<'a> {
    pub base_image: &'a str,
    pub prefix: &'a str,
    pub manifests: &'a [ContextManifest],
    pub require_hashes: bool,
}

impl BuildStage<'_> {
    const STAGE_NAME: &'static str = "build";

    pub fn render(&self) -> (Vec<String>, BuiltPrefix) {
        let mut lines = Vec::new();
        let prefix = self.prefix;

        lines.push("# build stage: manifests install into an isolated prefix".to_string());
        lines.push(format!("FROM {} AS {}", self.base_image, Self::STAGE_NAME));
        lines.push(format!("RUN python -m venv {prefix}"));
        lines.push(format!(
            "RUN {prefix}/bin/pip install --no-cache-dir --upgrade pip setuptools wheel"
        ));

        let hashes_flag = if self.require_hashes {
            " --require-hashes"
        } else {
            ""
        };
        for manifest in self.manifests {
            let target = format!("/tmp/manifests/{}", manifest.kind.file_name());
            lines.push(format!("COPY {} {}", manifest.context_path, target));
            lines.push(format!(
                "RUN {prefix}/bin/pip install --no-cache-dir{hashes_flag} -r {target}"
            ));
        }

        lines.push(format!(
            "RUN find {prefix} -type d -name __pycache__ -prune -exec rm -rf '{{}}' +"
        ));
        lines.push(String::new());

        let built = BuiltPrefix {
            stage: Self::STAGE_NAME.to_string(),
            path: prefix.to_string(),
        };
        (lines, built)
    }
}

/// Second phase: minimal base, the built prefix, the service source, and
/// the runtime command. Consumes the `BuiltPrefix` produced by the build
/// stage.
pub struct RuntimeStage<'a> {
    pub base_image: &'a str,
    pub prefix: BuiltPrefix,
    pub workdir: &'a str,
    pub command: &'a [String],
}

impl RuntimeStage<'_> {
    pub fn render(&self) -> SlipwayResult<Vec<String>> {
        let mut lines = Vec::new();
        let path = &self.prefix.path;
        let workdir = self.workdir;

        lines.push("# runtime stage: prefix and source only, no build toolchain".to_string());
        lines.push(format!("FROM {}", self.base_image));
        lines.push(format!("COPY --from={} {} {}", self.prefix.stage, path, path));
        lines.push(format!("ENV PATH={path}/bin:$PATH"));
        lines.push(format!("WORKDIR {workdir}"));
        lines.push(format!("COPY . {workdir}"));
        lines.push(format!("ENV PYTHONPATH={workdir}"));

        if !self.command.is_empty() {
            lines.push(format!("CMD {}", serde_json::to_string(self.command)?));
        }

        Ok(lines)
    }
}

/// Render the full two-stage Containerfile for one service.
pub fn render_containerfile(
    build: &BuildConfig,
    service: &ServiceConfig,
    manifests: &[ContextManifest],
) -> SlipwayResult<String> {
    let build_stage = BuildStage {
        base_image: &build.base_image,
        prefix: &build.prefix,
        manifests,
        require_hashes: build.require_hashes,
    };
    let (mut lines, built_prefix) = build_stage.render();

    let runtime_stage = RuntimeStage {
        base_image: &build.base_image,
        prefix: built_prefix,
        workdir: &build.workdir,
        command: &service.command,
    };
    lines.extend(runtime_stage.render()?);

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Config;

    fn manifests(kinds: &[ManifestKind]) -> Vec<ContextManifest> {
        kinds
            .iter()
            .map(|kind| ContextManifest {
                kind: *kind,
                context_path: format!("requirements/{}", kind.file_name()),
            })
            .collect()
    }

    fn ingest_service() -> ServiceConfig {
        Config::default().services[0].clone()
    }

    #[test]
    fn production_containerfile_structure() {
        let build = BuildConfig::default();
        let text =
            render_containerfile(&build, &ingest_service(), &manifests(&[ManifestKind::Main]))
                .unwrap();

        assert!(text.contains("FROM docker.io/library/python:3.12-slim AS build"));
        assert!(text.contains("RUN python -m venv /opt/deps"));
        assert!(text.contains("--upgrade pip setuptools wheel"));
        assert!(text.contains("COPY requirements/main.txt /tmp/manifests/main.txt"));
        assert!(text.contains("COPY --from=build /opt/deps /opt/deps"));
        assert!(text.contains("ENV PATH=/opt/deps/bin:$PATH"));
        assert!(text.contains("WORKDIR /app"));
        assert!(text.contains("ENV PYTHONPATH=/app"));
        assert!(text.contains(r#"CMD ["python","-m","ingest"]"#));
    }

    #[test]
    fn production_never_references_dev_manifests() {
        let build = BuildConfig::default();
        let text =
            render_containerfile(&build, &ingest_service(), &manifests(&[ManifestKind::Main]))
                .unwrap();

        assert!(!text.contains("dev.txt"));
        assert!(!text.contains("tests.txt"));
    }

    #[test]
    fn development_installs_manifests_in_order() {
        let build = BuildConfig::default();
        let text = render_containerfile(
            &build,
            &ingest_service(),
            &manifests(&[ManifestKind::Dev, ManifestKind::Main, ManifestKind::Tests]),
        )
        .unwrap();

        let dev = text.find("COPY requirements/dev.txt").unwrap();
        let main = text.find("COPY requirements/main.txt").unwrap();
        let tests = text.find("COPY requirements/tests.txt").unwrap();
        assert!(dev < main);
        assert!(main < tests);
    }

    #[test]
    fn require_hashes_flag_is_configurable() {
        let mut build = BuildConfig::default();
        let m = manifests(&[ManifestKind::Main]);

        let with = render_containerfile(&build, &ingest_service(), &m).unwrap();
        assert!(with.contains("--require-hashes"));

        build.require_hashes = false;
        let without = render_containerfile(&build, &ingest_service(), &m).unwrap();
        assert!(!without.contains("--require-hashes"));
    }

    #[test]
    fn runtime_stage_consumes_built_prefix() {
        let stage = BuildStage {
            base_image: "python:3.12-slim",
            prefix: "/opt/custom",
            manifests: &manifests(&[ManifestKind::Main]),
            require_hashes: true,
        };
        let (_, built) = stage.render();
        assert_eq!(built.stage, "build");
        assert_eq!(built.path, "/opt/custom");

        let runtime = RuntimeStage {
            base_image: "python:3.12-slim",
            prefix: built,
            workdir: "/srv",
            command: &[],
        };
        let lines = runtime.render().unwrap();
        assert!(lines
            .iter()
            .any(|l| l == "COPY --from=build /opt/custom /opt/custom"));
        // Empty command leaves the image CMD unset
        assert!(!lines.iter().any(|l| l.starts_with("CMD")));
    }

    #[test]
    fn cache_purge_runs_in_build_stage_only() {
        let build = BuildConfig::default();
        let text =
            render_containerfile(&build, &ingest_service(), &manifests(&[ManifestKind::Main]))
                .unwrap();

        let purge = text.find("__pycache__").unwrap();
        let runtime = text.find("# runtime stage").unwrap();
        assert!(purge < runtime);
    }
}
