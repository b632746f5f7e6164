//! Dependency manifest resolution
//!
//! Maps a build mode to the ordered set of dependency manifests that get
//! installed into the image's dependency prefix. Production installs the
//! main manifest only; development layers the dev tooling and test
//! manifests around it, so the development set is always a strict superset
//! of the production set.

use crate::error::{SlipwayError, SlipwayResult};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Image build variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Production,
    Development,
}

impl BuildMode {
    /// Map the CLI `--dev` flag to a mode
    pub fn from_dev_flag(dev: bool) -> Self {
        if dev {
            Self::Development
        } else {
            Self::Production
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Production => "production",
            Self::Development => "development",
        };
        write!(f, "{}", name)
    }
}

/// The named manifests a build mode can pull in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    /// Runtime dependencies, installed in every mode
    Main,
    /// Development tooling
    Dev,
    /// Test-only dependencies
    Tests,
}

impl ManifestKind {
    /// File name of this manifest under the manifest directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Main => "main.txt",
            Self::Dev => "dev.txt",
            Self::Tests => "tests.txt",
        }
    }

    /// All manifest kinds slipway knows about
    pub fn all() -> &'static [Self] {
        &[Self::Main, Self::Dev, Self::Tests]
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Main => "main",
            Self::Dev => "dev",
            Self::Tests => "tests",
        };
        write!(f, "{}", name)
    }
}

/// A manifest resolved to a concrete file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRef {
    pub kind: ManifestKind,
    pub path: PathBuf,
}

/// Resolve the ordered manifest set for a mode.
///
/// Development order is dev, main, tests: the dev tooling must be in the
/// prefix before the main and test sets install. Installation is purely
/// additive, no manifest replaces another. A missing required manifest is
/// fatal to the build and never retried.
pub fn resolve(mode: BuildMode, manifest_dir: &Path) -> SlipwayResult<Vec<ManifestRef>> {
    let kinds: &[ManifestKind] = match mode {
        BuildMode::Production => &[ManifestKind::Main],
        BuildMode::Development => &[ManifestKind::Dev, ManifestKind::Main, ManifestKind::Tests],
    };

    let mut refs = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let path = manifest_dir.join(kind.file_name());
        if !path.is_file() {
            return Err(SlipwayError::ManifestNotFound {
                mode: mode.to_string(),
                path,
            });
        }
        debug!("Resolved {} manifest: {}", kind, path.display());
        refs.push(ManifestRef { kind: *kind, path });
    }

    Ok(refs)
}

/// All manifest files that participate in staleness tracking.
///
/// The tracker is deliberately coarse: every manifest that exists is a
/// declared input regardless of mode, so touching any of them invalidates
/// the whole image set.
pub fn input_files(manifest_dir: &Path) -> Vec<PathBuf> {
    ManifestKind::all()
        .iter()
        .map(|kind| manifest_dir.join(kind.file_name()))
        .filter(|path| path.is_file())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifests(dir: &Path, kinds: &[ManifestKind]) {
        for kind in kinds {
            fs::write(dir.join(kind.file_name()), "pkg==1.0\n").unwrap();
        }
    }

    #[test]
    fn production_resolves_main_only() {
        let dir = TempDir::new().unwrap();
        write_manifests(dir.path(), ManifestKind::all());

        let refs = resolve(BuildMode::Production, dir.path()).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, ManifestKind::Main);
    }

    #[test]
    fn development_resolves_dev_main_tests_in_order() {
        let dir = TempDir::new().unwrap();
        write_manifests(dir.path(), ManifestKind::all());

        let refs = resolve(BuildMode::Development, dir.path()).unwrap();
        let kinds: Vec<ManifestKind> = refs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![ManifestKind::Dev, ManifestKind::Main, ManifestKind::Tests]
        );
    }

    #[test]
    fn development_is_superset_of_production() {
        let dir = TempDir::new().unwrap();
        write_manifests(dir.path(), ManifestKind::all());

        let prod = resolve(BuildMode::Production, dir.path()).unwrap();
        let dev = resolve(BuildMode::Development, dir.path()).unwrap();

        for m in &prod {
            assert!(dev.iter().any(|d| d.kind == m.kind));
        }
    }

    #[test]
    fn production_ignores_missing_dev_manifests() {
        let dir = TempDir::new().unwrap();
        write_manifests(dir.path(), &[ManifestKind::Main]);

        assert!(resolve(BuildMode::Production, dir.path()).is_ok());
    }

    #[test]
    fn development_fails_on_missing_tests_manifest() {
        let dir = TempDir::new().unwrap();
        write_manifests(dir.path(), &[ManifestKind::Main, ManifestKind::Dev]);

        let err = resolve(BuildMode::Development, dir.path()).unwrap_err();
        match err {
            SlipwayError::ManifestNotFound { mode, path } => {
                assert_eq!(mode, "development");
                assert!(path.ends_with("tests.txt"));
            }
            other => panic!("expected ManifestNotFound, got {other}"),
        }
    }

    #[test]
    fn missing_main_is_fatal_in_every_mode() {
        let dir = TempDir::new().unwrap();
        write_manifests(dir.path(), &[ManifestKind::Dev, ManifestKind::Tests]);

        assert!(resolve(BuildMode::Production, dir.path()).is_err());
        assert!(resolve(BuildMode::Development, dir.path()).is_err());
    }

    #[test]
    fn input_files_lists_existing_manifests_only() {
        let dir = TempDir::new().unwrap();
        write_manifests(dir.path(), &[ManifestKind::Main, ManifestKind::Tests]);

        let inputs = input_files(dir.path());
        assert_eq!(inputs.len(), 2);
        assert!(inputs.iter().any(|p| p.ends_with("main.txt")));
        assert!(inputs.iter().any(|p| p.ends_with("tests.txt")));
    }

    #[test]
    fn mode_display() {
        assert_eq!(BuildMode::Production.to_string(), "production");
        assert_eq!(BuildMode::Development.to_string(), "development");
    }

    #[test]
    fn mode_from_flag() {
        assert_eq!(BuildMode::from_dev_flag(false), BuildMode::Production);
        assert_eq!(BuildMode::from_dev_flag(true), BuildMode::Development);
    }
}
