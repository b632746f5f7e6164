//! Build staleness tracking
//!
//! A single marker file records the time of the last successful full build
//! pass. The image set is stale when the marker is missing or any declared
//! input file has been modified after it. The marker has no expiry: only a
//! newer input or explicit deletion invalidates it.

use crate::error::{SlipwayError, SlipwayResult};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::debug;

/// The build description plus the input files whose modification
/// invalidates a previous build. Read-only per invocation.
#[derive(Debug, Clone)]
pub struct BuildRecipe {
    /// The build description itself (the project config file)
    pub recipe_file: PathBuf,
    /// Dependency manifest files
    pub inputs: Vec<PathBuf>,
}

impl BuildRecipe {
    pub fn new(recipe_file: PathBuf, inputs: Vec<PathBuf>) -> Self {
        Self { recipe_file, inputs }
    }

    /// Every file in the declared input set, recipe file first
    fn all_inputs(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.recipe_file).chain(self.inputs.iter())
    }
}

/// Persisted sentinel for "last successful full build"
#[derive(Debug, Clone)]
pub struct StalenessMarker {
    path: PathBuf,
}

impl StalenessMarker {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Marker modification time, if the marker exists
    pub fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    /// Marker modification time as a wall-clock timestamp, for display
    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.modified().map(DateTime::<Utc>::from)
    }

    /// Whether the recipe's inputs invalidate the last recorded build.
    ///
    /// Coarse mtime comparison, no content hashing: a touch without a
    /// content change still reads as stale, and a change to a file outside
    /// the declared input set is invisible. Inputs that do not exist cannot
    /// be newer than the marker and are skipped here; the resolver reports
    /// missing required manifests at build time.
    pub fn is_stale(&self, recipe: &BuildRecipe) -> bool {
        let Some(marker_time) = self.modified() else {
            debug!("Marker missing: {}", self.path.display());
            return true;
        };

        for input in recipe.all_inputs() {
            let Ok(meta) = std::fs::metadata(input) else {
                continue;
            };
            let Ok(mtime) = meta.modified() else {
                continue;
            };
            if mtime > marker_time {
                debug!("Input newer than marker: {}", input.display());
                return true;
            }
        }

        false
    }

    /// Record a successful full build pass.
    ///
    /// The marker directory is created on demand and the marker is written
    /// to a temporary file first, then renamed into place, so a concurrent
    /// reader never observes a partially written marker. The resulting
    /// mtime is the freshness instant; the file content is informational.
    pub async fn mark_fresh(&self) -> SlipwayResult<()> {
        let parent = self.path.parent().ok_or_else(|| {
            SlipwayError::Internal(format!("marker path has no parent: {}", self.path.display()))
        })?;

        fs::create_dir_all(parent)
            .await
            .map_err(|e| self.write_err(e))?;

        let tmp = parent.join(format!(".fresh.{}", uuid::Uuid::new_v4()));
        let content = format!("built at {}\n", Utc::now().to_rfc3339());
        fs::write(&tmp, content)
            .await
            .map_err(|e| self.write_err(e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.write_err(e))?;

        debug!("Marked fresh: {}", self.path.display());
        Ok(())
    }

    fn write_err(&self, source: std::io::Error) -> SlipwayError {
        SlipwayError::MarkerWriteFailure {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn recipe_in(dir: &Path) -> BuildRecipe {
        let recipe_file = dir.join("slipway.toml");
        let manifest = dir.join("main.txt");
        std_fs::write(&recipe_file, "[build]\n").unwrap();
        std_fs::write(&manifest, "pkg==1.0\n").unwrap();
        BuildRecipe::new(recipe_file, vec![manifest])
    }

    fn set_mtime(path: &Path, secs_after_epoch: i64) {
        filetime::set_file_mtime(path, FileTime::from_unix_time(secs_after_epoch, 0)).unwrap();
    }

    #[tokio::test]
    async fn stale_when_marker_missing() {
        let dir = TempDir::new().unwrap();
        let recipe = recipe_in(dir.path());
        let marker = StalenessMarker::new(dir.path().join(".slipway/fresh"));

        assert!(!marker.exists());
        assert!(marker.is_stale(&recipe));
    }

    #[tokio::test]
    async fn fresh_after_mark() {
        let dir = TempDir::new().unwrap();
        let recipe = recipe_in(dir.path());
        let marker = StalenessMarker::new(dir.path().join(".slipway/fresh"));

        marker.mark_fresh().await.unwrap();

        assert!(marker.exists());
        assert!(!marker.is_stale(&recipe));
    }

    #[tokio::test]
    async fn stale_when_input_newer_than_marker() {
        let dir = TempDir::new().unwrap();
        let recipe = recipe_in(dir.path());
        let marker = StalenessMarker::new(dir.path().join(".slipway/fresh"));

        marker.mark_fresh().await.unwrap();

        // Push the manifest's mtime past the marker's
        set_mtime(marker.path(), 1_000_000);
        set_mtime(&recipe.inputs[0], 1_000_010);
        set_mtime(&recipe.recipe_file, 999_990);

        assert!(marker.is_stale(&recipe));
    }

    #[tokio::test]
    async fn stale_when_recipe_file_newer_than_marker() {
        let dir = TempDir::new().unwrap();
        let recipe = recipe_in(dir.path());
        let marker = StalenessMarker::new(dir.path().join(".slipway/fresh"));

        marker.mark_fresh().await.unwrap();

        set_mtime(marker.path(), 1_000_000);
        set_mtime(&recipe.inputs[0], 999_990);
        set_mtime(&recipe.recipe_file, 1_000_010);

        assert!(marker.is_stale(&recipe));
    }

    #[tokio::test]
    async fn fresh_when_all_inputs_older() {
        let dir = TempDir::new().unwrap();
        let recipe = recipe_in(dir.path());
        let marker = StalenessMarker::new(dir.path().join(".slipway/fresh"));

        marker.mark_fresh().await.unwrap();

        set_mtime(marker.path(), 1_000_000);
        set_mtime(&recipe.inputs[0], 999_000);
        set_mtime(&recipe.recipe_file, 999_000);

        assert!(!marker.is_stale(&recipe));
    }

    #[tokio::test]
    async fn equal_mtime_is_not_stale() {
        // Strictly newer invalidates; equal does not
        let dir = TempDir::new().unwrap();
        let recipe = recipe_in(dir.path());
        let marker = StalenessMarker::new(dir.path().join(".slipway/fresh"));

        marker.mark_fresh().await.unwrap();

        set_mtime(marker.path(), 1_000_000);
        set_mtime(&recipe.inputs[0], 1_000_000);
        set_mtime(&recipe.recipe_file, 1_000_000);

        assert!(!marker.is_stale(&recipe));
    }

    #[tokio::test]
    async fn missing_input_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut recipe = recipe_in(dir.path());
        recipe.inputs.push(dir.path().join("dev.txt"));
        let marker = StalenessMarker::new(dir.path().join(".slipway/fresh"));

        marker.mark_fresh().await.unwrap();
        set_mtime(marker.path(), 1_000_000);
        set_mtime(&recipe.inputs[0], 999_000);
        set_mtime(&recipe.recipe_file, 999_000);

        assert!(!marker.is_stale(&recipe));
    }

    #[tokio::test]
    async fn mark_fresh_creates_state_dir() {
        let dir = TempDir::new().unwrap();
        let marker = StalenessMarker::new(dir.path().join(".slipway/nested/fresh"));

        marker.mark_fresh().await.unwrap();
        assert!(marker.exists());
    }

    #[tokio::test]
    async fn mark_fresh_overwrites_previous_marker() {
        let dir = TempDir::new().unwrap();
        let marker = StalenessMarker::new(dir.path().join(".slipway/fresh"));

        marker.mark_fresh().await.unwrap();
        set_mtime(marker.path(), 1_000_000);
        let before = marker.modified().unwrap();

        marker.mark_fresh().await.unwrap();
        assert!(marker.modified().unwrap() > before);
    }

    #[tokio::test]
    async fn deleting_marker_forces_stale() {
        let dir = TempDir::new().unwrap();
        let recipe = recipe_in(dir.path());
        let marker = StalenessMarker::new(dir.path().join(".slipway/fresh"));

        marker.mark_fresh().await.unwrap();
        assert!(!marker.is_stale(&recipe));

        std_fs::remove_file(marker.path()).unwrap();
        assert!(marker.is_stale(&recipe));
    }

    #[tokio::test]
    async fn built_at_reports_timestamp() {
        let dir = TempDir::new().unwrap();
        let marker = StalenessMarker::new(dir.path().join(".slipway/fresh"));

        assert!(marker.built_at().is_none());
        marker.mark_fresh().await.unwrap();
        assert!(marker.built_at().is_some());
    }
}
