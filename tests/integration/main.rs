//! Integration tests for the slipway CLI

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// A slipway command isolated from the developer's real config and
    /// from any project file above the temp directory
    fn slipway(project: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("slipway");
        cmd.current_dir(project.path())
            .env("SLIPWAY_CONFIG", project.path().join("no-global.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        slipway(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "incremental build and serve orchestrator",
            ));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        slipway(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("slipway"));
    }

    #[test]
    fn init_creates_project_config() {
        let temp = TempDir::new().unwrap();
        slipway(&temp)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Created project config"));

        let content = std::fs::read_to_string(temp.path().join("slipway.toml")).unwrap();
        assert!(content.contains("[[service]]"));
    }

    #[test]
    fn init_refuses_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("slipway.toml"), "existing").unwrap();

        slipway(&temp)
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn config_path_points_at_global_config() {
        let temp = TempDir::new().unwrap();
        slipway(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_prints_merged_config() {
        let temp = TempDir::new().unwrap();
        slipway(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[build]"))
            .stdout(predicate::str::contains("[[service]]"));
    }

    #[test]
    fn config_show_reflects_project_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("slipway.toml"),
            "[build]\nimage_prefix = \"myapp\"\n",
        )
        .unwrap();

        slipway(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("image_prefix = \"myapp\""));
    }

    #[test]
    fn build_unknown_service_fails() {
        let temp = TempDir::new().unwrap();
        slipway(&temp)
            .args(["build", "--service", "ghost"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown service"));
    }

    #[test]
    fn status_runs_without_a_project() {
        let temp = TempDir::new().unwrap();
        slipway(&temp)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Slipway Status"))
            .stdout(predicate::str::contains("never built"));
    }

    #[test]
    fn status_json_output() {
        let temp = TempDir::new().unwrap();
        slipway(&temp)
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"marker\""))
            .stdout(predicate::str::contains("\"services\""));
    }

    #[test]
    fn invalid_project_config_fails_with_location() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("slipway.toml"), "build = \"nope\"\n").unwrap();

        slipway(&temp)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
