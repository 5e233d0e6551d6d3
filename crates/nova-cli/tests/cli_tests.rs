//! CLI integration tests
//!
//! None of these reach a compiler or the network: every scenario fails or
//! exits before toolchain discovery.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn nova_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nova").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("NOVA_TARGET")
        .env_remove("NOVA_JOBS")
        .env_remove("NOVA_OPT_LEVEL")
        .env_remove("NOVA_LOG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// A directory that looks like a Nova Physics checkout
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::create_dir_all(dir.path().join("include")).unwrap();
    fs::write(dir.path().join("src/body.c"), "int nv_body(void) { return 0; }\n").unwrap();
    dir
}

mod help_messages {
    use super::*;

    #[test]
    fn test_main_help_shows_all_commands() {
        let dir = TempDir::new().unwrap();
        nova_cmd(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build"))
            .stdout(predicate::str::contains("examples"))
            .stdout(predicate::str::contains("bench"))
            .stdout(predicate::str::contains("tests"))
            .stdout(predicate::str::contains("deps"));
    }

    #[test]
    fn test_main_help_shows_environment_variables() {
        let dir = TempDir::new().unwrap();
        nova_cmd(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("ENVIRONMENT VARIABLES"))
            .stdout(predicate::str::contains("NOVA_TARGET"))
            .stdout(predicate::str::contains("NOVA_JOBS"));
    }

    #[test]
    fn test_example_alias_help() {
        let dir = TempDir::new().unwrap();
        nova_cmd(dir.path())
            .args(["example", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("SDL2"));
    }

    #[test]
    fn test_build_help_shows_global_flags() {
        let dir = TempDir::new().unwrap();
        nova_cmd(dir.path())
            .args(["build", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--opt-level"))
            .stdout(predicate::str::contains("--force-deps"))
            .stdout(predicate::str::contains("--enable-tracy"));
    }
}

mod flag_validation {
    use super::*;

    #[test]
    fn test_opt_level_out_of_range() {
        let dir = project();
        nova_cmd(dir.path())
            .args(["build", "-O", "4"])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("4"));
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let dir = project();
        nova_cmd(dir.path())
            .args(["build", "-j", "0"])
            .assert()
            .failure()
            .code(2);
    }

    #[test]
    fn test_bench_requires_name() {
        let dir = project();
        nova_cmd(dir.path()).arg("bench").assert().failure().code(2);
    }

    #[test]
    fn test_invalid_env_target_is_fatal() {
        let dir = project();
        nova_cmd(dir.path())
            .env("NOVA_TARGET", "clang")
            .arg("build")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("FAIL"));
    }
}

mod project_checks {
    use super::*;

    #[test]
    fn test_outside_project_root_fails() {
        let dir = TempDir::new().unwrap();
        nova_cmd(dir.path())
            .arg("build")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("project root"));
    }

    #[test]
    fn test_missing_benchmark() {
        let dir = project();
        nova_cmd(dir.path())
            .args(["bench", "boxes"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("boxes.c"))
            .stderr(predicate::str::contains("is not found"));
    }

    #[test]
    fn test_missing_test_suite() {
        let dir = project();
        nova_cmd(dir.path())
            .arg("tests")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("tests.c"));
    }

    #[test]
    fn test_invalid_project_config() {
        let dir = project();
        fs::write(dir.path().join("nova.toml"), "[build]\nopt_level = 7\n").unwrap();
        nova_cmd(dir.path())
            .arg("build")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Failed to load configuration"));
    }

    #[test]
    fn test_clear_removes_cache_before_failing() {
        let dir = project();
        let cache = dir.path().join("cache");
        fs::create_dir_all(cache.join("obj")).unwrap();
        fs::write(cache.join("sources.json"), "{}").unwrap();

        nova_cmd(dir.path())
            .args(["--clear", "bench", "missing"])
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("Cleared the build cache"));

        assert!(!cache.exists());
    }

    #[test]
    fn test_quiet_hides_info_lines() {
        let dir = project();
        fs::create_dir_all(dir.path().join("cache")).unwrap();

        nova_cmd(dir.path())
            .args(["-q", "--clear", "bench", "missing"])
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("FAIL"));
    }
}
