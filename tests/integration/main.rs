//! Integration tests for binfetch

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn binfetch() -> Command {
        cargo_bin_cmd!("binfetch")
    }

    /// Config pinning the platform so keys are the same on every host
    fn write_config(dir: &Path) -> PathBuf {
        let path = dir.join("config.toml");
        fs::write(
            &path,
            r#"
                [platform]
                os_version_name = "Big Sur"
                ios_version = "14.2"

                [index]
                api_base = "http://127.0.0.1:9/v2/latest"
            "#,
        )
        .unwrap();
        path
    }

    #[test]
    fn help_displays() {
        binfetch()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("prebuilt layout test"));
    }

    #[test]
    fn version_displays() {
        binfetch()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("binfetch"));
    }

    #[test]
    fn key_for_mac() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["key", "mac", "X86_64", "Release"])
            .assert()
            .success()
            .stdout("mac-bigsur-x86_64-release\n");
    }

    #[test]
    fn key_for_ios_simulator() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["key", "ios-simulator", "x86_64", "debug"])
            .assert()
            .success()
            .stdout("ios-simulator-14-x86_64-debug\n");
    }

    #[test]
    fn unsupported_port_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["key", "gtk", "x86_64", "release"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not currently supported"));
    }

    #[test]
    fn fetch_unsupported_port_reported_before_checkout() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        binfetch()
            .current_dir(temp.path())
            .arg("--config")
            .arg(&config)
            .args(["fetch", "gtk", "x86_64", "release"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not currently supported"))
            .stderr(predicate::str::contains("No WebKit checkout").not())
            .stderr(predicate::str::contains("Latest revision is downloaded").not());
    }

    #[test]
    fn fetch_rejects_path_revision() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["--quiet", "fetch", "mac", "x86_64", "release", "--revision", "../other"])
            .arg("--checkout")
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("not a valid cache directory name"));
    }

    #[test]
    fn fetch_cached_revision_prints_path() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        let cached = temp
            .path()
            .join("WebKitBuild/downloaded_binaries/mac-bigsur-x86_64-release/271234");
        fs::create_dir_all(&cached).unwrap();

        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["--quiet", "fetch", "mac", "x86_64", "release", "--revision", "271234"])
            .arg("--checkout")
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("271234"));
    }

    #[test]
    fn fetch_unreachable_index_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());

        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["--quiet", "fetch", "mac", "x86_64", "release", "--revision", "1"])
            .arg("--checkout")
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Download failed"));
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["cache", "list", "--checkout"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("No downloaded binaries"));
    }

    #[test]
    fn cache_list_json() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        let key_dir = temp
            .path()
            .join("WebKitBuild/downloaded_binaries/mac-bigsur-x86_64-release");
        fs::create_dir_all(key_dir.join("271234")).unwrap();
        fs::create_dir_all(key_dir.join(".271300.abc.tmp")).unwrap();

        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["cache", "list", "--format", "json", "--checkout"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("\"revision\": \"271234\""))
            .stdout(predicate::str::contains("271300").not());
    }

    #[test]
    fn cache_dir_without_checkout_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        binfetch()
            .current_dir(temp.path())
            .arg("--config")
            .arg(&config)
            .args(["cache", "dir"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No WebKit checkout found"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("custom.toml");
        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[index]"))
            .stdout(predicate::str::contains("Big Sur"));
    }

    #[test]
    fn config_set_persists() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        binfetch()
            .arg("--config")
            .arg(&config)
            .args(["--quiet", "config", "set", "index.latest_download_source", "s3-url"])
            .assert()
            .success();

        let written = fs::read_to_string(&config).unwrap();
        assert!(written.contains("latest_download_source = \"s3-url\""));
    }
}
