//! End-to-end tests driving the `natlib` binary against a temporary home.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test context with an isolated natlib home and a resource directory
struct TestContext {
    temp_dir: TempDir,
    natlib_home: PathBuf,
    resources: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let natlib_home = temp_dir.path().join(".natlib");
        let resources = temp_dir.path().join("resources");
        std::fs::create_dir_all(&resources).expect("failed to create resources dir");
        Self {
            temp_dir,
            natlib_home,
            resources,
        }
    }

    fn resource(&self, path: &str, bytes: &[u8]) {
        let path = self.resources.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    fn lib_root(&self) -> PathBuf {
        self.natlib_home.join("lib")
    }

    fn natlib_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_natlib");
        let mut cmd = Command::new(bin_path);
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("NATLIB_HOME", &self.natlib_home);
        cmd.env_remove("NATLIB_RESOURCES");
        cmd.env_remove("RUST_LOG");
        cmd.arg("--resources").arg(&self.resources);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.natlib_cmd()
            .args(args)
            .output()
            .expect("failed to run natlib")
    }

    /// Run with a fixed platform so results don't depend on the host
    fn run_linux(&self, args: &[&str]) -> Output {
        self.natlib_cmd()
            .args(["--os", "linux", "--arch", "x64"])
            .args(args)
            .output()
            .expect("failed to run natlib")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    assert!(ctx.run(&["--version"]).status.success());
}

#[test]
fn test_name_for_selected_platform() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--os", "windows", "--arch", "arm64", "name", "foo"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "foo-arm64.dll");

    let output = ctx.run(&["--os", "linux", "--arch", "x64", "name", "foo"]);
    assert_eq!(stdout(&output).trim(), "libfoo.so");
}

#[test]
fn test_name_all_platforms() {
    let ctx = TestContext::new();
    let output = ctx.run(&["name", "--all", "foo"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert_eq!(out.lines().count(), 6);
    for expected in [
        "foo.dll",
        "foo-arm64.dll",
        "libfoo.dylib",
        "libfoo-arm64.dylib",
        "libfoo.so",
        "libfoo-arm64.so",
    ] {
        assert!(
            out.lines().any(|line| line.ends_with(&format!(" {expected}"))),
            "missing {expected} in:\n{out}"
        );
    }

    // Filenames start in one column
    let columns: Vec<usize> = out.lines().map(|line| line.rfind(' ').unwrap()).collect();
    assert!(columns.iter().all(|&c| c == columns[0]), "unaligned:\n{out}");
}

#[test]
fn test_unknown_os_is_rejected() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--os", "solaris", "--arch", "x64", "name", "foo"]);
    assert!(!output.status.success());
}

#[test]
fn test_extract_writes_content_addressed_file() {
    let ctx = TestContext::new();
    ctx.resource("org/demo/libdemo.so", b"demo library");
    ctx.resource("org/demo/libdep.so", b"dependency");

    let output = ctx.run_linux(&["extract", "org.demo", "demo", "dep"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let path = PathBuf::from(stdout(&output).trim());
    assert_eq!(path.file_name().unwrap(), "libdemo.so");
    assert!(path.starts_with(ctx.lib_root().join("org").join("demo")));
    assert_eq!(std::fs::read(&path).unwrap(), b"demo library");
    assert_eq!(
        std::fs::read(path.with_file_name("libdep.so")).unwrap(),
        b"dependency"
    );
}

#[test]
fn test_hash_matches_extract_directory() {
    let ctx = TestContext::new();
    ctx.resource("org/demo/demo.bin", b"raw bytes");

    let root = ctx.temp_dir.path().join("cache");
    let root = root.to_str().unwrap();
    let hash_args = ["--root", root, "hash", "--raw", "org.demo", "demo.bin"];
    let first = ctx.run_linux(&hash_args);
    assert!(first.status.success());
    let second = ctx.run_linux(&hash_args);
    assert_eq!(stdout(&first), stdout(&second));

    let line = stdout(&first);
    let (digest, dir) = line.trim().split_once(' ').unwrap();
    assert_eq!(digest.len(), 64);
    assert!(Path::new(dir).ends_with(digest));

    let extracted = ctx.run_linux(&["--root", root, "extract", "--raw", "org.demo", "demo.bin"]);
    assert!(extracted.status.success());
    assert_eq!(
        PathBuf::from(stdout(&extracted).trim()),
        Path::new(dir).join("demo.bin")
    );
}

#[test]
fn test_extract_missing_resource_fails() {
    let ctx = TestContext::new();
    let output = ctx.run_linux(&["extract", "--raw", "org.demo", "absent.so"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.so"));
}

#[test]
fn test_load_missing_resource_fails() {
    let ctx = TestContext::new();
    let output = ctx.run_linux(&["load", "org.demo", "demo"]);
    assert!(!output.status.success());
    assert!(!ctx.lib_root().join("org").join("demo").exists());
}

#[test]
fn test_load_manifest_without_entries_for_platform_fails() {
    let ctx = TestContext::new();
    let manifest = ctx.temp_dir.path().join("natlib.toml");
    std::fs::write(
        &manifest,
        r#"
package = "org.demo"

[[platform]]
os = "windows"
arch = "x64"
libraries = [{ library = "demo.dll" }]
"#,
    )
    .unwrap();

    let output = ctx.run_linux(&["load", "--manifest", manifest.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_clean_dry_run_keeps_files() {
    let ctx = TestContext::new();
    ctx.resource("pkg/a.bin", b"a");
    assert!(ctx.run_linux(&["extract", "--raw", "pkg", "a.bin"]).status.success());
    assert!(ctx.lib_root().exists());

    let output = ctx.run_linux(&["clean", "--dry-run"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Would remove"));
    assert!(ctx.lib_root().exists());

    assert!(ctx.run_linux(&["clean"]).status.success());
    assert!(!ctx.lib_root().exists());
}

#[test]
fn test_completions_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("natlib"));
}
