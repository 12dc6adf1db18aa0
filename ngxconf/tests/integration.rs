use std::process::{Command, Output};

/// A throwaway configuration tree
struct TestConfig {
    dir: tempfile::TempDir,
}

impl TestConfig {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn file(self, name: &str, content: &str) -> Self {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
        self
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    fn run(&self, args: &[&str]) -> Output {
        // Use the compiled binary directly
        let bin_path = env!("CARGO_BIN_EXE_ngxconf");
        Command::new(bin_path)
            .args(args)
            .arg(self.path("nginx.conf"))
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run ngxconf")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const MAIN: &str = "user nginx;\n\
                    # workers\n\
                    events {\n    worker_connections 1024;\n}\n\
                    http {\n    \
                    include mime.types;\n    \
                    include sites/*.conf;\n\
                    }\n";

fn site_tree() -> TestConfig {
    TestConfig::new()
        .file("nginx.conf", MAIN)
        .file("mime.types", "types {\n    text/html html;\n}\n")
        .file("sites/a.conf", "server {\n    listen 80;\n    root /srv/a;\n}\n")
        .file("sites/b.conf", "server {\n    listen 81;\n    proxy_pass http://b;\n}\n")
}

#[test]
fn test_prints_expanded_config() {
    let config = site_tree();
    let output = config.run(&[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let expected = "user nginx;\n\
                    # workers\n\
                    events {\n    worker_connections 1024;\n}\n\
                    http {\n    \
                    types {\n    text/html html;\n}\n\
                    \n    \
                    server {\n    listen 80;\n    root /srv/a;\n}\n\
                    server {\n    listen 81;\n    proxy_pass http://b;\n}\n\
                    \n}\n\n";
    assert_eq!(stdout(&output), expected);
}

#[test]
fn test_structure_shows_included_files() {
    let config = site_tree();
    let output = config.run(&["--structure"]);
    assert!(output.status.success());

    let out = stdout(&output);
    let markers: Vec<_> = out.lines().filter(|line| line.trim_start().starts_with("## ")).collect();
    assert_eq!(markers.len(), 4);
    assert!(markers[0].ends_with("nginx.conf;"));
    assert!(markers[1].ends_with("mime.types;"));
    assert!(markers[2].ends_with(&format!("sites{}a.conf;", std::path::MAIN_SEPARATOR)));
}

#[test]
fn test_skip_comments_and_dummy() {
    let config = site_tree();
    let output = config.run(&["-c", "-d"]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(!out.contains('#'));
    assert!(!out.contains("events"));
    assert!(!out.contains("text/html"));
    assert!(out.contains("listen 81;"));
}

#[test]
fn test_minimal() {
    let config = site_tree();
    let output = config.run(&["-m", "-c"]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("listen 80;"));
    assert!(out.contains("proxy_pass http://b;"));
    assert!(!out.contains("user"));
    assert!(!out.contains("types"));
    assert!(!out.contains("# workers"));
}

#[test]
fn test_syntax_error_in_included_file() {
    let config = TestConfig::new()
        .file("nginx.conf", "http {\n    include broken.conf;\n}\n")
        .file("broken.conf", "server {\n    listen 80\n}\n");

    let output = config.run(&[]);
    assert_eq!(output.status.code(), Some(1));

    let err = stderr(&output);
    assert!(err.contains("broken.conf"));
    assert!(err.contains("expected"));
}

#[test]
fn test_missing_include_fails() {
    let config = TestConfig::new().file("nginx.conf", "include conf.d/*.conf;\n");

    let output = config.run(&[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No files match include pattern"));
}

#[test]
fn test_missing_config_file() {
    let config = TestConfig::new();
    let output = config.run(&[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains(&config.path("nginx.conf")));
}
