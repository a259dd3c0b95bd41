use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn cache_path(&self) -> PathBuf {
        self.xdg_data.join("rivalscope/cache.db")
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str], extra_env: &[(&str, String)]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("rivalscope"));

    let mut command = Command::new(bin_path);
    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state);
    for (key, value) in extra_env {
        command.env(key, value);
    }

    command
        .output()
        .unwrap_or_else(|e| panic!("failed to execute rivalscope: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "rivalscope {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        output.status,
        stdout,
        stderr
    );
}

#[test]
fn help_lists_subcommands() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["--help"], &[]);
    assert_success(&["--help"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("health"), "missing health in:\n{stdout}");
    assert!(
        stdout.contains("clear-cache"),
        "missing clear-cache in:\n{stdout}"
    );
}

#[test]
fn clear_cache_initializes_store_and_reports_counts() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["clear-cache"], &[]);
    assert_success(&["clear-cache"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("cleared 0 signal entries, 0 run entries"),
        "expected empty-cache summary, got:\n{stdout}"
    );
    assert!(
        env.cache_path().exists(),
        "cache store should exist at {}",
        env.cache_path().display()
    );
}

#[test]
fn health_succeeds_against_live_backend() {
    let env = CliTestEnv::new();

    // Keep the runtime alive so the mock server serves the child process
    let runtime = tokio::runtime::Runtime::new().expect("failed to create runtime");
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    });

    let output = run_bin(
        &env,
        &["health"],
        &[("RIVALSCOPE_API_URL", server.uri())],
    );
    assert_success(&["health"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("backend reachable"),
        "expected reachable summary, got:\n{stdout}"
    );
}

#[test]
fn env_url_overrides_config_file() {
    let env = CliTestEnv::new();

    // Config file points somewhere dead; the env var should win.
    let config_dir = env.xdg_config.join("rivalscope");
    fs::create_dir_all(&config_dir).expect("failed to create config dir");
    fs::write(
        config_dir.join("config.toml"),
        "[api]\nbase_url = \"http://127.0.0.1:1\"\n",
    )
    .expect("failed to write config file");

    let runtime = tokio::runtime::Runtime::new().expect("failed to create runtime");
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    });

    let output = run_bin(
        &env,
        &["health"],
        &[("RIVALSCOPE_API_URL", server.uri())],
    );
    assert_success(&["health"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(&server.uri()),
        "expected the resolved URL {} in:\n{stdout}",
        server.uri()
    );
}

#[test]
fn health_fails_when_backend_reports_unhealthy() {
    let env = CliTestEnv::new();

    let runtime = tokio::runtime::Runtime::new().expect("failed to create runtime");
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    });

    let output = run_bin(
        &env,
        &["health"],
        &[("RIVALSCOPE_API_URL", server.uri())],
    );
    assert!(
        !output.status.success(),
        "health should exit nonzero against an unhealthy backend"
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("backend unreachable"),
        "expected unreachable summary, got:\n{stdout}"
    );
}
