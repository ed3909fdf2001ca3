use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Run the CLI binary with an isolated HOME and explicit token file.
pub fn run_cli_with_env(args: &[&str], home: &Path, api_url: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rxstorage"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env("RXSTORAGE_API_URL", api_url);
    cmd.env("RXSTORAGE_TOKEN_FILE", token_file(home));
    cmd.env_remove("RXSTORAGE_ISSUER");
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI off the async runtime so a mock server can keep serving.
pub async fn run_cli(args: &[&str], home: &Path, api_url: &str) -> Output {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let home = home.to_path_buf();
    let api_url = api_url.to_string();

    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_cli_with_env(&args, &home, &api_url)
    })
    .await
    .expect("CLI task panicked")
}

/// Run the CLI and expect success, returning stdout.
pub async fn run_cli_success(args: &[&str], home: &Path, api_url: &str) -> String {
    let output = run_cli(args, home, api_url).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn token_file(home: &Path) -> PathBuf {
    home.join("tokens.json")
}

pub fn read_tokens(home: &Path) -> serde_json::Value {
    let json = std::fs::read_to_string(token_file(home)).expect("token file exists");
    serde_json::from_str(&json).expect("token file is JSON")
}
