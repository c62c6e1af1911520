use std::collections::BTreeMap;

use serde::Serialize;
use waywire_transport::config::{DISPLAY_ENV, HOME_ENV, RUNTIME_DIR_ENV};
use waywire_transport::SocketConfig;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

const SOCKET_OVERRIDE_ENV: &str = "WAYWIRE_SOCKET";

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct SocketInfo {
    display: String,
    path: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    version: String,
    target: String,
    rust_version: String,
    git_hash: String,
    platform: PlatformInfo,
    features: Vec<String>,
    dependencies: BTreeMap<String, String>,
    socket: SocketInfo,
    environment: BTreeMap<String, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut deps = BTreeMap::new();
    deps.insert("clap".to_string(), "4.5".to_string());
    deps.insert("minijinja".to_string(), "2".to_string());
    deps.insert("roxmltree".to_string(), "0.20".to_string());

    let mut env = BTreeMap::new();
    for key in [
        RUNTIME_DIR_ENV,
        HOME_ENV,
        DISPLAY_ENV,
        SOCKET_OVERRIDE_ENV,
        "RUST_LOG",
    ] {
        env.insert(key.to_string(), std::env::var(key).ok());
    }

    let output = EnvInfoOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: target_triple(),
        rust_version: option_env!("RUSTC_VERSION")
            .unwrap_or("unknown")
            .to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        features: active_features(),
        dependencies: deps,
        socket: socket_info(&SocketConfig::from_env()),
        environment: env,
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn socket_info(config: &SocketConfig) -> SocketInfo {
    let display = config.display_name().to_string_lossy().into_owned();
    match config.resolve() {
        Ok(path) => SocketInfo {
            display,
            path: Some(path.display().to_string()),
            error: None,
        },
        Err(err) => SocketInfo {
            display,
            path: None,
            error: Some(err.to_string()),
        },
    }
}

fn target_triple() -> String {
    if let Some(target) = option_env!("WAYWIRE_BUILD_TARGET") {
        return target.to_string();
    }

    match (std::env::consts::ARCH, std::env::consts::OS) {
        ("aarch64", "macos") => "aarch64-apple-darwin".to_string(),
        ("x86_64", "macos") => "x86_64-apple-darwin".to_string(),
        ("aarch64", "linux") => "aarch64-unknown-linux-gnu".to_string(),
        ("x86_64", "linux") => "x86_64-unknown-linux-gnu".to_string(),
        (arch, os) => format!("{arch}-unknown-{os}"),
    }
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("waywire environment\n");
            println!("  Version:    {}", output.version);
            println!("  Target:     {}", output.target);
            println!("  Rust:       {}", output.rust_version);
            println!("  Git hash:   {}", output.git_hash);
            println!(
                "  Platform:   {} ({})",
                output.platform.os, output.platform.arch
            );
            println!("  Features:   {}", output.features.join(", "));
            println!("  Display:    {}", output.socket.display);
            match (&output.socket.path, &output.socket.error) {
                (Some(path), _) => println!("  Socket:     {path}"),
                (None, Some(err)) => println!("  Socket:     unresolved ({err})"),
                (None, None) => println!("  Socket:     unresolved"),
            }
            println!("\n  Dependencies:");
            for (k, v) in &output.dependencies {
                println!("    {:<12} {}", k, v);
            }
            println!("\n  Environment:");
            for (k, v) in &output.environment {
                println!("    {:<20} {}", k, v.as_deref().unwrap_or("(not set)"));
            }
        }
        OutputFormat::Raw => println!(
            "{}",
            output.socket.path.as_deref().unwrap_or_default()
        ),
    }
}

fn active_features() -> Vec<String> {
    let mut features = Vec::new();
    if cfg!(feature = "conn") {
        features.push("conn".to_string());
    }
    if cfg!(feature = "scanner") {
        features.push("scanner".to_string());
    }
    if cfg!(feature = "cli") {
        features.push("cli".to_string());
    }
    features
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn socket_info_reports_resolved_path() {
        let config = SocketConfig {
            runtime_dir: Some(PathBuf::from("/run/user/1000")),
            home_dir: None,
            display: Some("wayland-1".into()),
        };
        let info = socket_info(&config);
        assert_eq!(info.display, "wayland-1");
        assert_eq!(info.path.as_deref(), Some("/run/user/1000/wayland-1"));
        assert!(info.error.is_none());
    }

    #[test]
    fn socket_info_reports_resolution_error() {
        let config = SocketConfig {
            runtime_dir: None,
            home_dir: None,
            display: None,
        };
        let info = socket_info(&config);
        assert_eq!(info.display, "wayland-0");
        assert!(info.path.is_none());
        assert!(info.error.is_some());
    }

    #[test]
    fn target_looks_like_triple() {
        let target = target_triple();
        assert!(target.split('-').count() >= 3);
    }
}
