mod backup;
mod classinfo;
mod config;
mod csv;
mod ipc;
mod records;
mod report;
mod roster;
mod status;
mod workspace;

use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_filter: &str) {
    // stdout carries the IPC channel; logs go to stderr.
    let filter = EnvFilter::try_from_env(config::LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let config = match config::AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("attendanced: {e}");
            std::process::exit(2);
        }
    };
    init_tracing(&config.log.filter);

    let mut state = ipc::AppState::new(config);
    if let Some(path) = state.config.workspace.clone() {
        match workspace::Workspace::open(&path, &state.config.class.default_name) {
            Ok(ws) => state.workspace = Some(ws),
            Err(e) => tracing::warn!(
                workspace = %path.display(),
                error = %format!("{e:#}"),
                "configured workspace could not be opened"
            ),
        }
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "attendanced ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                tracing::warn!(error = %e, "unparseable request line");
                let _ = writeln!(stdout, "{}", ipc::bad_json(e.to_string()));
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
