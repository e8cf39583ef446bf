//! Chrome Collect service: JSON-RPC over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.save", "params":{"url":"...","html":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Started with `--update-pid=<pid> --update-target=<path>`, the process instead
//! acts as the updater that replaces `<path>` once `<pid>` has exited.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use chrome_collect::app::App;
use chrome_collect::rpc_handler::handle_method;
use chrome_collect::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use chrome_collect::services::update_coordinator::{
    parse_launch_mode, run_updater, HandoffTiming, SystemProbe,
};
use chrome_collect::types::settings::ServiceSettings;
use chrome_collect::types::update::LaunchMode;

use serde_json::{json, Value};
use tracing::{error, info, warn};

/// Logs go to stderr; stdout carries the protocol.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn respond(out: &mut impl Write, value: &Value) -> io::Result<()> {
    writeln!(out, "{}", value)?;
    out.flush()
}

fn load_settings() -> ServiceSettings {
    let mut engine = SettingsEngine::new(None);
    match engine.load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %engine.get_config_path().display(), error = %e, "Using default settings");
            ServiceSettings::default()
        }
    }
}

fn run_updater_mode(pid: u32, target: &std::path::Path) {
    info!(pid, target = %target.display(), "Starting in updater mode");
    if let Err(e) = run_updater(pid, target, &SystemProbe, &HandoffTiming::default()) {
        error!(error = %e, "Update failed");
        std::process::exit(1);
    }
}

fn main() {
    init_logging();

    let args = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned());
    if let LaunchMode::Updater { pid, target } = parse_launch_mode(args) {
        run_updater_mode(pid, &target);
        return;
    }

    let app = match App::open(load_settings()) {
        Ok(app) => Arc::new(app),
        Err(e) => {
            error!(error = %e, "Startup failed");
            std::process::exit(1);
        }
    };
    if let Err(e) = app.startup() {
        error!(error = %e, "Startup failed");
        std::process::exit(1);
    }
    app.set_handoff_hook(Arc::new(|| {
        info!("Updater launched, shutting down");
        std::process::exit(0);
    }));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let ready = json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")});
    if respond(&mut out, &ready).is_err() {
        return;
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(req) => {
                let id = req.get("id").cloned().unwrap_or(Value::Null);
                let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                let params = req.get("params").cloned().unwrap_or(json!({}));
                match handle_method(&app, method, &params) {
                    Ok(val) => json!({"id": id, "result": val}),
                    Err(err) => json!({"id": id, "error": err}),
                }
            }
            Err(e) => json!({"id": null, "error": format!("parse error: {}", e)}),
        };
        if respond(&mut out, &response).is_err() {
            break;
        }
    }
    info!("Input closed, exiting");
}
