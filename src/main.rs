//! cfmhost entrypoint.
//!
//! Resolves the command line, then hands off to `server::start`, which
//! blocks for the rest of the process lifetime. Keep this file minimal —
//! the logic lives in the library modules.

use std::process::ExitCode;
use std::sync::Arc;

use log::error;

use cfmhost::config::{self, Resolution};
use cfmhost::engine::{Disabled, ScriptEngine};
use cfmhost::server::{self, ServerState};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match config::resolve(std::env::args()) {
        Ok(Resolution::Help(text)) => {
            print!("{text}");
            return ExitCode::SUCCESS;
        }
        Ok(Resolution::Config(config)) => config,
        Err(e) => {
            error!("{e}");
            eprintln!("run with --help for usage");
            return ExitCode::from(2);
        }
    };

    let state = ServerState::new();
    let engine: Arc<dyn ScriptEngine> = Arc::new(Disabled);
    match server::start(&state, &config, engine).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
