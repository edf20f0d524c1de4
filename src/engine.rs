//! Seam between the HTTP host and the CFML script engine.
//!
//! The engine is an external collaborator: the host only knows how to hand
//! it a request and turn its answer into an HTTP response. A build without a
//! real engine linked in ships [`Disabled`], which answers 503.

use std::fmt;
use std::path::PathBuf;

use log::info;

use crate::params::ParameterMap;

/// Init parameters handed to the engine once, during bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Engine working directory, `<webapproot>/WEB-INF`.
    pub web_directory: PathBuf,
    /// Engine server root, `<webapproot>/lucee-server`.
    pub server_root: PathBuf,
}

/// Which of the engine's registrations matched the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEntry {
    Page,
    Rest,
    Admin,
}

/// One request handed to the engine. Owned, independent per invocation.
#[derive(Debug)]
pub struct EngineRequest {
    pub entry: EngineEntry,
    pub method: String,
    pub path: String,
    pub params: ParameterMap,
}

/// What the engine rendered.
#[derive(Debug)]
pub struct EngineResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Engine-side failure; logged by the dispatcher and turned into a 500 for
/// the one request concerned.
#[derive(Debug)]
pub struct EngineError(pub String);

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for EngineError {}

pub trait ScriptEngine: Send + Sync {
    /// Called once during bootstrap, before the listener starts.
    fn init(&self, config: &EngineConfig);

    /// Renders one request. Must be safe under concurrent invocation.
    fn handle(&self, request: EngineRequest) -> Result<EngineResponse, EngineError>;
}

/// Stand-in engine for builds without a CFML runtime linked in.
pub struct Disabled;

impl ScriptEngine for Disabled {
    fn init(&self, config: &EngineConfig) {
        info!(
            "script engine disabled; configured web directory {} and server root {} are unused",
            config.web_directory.display(),
            config.server_root.display()
        );
    }

    fn handle(&self, request: EngineRequest) -> Result<EngineResponse, EngineError> {
        Ok(EngineResponse {
            status: 503,
            content_type: "text/plain; charset=utf-8".to_owned(),
            body: format!(
                "No CFML engine is available to serve {} ({:?} entry).\n",
                request.path, request.entry
            )
            .into_bytes(),
        })
    }
}
