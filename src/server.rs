//! Server bootstrap and request dispatch.
//!
//! One listener per process: [`ServerState`] guards the start sequence with
//! an atomic check-and-set, and [`start`] blocks in `axum::serve` for the
//! rest of the process lifetime once the bind succeeds. Everything between
//! accept and handler is delegated to axum/tokio; this module only decides
//! which handler a request belongs to.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Response};
use log::{error, info, warn};
use tokio::net::TcpListener;

use crate::config::ResolvedConfig;
use crate::engine::{EngineConfig, EngineEntry, EngineRequest, EngineResponse, ScriptEngine};
use crate::error::StartError;
use crate::html::PLACEHOLDER_PAGE;
use crate::params::ParameterMap;
use crate::routes::{self, RouteTarget};

/// Single-start guard, owned by the caller and shared with any task that
/// wants to observe or attempt a start.
pub struct ServerState {
    started: AtomicBool,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Atomically claims the start sequence. Only one caller ever wins.
    fn try_begin(&self) -> bool {
        self.started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Undoes the claim after a failed bootstrap so the caller may retry.
    fn reset(&self) {
        self.started.store(false, Ordering::SeqCst);
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Starts the HTTP container and blocks until it is externally stopped.
///
/// Returns [`StartError::AlreadyStarted`] without side effects when the
/// guard is already claimed; any other error leaves the guard released.
pub async fn start(
    state: &ServerState,
    config: &ResolvedConfig,
    engine: Arc<dyn ScriptEngine>,
) -> Result<(), StartError> {
    if !state.try_begin() {
        return Err(StartError::AlreadyStarted);
    }
    let listener = match bootstrap(config, &engine).await {
        Ok(listener) => listener,
        Err(e) => {
            state.reset();
            return Err(e);
        }
    };

    let app = router(engine).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app).await.map_err(StartError::Serve)
}

/// Everything that must succeed before the process commits to serving.
async fn bootstrap(
    config: &ResolvedConfig,
    engine: &Arc<dyn ScriptEngine>,
) -> Result<TcpListener, StartError> {
    let port = parse_port(&config.port)?;

    // Informational only; must never fail or influence path resolution.
    info!("Application root: {}", app_root().display());

    let base_dir = create_base_dir(&config.temp_dir_prefix)?;
    info!("Temporary base directory: {}", base_dir.display());

    engine.init(&EngineConfig {
        web_directory: config.web_inf(),
        server_root: config.server_root(),
    });

    let listener = bind(port).await?;
    info!("Listening port: {port}");
    Ok(listener)
}

fn parse_port(value: &str) -> Result<u16, StartError> {
    match value.parse::<u16>() {
        Ok(0) | Err(_) => Err(StartError::InvalidPort(value.to_owned())),
        Ok(port) => Ok(port),
    }
}

/// Directory the build tree hangs off when running out of `target/`, else
/// the current working directory. Logged once and otherwise unused.
fn app_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| {
            exe.ancestors()
                .find(|dir| dir.file_name().is_some_and(|name| name == "target"))
                .and_then(Path::parent)
                .map(Path::to_path_buf)
        })
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Creates the uniquely-named working directory the container runs out of.
/// Deliberately kept on disk; a failed or stopped server leaves it behind.
fn create_base_dir(prefix: &str) -> Result<PathBuf, StartError> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map(tempfile::TempDir::keep)
        .map_err(StartError::BaseDir)
}

async fn bind(port: u16) -> Result<TcpListener, StartError> {
    match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => Err(StartError::PortInUse(port)),
        Err(e) => Err(StartError::Bind(e)),
    }
}

/// The whole routing decision lives in the fallback: the table in `routes`
/// picks the handler, so "no route matched" is what selects the placeholder.
pub(crate) fn router(engine: Arc<dyn ScriptEngine>) -> Router {
    Router::new().fallback(dispatch).with_state(engine)
}

async fn dispatch(
    State(engine): State<Arc<dyn ScriptEngine>>,
    ConnectInfo(origin): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let path = request.uri().path().to_owned();
    let entry = match routes::resolve_target(&path) {
        RouteTarget::Placeholder => return placeholder(),
        RouteTarget::Admin => {
            if !is_loopback_origin(origin.ip()) {
                warn!("denied admin request for {path} from non-loopback origin {origin}");
                return (StatusCode::FORBIDDEN, "Forbidden\n").into_response();
            }
            EngineEntry::Admin
        }
        RouteTarget::Rest => EngineEntry::Rest,
        RouteTarget::Page => EngineEntry::Page,
    };

    let engine_request = EngineRequest {
        entry,
        method: request.method().to_string(),
        path: path.clone(),
        params: ParameterMap::from_uri(request.uri()),
    };
    match engine.handle(engine_request) {
        Ok(response) => engine_response(response),
        Err(e) => {
            // Isolated to this request; the listener and other requests
            // keep going.
            error!("script engine failed on {path}: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Static page for anything no route claimed. Stateless, so unbounded
/// concurrent invocation needs no coordination.
fn placeholder() -> Response {
    Html(PLACEHOLDER_PAGE).into_response()
}

fn engine_response(response: EngineResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(CONTENT_TYPE, response.content_type)], response.body).into_response()
}

/// 127.0.0.0/8 and ::1, including the v4-mapped form dual-stack listeners
/// report.
pub(crate) fn is_loopback_origin(ip: IpAddr) -> bool {
    ip.to_canonical().is_loopback()
}
