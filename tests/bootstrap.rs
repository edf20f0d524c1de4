//! End-to-end tests: a real listener on an ephemeral port, exercised with
//! raw HTTP/1.1 over tokio sockets.

use std::net::TcpListener as StdTcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use cfmhost::config::ResolvedConfig;
use cfmhost::engine::{
    EngineConfig, EngineError, EngineRequest, EngineResponse, ScriptEngine,
};
use cfmhost::error::StartError;
use cfmhost::html::PLACEHOLDER_PAGE;
use cfmhost::server::{self, ServerState};

/// Engine double that records its init parameters and echoes each request.
#[derive(Default)]
struct EchoEngine {
    init: Mutex<Option<EngineConfig>>,
}

impl ScriptEngine for EchoEngine {
    fn init(&self, config: &EngineConfig) {
        *self.init.lock().unwrap() = Some(config.clone());
    }

    fn handle(&self, request: EngineRequest) -> Result<EngineResponse, EngineError> {
        Ok(EngineResponse {
            status: 200,
            content_type: "text/plain".into(),
            body: format!("{:?} {} {}", request.entry, request.method, request.path)
                .into_bytes(),
        })
    }
}

fn free_port() -> u16 {
    StdTcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral")
        .local_addr()
        .expect("local addr")
        .port()
}

fn test_config(port: u16, root: &Path) -> ResolvedConfig {
    ResolvedConfig {
        port: port.to_string(),
        temp_dir_prefix: "cfmhost-e2e".into(),
        web_app_root: root.to_path_buf(),
    }
}

/// Spawns the blocking server and waits until the guard reports started.
async fn spawn_server(engine: Arc<EchoEngine>) -> (Arc<ServerState>, ResolvedConfig, u16) {
    let state = Arc::new(ServerState::new());
    let port = free_port();
    let root = tempfile::tempdir().expect("webapproot").keep();
    let config = test_config(port, &root);

    {
        let state = Arc::clone(&state);
        let config = config.clone();
        let engine = engine as Arc<dyn ScriptEngine>;
        tokio::spawn(async move {
            if let Err(e) = server::start(&state, &config, engine).await {
                panic!("server failed to start: {e}");
            }
        });
    }

    // The guard is claimed before the bind completes, so readiness is
    // "guard set and the socket accepts connections".
    for _ in 0..500 {
        if state.is_started() && TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return (state, config, port);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server did not start within 5s");
}

async fn http_get(port: u16, path: &str) -> (String, String) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.expect("connect");
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.expect("send");
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("recv");
    let text = String::from_utf8(raw).expect("utf8 response");
    let (head, body) = text.split_once("\r\n\r\n").expect("header terminator");
    let status_line = head.lines().next().expect("status line").to_owned();
    (status_line, body.to_owned())
}

#[tokio::test]
async fn routes_engine_patterns_and_placeholders_end_to_end() {
    let engine = Arc::new(EchoEngine::default());
    let (_state, config, port) = spawn_server(Arc::clone(&engine)).await;

    // Engine init got both derived paths from the configured web app root.
    let init = engine.init.lock().unwrap().clone().expect("engine initialised");
    assert_eq!(init.web_directory, config.web_app_root.join("WEB-INF"));
    assert_eq!(init.server_root, config.web_app_root.join("lucee-server"));

    let (status, body) = http_get(port, "/anything/else").await;
    assert!(status.contains("200"), "got {status}");
    assert_eq!(body, PLACEHOLDER_PAGE);

    let (status, body) = http_get(port, "/welcome.cfm").await;
    assert!(status.contains("200"), "got {status}");
    assert_eq!(body, "Page GET /welcome.cfm");

    let (status, body) = http_get(port, "/rest/api/things").await;
    assert!(status.contains("200"), "got {status}");
    assert_eq!(body, "Rest GET /rest/api/things");

    // The test client connects over loopback, so the admin gate lets it in.
    let (status, body) = http_get(port, "/lucee/admin/server.cfm").await;
    assert!(status.contains("200"), "got {status}");
    assert_eq!(body, "Admin GET /lucee/admin/server.cfm");
}

#[tokio::test]
async fn a_second_start_is_a_noop_with_no_new_listener() {
    let engine = Arc::new(EchoEngine::default());
    let (state, config, port) = spawn_server(Arc::clone(&engine)).await;

    let again = server::start(&state, &config, engine as Arc<dyn ScriptEngine>).await;
    assert!(matches!(again, Err(StartError::AlreadyStarted)));

    // The original listener still serves.
    let (status, body) = http_get(port, "/still/here").await;
    assert!(status.contains("200"), "got {status}");
    assert_eq!(body, PLACEHOLDER_PAGE);
}

#[tokio::test]
async fn a_bound_port_is_reported_as_port_in_use() {
    let engine = Arc::new(EchoEngine::default());
    let (_state, config, port) = spawn_server(Arc::clone(&engine)).await;

    let other = ServerState::new();
    let clashing = test_config(port, &config.web_app_root);
    match server::start(&other, &clashing, engine as Arc<dyn ScriptEngine>).await {
        Err(StartError::PortInUse(reported)) => assert_eq!(reported, port),
        Err(e) => panic!("wrong error: {e}"),
        Ok(()) => panic!("start unexpectedly succeeded"),
    }
    assert!(!other.is_started(), "failed bootstrap must release the guard");
}

#[tokio::test]
async fn concurrent_placeholder_requests_do_not_cross_contaminate() {
    let engine = Arc::new(EchoEngine::default());
    let (_state, _config, port) = spawn_server(engine).await;

    let mut tasks = Vec::new();
    for _ in 0..100 {
        tasks.push(tokio::spawn(http_get(port, "/anything/else")));
    }
    for task in tasks {
        let (status, body) = task.await.expect("request task");
        assert!(status.contains("200"), "got {status}");
        assert_eq!(body, PLACEHOLDER_PAGE);
    }
}
