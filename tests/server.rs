//! Runs the socket server on a temporary path and talks to it through the
//! crate's own client.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use lambda_calc_rpc::error::ClientError;
use lambda_calc_rpc::rpc::{
    Outcome, Response, EVALUATION_ERROR, EXPRESSION_ERROR, INVALID_PARAMS, PARSE_ERROR,
};
use lambda_calc_rpc::{Client, Config, Server, ShutdownHandle};
use serde_json::json;

static NEXT_SOCKET: AtomicUsize = AtomicUsize::new(0);

fn socket_path() -> PathBuf {
    let n = NEXT_SOCKET.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("lambda_calc_rpc-{}-{}.sock", std::process::id(), n))
}

struct TestServer {
    path: PathBuf,
    shutdown: ShutdownHandle,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start() -> TestServer {
        TestServer::start_with(Config::default().with_socket_path(socket_path()))
    }

    fn start_with(config: Config) -> TestServer {
        let server = Server::bind(&config).unwrap();
        let path = server.path().to_path_buf();
        let shutdown = server.shutdown_handle();
        let handle = thread::spawn(move || server.run());
        TestServer {
            path,
            shutdown,
            handle: Some(handle),
        }
    }

    fn connect(&self) -> Client {
        Client::connect(&self.path).unwrap()
    }

    fn stop(mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn error_code(response: &Response) -> Option<i64> {
    match &response.outcome {
        Outcome::Error(err) => Some(err.code),
        Outcome::Result(_) => None,
    }
}

#[test]
fn evaluate_over_socket() {
    let server = TestServer::start();
    let mut client = server.connect();
    assert_eq!("(x y)", client.evaluate("( x y )").unwrap());
    assert_eq!("x", client.evaluate("( ( x ) )").unwrap());
    assert_eq!("((a b) c)", client.evaluate("( ( a b ) c )").unwrap());
    server.stop();
}

#[test]
fn response_carries_request_id() {
    let server = TestServer::start();
    let mut client = server.connect();
    let response = client
        .call("evaluate", json!({"expression": "( f ( a b ) )"}))
        .unwrap();
    assert_eq!(
        Response::success(json!(1), json!({"expression": "(f b)"})),
        response
    );
    let response = client
        .call("evaluate", json!({"expression": "q"}))
        .unwrap();
    assert_eq!(json!(2), response.id);
}

#[test]
fn ping_is_echoed() {
    let server = TestServer::start();
    let mut client = server.connect();
    let response = client
        .send(&lambda_calc_rpc::rpc::Request::new(1, "ping", json!({"a": 1})))
        .unwrap();
    assert_eq!(Response::success(json!(1), json!({"a": 1})), response);
}

#[test]
fn request_errors_keep_connection() {
    let server = TestServer::start();
    let mut client = server.connect();

    let response = client.call("evaluate", json!("( x y )")).unwrap();
    assert_eq!(Some(INVALID_PARAMS), error_code(&response));

    let response = client.call("evaluate", json!({"expression": 3})).unwrap();
    assert_eq!(Some(INVALID_PARAMS), error_code(&response));

    match client.evaluate("( x") {
        Err(ClientError::Remote(err)) => assert_eq!(EXPRESSION_ERROR, err.code),
        other => panic!("expected a parse error, got {:?}", other),
    }
    match client.evaluate("") {
        Err(ClientError::Remote(err)) => assert_eq!(EXPRESSION_ERROR, err.code),
        other => panic!("expected a parse error, got {:?}", other),
    }

    // still usable
    assert_eq!("(x y)", client.evaluate("( x y )").unwrap());
}

#[test]
fn strict_head_error_over_socket() {
    let config = Config {
        reduce_head_spine: false,
        ..Config::default().with_socket_path(socket_path())
    };
    let server = TestServer::start_with(config);
    let mut client = server.connect();
    match client.evaluate("( ( a b ) c )") {
        Err(ClientError::Remote(err)) => assert_eq!(EVALUATION_ERROR, err.code),
        other => panic!("expected an evaluation error, got {:?}", other),
    }
    assert_eq!("(a b)", client.evaluate("( a b )").unwrap());
}

#[test]
fn deep_nesting_is_rejected_without_dropping_connection() {
    let server = TestServer::start();
    let mut client = server.connect();
    let n = 50_000;
    let deep = format!("{}a {}", "( ".repeat(n), "b ) ".repeat(n));
    match client.evaluate(&deep) {
        Err(ClientError::Remote(err)) => assert_eq!(EXPRESSION_ERROR, err.code),
        other => panic!("expected a parse error, got {:?}", other),
    }

    assert_eq!("(x y)", client.evaluate("( x y )").unwrap());
    let mut other = server.connect();
    assert_eq!("x", other.evaluate("( ( x ) )").unwrap());
}

#[test]
fn depth_limit_follows_config() {
    let config = Config {
        max_depth: Some(2),
        ..Config::default().with_socket_path(socket_path())
    };
    let server = TestServer::start_with(config);
    let mut client = server.connect();
    assert_eq!("((a b) c)", client.evaluate("( ( a b ) c )").unwrap());
    match client.evaluate("( ( ( a b ) c ) d )") {
        Err(ClientError::Remote(err)) => assert_eq!(EXPRESSION_ERROR, err.code),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn malformed_json_gets_reply_then_close() {
    let server = TestServer::start();
    let mut client = server.connect();
    client.send_raw(b"{\"id\": 1, \"method\": }\n").unwrap();

    let response = client.read_response().unwrap();
    assert_eq!(Some(PARSE_ERROR), error_code(&response));
    assert!(matches!(client.read_response(), Err(ClientError::Closed)));

    // other clients are unaffected
    let mut other = server.connect();
    assert_eq!("(x y)", other.evaluate("( x y )").unwrap());
}

#[test]
fn concurrent_clients() {
    let server = TestServer::start();
    let workers: Vec<_> = (0..16)
        .map(|i| {
            let mut client = server.connect();
            thread::spawn(move || {
                for round in 0..25 {
                    let f = format!("f{}_{}", i, round);
                    let expected = format!("({} x{})", f, i);
                    let got = client.evaluate(&format!("( {} ( y x{} ) )", f, i)).unwrap();
                    assert_eq!(expected, got);

                    let nested = client
                        .evaluate(&format!("( ( ( a{} ) b{} ) c{} )", i, round, i))
                        .unwrap();
                    assert_eq!(format!("((a{} b{}) c{})", i, round, i), nested);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn shutdown_removes_socket_and_closes_clients() {
    let server = TestServer::start();
    let path = server.path.clone();
    let mut client = server.connect();
    assert_eq!("x", client.evaluate("x").unwrap());
    assert!(path.exists());

    server.stop();

    assert!(!path.exists());
    assert!(matches!(client.read_response(), Err(ClientError::Closed)));
}

#[test]
fn stale_socket_file_is_replaced() {
    let path = socket_path();
    fs::write(&path, b"left over").unwrap();

    let server = TestServer::start_with(Config::default().with_socket_path(path.clone()));
    let mut client = server.connect();
    assert_eq!("(x y)", client.evaluate("( x y )").unwrap());
    server.stop();
    assert!(!path.exists());
}

#[test]
fn shutdown_is_idempotent() {
    let server = TestServer::start();
    let handle = server.shutdown.clone();
    handle.shutdown();
    assert!(handle.is_shutdown());
    handle.shutdown();
    server.stop();
}
