//! Tests de integración para el servidor de archivos
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en `127.0.0.1:0` sobre un root
//! temporal y habla con él por TCP real.

use static_server::config::Config;
use static_server::metrics::MetricsSnapshot;
use static_server::server::Server;
use std::fs;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

/// Servidor corriendo en un thread aparte
struct TestServer {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<MetricsSnapshot>,
}

impl TestServer {
    fn start(config: Config) -> Self {
        let server = Server::bind(config).expect("bind");
        let addr = server.local_addr().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&shutdown);
        let handle = thread::spawn(move || server.run(flag).expect("run"));

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    fn stop(self) -> MetricsSnapshot {
        self.shutdown.store(true, Ordering::SeqCst);
        self.handle.join().unwrap()
    }
}

/// tmp/
///   www/index.html
///   www/data.bin        (bytes 0..=255)
///   www/css/site.css
///   secret/passwd
///   www-secret/config
fn site() -> (TempDir, Config) {
    let dir = tempdir().unwrap();
    let www = dir.path().join("www");

    fs::create_dir_all(www.join("css")).unwrap();
    fs::create_dir_all(dir.path().join("secret")).unwrap();
    fs::create_dir_all(dir.path().join("www-secret")).unwrap();

    fs::write(www.join("index.html"), b"<html><body>hello</body></html>").unwrap();
    fs::write(www.join("data.bin"), (0..=255u8).collect::<Vec<_>>()).unwrap();
    fs::write(www.join("css").join("site.css"), b"h1 { color: red; }").unwrap();
    fs::write(dir.path().join("secret").join("passwd"), b"root:x:0:0").unwrap();
    fs::write(dir.path().join("www-secret").join("config"), b"token=abc").unwrap();

    let config = Config {
        port: 0,
        root_dir: www.to_string_lossy().into_owned(),
        workers: 4,
        queue_capacity: 64,
        read_timeout_ms: 5_000,
        write_timeout_ms: 5_000,
        ..Config::default()
    };

    (dir, config)
}

/// Envía bytes crudos, cierra la escritura y lee hasta que el servidor cierre
fn send_raw(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    stream.write_all(raw).unwrap();
    stream.shutdown(Shutdown::Write).unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    response
}

fn get(addr: SocketAddr, path: &str) -> Vec<u8> {
    send_raw(addr, format!("GET {} HTTP/1.0\r\n\r\n", path).as_bytes())
}

fn status_line(response: &[u8]) -> String {
    let end = response
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(response.len());
    String::from_utf8_lossy(&response[..end]).into_owned()
}

fn body(response: &[u8]) -> &[u8] {
    response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| &response[pos + 4..])
        .unwrap_or(&[])
}

// ==================== Archivos ====================

#[test]
fn test_root_serves_index_byte_exact() {
    let (dir, config) = site();
    let server = TestServer::start(config);

    let response = get(server.addr, "/");
    let expected = fs::read(dir.path().join("www").join("index.html")).unwrap();

    assert_eq!(status_line(&response), "HTTP/1.0 200 OK");
    assert_eq!(body(&response), expected.as_slice());

    server.stop();
}

#[test]
fn test_binary_file_byte_exact() {
    let (_dir, config) = site();
    let server = TestServer::start(config);

    let response = get(server.addr, "/data.bin");
    let text = String::from_utf8_lossy(&response);

    assert_eq!(status_line(&response), "HTTP/1.0 200 OK");
    assert!(text.contains("Content-Length: 256\r\n"));
    assert_eq!(body(&response), (0..=255u8).collect::<Vec<_>>().as_slice());

    server.stop();
}

#[test]
fn test_nested_file_and_headers() {
    let (_dir, config) = site();
    let server = TestServer::start(config);

    let response = get(server.addr, "/css/site.css");
    let text = String::from_utf8_lossy(&response);

    assert_eq!(status_line(&response), "HTTP/1.0 200 OK");
    assert!(text.contains("Content-Type: text/css\r\n"));
    assert!(text.contains("Connection: close\r\n"));
    assert_eq!(body(&response), b"h1 { color: red; }");

    server.stop();
}

// ==================== Seguridad ====================

#[test]
fn test_traversal_is_rejected() {
    let (_dir, config) = site();
    let server = TestServer::start(config);

    for path in ["/../secret/passwd", "/css/../../secret/passwd", "/../www-secret/config"] {
        let response = get(server.addr, path);
        assert_eq!(status_line(&response), "HTTP/1.0 404 NOT FOUND", "path: {}", path);
        assert_eq!(body(&response), b"File Not Found");
    }

    server.stop();
}

#[cfg(unix)]
#[test]
fn test_symlink_escape_is_rejected() {
    let (dir, config) = site();
    std::os::unix::fs::symlink(
        dir.path().join("secret"),
        dir.path().join("www").join("escape"),
    )
    .unwrap();
    let server = TestServer::start(config);

    let response = get(server.addr, "/escape/passwd");
    assert_eq!(status_line(&response), "HTTP/1.0 404 NOT FOUND");

    server.stop();
}

#[test]
fn test_missing_file_is_not_found() {
    let (_dir, config) = site();
    let server = TestServer::start(config);

    let response = get(server.addr, "/does-not-exist.html");
    assert_eq!(status_line(&response), "HTTP/1.0 404 NOT FOUND");

    server.stop();
}

// ==================== Requests inválidos ====================

#[test]
fn test_malformed_request_is_bad_request() {
    let (_dir, config) = site();
    let server = TestServer::start(config);

    let response = send_raw(server.addr, b"\x00\x01\x02\x03garbage");
    assert_eq!(status_line(&response), "HTTP/1.0 400 BAD REQUEST");

    let response = send_raw(server.addr, b"OPTIONSX / HTTP/1.0\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.0 400 BAD REQUEST");

    let snapshot = server.stop();
    assert_eq!(snapshot.count_for(400), 2);
}

#[test]
fn test_silent_client_is_abandoned() {
    let (_dir, config) = site();
    let server = TestServer::start(config);

    drop(TcpStream::connect(server.addr).unwrap());
    assert_eq!(status_line(&get(server.addr, "/")), "HTTP/1.0 200 OK");

    let snapshot = server.stop();
    assert_eq!(snapshot.abandoned_connections, 1);
    assert_eq!(snapshot.total_requests, 1);
}

// ==================== Concurrencia ====================

#[test]
fn test_concurrent_clients() {
    let (dir, config) = site();
    let server = TestServer::start(config);
    let addr = server.addr;
    let expected = fs::read(dir.path().join("www").join("index.html")).unwrap();

    let clients: Vec<_> = (0..32)
        .map(|i| {
            thread::spawn(move || {
                let path = if i % 2 == 0 { "/" } else { "/index.html" };
                get(addr, path)
            })
        })
        .collect();

    for client in clients {
        let response = client.join().unwrap();
        assert_eq!(status_line(&response), "HTTP/1.0 200 OK");
        assert_eq!(body(&response), expected.as_slice());
    }

    let snapshot = server.stop();
    assert_eq!(snapshot.count_for(200), 32);
    assert_eq!(snapshot.busy_workers, 0);
}

#[test]
fn test_full_queue_replies_service_unavailable() {
    let (_dir, mut config) = site();
    config.workers = 1;
    config.queue_capacity = 1;
    let server = TestServer::start(config);

    // A ocupa al único worker (no manda nada)
    let stalled = TcpStream::connect(server.addr).unwrap();
    thread::sleep(Duration::from_millis(300));

    // B llena la cola
    let mut queued = TcpStream::connect(server.addr).unwrap();
    queued.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();
    thread::sleep(Duration::from_millis(300));

    // C no entra
    let mut rejected = TcpStream::connect(server.addr).unwrap();
    let mut response = Vec::new();
    rejected.read_to_end(&mut response).unwrap();
    assert_eq!(status_line(&response), "HTTP/1.0 503 SERVICE UNAVAILABLE");

    // Al soltar A el worker atiende a B
    drop(stalled);
    let mut response = Vec::new();
    queued.read_to_end(&mut response).unwrap();
    assert_eq!(status_line(&response), "HTTP/1.0 200 OK");

    let snapshot = server.stop();
    assert_eq!(snapshot.dropped_connections, 1);
    assert_eq!(snapshot.count_for(200), 1);
}

// ==================== Apagado ====================

#[test]
fn test_shutdown_drains_queued_connections() {
    let (_dir, mut config) = site();
    config.workers = 1;
    let server = TestServer::start(config);

    let stalled = TcpStream::connect(server.addr).unwrap();
    thread::sleep(Duration::from_millis(300));

    let mut queued = TcpStream::connect(server.addr).unwrap();
    queued.write_all(b"GET /css/site.css HTTP/1.0\r\n\r\n").unwrap();
    thread::sleep(Duration::from_millis(300));

    // Se pide el apagado con B todavía en la cola
    server.shutdown.store(true, Ordering::SeqCst);
    drop(stalled);

    let mut response = Vec::new();
    queued.read_to_end(&mut response).unwrap();
    assert_eq!(status_line(&response), "HTTP/1.0 200 OK");
    assert_eq!(body(&response), b"h1 { color: red; }");

    let snapshot = server.handle.join().unwrap();
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.abandoned_connections, 1);
}

#[test]
fn test_shutdown_with_no_traffic() {
    let (_dir, config) = site();
    let server = TestServer::start(config);

    thread::sleep(Duration::from_millis(50));
    let snapshot = server.stop();

    assert_eq!(snapshot.total_requests, 0);
    assert_eq!(snapshot.dropped_connections, 0);
}
