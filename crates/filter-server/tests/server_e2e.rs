//! # Server End-to-End Tests
//!
//! Real sockets on 127.0.0.1 against a running [`CommandServer`], with the
//! state file and ledger in a temporary directory.

use std::path::Path;
use std::time::Duration;

use filter_server::{CommandServer, FilterMode, ServerConfig};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use url_filter::{accept_any, FilterSpec, HashKind, PersistPolicy};

const IO_TIMEOUT: Duration = Duration::from_secs(5);

struct RunningServer {
    addr: std::net::SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RunningServer {
    async fn stop(self) {
        let _ = self.shutdown.send(());
        timeout(IO_TIMEOUT, self.handle)
            .await
            .expect("server should stop")
            .expect("server task should not panic");
    }
}

fn config(dir: &Path, size: usize) -> ServerConfig {
    ServerConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        filter: FilterSpec::new(size, vec![(HashKind::Baseline, 1)]).unwrap(),
        state_file: dir.join("bloom_state.bin"),
        ledger_path: dir.join("urls.txt"),
        validator: accept_any,
        ..ServerConfig::default()
    }
}

async fn start(config: ServerConfig) -> RunningServer {
    let server = CommandServer::bind(config).await.expect("bind");
    let addr = server.local_addr();
    let (shutdown, rx) = oneshot::channel();
    let handle = tokio::spawn(server.run_until(async {
        let _ = rx.await;
    }));
    RunningServer {
        addr,
        shutdown,
        handle,
    }
}

/// Send one request line and read exactly `expected.len()` reply bytes
async fn request(stream: &mut TcpStream, line: &str, expected: &str) {
    stream
        .write_all(format!("{}\n", line).as_bytes())
        .await
        .unwrap();
    let mut reply = vec![0u8; expected.len()];
    timeout(IO_TIMEOUT, stream.read_exact(&mut reply))
        .await
        .expect("reply within timeout")
        .expect("reply");
    assert_eq!(String::from_utf8(reply).unwrap(), expected, "reply to {:?}", line);
}

/// Assert that the server has closed the connection
async fn assert_closed(stream: &mut TcpStream) {
    let mut buf = [0u8; 64];
    let n = timeout(IO_TIMEOUT, stream.read(&mut buf))
        .await
        .expect("close within timeout")
        .unwrap_or(0);
    assert_eq!(n, 0, "connection should be closed");
}

#[tokio::test]
async fn test_post_get_delete_sequence() {
    let dir = TempDir::new().unwrap();
    let server = start(config(dir.path(), 8)).await;
    let mut client = TcpStream::connect(server.addr).await.unwrap();

    request(&mut client, "POST www.example.com0", "201 Created\n").await;
    request(&mut client, "GET www.example.com0", "200 Ok\n\ntrue true\n").await;
    request(&mut client, "DELETE www.example.com0", "204 No Content\n").await;
    request(&mut client, "DELETE www.example.com0", "404 Not Found\n").await;

    server.stop().await;
}

#[tokio::test]
async fn test_malformed_requests() {
    let dir = TempDir::new().unwrap();
    let server = start(config(dir.path(), 64)).await;
    let mut client = TcpStream::connect(server.addr).await.unwrap();

    request(&mut client, "POST", "400 Bad Request\n").await;
    request(&mut client, "", "400 Bad Request\n").await;
    request(&mut client, "GET www.a.com extra", "400 Bad Request\n").await;
    request(&mut client, "PATCH www.a.com", "400 Bad Request\n").await;

    // Still usable afterwards
    request(&mut client, "GET www.a.com", "200 Ok\n\nfalse\n").await;

    server.stop().await;
}

#[tokio::test]
async fn test_strict_url_validation() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), 256);
    config.validator = url_filter::is_valid_url;
    let server = start(config).await;
    let mut client = TcpStream::connect(server.addr).await.unwrap();

    request(&mut client, "POST www.example.com0", "400 Bad Request\n").await;
    request(&mut client, "POST https://www.example.com", "201 Created\n").await;
    request(&mut client, "GET https://www.example.com", "200 Ok\n\ntrue true\n").await;

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_posts_are_all_visible() {
    let dir = TempDir::new().unwrap();
    let server = start(config(dir.path(), 4096)).await;
    let addr = server.addr;

    let writers: Vec<_> = (0..2)
        .map(|c| {
            tokio::spawn(async move {
                let mut client = TcpStream::connect(addr).await.unwrap();
                for i in 0..20 {
                    request(&mut client, &format!("POST www.c{}-{}.com", c, i), "201 Created\n").await;
                }
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap();
    }

    let mut reader = TcpStream::connect(addr).await.unwrap();
    for c in 0..2 {
        for i in 0..20 {
            request(
                &mut reader,
                &format!("GET www.c{}-{}.com", c, i),
                "200 Ok\n\ntrue true\n",
            )
            .await;
        }
    }

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocked_posts_do_not_stall_other_connections() {
    let dir = TempDir::new().unwrap();
    let server = CommandServer::bind(config(dir.path(), 4096)).await.expect("bind");
    let filter = server.shared_filter().unwrap();
    let addr = server.local_addr();
    let (shutdown, rx) = oneshot::channel();
    let handle = tokio::spawn(server.run_until(async {
        let _ = rx.await;
    }));
    let server = RunningServer {
        addr,
        shutdown,
        handle,
    };

    let guard = filter.lock();
    let writers: Vec<_> = (0..4)
        .map(|c| {
            tokio::spawn(async move {
                let mut client = TcpStream::connect(addr).await.unwrap();
                request(&mut client, &format!("POST www.w{}.com", c), "201 Created\n").await;
            })
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // every worker thread would be parked on the filter if POSTs ran inline
    let mut client = TcpStream::connect(addr).await.unwrap();
    request(&mut client, "DELETE www.absent.com", "404 Not Found\n").await;

    drop(guard);
    for writer in writers {
        writer.await.unwrap();
    }
    request(&mut client, "GET www.w3.com", "200 Ok\n\ntrue true\n").await;

    server.stop().await;
}

#[tokio::test]
async fn test_delete_keeps_filter_bits() {
    let dir = TempDir::new().unwrap();
    let server = start(config(dir.path(), 8)).await;
    let mut client = TcpStream::connect(server.addr).await.unwrap();

    request(&mut client, "POST www.a.com", "201 Created\n").await;
    request(&mut client, "DELETE www.a.com", "204 No Content\n").await;
    request(&mut client, "GET www.a.com", "200 Ok\n\ntrue false\n").await;

    server.stop().await;
}

#[tokio::test]
async fn test_strict_mode_closes_connection() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), 64);
    config.strict = true;
    let server = start(config).await;
    let mut client = TcpStream::connect(server.addr).await.unwrap();

    request(&mut client, "GET", "400 Bad Request\n").await;
    assert_closed(&mut client).await;

    server.stop().await;
}

#[tokio::test]
async fn test_per_connection_mode() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), 64);
    config.mode = FilterMode::PerConnection;
    let server = start(config).await;

    let mut first = TcpStream::connect(server.addr).await.unwrap();
    first.write_all(b"128 1 1\n").await.unwrap();
    request(&mut first, "POST www.private.com", "201 Created\n").await;
    request(&mut first, "GET www.private.com", "200 Ok\n\ntrue true\n").await;

    // A fresh connection has its own empty filter
    let mut second = TcpStream::connect(server.addr).await.unwrap();
    second.write_all(b"128 1 1\n").await.unwrap();
    request(&mut second, "GET www.private.com", "200 Ok\n\nfalse\n").await;

    let mut rejected = TcpStream::connect(server.addr).await.unwrap();
    request(&mut rejected, "not a config", "400 Bad Request\n").await;
    assert_closed(&mut rejected).await;

    server.stop().await;
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = TempDir::new().unwrap();

    let server = start(config(dir.path(), 512)).await;
    let mut client = TcpStream::connect(server.addr).await.unwrap();
    request(&mut client, "POST www.kept.com", "201 Created\n").await;
    drop(client);
    server.stop().await;

    assert!(dir.path().join("bloom_state.bin").exists());

    let server = start(config(dir.path(), 512)).await;
    let mut client = TcpStream::connect(server.addr).await.unwrap();
    request(&mut client, "GET www.kept.com", "200 Ok\n\ntrue true\n").await;
    server.stop().await;
}

#[tokio::test]
async fn test_on_shutdown_policy_checkpoints() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join("bloom_state.bin");
    let mut on_shutdown = config(dir.path(), 512);
    on_shutdown.persist = PersistPolicy::OnShutdown;

    let server = start(on_shutdown.clone()).await;
    let mut client = TcpStream::connect(server.addr).await.unwrap();
    request(&mut client, "POST www.late.com", "201 Created\n").await;
    assert!(!state_file.exists(), "no write before shutdown");
    drop(client);
    server.stop().await;

    assert!(state_file.exists(), "checkpoint on shutdown");

    let restarted = CommandServer::bind(on_shutdown).await.unwrap();
    let filter = restarted.shared_filter().unwrap();
    assert!(filter.lock().possibly_contains("www.late.com"));
}

#[tokio::test]
async fn test_corrupted_state_file_is_ignored() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bloom_state.bin"), b"\x01\x02").unwrap();

    let server = CommandServer::bind(config(dir.path(), 64)).await.unwrap();
    let filter = server.shared_filter().unwrap();

    assert_eq!(filter.lock().size(), 64);
    assert_eq!(filter.lock().bits_set(), 0);
}

#[tokio::test]
async fn test_bind_failure() {
    let dir = TempDir::new().unwrap();
    let first = CommandServer::bind(config(dir.path(), 8)).await.unwrap();

    let mut taken = config(dir.path(), 8);
    taken.listen_addr = first.local_addr();
    let result = CommandServer::bind(taken).await;

    assert!(matches!(result, Err(filter_server::ServerError::Bind { .. })));
}
