//! End-to-end tests: a real `HostClient` talking to a fake UDP host over
//! loopback sockets.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

use hostlink::prelude::*;

// =========================================================================
// Test collaborators
// =========================================================================

#[derive(Default)]
struct SessionState {
    payloads: Vec<Vec<u8>>,
    errors: Vec<String>,
}

/// Session handler whose state is observable from the test body.
#[derive(Clone, Default)]
struct TestSession {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionHandler for TestSession {
    fn handle_payload(&mut self, payload: &[u8]) {
        self.inner.lock().unwrap().payloads.push(payload.to_vec());
    }

    fn can_communicate(&self) -> bool {
        !self.inner.lock().unwrap().payloads.is_empty()
    }

    fn report_error(&mut self, message: &str) {
        self.inner.lock().unwrap().errors.push(message.to_string());
    }
}

/// Fake host: grants client id 7 to any request, follows up with one game
/// frame, acks disconnects, and records every packet it sees.
async fn spawn_host() -> (SocketAddr, Arc<Mutex<Vec<ClientPacket>>>) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen2 = seen.clone();

    tokio::spawn(async move {
        let mut buf = vec![0u8; 2048];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                return;
            };
            let Ok(packet) = ClientPacket::decode(&buf[..len]) else {
                continue;
            };
            seen2.lock().unwrap().push(packet.clone());
            match packet {
                ClientPacket::Request { request_id, .. } => {
                    let accept = HostPacket::Accept {
                        request_id,
                        client_id: 7,
                    };
                    let _ = socket.send_to(&accept.encode(), peer).await;
                    let frame = HostPacket::GameFrame {
                        payload: b"hello".to_vec(),
                    };
                    let _ = socket.send_to(&frame.encode(), peer).await;
                }
                ClientPacket::DisconnectRequest { client_id } => {
                    let ack = HostPacket::DisconnectAck { client_id };
                    let _ = socket.send_to(&ack.encode(), peer).await;
                }
                ClientPacket::GameFrame { .. } => {}
            }
        }
    });

    (addr, seen)
}

/// Polls `check` until it returns true or the deadline passes.
async fn wait_until(check: impl Fn() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within deadline");
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn test_connect_receive_and_graceful_disconnect() {
    let (host, _seen) = spawn_host().await;
    let session = TestSession::default();
    let disconnects = Arc::new(AtomicUsize::new(0));
    let disconnects2 = disconnects.clone();

    let (client, handle) = HostClientBuilder::new()
        .tick_rate(50)
        .session_identifier(b"itest".to_vec())
        .on_disconnected(move || {
            disconnects2.fetch_add(1, Ordering::SeqCst);
        })
        .connect(host, session.clone())
        .await
        .unwrap();

    let run = tokio::spawn(client.run());

    // The host's accept is followed by one game frame.
    wait_until(|| !session.inner.lock().unwrap().payloads.is_empty()).await;
    assert_eq!(
        session.inner.lock().unwrap().payloads,
        vec![b"hello".to_vec()],
    );

    handle.disconnect();
    timeout(Duration::from_secs(5), run)
        .await
        .expect("loop should exit after disconnect handshake")
        .unwrap()
        .unwrap();
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_game_data_reaches_host_with_assigned_client_id() {
    let (host, seen) = spawn_host().await;
    let session = TestSession::default();

    let (client, handle) = HostClientBuilder::new()
        .tick_rate(50)
        .connect(host, session.clone())
        .await
        .unwrap();
    let run = tokio::spawn(client.run());

    // Wait for the handshake to finish before sending game data.
    wait_until(|| !session.inner.lock().unwrap().payloads.is_empty()).await;
    handle.send_game_data(b"move".to_vec());

    wait_until(|| {
        seen.lock().unwrap().iter().any(|p| {
            matches!(
                p,
                ClientPacket::GameFrame { client_id: 7, payload } if payload == b"move"
            )
        })
    })
    .await;

    handle.shutdown();
    timeout(Duration::from_secs(5), run)
        .await
        .expect("loop should exit on shutdown")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_stale_accept_never_assigns_client_id() {
    // Host that first replies with an accept for a different request
    // round (stale), then the real one. The stale id must not stick.
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let host = socket.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen2 = seen.clone();

    tokio::spawn(async move {
        let mut buf = vec![0u8; 2048];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                return;
            };
            let Ok(packet) = ClientPacket::decode(&buf[..len]) else {
                continue;
            };
            seen2.lock().unwrap().push(packet.clone());
            match packet {
                ClientPacket::Request { request_id, .. } => {
                    let stale = HostPacket::Accept {
                        request_id: request_id.wrapping_add(1),
                        client_id: 99,
                    };
                    let _ = socket.send_to(&stale.encode(), peer).await;
                    let real = HostPacket::Accept {
                        request_id,
                        client_id: 7,
                    };
                    let _ = socket.send_to(&real.encode(), peer).await;
                    let frame = HostPacket::GameFrame {
                        payload: b"hello".to_vec(),
                    };
                    let _ = socket.send_to(&frame.encode(), peer).await;
                }
                _ => {}
            }
        }
    });

    let session = TestSession::default();
    let (client, handle) = HostClientBuilder::new()
        .tick_rate(50)
        .connect(host, session.clone())
        .await
        .unwrap();
    let run = tokio::spawn(client.run());

    wait_until(|| !session.inner.lock().unwrap().payloads.is_empty()).await;
    handle.send_game_data(b"m".to_vec());

    // The frame must carry the id from the matching accept, not the
    // stale one.
    wait_until(|| {
        seen.lock().unwrap().iter().any(|p| {
            matches!(p, ClientPacket::GameFrame { client_id: 7, .. })
        })
    })
    .await;
    assert!(!seen
        .lock()
        .unwrap()
        .iter()
        .any(|p| matches!(p, ClientPacket::GameFrame { client_id: 99, .. })));

    handle.shutdown();
    timeout(Duration::from_secs(5), run)
        .await
        .expect("loop should exit on shutdown")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_exits_without_disconnect_callback() {
    let (host, _seen) = spawn_host().await;
    let disconnects = Arc::new(AtomicUsize::new(0));
    let disconnects2 = disconnects.clone();

    let (client, handle) = HostClientBuilder::new()
        .tick_rate(50)
        .on_disconnected(move || {
            disconnects2.fetch_add(1, Ordering::SeqCst);
        })
        .connect(host, TestSession::default())
        .await
        .unwrap();
    let run = tokio::spawn(client.run());

    handle.shutdown();
    timeout(Duration::from_secs(5), run)
        .await
        .expect("loop should exit on shutdown")
        .unwrap()
        .unwrap();
    // A shutdown is not a connection ending on its own; no callback.
    assert_eq!(disconnects.load(Ordering::SeqCst), 0);
}
