//! Loopback integration tests for the UDP link.

use std::net::SocketAddr;
use std::time::Duration;

use hostlink_transport::{PacketSink, UdpLink};

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

/// Polls `link` until a datagram arrives or the deadline passes.
async fn recv_one(link: &mut UdpLink) -> Option<hostlink_transport::Datagram> {
    for _ in 0..200 {
        if let Some(dgram) = link.drain_inbound().into_iter().next() {
            return Some(dgram);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    None
}

// ============================================================================
// Send / receive
// ============================================================================

#[tokio::test]
async fn test_enqueue_delivers_datagram_to_peer() {
    let sender = UdpLink::bind(loopback()).await.unwrap();
    let mut receiver = UdpLink::bind(loopback()).await.unwrap();

    sender
        .outbound()
        .enqueue(vec![1, 2, 3, 4], receiver.local_addr());

    let dgram = recv_one(&mut receiver).await.expect("datagram should arrive");
    assert_eq!(dgram.bytes, vec![1, 2, 3, 4]);
    assert_eq!(dgram.source, sender.local_addr());

    sender.shutdown();
    receiver.shutdown();
}

#[tokio::test]
async fn test_multiple_datagrams_drain_in_order() {
    let sender = UdpLink::bind(loopback()).await.unwrap();
    let mut receiver = UdpLink::bind(loopback()).await.unwrap();

    let outbound = sender.outbound();
    for i in 0u8..5 {
        outbound.enqueue(vec![i], receiver.local_addr());
    }

    let mut got = Vec::new();
    for _ in 0..200 {
        got.extend(receiver.drain_inbound());
        if got.len() >= 5 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(got.len(), 5);
    for (i, dgram) in got.iter().enumerate() {
        assert_eq!(dgram.bytes, vec![i as u8]);
    }

    sender.shutdown();
    receiver.shutdown();
}

#[tokio::test]
async fn test_drain_inbound_empty_when_nothing_received() {
    let mut link = UdpLink::bind(loopback()).await.unwrap();
    assert!(link.drain_inbound().is_empty());
    link.shutdown();
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_enqueue_after_shutdown_is_silent_noop() {
    let sender = UdpLink::bind(loopback()).await.unwrap();
    let mut receiver = UdpLink::bind(loopback()).await.unwrap();

    let outbound = sender.outbound();
    sender.shutdown();
    // Give the outbound task a moment to observe the signal and exit.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Must not panic and must not deliver.
    outbound.enqueue(vec![9, 9, 9], receiver.local_addr());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(receiver.drain_inbound().is_empty());

    receiver.shutdown();
}

#[tokio::test]
async fn test_local_addr_reports_bound_port() {
    let link = UdpLink::bind(loopback()).await.unwrap();
    assert_ne!(link.local_addr().port(), 0);
    link.shutdown();
}
