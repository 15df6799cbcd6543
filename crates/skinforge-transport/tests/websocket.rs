//! Integration tests for WebSocket relay links.
//!
//! These spin up a real listener on an OS-assigned port and dial it with
//! [`WebSocketTransport::connect`], so both ends use the crate's own code.

#[cfg(feature = "websocket")]
mod websocket {
    use skinforge_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};

    /// Binds on port 0, dials it, and returns (backend side, proxy side).
    async fn link_pair() -> (WebSocketConnection, WebSocketConnection) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address").to_string();

        let accept = tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let proxy = WebSocketTransport::connect(&addr)
            .await
            .expect("should connect");
        let backend = accept.await.expect("accept task should complete");
        (backend, proxy)
    }

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (backend, proxy) = link_pair().await;
        assert_ne!(backend.id(), proxy.id());

        proxy.send(b"from proxy").await.expect("send should succeed");
        let received = backend.recv().await.expect("recv").expect("frame");
        assert_eq!(received, b"from proxy");

        backend.send(b"from backend").await.expect("send should succeed");
        let received = proxy.recv().await.expect("recv").expect("frame");
        assert_eq!(received, b"from backend");
    }

    #[tokio::test]
    async fn test_frame_boundaries_are_preserved() {
        // Two sends must come out as two recvs, never merged.
        let (backend, proxy) = link_pair().await;

        proxy.send(b"one").await.unwrap();
        proxy.send(b"two").await.unwrap();

        assert_eq!(backend.recv().await.unwrap().unwrap(), b"one");
        assert_eq!(backend.recv().await.unwrap().unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_peer_close() {
        let (backend, proxy) = link_pair().await;

        proxy.close().await.expect("close should succeed");

        let result = backend.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on clean close");
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        // Bind then drop to get a port nobody listens on.
        let transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap().to_string();
        drop(transport);

        let result = WebSocketTransport::connect(&addr).await;
        assert!(result.is_err());
    }
}
