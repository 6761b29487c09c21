// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Socket layer beneath [`TransportConnection`](super::TransportConnection).
//!
//! A transport moves raw text frames for exactly one socket lifetime.
//! Decoding happens one layer up so an unrecognized frame can be dropped
//! without touching the socket, and reconnecting means asking the factory
//! for a fresh transport.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Socket-level failure. Never carries a decoded frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    /// The socket is not open (never connected, closed, or broken).
    #[error("not connected")]
    NotConnected,

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// One push-channel socket.
pub trait Transport: Send {
    /// Open the socket at `address`.
    fn connect(&mut self, address: &str) -> TransportFuture<'_, ()>;

    /// Close the socket with a close frame. Closing an unopened transport is a no-op.
    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    fn send(&mut self, text: String) -> TransportFuture<'_, ()>;

    /// Next inbound text frame, or `None` once the peer has closed.
    ///
    /// Must be cancel-safe: the connection driver races it against
    /// teardown and outbound traffic.
    fn recv(&mut self) -> TransportFuture<'_, Option<String>>;

    fn is_connected(&self) -> bool;
}

/// Produces a fresh transport for every connection attempt.
pub trait TransportFactory: Send + Sync + 'static {
    fn create(&self) -> Box<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Box<dyn Transport> + Send + Sync + 'static,
{
    fn create(&self) -> Box<dyn Transport> {
        self()
    }
}

/// Factory handing out [`WebSocketTransport`]s.
pub fn websocket_factory() -> Arc<dyn TransportFactory> {
    Arc::new(|| -> Box<dyn Transport> { Box::new(WebSocketTransport::default()) })
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct OpenSocket {
    outbound: SplitSink<Socket, Message>,
    inbound: SplitStream<Socket>,
}

/// `ws://` / `wss://` transport on `tokio-tungstenite`.
#[derive(Default)]
pub struct WebSocketTransport {
    socket: Option<OpenSocket>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn socket(&mut self) -> TransportResult<&mut OpenSocket> {
        self.socket.as_mut().ok_or(TransportError::NotConnected)
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, address: &str) -> TransportFuture<'_, ()> {
        let address = address.to_string();
        Box::pin(async move {
            let (socket, _response) = tokio_tungstenite::connect_async(address.as_str())
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            let (outbound, inbound) = socket.split();
            self.socket = Some(OpenSocket { outbound, inbound });
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            match self.socket.take() {
                Some(mut socket) => socket
                    .outbound
                    .close()
                    .await
                    .map_err(|e| TransportError::Send(e.to_string())),
                None => Ok(()),
            }
        })
    }

    fn send(&mut self, text: String) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let result = self.socket()?.outbound.send(Message::Text(text.into())).await;
            result.map_err(|e| {
                self.socket = None;
                TransportError::Send(e.to_string())
            })
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<String>> {
        Box::pin(async move {
            loop {
                let next = self.socket()?.inbound.next().await;
                match next {
                    Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                    // tungstenite answers pings itself; binary frames are not part of the channel
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_)))
                    | Some(Ok(Message::Frame(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => {
                        self.socket = None;
                        return Ok(None);
                    }
                    Some(Err(e)) => {
                        self.socket = None;
                        return Err(TransportError::Receive(e.to_string()));
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }
}
