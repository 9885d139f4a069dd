//! The seam between the session manager and the wire.
//!
//! A [`Connector`] opens one transport per call. The transport is a pair of
//! channels: text frames out, text frames (or the error that ended them) in.
//! The incoming side yielding `None` or an error means the transport closed.

mod websocket;

pub use websocket::WebSocketConnector;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::TransportError;

pub type IncomingFrame = Result<String, TransportError>;

/// One live, bidirectional text-frame transport.
pub struct Transport {
    outgoing: mpsc::UnboundedSender<String>,
    incoming: mpsc::UnboundedReceiver<IncomingFrame>,
    reader: Option<JoinHandle<()>>,
}

impl Transport {
    pub fn new(
        outgoing: mpsc::UnboundedSender<String>,
        incoming: mpsc::UnboundedReceiver<IncomingFrame>,
    ) -> Self {
        Self {
            outgoing,
            incoming,
            reader: None,
        }
    }

    /// Ties a background reader task to this transport; it is aborted on drop.
    pub fn with_reader(mut self, reader: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Queues a frame for delivery.
    pub fn send(&self, frame: String) -> Result<(), TransportError> {
        self.outgoing
            .send(frame)
            .map_err(|_| TransportError::Closed("writer has stopped".to_string()))
    }

    /// Waits for the next inbound frame.
    pub async fn recv(&mut self) -> Option<IncomingFrame> {
        self.incoming.recv().await
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Opens transports to a controller.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Transport, TransportError>;
}
