use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{Connector, Transport};
use crate::error::TransportError;

/// Opens websocket transports with `tokio-tungstenite`.
#[derive(Debug, Default, Clone)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Transport, TransportError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        let (mut writer, mut reader) = stream.split();

        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<String>();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let peer = url.to_string();

        // Ends when the transport is dropped, closing the socket politely.
        let writer_peer = peer.clone();
        tokio::spawn(async move {
            while let Some(frame) = outgoing_rx.recv().await {
                if let Err(e) = writer.send(Message::Text(frame.into())).await {
                    log::warn!("websocket write error on {}: {}", writer_peer, e);
                    return;
                }
            }
            let _ = writer.close().await;
        });

        let reader_task = tokio::spawn(async move {
            while let Some(message) = reader.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if incoming_tx.send(Ok(text.to_string())).is_err() {
                            return;
                        }
                    }
                    Ok(Message::Binary(payload)) => {
                        log::debug!(
                            "ignoring binary frame from {} ({} bytes)",
                            peer,
                            payload.len()
                        );
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                    Ok(Message::Close(frame)) => {
                        log::debug!("close frame from {}: {:?}", peer, frame);
                        return;
                    }
                    Err(e) => {
                        log::warn!("websocket read error on {}: {}", peer, e);
                        let _ = incoming_tx.send(Err(TransportError::WebSocket(e.to_string())));
                        return;
                    }
                }
            }
        });

        Ok(Transport::new(outgoing_tx, incoming_rx).with_reader(reader_task))
    }
}
