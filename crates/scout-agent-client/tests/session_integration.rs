use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use scout_agent_client::{
    Command, ConnectionState, Event, SessionConfig, SessionManager, WebSocketConnector,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    (listener, url)
}

async fn wait_for(events: &mut mpsc::UnboundedReceiver<Event>, wanted: ConnectionState) {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match events.recv().await {
                Some(Event::ConnectionStatus(state)) if state == wanted => return,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for connection status");
}

#[tokio::test]
async fn test_receives_controller_frames_and_sends_commands() {
    let (listener, url) = bind().await;
    let (server_tx, mut server_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        for frame in [
            r#"{"type":"state","running":true,"step":"search"}"#,
            r#"{"type":"log","message":"Which size?","level":"question"}"#,
            r#"{"type":"finding","title":"Camera","price":"$120","url":"https://shop.example/1"}"#,
        ] {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        while let Some(Ok(message)) = ws.next().await {
            if let Message::Text(text) = message {
                let _ = server_tx.send(text.to_string());
            }
        }
    });

    let (event_tx, mut events) = mpsc::unbounded_channel();
    let config = SessionConfig::new(&url).unwrap();
    let (manager, handle) = SessionManager::new(WebSocketConnector::new(), config, event_tx);
    let _task = manager.spawn();

    wait_for(&mut events, ConnectionState::Connected).await;

    match events.recv().await {
        Some(Event::StateChanged(state)) => {
            assert!(state.running);
            assert_eq!(state.get("step").map(|v| v.to_string()), Some("search".to_string()));
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(matches!(events.recv().await, Some(Event::Log { .. })));
    assert_eq!(events.recv().await, Some(Event::Question("Which size?".to_string())));
    match events.recv().await {
        Some(Event::Finding(finding)) => {
            assert_eq!(finding.headline(), "Camera - $120");
            assert_eq!(finding.url.as_deref(), Some("https://shop.example/1"));
        }
        other => panic!("unexpected event: {:?}", other),
    }

    handle.send(&Command::human_input("medium"));
    let frame = tokio::time::timeout(Duration::from_secs(5), server_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["action"], "human_input");
    assert_eq!(value["message"], "medium");

    handle.shutdown();
}

#[tokio::test]
async fn test_reconnects_after_server_closes() {
    let (listener, url) = bind().await;

    tokio::spawn(async move {
        // First session is closed straight away, the second one stays open.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(r#"{"type":"state","paused":true}"#.into()))
            .await
            .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (event_tx, mut events) = mpsc::unbounded_channel();
    let config = SessionConfig::new(&url)
        .unwrap()
        .with_reconnect_delay(Duration::from_millis(50));
    let (manager, handle) = SessionManager::new(WebSocketConnector::new(), config, event_tx);
    let _task = manager.spawn();

    wait_for(&mut events, ConnectionState::Connected).await;
    wait_for(&mut events, ConnectionState::Disconnected).await;
    assert!(matches!(events.recv().await, Some(Event::Diagnostic(_))));
    wait_for(&mut events, ConnectionState::Connected).await;

    assert!(matches!(
        events.recv().await,
        Some(Event::StateChanged(state)) if state.paused
    ));
    assert_eq!(handle.connection_state(), ConnectionState::Connected);

    handle.shutdown();
}

#[tokio::test]
async fn test_unreachable_controller_stays_disconnected() {
    let (listener, url) = bind().await;
    drop(listener);

    let (event_tx, mut events) = mpsc::unbounded_channel();
    let config = SessionConfig::new(&url).unwrap();
    let (manager, handle) = SessionManager::new(WebSocketConnector::new(), config, event_tx);
    let _task = manager.spawn();

    wait_for(&mut events, ConnectionState::Disconnected).await;
    assert!(matches!(events.recv().await, Some(Event::Diagnostic(_))));

    handle.send(&Command::Stop);
    assert_eq!(handle.connection_state(), ConnectionState::Disconnected);
}
