use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use scout_ui_types::{
    Command, InboundEvent, LogEvent, LogLevel, ResultEvent, StatePatch, StateUpdateEvent,
};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::server::{AppState, RunState};

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "controller-mock"
    }))
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(app): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // A fresh console gets the full picture first.
    {
        let run = app.run.lock().await;
        let update = StateUpdateEvent::new(full_patch(&run)).with_findings(run.findings.clone());
        send_event(&frame_tx, &InboundEvent::State(update));
    }

    let mut replay: Option<JoinHandle<()>> = None;
    while let Some(Ok(message)) = receiver.next().await {
        let text = match message {
            Message::Text(text) => text.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };

        match Command::from_frame(&text) {
            Ok(command) => {
                tracing::info!("Received {} command", command.action());
                apply_command(&app, command, &frame_tx, &mut replay).await;
            }
            Err(e) => tracing::warn!("Ignoring command frame: {}", e),
        }
    }

    if let Some(replay) = replay {
        replay.abort();
    }
    writer.abort();
}

async fn apply_command(
    app: &AppState,
    command: Command,
    frame_tx: &mpsc::UnboundedSender<String>,
    replay: &mut Option<JoinHandle<()>>,
) {
    let mut run = app.run.lock().await;
    let patch = match command {
        Command::Start { task } => {
            if !accepts_start(&run, &task) {
                tracing::info!("Ignoring start: empty task or a run is already active");
                return;
            }
            if let Some(previous) = replay.take() {
                previous.abort();
            }
            run.findings.clear();
            run.state.running = true;
            run.state.paused = false;
            *replay = Some(tokio::spawn(replay_script(app.clone(), frame_tx.clone())));
            StatePatch::new()
                .with_running(true)
                .with_paused(false)
                .with_field("task", task)
        }
        Command::Pause => {
            run.state.paused = true;
            StatePatch::new().with_paused(true)
        }
        Command::Resume => {
            run.state.paused = false;
            StatePatch::new().with_paused(false)
        }
        Command::Stop => {
            if let Some(previous) = replay.take() {
                previous.abort();
            }
            run.state.running = false;
            run.state.paused = false;
            StatePatch::new().with_running(false).with_paused(false)
        }
        Command::HumanInput { message } => {
            let echo = LogEvent::new(format!("Operator: {}", message), LogLevel::Human);
            send_event(frame_tx, &InboundEvent::Log(echo));
            return;
        }
    };

    run.state.extra.extend(patch.extra.clone());
    send_event(frame_tx, &InboundEvent::State(StateUpdateEvent::new(patch)));
}

async fn replay_script(app: AppState, frame_tx: mpsc::UnboundedSender<String>) {
    for step in app.script.steps.iter() {
        tokio::time::sleep(step.delay()).await;
        while app.run.lock().await.state.paused {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        match step.event() {
            Ok(InboundEvent::Finding(finding)) => app.run.lock().await.findings.push(finding),
            Ok(InboundEvent::State(update)) => {
                app.run.lock().await.state.extra.extend(update.patch.extra)
            }
            _ => {}
        }
        if frame_tx.send(step.frame.to_string()).is_err() {
            return;
        }
    }

    let mut run = app.run.lock().await;
    run.state.running = false;
    let summary = format!("Run finished with {} finding(s)", run.findings.len());
    send_event(
        &frame_tx,
        &InboundEvent::Result(ResultEvent::new(summary, run.findings.clone())),
    );
    send_event(
        &frame_tx,
        &InboundEvent::State(StateUpdateEvent::new(StatePatch::new().with_running(false))),
    );
}

/// A run starts only from idle and only with a task.
pub fn accepts_start(run: &RunState, task: &str) -> bool {
    !run.state.running && !task.trim().is_empty()
}

fn full_patch(run: &RunState) -> StatePatch {
    let mut patch = StatePatch::new()
        .with_running(run.state.running)
        .with_paused(run.state.paused);
    patch.extra = run.state.extra.clone();
    patch
}

fn send_event(frame_tx: &mpsc::UnboundedSender<String>, event: &InboundEvent) {
    match event.to_frame() {
        Ok(frame) => {
            let _ = frame_tx.send(frame);
        }
        Err(e) => tracing::warn!("Failed to encode {} frame: {}", event.event_type(), e),
    }
}
