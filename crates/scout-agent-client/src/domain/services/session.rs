use anyhow::Result;
use scout_ui_types::Command;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::{Dispatcher, Lifecycle, ReconnectTicket};
use crate::configuration::SessionConfig;
use crate::domain::models::{ConnectionState, Event};
use crate::error::TransportError;
use crate::infrastructure::transport::{Connector, IncomingFrame, Transport};

enum SessionControl {
    Connect,
    Send(String),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

enum Wake {
    Control(Option<SessionControl>),
    Timer(ReconnectTicket),
    Frame(Option<IncomingFrame>),
}

/// Cloneable front door to a running [`SessionManager`].
#[derive(Clone)]
pub struct SessionHandle {
    control_tx: mpsc::UnboundedSender<SessionControl>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl SessionHandle {
    pub fn connection_state(&self) -> ConnectionState {
        return *self.state_rx.borrow();
    }

    /// A read-only view that changes with every lifecycle transition.
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        return self.state_rx.clone();
    }

    /// Sends a command if a session is open. Otherwise the command is lost:
    /// nothing is queued and the caller is not told.
    pub fn send(&self, command: &Command) {
        if !self.connection_state().is_connected() {
            log::debug!(
                "Not connected, dropping {} command",
                command.action().as_str()
            );
            return;
        }

        self.request(SessionControl::Send(command.to_frame()));
    }

    /// Asks for an immediate connection attempt. Ignored while one is in
    /// flight or a session is open.
    pub fn connect(&self) {
        self.request(SessionControl::Connect);
    }

    pub fn shutdown(&self) {
        self.request(SessionControl::Shutdown);
    }

    fn request(&self, control: SessionControl) {
        if self.control_tx.send(control).is_err() {
            log::debug!("Session manager has already stopped");
        }
    }
}

/// Owns the transport and the connection lifecycle of one console.
///
/// All work happens on the task running [`SessionManager::run`]: frames are
/// dispatched one at a time in arrival order, and the only timers are the
/// reconnect timers it schedules after a close.
pub struct SessionManager<C: Connector> {
    connector: C,
    config: SessionConfig,
    lifecycle: Lifecycle,
    dispatcher: Dispatcher,
    event_tx: mpsc::UnboundedSender<Event>,
    state_tx: watch::Sender<ConnectionState>,
    control_rx: mpsc::UnboundedReceiver<SessionControl>,
    timer_tx: mpsc::UnboundedSender<ReconnectTicket>,
    timer_rx: mpsc::UnboundedReceiver<ReconnectTicket>,
    transport: Option<Transport>,
}

impl<C: Connector + 'static> SessionManager<C> {
    pub fn new(
        connector: C,
        config: SessionConfig,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> (SessionManager<C>, SessionHandle) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let manager = SessionManager {
            connector,
            config,
            lifecycle: Lifecycle::new(),
            dispatcher: Dispatcher::new(event_tx.clone()),
            event_tx,
            state_tx,
            control_rx,
            timer_tx,
            timer_rx,
            transport: None,
        };
        let handle = SessionHandle {
            control_tx,
            state_rx,
        };

        return (manager, handle);
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        return tokio::spawn(self.run());
    }

    /// Connects, then serves transport and control events until shut down or
    /// until every handle is dropped. Fails only when the presentation layer
    /// stops listening.
    pub async fn run(mut self) -> Result<()> {
        let mut flow = self.connect().await?;

        while flow == Flow::Continue {
            let wake = match self.transport.as_mut() {
                Some(transport) => tokio::select! {
                    control = self.control_rx.recv() => Wake::Control(control),
                    Some(ticket) = self.timer_rx.recv() => Wake::Timer(ticket),
                    frame = transport.recv() => Wake::Frame(frame),
                },
                None => tokio::select! {
                    control = self.control_rx.recv() => Wake::Control(control),
                    Some(ticket) = self.timer_rx.recv() => Wake::Timer(ticket),
                },
            };

            flow = match wake {
                Wake::Control(None) | Wake::Control(Some(SessionControl::Shutdown)) => Flow::Stop,
                Wake::Control(Some(SessionControl::Connect)) => self.connect().await?,
                Wake::Control(Some(SessionControl::Send(frame))) => {
                    self.deliver(frame);
                    Flow::Continue
                }
                Wake::Timer(ticket) => {
                    if self.lifecycle.is_due(ticket) {
                        self.connect().await?
                    } else {
                        log::debug!(
                            "Ignoring stale reconnect timer for generation {}",
                            ticket.generation
                        );
                        Flow::Continue
                    }
                }
                Wake::Frame(Some(Ok(frame))) => {
                    self.dispatcher.on_message(&frame)?;
                    Flow::Continue
                }
                Wake::Frame(Some(Err(err))) => self.handle_close(&err.to_string())?,
                Wake::Frame(None) => self.handle_close("closed by peer")?,
            };
        }

        self.transport = None;
        log::info!("Session to {} shut down", self.config.url);
        return Ok(());
    }

    /// Runs one connection attempt. Control requests are still served while it
    /// is pending, and a shutdown abandons it.
    async fn connect(&mut self) -> Result<Flow> {
        let Some(generation) = self.lifecycle.begin_connect() else {
            log::debug!(
                "Connect requested while {}, ignoring",
                self.lifecycle.state()
            );
            return Ok(Flow::Continue);
        };
        self.publish_status()?;

        log::info!(
            "Connecting to {} (generation {})",
            self.config.url,
            generation
        );
        let attempt = {
            let pending = tokio::time::timeout(
                self.config.connect_timeout,
                self.connector.connect(&self.config.url),
            );
            tokio::pin!(pending);

            loop {
                tokio::select! {
                    attempt = &mut pending => break attempt,
                    control = self.control_rx.recv() => match control {
                        None | Some(SessionControl::Shutdown) => {
                            log::info!("Abandoning connection attempt to {}", self.config.url);
                            return Ok(Flow::Stop);
                        }
                        Some(SessionControl::Connect) => {
                            log::debug!("Connect requested while connecting, ignoring");
                        }
                        Some(SessionControl::Send(_)) => {
                            log::debug!("Dropping command while connecting");
                        }
                    },
                }
            }
        };

        match attempt {
            Ok(Ok(transport)) => {
                self.lifecycle.opened(generation);
                self.transport = Some(transport);
                log::info!("Connected to {}", self.config.url);
                self.publish_status()?;
                return Ok(Flow::Continue);
            }
            Ok(Err(err)) => return self.handle_close(&err.to_string()),
            Err(_) => {
                let err = TransportError::Timeout(self.config.connect_timeout);
                return self.handle_close(&err.to_string());
            }
        }
    }

    fn handle_close(&mut self, reason: &str) -> Result<Flow> {
        self.transport = None;
        let Some(ticket) = self.lifecycle.closed(self.lifecycle.generation()) else {
            return Ok(Flow::Continue);
        };

        let delay_ms = self.config.reconnect_delay.as_millis();
        log::warn!(
            "Connection to {} lost ({}), reconnecting in {} ms",
            self.config.url,
            reason,
            delay_ms
        );
        self.publish_status()?;
        self.event_tx.send(Event::Diagnostic(format!(
            "Disconnected from controller ({reason}). Reconnecting in {delay_ms} ms."
        )))?;
        self.schedule_reconnect(ticket);

        return Ok(Flow::Continue);
    }

    fn schedule_reconnect(&self, ticket: ReconnectTicket) {
        let timer_tx = self.timer_tx.clone();
        let delay = self.config.reconnect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = timer_tx.send(ticket);
        });
    }

    fn deliver(&self, frame: String) {
        match &self.transport {
            Some(transport) if self.lifecycle.state().is_connected() => {
                if let Err(err) = transport.send(frame) {
                    log::debug!("Dropping command: {}", err);
                }
            }
            _ => log::debug!("Dropping command while {}", self.lifecycle.state()),
        }
    }

    fn publish_status(&self) -> Result<()> {
        let state = self.lifecycle.state();
        self.state_tx.send_replace(state);
        self.event_tx.send(Event::ConnectionStatus(state))?;
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;

    enum Outcome {
        Refuse,
        Open,
        OpenThenClose,
        Hang,
    }

    struct Remote {
        to_client: mpsc::UnboundedSender<IncomingFrame>,
        from_client: mpsc::UnboundedReceiver<String>,
    }

    struct ScriptedConnector {
        script: Mutex<VecDeque<Outcome>>,
        attempts: Arc<Mutex<Vec<Instant>>>,
        remotes: mpsc::UnboundedSender<Remote>,
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(&self, _url: &str) -> Result<Transport, TransportError> {
            self.attempts.lock().unwrap().push(Instant::now());
            let outcome = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Outcome::Open);

            let (out_tx, out_rx) = mpsc::unbounded_channel();
            let (in_tx, in_rx) = mpsc::unbounded_channel();
            match outcome {
                Outcome::Refuse => {
                    return Err(TransportError::WebSocket("connection refused".to_string()))
                }
                Outcome::Open => {
                    let _ = self.remotes.send(Remote {
                        to_client: in_tx,
                        from_client: out_rx,
                    });
                }
                Outcome::OpenThenClose => drop(in_tx),
                Outcome::Hang => std::future::pending::<()>().await,
            }
            Ok(Transport::new(out_tx, in_rx))
        }
    }

    struct Harness {
        handle: SessionHandle,
        events: mpsc::UnboundedReceiver<Event>,
        remotes: mpsc::UnboundedReceiver<Remote>,
        attempts: Arc<Mutex<Vec<Instant>>>,
        task: JoinHandle<Result<()>>,
    }

    impl Harness {
        fn start(script: Vec<Outcome>) -> Harness {
            let (manager, handle, events, remotes, attempts) = build(script);
            let task = manager.spawn();
            Harness {
                handle,
                events,
                remotes,
                attempts,
                task,
            }
        }

        fn attempts(&self) -> Vec<Instant> {
            self.attempts.lock().unwrap().clone()
        }

        async fn wait_for_status(&mut self, wanted: ConnectionState) {
            loop {
                match self.events.recv().await {
                    Some(Event::ConnectionStatus(state)) if state == wanted => return,
                    Some(_) => continue,
                    None => panic!("event channel closed before {wanted}"),
                }
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn build(
        script: Vec<Outcome>,
    ) -> (
        SessionManager<ScriptedConnector>,
        SessionHandle,
        mpsc::UnboundedReceiver<Event>,
        mpsc::UnboundedReceiver<Remote>,
        Arc<Mutex<Vec<Instant>>>,
    ) {
        let (remote_tx, remote_rx) = mpsc::unbounded_channel();
        let attempts = Arc::new(Mutex::new(vec![]));
        let connector = ScriptedConnector {
            script: Mutex::new(script.into_iter().collect()),
            attempts: attempts.clone(),
            remotes: remote_tx,
        };
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (manager, handle) =
            SessionManager::new(connector, SessionConfig::default(), event_tx);
        (manager, handle, event_rx, remote_rx, attempts)
    }

    #[tokio::test]
    async fn test_connect_publishes_lifecycle() {
        let mut harness = Harness::start(vec![Outcome::Open]);

        assert_eq!(
            harness.events.recv().await,
            Some(Event::ConnectionStatus(ConnectionState::Connecting))
        );
        assert_eq!(
            harness.events.recv().await,
            Some(Event::ConnectionStatus(ConnectionState::Connected))
        );
        assert_eq!(harness.handle.connection_state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_dropped() {
        let (manager, handle, mut events, mut remotes, _attempts) = build(vec![Outcome::Open]);

        handle.send(&Command::Pause);
        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);
        assert!(events.try_recv().is_err());

        let _task = manager.spawn();
        let mut remote = remotes.recv().await.unwrap();
        while events.recv().await != Some(Event::ConnectionStatus(ConnectionState::Connected)) {}

        handle.send(&Command::start("find a walkman"));
        let frame = remote.from_client.recv().await.unwrap();
        assert_eq!(
            Command::from_frame(&frame).unwrap(),
            Command::start("find a walkman")
        );
        assert!(remote.from_client.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_frames_are_dispatched_in_order() {
        let mut harness = Harness::start(vec![Outcome::Open]);
        let remote = harness.remotes.recv().await.unwrap();
        harness.wait_for_status(ConnectionState::Connected).await;

        for frame in [
            r#"{"type":"state","running":true}"#,
            r#"{"type":"log","message":"searching","level":"info"}"#,
            r#"{"type":"finding","title":"Widget","price":"$9"}"#,
        ] {
            remote.to_client.send(Ok(frame.to_string())).unwrap();
        }

        assert!(matches!(
            harness.events.recv().await,
            Some(Event::StateChanged(state)) if state.running
        ));
        assert!(matches!(
            harness.events.recv().await,
            Some(Event::Log { message, .. }) if message == "searching"
        ));
        assert!(matches!(
            harness.events.recv().await,
            Some(Event::Finding(finding)) if finding.title.as_deref() == Some("Widget")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_once_after_fixed_delay() {
        let harness = Harness::start(vec![
            Outcome::OpenThenClose,
            Outcome::OpenThenClose,
            Outcome::OpenThenClose,
        ]);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(harness.attempts().len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let attempts = harness.attempts();
        assert_eq!(attempts.len(), 2);
        assert!(attempts[1] - attempts[0] >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_emits_status_and_diagnostic() {
        let mut harness = Harness::start(vec![Outcome::OpenThenClose, Outcome::Open]);

        harness.wait_for_status(ConnectionState::Connected).await;
        assert_eq!(
            harness.events.recv().await,
            Some(Event::ConnectionStatus(ConnectionState::Disconnected))
        );
        assert!(matches!(
            harness.events.recv().await,
            Some(Event::Diagnostic(message)) if message.contains("Reconnecting in 2000 ms")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_without_limit_or_backoff() {
        let harness = Harness::start(vec![
            Outcome::Refuse,
            Outcome::Refuse,
            Outcome::Refuse,
            Outcome::Refuse,
            Outcome::Refuse,
            Outcome::Open,
        ]);

        tokio::time::sleep(Duration::from_millis(10_100)).await;

        let attempts = harness.attempts();
        assert_eq!(attempts.len(), 6);
        for pair in attempts.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_millis(2000));
        }
        assert_eq!(harness.handle.connection_state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_after_manual_connect_is_ignored() {
        let harness = Harness::start(vec![Outcome::Refuse, Outcome::Open]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(harness.handle.connection_state(), ConnectionState::Disconnected);
        harness.handle.connect();

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(harness.attempts().len(), 2);
        assert_eq!(harness.handle.connection_state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_connect_while_connected_is_ignored() {
        let mut harness = Harness::start(vec![Outcome::Open]);
        let _remote = harness.remotes.recv().await.unwrap();
        harness.wait_for_status(ConnectionState::Connected).await;

        let attempts = harness.attempts.clone();
        harness.handle.connect();
        harness.handle.shutdown();
        harness.task.await.unwrap().unwrap();

        assert_eq!(attempts.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_pending_connect() {
        let harness = Harness::start(vec![Outcome::Hang]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(harness.handle.connection_state(), ConnectionState::Connecting);

        let requested = Instant::now();
        harness.handle.shutdown();
        harness.task.await.unwrap().unwrap();

        assert!(requested.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_close_never_reaches_next_transport() {
        let mut harness = Harness::start(vec![Outcome::Open, Outcome::Open]);
        let Remote {
            to_client,
            from_client: mut first,
        } = harness.remotes.recv().await.unwrap();
        harness.wait_for_status(ConnectionState::Connected).await;

        drop(to_client);
        harness.wait_for_status(ConnectionState::Disconnected).await;
        harness.handle.send(&Command::Stop);
        harness.handle.send(&Command::human_input("blue"));

        let mut second = harness.remotes.recv().await.unwrap();
        harness.wait_for_status(ConnectionState::Connected).await;
        assert_eq!(harness.attempts().len(), 2);

        assert!(first.try_recv().is_err());
        assert!(matches!(
            second.from_client.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        ));

        harness.handle.send(&Command::Pause);
        let frame = second.from_client.recv().await.unwrap();
        assert_eq!(Command::from_frame(&frame).unwrap(), Command::Pause);
    }

    #[tokio::test]
    async fn test_undecodable_frame_keeps_session_open() {
        let mut harness = Harness::start(vec![Outcome::Open]);
        let remote = harness.remotes.recv().await.unwrap();
        harness.wait_for_status(ConnectionState::Connected).await;

        remote.to_client.send(Ok("not json".to_string())).unwrap();
        remote.to_client.send(Ok(r#"{"type":"ping"}"#.to_string())).unwrap();
        remote
            .to_client
            .send(Ok(r#"{"type":"state","paused":true}"#.to_string()))
            .unwrap();

        assert!(matches!(
            harness.events.recv().await,
            Some(Event::StateChanged(state)) if state.paused
        ));
        assert_eq!(harness.handle.connection_state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_dropping_every_handle_stops_the_session() {
        let (manager, handle, _events, _remotes, _attempts) = build(vec![Outcome::Open]);
        let task = manager.spawn();

        drop(handle);

        task.await.unwrap().unwrap();
    }
}
