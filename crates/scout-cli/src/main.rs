use std::fs::OpenOptions;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use scout_agent_client::{Event, SessionHandle, SessionManager, WebSocketConnector};
use scout_cli::config::{ConsoleConfig, DEFAULT_CONFIG_FILE};
use scout_cli::console::Console;
use scout_cli::input::{self, OperatorInput, HELP};
use scout_ui_types::Command;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[clap(
    name = "Scout",
    author,
    version = "0.1.0",
    about = "Operator console for a remote research agent"
)]
struct Cli {
    #[clap(long, short, help = "Controller websocket URL (ws:// or wss://)")]
    url: Option<String>,

    #[clap(long, short, help = "YAML config file [default: scout.yaml]")]
    config: Option<String>,

    #[clap(long, short, help = "Log level [default: info]")]
    log_level: Option<String>,

    #[clap(long, help = "File that receives log output [default: scout.log]")]
    log_file: Option<String>,

    #[clap(long, help = "Delay before reconnecting after a closed session")]
    reconnect_delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let mut config = ConsoleConfig::load(&config_path, cli.config.is_some()).await?;
    if let Some(url) = cli.url {
        config.url = url;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    if let Some(log_file) = cli.log_file {
        config.log_file = log_file;
    }
    if let Some(delay) = cli.reconnect_delay_ms {
        config.reconnect_delay_ms = delay;
    }

    // The console owns stdout, so logs go to a file.
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file {}", config.log_file))?;
    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(LevelFilter::Info))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let session_config = config.session_config()?;
    log::info!("Starting scout console against {}", session_config.url);
    println!("scout console, controller {}", session_config.url);
    println!("type 'help' for commands");

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (manager, handle) = SessionManager::new(WebSocketConnector::new(), session_config, event_tx);
    let session = manager.spawn();

    let result = run_console(&handle, event_rx).await;

    handle.shutdown();
    match session.await {
        Ok(Err(err)) => log::warn!("Session ended with error: {}", err),
        Err(err) => log::warn!("Session task failed: {}", err),
        Ok(Ok(())) => {}
    }

    result
}

async fn run_console(
    handle: &SessionHandle,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut console = Console::new(std::io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    log::info!("stdin closed, leaving console");
                    return Ok(());
                };

                match input::parse(&line, console.question_pending()) {
                    Ok(Some(OperatorInput::Send(command))) => {
                        let delivered = handle.connection_state().is_connected();
                        handle.send(&command);
                        if let Command::HumanInput { .. } = command {
                            console.reply_submitted(delivered)?;
                        }
                    }
                    Ok(Some(OperatorInput::Reconnect)) => handle.connect(),
                    Ok(Some(OperatorInput::Findings)) => console.render_findings()?,
                    Ok(Some(OperatorInput::Status)) => console.render_status()?,
                    Ok(Some(OperatorInput::Help)) => console.notice(HELP)?,
                    Ok(Some(OperatorInput::Quit)) => return Ok(()),
                    Ok(None) => {}
                    Err(err) => console.notice(&format!("error: {}", err))?,
                }
            }
            event = event_rx.recv() => {
                match event {
                    Some(event) => console.handle_event(event)?,
                    None => return Ok(()),
                }
            }
        }
    }
}
