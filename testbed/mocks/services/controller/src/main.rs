use controller_mock::{MockController, Script};
use std::env;
use std::fs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let script_path =
        env::var("SCRIPT_PATH").unwrap_or_else(|_| "fixtures/demo-script.yaml".to_string());

    let controller = if let Ok(script_file) = fs::read_to_string(&script_path) {
        tracing::info!("Loading script from {}", script_path);
        MockController::with_script(Script::from_yaml(&script_file)?)
    } else {
        tracing::info!("No script found at {}, using the built-in test script", script_path);
        MockController::new()?
    };

    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:7860".to_string());

    tracing::info!("Starting mock controller on ws://{}/ws", addr);
    controller.bind(&addr).await?;

    Ok(())
}
