use std::time::Duration;

use scout_ui_types::{FindingEvent, InboundEvent, LogEvent, LogLevel, StatePatch, StateUpdateEvent};
use serde::{Deserialize, Serialize};

/// One scripted frame and how long to wait before sending it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub delay_ms: u64,
    pub frame: serde_json::Value,
}

impl Step {
    pub fn new(delay_ms: u64, event: &InboundEvent) -> anyhow::Result<Self> {
        let frame = serde_json::from_str(&event.to_frame()?)?;
        Ok(Self { delay_ms, frame })
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn event(&self) -> anyhow::Result<InboundEvent> {
        Ok(InboundEvent::from_frame(&self.frame.to_string())?)
    }
}

/// The frames replayed to a console after it starts a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_yaml(yaml_content: &str) -> anyhow::Result<Self> {
        let script: Script = serde_yaml::from_str(yaml_content)?;
        script.validate()?;
        Ok(script)
    }

    /// Every step must decode as an inbound event.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            step.event()
                .map_err(|e| anyhow::anyhow!("Invalid frame in step {}: {}", index + 1, e))?;
        }
        Ok(())
    }

    pub fn create_test_script() -> anyhow::Result<Self> {
        let steps = vec![
            Step::new(
                100,
                &InboundEvent::Log(LogEvent::new("Searching listings", LogLevel::Info)),
            )?,
            Step::new(
                100,
                &InboundEvent::State(StateUpdateEvent::new(
                    StatePatch::new().with_field("step", "search"),
                )),
            )?,
            Step::new(
                100,
                &InboundEvent::Finding(
                    FindingEvent::new("Test Item", "$10").with_url("https://example.com/item"),
                ),
            )?,
            Step::new(
                100,
                &InboundEvent::Log(LogEvent::new("Is $10 acceptable?", LogLevel::Question)),
            )?,
        ];
        Ok(Self { steps })
    }
}
