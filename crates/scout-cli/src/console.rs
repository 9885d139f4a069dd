//! Line-oriented rendering of session events.
//!
//! The console keeps read-only copies of what the client core reports (the
//! latest agent snapshot, the connection state, findings and any pending
//! question) and writes one or more lines per event. It never talks back to
//! the session; commands go through the session handle in `main`.

use std::io::{self, Write};

use scout_agent_client::{AgentState, ConnectionState, Event, Finding, FindingLog, LogLevel};

pub struct Console<W: Write> {
    out: W,
    state: AgentState,
    connection: ConnectionState,
    findings: FindingLog,
    question: Option<String>,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Console<W> {
        return Console {
            out,
            state: AgentState::default(),
            connection: ConnectionState::Disconnected,
            findings: FindingLog::new(),
            question: None,
        };
    }

    pub fn question_pending(&self) -> bool {
        return self.question.is_some();
    }

    pub fn findings(&self) -> &FindingLog {
        return &self.findings;
    }

    /// Records an operator reply. The question stays pending when the reply
    /// never left the console.
    pub fn reply_submitted(&mut self, delivered: bool) -> io::Result<()> {
        if delivered {
            self.question = None;
            return Ok(());
        }

        writeln!(self.out, "[!] not connected, answer not sent")?;
        return self.out.flush();
    }

    pub fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::StateChanged(state) => {
                self.state = state;
                writeln!(self.out, "[state] {}", self.describe_state())?;
            }
            // Questions are rendered from the dedicated event below.
            Event::Log {
                level: LogLevel::Question,
                ..
            } => {}
            Event::Log { message, level } => {
                writeln!(self.out, "[{}] {}", level, message)?;
            }
            Event::Question(question) => {
                writeln!(self.out, "[question] {}", question)?;
                writeln!(self.out, "  reply with: answer <message>")?;
                self.question = Some(question);
            }
            Event::Finding(finding) => {
                self.write_finding("+", &finding)?;
                self.findings.record(finding);
            }
            Event::FindingsRestored(backlog) => {
                self.findings.restore(backlog);
                writeln!(self.out, "[findings] restored {}", self.findings.len())?;
            }
            Event::RunCompleted { summary, findings } => {
                self.question = None;
                if !findings.is_empty() {
                    self.findings.restore(findings);
                }
                writeln!(self.out, "[done] {}", summary)?;
                writeln!(self.out, "  {} finding(s)", self.findings.len())?;
            }
            Event::ConnectionStatus(connection) => {
                self.connection = connection;
                writeln!(self.out, "[connection] {}", connection)?;
            }
            Event::Diagnostic(message) => {
                writeln!(self.out, "[!] {}", message)?;
            }
        }

        return self.out.flush();
    }

    pub fn render_status(&mut self) -> io::Result<()> {
        writeln!(self.out, "connection: {}", self.connection)?;
        writeln!(self.out, "agent:      {}", self.describe_state())?;
        writeln!(self.out, "findings:   {}", self.findings.len())?;
        if let Some(question) = &self.question {
            writeln!(self.out, "question:   {}", question)?;
        }
        return self.out.flush();
    }

    pub fn render_findings(&mut self) -> io::Result<()> {
        if self.findings.is_empty() {
            writeln!(self.out, "no findings yet")?;
            return self.out.flush();
        }

        let findings: Vec<Finding> = self.findings.iter().cloned().collect();
        for (index, finding) in findings.iter().enumerate() {
            self.write_finding(&format!("{}.", index + 1), finding)?;
        }
        return self.out.flush();
    }

    pub fn notice(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message)?;
        return self.out.flush();
    }

    fn describe_state(&self) -> String {
        let mut description = self.state.run_mode().to_string();
        for (name, value) in &self.state.extra {
            description.push_str(&format!(" {}={}", name, value));
        }
        return description;
    }

    fn write_finding(&mut self, marker: &str, finding: &Finding) -> io::Result<()> {
        writeln!(self.out, "{} {}", marker, finding.headline())?;
        if let Some(notes) = &finding.notes {
            writeln!(self.out, "    {}", notes)?;
        }
        if let Some(url) = &finding.url {
            writeln!(self.out, "    {}", url)?;
        }
        return Ok(());
    }
}
