use scout_ui_types::Command;

use crate::error::InputError;

/// What a line typed by the operator asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorInput {
    Send(Command),
    Reconnect,
    Findings,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  start <task>       begin a research run
  pause              pause the current run
  resume             resume a paused run
  stop               stop the current run
  answer <message>   reply to the agent's question (alias: say)
  reconnect          connect now instead of waiting for the retry timer
  findings           list findings, newest first
  status             show connection and agent state
  help               show this list
  quit               leave the console

While the agent is waiting on a question, any other line is sent as the answer.";

/// Parses one line of operator input.
///
/// Returns `Ok(None)` for a blank line when nothing is pending. With a question
/// pending, a blank line is an empty answer and is rejected.
pub fn parse(line: &str, question_pending: bool) -> Result<Option<OperatorInput>, InputError> {
    let line = line.trim();
    if line.is_empty() {
        if question_pending {
            return Err(InputError::EmptyMessage);
        }
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word.to_ascii_lowercase().as_str() {
        "start" => {
            if rest.is_empty() {
                return Err(InputError::EmptyTask);
            }
            OperatorInput::Send(Command::start(rest))
        }
        "answer" | "say" => {
            if rest.is_empty() {
                return Err(InputError::EmptyMessage);
            }
            OperatorInput::Send(Command::human_input(rest))
        }
        "pause" => no_argument(word, rest, OperatorInput::Send(Command::Pause))?,
        "resume" => no_argument(word, rest, OperatorInput::Send(Command::Resume))?,
        "stop" => no_argument(word, rest, OperatorInput::Send(Command::Stop))?,
        "reconnect" => no_argument(word, rest, OperatorInput::Reconnect)?,
        "findings" => no_argument(word, rest, OperatorInput::Findings)?,
        "status" => no_argument(word, rest, OperatorInput::Status)?,
        "help" | "?" => OperatorInput::Help,
        "quit" | "exit" => OperatorInput::Quit,
        _ if question_pending => OperatorInput::Send(Command::human_input(line)),
        _ => return Err(InputError::UnknownCommand(word.to_string())),
    };

    Ok(Some(input))
}

fn no_argument(
    word: &str,
    rest: &str,
    input: OperatorInput,
) -> Result<OperatorInput, InputError> {
    if !rest.is_empty() {
        return Err(InputError::UnexpectedArgument {
            command: word.to_string(),
        });
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(line: &str) -> Command {
        match parse(line, false) {
            Ok(Some(OperatorInput::Send(command))) => command,
            other => panic!("expected a command for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_start_keeps_the_whole_task() {
        assert_eq!(
            send("start   find a used Leica M6 under $2000  "),
            Command::start("find a used Leica M6 under $2000")
        );
    }

    #[test]
    fn test_blank_task_is_rejected() {
        assert_eq!(parse("start", false), Err(InputError::EmptyTask));
        assert_eq!(parse("start    ", false), Err(InputError::EmptyTask));
    }

    #[test]
    fn test_answer_and_alias() {
        assert_eq!(send("answer size M"), Command::human_input("size M"));
        assert_eq!(send("say yes"), Command::human_input("yes"));
        assert_eq!(parse("answer  ", false), Err(InputError::EmptyMessage));
    }

    #[test]
    fn test_run_controls() {
        assert_eq!(send("pause"), Command::Pause);
        assert_eq!(send("RESUME"), Command::Resume);
        assert_eq!(send("stop"), Command::Stop);
        assert_eq!(
            parse("pause now", false),
            Err(InputError::UnexpectedArgument {
                command: "pause".to_string()
            })
        );
    }

    #[test]
    fn test_local_commands() {
        assert_eq!(parse("reconnect", false), Ok(Some(OperatorInput::Reconnect)));
        assert_eq!(parse("findings", false), Ok(Some(OperatorInput::Findings)));
        assert_eq!(parse("status", false), Ok(Some(OperatorInput::Status)));
        assert_eq!(parse("help", false), Ok(Some(OperatorInput::Help)));
        assert_eq!(parse("quit", false), Ok(Some(OperatorInput::Quit)));
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse("   ", false), Ok(None));
        assert_eq!(parse("   ", true), Err(InputError::EmptyMessage));
    }

    #[test]
    fn test_free_text_answers_pending_question() {
        assert_eq!(
            parse("the blue one please", true),
            Ok(Some(OperatorInput::Send(Command::human_input(
                "the blue one please"
            ))))
        );
        assert_eq!(
            parse("the blue one please", false),
            Err(InputError::UnknownCommand("the".to_string()))
        );
    }

    #[test]
    fn test_commands_win_over_pending_question() {
        assert_eq!(
            parse("stop", true),
            Ok(Some(OperatorInput::Send(Command::Stop)))
        );
    }
}
