use thiserror::Error;

/// Operator input rejected before it becomes a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("a task is required: start <task>")]
    EmptyTask,

    #[error("a message is required: answer <message>")]
    EmptyMessage,

    #[error("unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),

    #[error("'{command}' takes no arguments")]
    UnexpectedArgument { command: String },
}
