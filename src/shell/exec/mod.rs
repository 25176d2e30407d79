mod builtin;
mod external;
mod heredoc;
mod interp;
mod pipeline;
mod redirect;

pub use interp::execute;

/// Single diagnostic format for the whole execution core:
/// `minishell: [<command>: ]<message>`. The command segment is omitted when
/// no name is associated with the failure (descriptor duplication, pipes).
pub fn report_error(command: Option<&str>, message: &str) {
    match command {
        Some(command) => eprintln!("minishell: {}: {}", command, message),
        None => eprintln!("minishell: {}", message),
    }
}
