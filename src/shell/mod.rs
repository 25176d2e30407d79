pub mod builtins;
pub mod env;
pub mod exec;
pub mod expand;
pub mod parser;
mod readline;
mod shell;

pub use shell::Shell;
