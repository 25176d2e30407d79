use std::os::unix::io::RawFd;

use log::debug;
use nix::unistd::{close, dup, dup2};

use super::heredoc::close_heredocs;
use super::redirect::apply_redirections;
use super::report_error;
use crate::shell::builtins::Builtin;
use crate::shell::env::Env;
use crate::shell::parser::ast::Node;

/// Scoped snapshot of the shell's stdin/stdout.
///
/// Builtins run in the shell process, so a redirection here mutates the
/// shell's own descriptors. The snapshot restores them and closes the saved
/// duplicates on every exit path, including drop during unwinding.
struct StdioSnapshot {
    saved_stdout: RawFd,
    saved_stdin: RawFd,
    restored: bool,
}

impl StdioSnapshot {
    fn take() -> nix::Result<Self> {
        let saved_stdout = dup(libc::STDOUT_FILENO)?;
        let saved_stdin = match dup(libc::STDIN_FILENO) {
            Ok(fd) => fd,
            Err(err) => {
                let _ = close(saved_stdout);
                return Err(err);
            }
        };
        Ok(Self {
            saved_stdout,
            saved_stdin,
            restored: false,
        })
    }

    fn restore(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        if dup2(self.saved_stdout, libc::STDOUT_FILENO).is_err()
            || dup2(self.saved_stdin, libc::STDIN_FILENO).is_err()
        {
            report_error(None, "dup2 failed");
        }
        let _ = close(self.saved_stdout);
        let _ = close(self.saved_stdin);
    }
}

impl Drop for StdioSnapshot {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Run a builtin in the current process, bracketed by the stdio snapshot.
///
/// `argv` is the already-expanded argument vector. A failed redirection
/// returns its code without dispatching, releasing any heredoc descriptors
/// the later redirections still hold; the snapshot guarantees the shell's
/// descriptors are identical before and after either way.
pub fn execute_builtin(node: &mut Node, argv: &[String], env: &mut Env) -> i32 {
    let mut snapshot = match StdioSnapshot::take() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            debug!("stdio snapshot failed: {}", err);
            report_error(None, "dup failed");
            close_heredocs(node);
            return 1;
        }
    };

    if !node.redirections.is_empty() {
        let code = apply_redirections(node);
        if code != 0 {
            close_heredocs(node);
            snapshot.restore();
            return code;
        }
    }

    let status = match argv.first().and_then(|name| Builtin::lookup(name)) {
        Some(builtin) => builtin.run(argv, env),
        // the interpreter only routes recognized names here
        None => 0,
    };

    snapshot.restore();
    status
}
