use std::os::unix::io::RawFd;

use log::debug;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2};

use super::report_error;
use crate::shell::parser::ast::{Node, RedirKind, Redirection};

const CREATE_MODE: Mode = Mode::from_bits_truncate(0o644);

/// Apply a node's redirections onto the current process, strictly left to
/// right. The first failure stops the walk and its code is returned; 0 means
/// every redirection took effect.
pub fn apply_redirections(node: &mut Node) -> i32 {
    for redir in node.redirections.iter_mut() {
        let code = match redir.kind {
            RedirKind::Input => apply_input(redir),
            RedirKind::Output | RedirKind::Append => apply_output(redir),
            RedirKind::Heredoc => apply_heredoc(redir),
        };
        if code != 0 {
            return code;
        }
    }
    0
}

fn apply_input(redir: &Redirection) -> i32 {
    let fd = match open(redir.target.as_str(), OFlag::O_RDONLY, Mode::empty()) {
        Ok(fd) => fd,
        Err(err) => {
            debug!("open {} failed: {}", redir.target, err);
            report_error(Some(&redir.target), "No such file or directory");
            return 1;
        }
    };
    redirect_onto(fd, libc::STDIN_FILENO)
}

fn apply_output(redir: &Redirection) -> i32 {
    let disposition = if redir.kind == RedirKind::Append {
        OFlag::O_APPEND
    } else {
        OFlag::O_TRUNC
    };
    let flags = OFlag::O_WRONLY | OFlag::O_CREAT | disposition;
    let fd = match open(redir.target.as_str(), flags, CREATE_MODE) {
        Ok(fd) => fd,
        Err(err) => {
            debug!("open {} failed: {}", redir.target, err);
            report_error(Some(&redir.target), "Permission denied");
            return 1;
        }
    };
    redirect_onto(fd, libc::STDOUT_FILENO)
}

fn apply_heredoc(redir: &mut Redirection) -> i32 {
    // a non-positive descriptor means the heredoc was never materialized or
    // was already consumed; skipping is not an error
    if redir.fd <= 0 {
        return 0;
    }
    let fd = redir.fd;
    redir.fd = -1;
    redirect_onto(fd, libc::STDIN_FILENO)
}

/// Duplicate `fd` onto `target` and close `fd`, on every path.
fn redirect_onto(fd: RawFd, target: RawFd) -> i32 {
    if dup2(fd, target).is_err() {
        report_error(None, "dup2 failed");
        let _ = close(fd);
        return 1;
    }
    let _ = close(fd);
    0
}
