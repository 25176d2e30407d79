use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::os::unix::io::{IntoRawFd, RawFd};
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, warn};
use nix::unistd::close;

use crate::shell::parser::ast::{Node, RedirKind};

static HEREDOC_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Materialize every unresolved heredoc reachable from `node`.
///
/// Runs eagerly, before any forking, so body text is captured at the point
/// the command would run. Each heredoc ends up holding a readable descriptor
/// positioned at the start of its body; redirections that already carry a
/// descriptor are left alone.
pub fn process_heredocs(node: &mut Node) {
    for redir in node.redirections.iter_mut() {
        if redir.kind != RedirKind::Heredoc || redir.fd >= 0 {
            continue;
        }
        redir.fd = match read_heredoc(&redir.target) {
            Ok(fd) => fd,
            Err(err) => {
                warn!("heredoc `{}' failed: {}", redir.target, err);
                -1
            }
        };
    }
    if let Some(left) = node.left.as_deref_mut() {
        process_heredocs(left);
    }
    if let Some(right) = node.right.as_deref_mut() {
        process_heredocs(right);
    }
}

/// Close any heredoc descriptors the node subtree still holds. Used by the
/// parent after forking: the child duplicated its copy, ours must not leak.
pub fn close_heredocs(node: &mut Node) {
    for redir in node.redirections.iter_mut() {
        if redir.kind == RedirKind::Heredoc && redir.fd > 0 {
            let _ = close(redir.fd);
            redir.fd = -1;
        }
    }
    if let Some(left) = node.left.as_deref_mut() {
        close_heredocs(left);
    }
    if let Some(right) = node.right.as_deref_mut() {
        close_heredocs(right);
    }
}

fn read_heredoc(delimiter: &str) -> io::Result<RawFd> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    materialize(&mut input, delimiter, true)
}

/// Read lines until the delimiter (or end of input) and return a descriptor
/// over the captured body, positioned at its start. The backing storage is
/// an unlinked scratch file, so arbitrarily large bodies are fine.
pub fn materialize(
    input: &mut impl BufRead,
    delimiter: &str,
    interactive: bool,
) -> io::Result<RawFd> {
    let path = env::temp_dir().join(format!(
        "minishell-heredoc-{}-{}",
        process::id(),
        HEREDOC_SEQ.fetch_add(1, Ordering::Relaxed)
    ));

    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)?;

    loop {
        if interactive {
            // the continuation prompt must never mix into captured stdout
            let mut out = io::stderr();
            let _ = out.write_all(b"> ");
            let _ = out.flush();
        }
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            warn!("heredoc ended by end-of-file (wanted `{}')", delimiter);
            break;
        }
        let trimmed = line.strip_suffix('\n').unwrap_or(&line);
        if trimmed == delimiter {
            break;
        }
        writer.write_all(trimmed.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    drop(writer);

    // reopen for reading at offset zero, then unlink the name; the
    // descriptor keeps the data alive
    let reader = File::open(&path)?;
    if let Err(err) = fs::remove_file(&path) {
        debug!("could not unlink heredoc scratch file: {}", err);
    }
    Ok(reader.into_raw_fd())
}
