use std::os::unix::io::{IntoRawFd, RawFd};
use std::process;

use log::debug;
use nix::unistd::{close, dup2, fork, pipe, ForkResult, Pid};

use super::external::{exec_child, wait_for};
use super::heredoc::close_heredocs;
use super::redirect::apply_redirections;
use super::report_error;
use crate::shell::builtins::Builtin;
use crate::shell::env::Env;
use crate::shell::expand::expand_argv;
use crate::shell::parser::ast::{Node, NodeKind};

/// Run a pipeline: fork every stage before waiting on any of them, wire
/// each child's stdin/stdout through the connecting pipes, close unused
/// ends on both sides, then wait for all children and return the rightmost
/// stage's status.
pub fn execute_pipeline(node: &mut Node, env: &mut Env, last_status: i32) -> i32 {
    let mut stages: Vec<&mut Node> = Vec::new();
    collect_stages(node, &mut stages);

    // expansion happens once, in the parent, before any fork
    let argvs: Vec<Vec<String>> = stages
        .iter()
        .map(|stage| {
            if stage.is_leaf() {
                expand_argv(&stage.argv, last_status, env)
            } else {
                Vec::new()
            }
        })
        .collect();

    let count = stages.len();
    let mut pids: Vec<Pid> = Vec::with_capacity(count);
    let mut prev_read: RawFd = -1;
    let mut setup_failed = false;

    for (i, stage) in stages.iter_mut().enumerate() {
        let argv = &argvs[i];
        let is_last = i == count - 1;

        let (read_end, write_end) = if is_last {
            (-1, -1)
        } else {
            match pipe() {
                Ok((read_end, write_end)) => (read_end.into_raw_fd(), write_end.into_raw_fd()),
                Err(err) => {
                    debug!("pipe failed: {}", err);
                    report_error(None, "pipe failed");
                    close_valid(prev_read);
                    setup_failed = true;
                    break;
                }
            }
        };

        match unsafe { fork() } {
            Err(err) => {
                debug!("fork failed: {}", err);
                report_error(argv.first().map(String::as_str), "fork failed");
                close_valid(prev_read);
                close_valid(read_end);
                close_valid(write_end);
                setup_failed = true;
                break;
            }
            Ok(ForkResult::Child) => {
                if prev_read >= 0 {
                    if dup2(prev_read, libc::STDIN_FILENO).is_err() {
                        report_error(None, "dup2 failed");
                        process::exit(1);
                    }
                    let _ = close(prev_read);
                }
                if !is_last {
                    let _ = close(read_end);
                    if dup2(write_end, libc::STDOUT_FILENO).is_err() {
                        report_error(None, "dup2 failed");
                        process::exit(1);
                    }
                    let _ = close(write_end);
                }
                run_stage(stage, argv, env);
            }
            Ok(ForkResult::Parent { child }) => {
                pids.push(child);
                close_valid(prev_read);
                close_valid(write_end);
                prev_read = read_end;
            }
        }
    }

    // the forked children hold their own heredoc copies and the stages a
    // failed setup never reached must not keep theirs open either
    for stage in stages.iter_mut() {
        close_heredocs(stage);
    }

    if setup_failed {
        return reap(&pids, 1);
    }

    let mut status = 1;
    for (i, pid) in pids.iter().enumerate() {
        let stage_status = wait_for(*pid);
        if i == pids.len() - 1 {
            status = stage_status;
        }
    }
    status
}

/// Flatten a `Pipe` subtree into its stages, left to right.
fn collect_stages<'a>(node: &'a mut Node, out: &mut Vec<&'a mut Node>) {
    if node.kind != NodeKind::Pipe {
        out.push(node);
        return;
    }
    if let Some(left) = node.left.as_deref_mut() {
        collect_stages(left, out);
    }
    if let Some(right) = node.right.as_deref_mut() {
        collect_stages(right, out);
    }
}

/// Child-side stage body; pipe ends are already on fds 0/1.
fn run_stage(stage: &mut Node, argv: &[String], env: &mut Env) -> ! {
    if !stage.is_leaf() || argv.is_empty() {
        process::exit(1);
    }
    if let Some(builtin) = Builtin::lookup(&argv[0]) {
        let code = apply_redirections(stage);
        if code != 0 {
            process::exit(code);
        }
        process::exit(builtin.run(argv, env));
    }
    exec_child(stage, argv, env)
}

fn close_valid(fd: RawFd) {
    if fd >= 0 {
        let _ = close(fd);
    }
}

/// Wait for the children forked so far and surface `status`; used on the
/// error paths so no zombie outlives a failed pipeline setup.
fn reap(pids: &[Pid], status: i32) -> i32 {
    for pid in pids {
        let _ = wait_for(*pid);
    }
    status
}
