use std::ffi::CString;
use std::process;

use log::debug;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{access, fork, AccessFlags, ForkResult, Pid};

use super::heredoc::close_heredocs;
use super::redirect::apply_redirections;
use super::report_error;
use crate::shell::env::Env;
use crate::shell::parser::ast::Node;
use crate::utils::path::find_cmd_path;

/// Fork and run an external command, blocking until the child finishes.
///
/// `argv` is the already-expanded argument vector. Path resolution, the
/// final redirection pass and the exec itself all happen inside the child;
/// the parent only waits and translates the wait status.
pub fn execute_external(node: &mut Node, argv: &[String], env: &Env) -> i32 {
    match unsafe { fork() } {
        Err(err) => {
            debug!("fork failed: {}", err);
            report_error(Some(&argv[0]), "fork failed");
            close_heredocs(node);
            1
        }
        Ok(ForkResult::Child) => exec_child(node, argv, env),
        Ok(ForkResult::Parent { child }) => {
            // the child owns the heredoc descriptors now
            close_heredocs(node);
            wait_for(child)
        }
    }
}

/// Child-side half of the launch; never returns. Also used for pipeline
/// stages once their pipe ends are wired up.
pub(super) fn exec_child(node: &mut Node, argv: &[String], env: &Env) -> ! {
    let code = apply_redirections(node);
    if code != 0 {
        // process teardown reclaims the descriptors
        process::exit(code);
    }

    let name = argv[0].clone();
    let path = match find_cmd_path(&name, env) {
        Some(path) => path,
        None => {
            report_error(Some(&name), "command not found");
            process::exit(127);
        }
    };

    if access(path.as_str(), AccessFlags::X_OK).is_err() {
        report_error(Some(&name), "Permission denied");
        process::exit(126);
    }

    let envp = match env.to_cstring_vec() {
        Ok(envp) => envp,
        Err(_) => {
            report_error(Some(&name), "environment conversion failed");
            process::exit(1);
        }
    };

    let argv_c: Result<Vec<CString>, _> = argv
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect();
    if let (Ok(path_c), Ok(argv_c)) = (CString::new(path), argv_c) {
        let _ = nix::unistd::execve(&path_c, &argv_c, &envp);
    }
    // a failed exec after the existence and executability checks still
    // reads as "not found" from the shell's point of view
    report_error(Some(&name), "command not found");
    process::exit(127);
}

/// Translate a child's wait status into a shell exit status.
pub(super) fn wait_for(child: Pid) -> i32 {
    match waitpid(child, None) {
        Ok(WaitStatus::Exited(_, code)) => code,
        Ok(WaitStatus::Signaled(_, signal, _)) => 128 + signal as i32,
        Ok(status) => {
            debug!("unexpected wait status: {:?}", status);
            1
        }
        Err(err) => {
            debug!("waitpid failed: {}", err);
            1
        }
    }
}
