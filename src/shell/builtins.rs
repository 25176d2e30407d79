use std::env;
use std::io::{self, Write};
use std::process;

use errno::errno;
use log::debug;

use super::env::{is_valid_identifier, Env};
use crate::shell::exec::report_error;

/// The closed set of commands implemented inside the shell process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Echo,
    Cd,
    Pwd,
    Export,
    Unset,
    Env,
    Exit,
}

impl Builtin {
    /// Pure name lookup; lets the interpreter classify a command without
    /// committing to a code path.
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "echo" => Some(Builtin::Echo),
            "cd" => Some(Builtin::Cd),
            "pwd" => Some(Builtin::Pwd),
            "export" => Some(Builtin::Export),
            "unset" => Some(Builtin::Unset),
            "env" => Some(Builtin::Env),
            "exit" => Some(Builtin::Exit),
            _ => None,
        }
    }

    pub fn run(self, argv: &[String], env: &mut Env) -> i32 {
        debug!("running builtin {:?}: {:?}", self, argv);
        match self {
            Builtin::Echo => builtin_echo(argv),
            Builtin::Cd => builtin_cd(argv, env),
            Builtin::Pwd => builtin_pwd(),
            Builtin::Export => builtin_export(argv, env),
            Builtin::Unset => builtin_unset(argv, env),
            Builtin::Env => builtin_env(env),
            Builtin::Exit => builtin_exit(argv),
        }
    }
}

// Builtins write through the raw stream and flush before returning: fd 1 may
// be a redirection about to be unwound, so nothing can stay buffered.
fn write_stdout(text: &str) -> i32 {
    let mut out = io::stdout();
    if out.write_all(text.as_bytes()).is_err() || out.flush().is_err() {
        return 1;
    }
    0
}

fn builtin_echo(argv: &[String]) -> i32 {
    let mut args = &argv[1..];
    let mut newline = true;

    // any run of leading -n/-nnn... flags suppresses the newline
    while let Some(first) = args.first() {
        if first.len() > 1 && first.starts_with('-') && first[1..].chars().all(|c| c == 'n') {
            newline = false;
            args = &args[1..];
        } else {
            break;
        }
    }

    let mut text = args.join(" ");
    if newline {
        text.push('\n');
    }
    write_stdout(&text)
}

fn builtin_cd(argv: &[String], env: &mut Env) -> i32 {
    if argv.len() > 2 {
        report_error(Some("cd"), "too many arguments");
        return 1;
    }

    let target = match argv.get(1) {
        Some(arg) => shellexpand::tilde(arg).into_owned(),
        None => match env.get("HOME") {
            Some(home) => home.to_string(),
            None => {
                report_error(Some("cd"), "HOME not set");
                return 1;
            }
        },
    };

    let previous = env::current_dir().ok();
    if env::set_current_dir(&target).is_err() {
        report_error(Some("cd"), &format!("{}: {}", target, errno()));
        return 1;
    }

    if let Some(prev) = previous.and_then(|p| p.to_str().map(String::from)) {
        env.set("OLDPWD", &prev);
    }
    if let Ok(new_dir) = env::current_dir() {
        if let Some(new_dir) = new_dir.to_str() {
            env.set("PWD", new_dir);
        }
    }
    0
}

fn builtin_pwd() -> i32 {
    match env::current_dir() {
        Ok(dir) => write_stdout(&format!("{}\n", dir.display())),
        Err(_) => {
            report_error(Some("pwd"), &format!("{}", errno()));
            1
        }
    }
}

fn builtin_export(argv: &[String], env: &mut Env) -> i32 {
    if argv.len() == 1 {
        let mut listing = String::new();
        for (key, value) in env.iter() {
            match value {
                Some(value) => listing.push_str(&format!("declare -x {}=\"{}\"\n", key, value)),
                None => listing.push_str(&format!("declare -x {}\n", key)),
            }
        }
        return write_stdout(&listing);
    }

    let mut status = 0;
    for arg in &argv[1..] {
        let (name, value) = match arg.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (arg.as_str(), None),
        };
        if !is_valid_identifier(name) {
            report_error(Some("export"), &format!("`{}': not a valid identifier", arg));
            status = 1;
            continue;
        }
        match value {
            Some(value) => env.set(name, value),
            None => env.export(name),
        }
    }
    status
}

fn builtin_unset(argv: &[String], env: &mut Env) -> i32 {
    let mut status = 0;
    for arg in &argv[1..] {
        if !is_valid_identifier(arg) {
            report_error(Some("unset"), &format!("`{}': not a valid identifier", arg));
            status = 1;
            continue;
        }
        env.unset(arg);
    }
    status
}

fn builtin_env(env: &Env) -> i32 {
    let mut listing = String::new();
    for (key, value) in env.iter() {
        if let Some(value) = value {
            listing.push_str(&format!("{}={}\n", key, value));
        }
    }
    write_stdout(&listing)
}

fn builtin_exit(argv: &[String]) -> i32 {
    let _ = write_stdout("exit\n");

    let arg = match argv.get(1) {
        None => process::exit(0),
        Some(arg) => arg,
    };

    let code = match parse_exit_code(arg) {
        Some(code) => code,
        None => {
            report_error(Some("exit"), &format!("{}: numeric argument required", arg));
            process::exit(255);
        }
    };

    if argv.len() > 2 {
        // a bad first argument exits anyway, too many args does not
        report_error(Some("exit"), "too many arguments");
        return 1;
    }

    process::exit(code);
}

fn parse_exit_code(arg: &str) -> Option<i32> {
    let n: i64 = arg.parse().ok()?;
    Some((n.rem_euclid(256)) as i32)
}
