use crate::utils::config::Config;
use chrono::Local;
use env_logger::{Builder, Target};
use std::fs::{self, File};
use std::io::Write;
use std::process;

/// Set up file logging under the config directory. The shell's stdout and
/// stderr belong to the user's commands, so log records never go there; if
/// the log file cannot be created logging is simply disabled.
pub fn init_logger(config: &Config) {
    let level = match &config.logger_level {
        level if level.eq_ignore_ascii_case("error") => log::LevelFilter::Error,
        level if level.eq_ignore_ascii_case("warn") => log::LevelFilter::Warn,
        level if level.eq_ignore_ascii_case("info") => log::LevelFilter::Info,
        level if level.eq_ignore_ascii_case("debug") => log::LevelFilter::Debug,
        level if level.eq_ignore_ascii_case("trace") => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    };

    if fs::create_dir_all(&config.logger_dir).is_err() {
        return;
    }
    let date = Local::now().format("%Y-%m-%d");
    let log_file = config.logger_dir.join(format!("minishell_{}.log", date));
    let file = match File::create(&log_file) {
        Ok(file) => file,
        Err(_) => return,
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[PID:{}][{}] {} - {}",
                process::id(),
                record.level(),
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .filter(None, level)
        .init();

    log::debug!("log level set to {}", level);
}
