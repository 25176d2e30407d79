use log::{debug, warn};
use std::error::Error;
use std::io::Write;

use crate::shell::env::Env;
use crate::shell::exec::{self, execute};
use crate::shell::parser::Parser;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::utils::config::Config;

const PROMPT: &str = "minishell$ ";

pub struct Shell<'a> {
    env: Env,
    last_status: i32,
    readline: ReadlineManager<'a>,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            env: Env::from_process(),
            last_status: 0,
            readline: ReadlineManager::new(config)?,
        })
    }

    /// Read-eval loop; returns the status the shell process should exit with.
    pub fn run(&mut self) -> Result<i32, Box<dyn Error>> {
        debug!("minishell starting");
        self.readline.load_history();

        loop {
            std::io::stdout().flush()?;
            match self.readline.readline(PROMPT) {
                Ok(line) => self.handle_line(&line),
                Err(ReadlineError::Interrupted) => {
                    // ^C abandons the current line but keeps the shell alive
                    self.last_status = 130;
                }
                Err(ReadlineError::Eof) => {
                    println!("exit");
                    break;
                }
                Err(err) => {
                    warn!("readline error: {}", err);
                    eprintln!("minishell: {}", err);
                    break;
                }
            }
        }

        self.readline.save_history();
        debug!("minishell exiting with status {}", self.last_status);
        Ok(self.last_status)
    }

    fn handle_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.readline.add_history(line);
        debug!("input: {}", line);

        match Parser::new(line).parse() {
            Err(message) => {
                exec::report_error(None, &message);
                self.last_status = 2;
            }
            Ok(None) => {}
            Ok(Some(mut node)) => {
                self.last_status = execute(Some(&mut node), &mut self.env, self.last_status);
                debug!("status: {}", self.last_status);
            }
        }
    }
}
