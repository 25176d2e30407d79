use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::path::PathBuf;

pub struct Config {
    pub config_dir: PathBuf,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_dir: PathBuf,
    pub logger_level: String,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/minishell")
        } else {
            PathBuf::from("/tmp/minishell")
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            history_file: config_dir.join("history"),
            editor_mode: String::from("emacs"),
            logger_dir: config_dir.join("logs"),
            logger_level: String::from("warn"),
            config_dir,
        }
    }

    pub fn new() -> Self {
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(editor) = env::var("MINISHELL_EDITOR") {
            config.editor_mode = editor;
        }

        if let Ok(history) = env::var("MINISHELL_HISTORY") {
            config.history_file = PathBuf::from(history);
        }

        if let Ok(log_dir) = env::var("MINISHELL_LOG_DIR") {
            config.logger_dir = PathBuf::from(log_dir);
        }

        if let Ok(level) = env::var("MINISHELL_LOG_LEVEL") {
            config.logger_level = level;
        }

        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_mode_selection() {
        let mut config = Config::default();
        config.editor_mode = String::from("vi");
        assert!(matches!(config.get_edit_mode(), EditMode::Vi));
        config.editor_mode = String::from("EMACS");
        assert!(matches!(config.get_edit_mode(), EditMode::Emacs));
        config.editor_mode = String::from("unknown");
        assert!(matches!(config.get_edit_mode(), EditMode::Emacs));
    }
}
