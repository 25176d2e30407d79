use std::path::Path;

use log::debug;

use crate::shell::env::Env;

/// Resolve a command name to an executable path.
///
/// Names containing a slash bypass the search and only pass an existence
/// check. Everything else is looked up in the directories of the shell
/// environment's `PATH` (not the process environment: `export`/`unset`
/// must take effect immediately). Existence is the only criterion here;
/// the launcher distinguishes non-executable candidates separately.
pub fn find_cmd_path(name: &str, env: &Env) -> Option<String> {
    if name.is_empty() {
        return None;
    }

    if name.contains('/') {
        if Path::new(name).exists() {
            return Some(name.to_string());
        }
        return None;
    }

    let search_path = env.get("PATH")?;
    for dir in search_path.split(':') {
        // an empty PATH segment means the current directory
        let dir = if dir.is_empty() { "." } else { dir };
        let candidate = Path::new(dir).join(name);
        if candidate.exists() {
            debug!("resolved {} to {}", name, candidate.display());
            return Some(candidate.to_string_lossy().into_owned());
        }
    }
    None
}
