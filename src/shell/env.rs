use std::env;
use std::ffi::{CString, NulError};

/// One entry of the shell environment. Exported names without a value
/// (`export FOO`) carry `None` and are skipped when flattening for execve.
#[derive(Debug, Clone)]
struct EnvEntry {
    key: String,
    value: Option<String>,
}

/// The shell's environment list.
///
/// A single mutable structure threaded by reference through builtins,
/// expansion and path search. Insertion order is preserved so `env` output
/// is stable across mutations.
#[derive(Debug, Clone, Default)]
pub struct Env {
    entries: Vec<EnvEntry>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the list from the process environment.
    pub fn from_process() -> Self {
        let entries = env::vars()
            .map(|(key, value)| EnvEntry {
                key,
                value: Some(value),
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .and_then(|e| e.value.as_deref())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.value = Some(value.to_string()),
            None => self.entries.push(EnvEntry {
                key: key.to_string(),
                value: Some(value.to_string()),
            }),
        }
    }

    /// Mark a name exported without assigning a value. A no-op if the name
    /// already exists.
    pub fn export(&mut self, key: &str) {
        if !self.entries.iter().any(|e| e.key == key) {
            self.entries.push(EnvEntry {
                key: key.to_string(),
                value: None,
            });
        }
    }

    pub fn unset(&mut self, key: &str) {
        self.entries.retain(|e| e.key != key);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|e| (e.key.as_str(), e.value.as_deref()))
    }

    /// Flatten to `KEY=VALUE` strings for execve. Valueless entries are
    /// not part of the exported image.
    pub fn to_cstring_vec(&self) -> Result<Vec<CString>, NulError> {
        self.entries
            .iter()
            .filter_map(|e| {
                e.value
                    .as_deref()
                    .map(|v| CString::new(format!("{}={}", e.key, v)))
            })
            .collect()
    }
}

/// POSIX shell identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
