use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use log::debug;
use log::warn;
use thiserror::Error;

pub const DEFAULT_STATE_FILE: &str = "relay_states.txt";

#[derive(Debug, Error)]
#[error("Failed to persist '{}'", .path.display())]
pub struct PersistenceError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl PersistenceError {
    pub fn new<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Replaces `path` with `contents` by writing a sibling file and renaming it.
pub fn write_atomically(path: &Path, contents: &str) -> Result<(), PersistenceError> {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = fs::write(&tmp, contents);
    if let Err(e) = written.and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(PersistenceError::new(path, e));
    }
    Ok(())
}

/// Last commanded state of every relay, one `0` or `1` per line.
///
/// The board cannot be queried, so this record is the only source for the
/// relay states after a restart.
#[derive(Clone, Debug)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> [bool; 8] {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No relay states at '{}'", self.path.display());
                return [false; 8];
            }
            Err(e) => {
                warn!(
                    "Failed to load relay states from '{}': {}",
                    self.path.display(),
                    e
                );
                return [false; 8];
            }
        };
        parse_states(&content)
    }

    pub fn save(&self, states: &[bool; 8]) -> Result<(), PersistenceError> {
        let content: String = states
            .iter()
            .map(|state| format!("{}\n", *state as u8))
            .collect();
        write_atomically(&self.path, &content)?;
        debug!("Saved relay states to '{}'", self.path.display());
        Ok(())
    }
}

fn parse_states(content: &str) -> [bool; 8] {
    let mut states = [false; 8];
    for (i, line) in content.lines().take(8).enumerate() {
        match line.trim().parse::<i64>() {
            Ok(value) => states[i] = value != 0,
            Err(_) => warn!("Ignoring invalid state '{}' of relay {}", line, i + 1),
        }
    }
    states
}
