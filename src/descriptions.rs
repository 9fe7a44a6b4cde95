use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use log::debug;
use log::warn;

use crate::rm8_types::RelayId;
use crate::state_store::write_atomically;
use crate::state_store::PersistenceError;

pub const DEFAULT_DESCRIPTIONS_FILE: &str = "relay_descriptions.txt";

/// Free text labels of the relays, stored as `Relay <n>: <text>` lines.
#[derive(Clone, Debug)]
pub struct DescriptionStore {
    path: PathBuf,
}

impl DescriptionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> [String; 8] {
        match fs::read_to_string(&self.path) {
            Ok(content) => parse_descriptions(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No relay descriptions at '{}'", self.path.display());
                Default::default()
            }
            Err(e) => {
                warn!(
                    "Failed to load relay descriptions from '{}': {}",
                    self.path.display(),
                    e
                );
                Default::default()
            }
        }
    }

    pub fn save(&self, descriptions: &[String; 8]) -> Result<(), PersistenceError> {
        let content: String = RelayId::ALL
            .iter()
            .map(|relay| {
                let description = single_line(&descriptions[relay.index()]);
                format!("{}: {}\n", relay, description)
            })
            .collect();
        write_atomically(&self.path, &content)
    }

    /// Replaces the description of one relay and keeps the stored ones of all others.
    pub fn save_single(
        &self,
        relay: &RelayId,
        description: &str,
    ) -> Result<(), PersistenceError> {
        let mut descriptions = self.load();
        descriptions[relay.index()] = single_line(description);
        self.save(&descriptions)?;
        debug!("Saved description of '{}'", relay);
        Ok(())
    }
}

/// A description as it is stored: one line, without surrounding whitespace.
///
/// Line breaks would start a new record in the file, so they become spaces.
pub fn single_line(description: &str) -> String {
    description.trim().replace(['\r', '\n'], " ")
}

fn parse_descriptions(content: &str) -> [String; 8] {
    let mut descriptions: [String; 8] = Default::default();
    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        match parse_line(line) {
            Some((relay, description)) => descriptions[relay.index()] = description,
            None => debug!("Ignoring description line '{}'", line),
        }
    }
    descriptions
}

fn parse_line(line: &str) -> Option<(RelayId, String)> {
    let (label, description) = line.split_once(':')?;
    let number = label.trim().strip_prefix("Relay")?.trim();
    let relay = RelayId::try_from(number.parse::<u8>().ok()?).ok()?;
    Some((relay, description.trim().to_string()))
}
