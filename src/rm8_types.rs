use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;

use thiserror::Error;

use RelayId::*;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid relay number '{0}', expected 1 to 8")]
pub struct InvalidChannel(pub u8);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid relay state '{0}', expected on, off, high or low")]
pub struct InvalidRelayState(pub String);

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelayId {
    Relay1,
    Relay2,
    Relay3,
    Relay4,
    Relay5,
    Relay6,
    Relay7,
    Relay8,
}

impl RelayId {
    pub const ALL: [RelayId; 8] = [
        Relay1, Relay2, Relay3, Relay4, Relay5, Relay6, Relay7, Relay8,
    ];

    /// Zero based position of the relay, used to index frame tables and state records.
    pub fn index(&self) -> usize {
        match self {
            Relay1 => 0,
            Relay2 => 1,
            Relay3 => 2,
            Relay4 => 3,
            Relay5 => 4,
            Relay6 => 5,
            Relay7 => 6,
            Relay8 => 7,
        }
    }

    /// Relay number as printed on the board (1 to 8).
    pub fn number(&self) -> u8 {
        self.index() as u8 + 1
    }
}

impl TryFrom<u8> for RelayId {
    type Error = InvalidChannel;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1 => Ok(Relay1),
            2 => Ok(Relay2),
            3 => Ok(Relay3),
            4 => Ok(Relay4),
            5 => Ok(Relay5),
            6 => Ok(Relay6),
            7 => Ok(Relay7),
            8 => Ok(Relay8),
            unknown => Err(InvalidChannel(unknown)),
        }
    }
}

impl Display for RelayId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Relay {}", self.number())
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelayState {
    On,
    Off,
}

impl RelayState {
    pub fn toggled(&self) -> RelayState {
        match self {
            RelayState::On => RelayState::Off,
            RelayState::Off => RelayState::On,
        }
    }

    pub fn is_on(&self) -> bool {
        *self == RelayState::On
    }
}

impl From<bool> for RelayState {
    fn from(energized: bool) -> Self {
        match energized {
            true => RelayState::On,
            false => RelayState::Off,
        }
    }
}

impl From<RelayState> for bool {
    fn from(state: RelayState) -> Self {
        state.is_on()
    }
}

impl FromStr for RelayState {
    type Err = InvalidRelayState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" | "high" => Ok(RelayState::On),
            "off" | "low" => Ok(RelayState::Off),
            _ => Err(InvalidRelayState(s.to_string())),
        }
    }
}

impl Display for RelayState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RelayState::On => write!(f, "ON"),
            RelayState::Off => write!(f, "OFF"),
        }
    }
}
