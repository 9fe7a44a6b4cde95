use log::info;
use log::warn;
use thiserror::Error;

use crate::descriptions::single_line;
use crate::descriptions::DescriptionStore;
use crate::rm8_ctl::ProtocolError;
use crate::rm8_ctl::Rm8Control;
use crate::rm8_types::RelayId;
use crate::rm8_types::RelayState;
use crate::state_store::PersistenceError;
use crate::state_store::StateStore;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// The relay board as seen by a front end: device access plus the remembered
/// state and descriptions of all relays.
///
/// In-memory state only changes after the board acknowledged a command. A
/// failed save is reported but leaves the in-memory state as switched.
pub struct Rm8Board {
    control: Rm8Control,
    state_store: StateStore,
    description_store: DescriptionStore,
    states: [bool; 8],
    descriptions: [String; 8],
}

impl Rm8Board {
    pub fn open(
        control: Rm8Control,
        state_store: StateStore,
        description_store: DescriptionStore,
    ) -> Rm8Board {
        let states = state_store.load();
        let descriptions = description_store.load();
        Rm8Board {
            control,
            state_store,
            description_store,
            states,
            descriptions,
        }
    }

    pub fn control(&self) -> &Rm8Control {
        &self.control
    }

    pub fn state(&self, relay: &RelayId) -> RelayState {
        RelayState::from(self.states[relay.index()])
    }

    pub fn states(&self) -> &[bool; 8] {
        &self.states
    }

    pub fn description(&self, relay: &RelayId) -> &str {
        &self.descriptions[relay.index()]
    }

    pub fn switch(&mut self, relay: &RelayId, state: RelayState) -> Result<(), BoardError> {
        self.control.set(relay, state)?;
        self.record(relay, state)
    }

    pub fn toggle(&mut self, relay: &RelayId) -> Result<RelayState, BoardError> {
        let state = self.state(relay).toggled();
        self.switch(relay, state)?;
        Ok(state)
    }

    /// Switches the relays one after another, each in its own transaction.
    pub fn switch_all(&mut self, state: RelayState) -> Vec<(RelayId, Result<(), BoardError>)> {
        RelayId::ALL
            .iter()
            .map(|relay| (*relay, self.switch(relay, state)))
            .collect()
    }

    pub fn set_description(
        &mut self,
        relay: &RelayId,
        description: &str,
    ) -> Result<(), BoardError> {
        self.descriptions[relay.index()] = single_line(description);
        self.description_store.save_single(relay, description)?;
        Ok(())
    }

    pub fn clear_description(&mut self, relay: &RelayId) -> Result<(), BoardError> {
        self.set_description(relay, "")
    }

    fn record(&mut self, relay: &RelayId, state: RelayState) -> Result<(), BoardError> {
        self.states[relay.index()] = state.is_on();
        info!("'{}' is now '{}'", relay, state);
        if let Err(e) = self.state_store.save(&self.states) {
            warn!("{}: {}", relay, e);
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rm8_ctl::tests::MockDevice;
    use crate::rm8_ctl::tests::Reply;
    use crate::rm8_frames::RELAY_HIGH;
    use crate::rm8_frames::RELAY_LOW;
    use crate::rm8_types::RelayId::*;
    use crate::state_store::tests::temp_path;
    use std::fs;

    fn board(device: &MockDevice, name: &str) -> Rm8Board {
        Rm8Board::open(
            device.control(),
            StateStore::new(temp_path(&format!("{}-states.txt", name))),
            DescriptionStore::new(temp_path(&format!("{}-descriptions.txt", name))),
        )
    }

    #[test]
    fn acknowledged_switch_is_recorded_and_persisted() {
        let states_path = temp_path("e2e-states.txt");
        fs::write(&states_path, "1\n0\n0\n0\n1\n0\n0\n1\n").unwrap();
        let device = MockDevice::acking();
        let mut board = Rm8Board::open(
            device.control(),
            StateStore::new(&states_path),
            DescriptionStore::new(temp_path("e2e-descriptions.txt")),
        );

        board.switch(&Relay3, RelayState::On).unwrap();
        assert_eq!(board.state(&Relay3), RelayState::On);
        assert_eq!(device.log.borrow().written, vec![RELAY_HIGH[2].to_vec()]);

        let reloaded = StateStore::new(&states_path).load();
        assert_eq!(
            reloaded,
            [true, false, true, false, true, false, false, true]
        );
        fs::remove_file(&states_path).unwrap();
    }

    #[test]
    fn failed_switch_changes_nothing() {
        let device = MockDevice::replying(Reply::Bytes(Vec::new()));
        let mut board = board(&device, "failed");

        let err = board.switch(&Relay1, RelayState::On).unwrap_err();
        assert!(matches!(
            err,
            BoardError::Protocol(ProtocolError::UnexpectedResponse { .. })
        ));
        assert_eq!(board.states(), &[false; 8]);
        assert!(!board.state_store.path().exists());
    }

    #[test]
    fn toggle_flips_remembered_state() {
        let device = MockDevice::acking();
        let mut board = board(&device, "toggle");

        assert_eq!(board.toggle(&Relay6).unwrap(), RelayState::On);
        assert_eq!(board.toggle(&Relay6).unwrap(), RelayState::Off);
        assert_eq!(
            device.log.borrow().written,
            vec![RELAY_HIGH[5].to_vec(), RELAY_LOW[5].to_vec()]
        );
        fs::remove_file(board.state_store.path()).unwrap();
    }

    #[test]
    fn switch_all_records_only_acknowledged_relays() {
        let device = MockDevice::acking();
        let mut board = board(&device, "all");

        let results = board.switch_all(RelayState::On);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(board.states(), &[true; 8]);

        device.set_reply(Reply::Bytes(b"NAK".to_vec()));
        let results = board.switch_all(RelayState::Off);
        assert!(results.iter().all(|(_, r)| r.is_err()));
        assert_eq!(board.states(), &[true; 8]);
        assert_eq!(board.state_store.load(), [true; 8]);
        fs::remove_file(board.state_store.path()).unwrap();
    }

    #[test]
    fn persistence_failure_keeps_switched_state() {
        let device = MockDevice::acking();
        let mut board = Rm8Board::open(
            device.control(),
            StateStore::new(temp_path("no-such-dir").join("states.txt")),
            DescriptionStore::new(temp_path("persist-descriptions.txt")),
        );

        let err = board.switch(&Relay2, RelayState::On).unwrap_err();
        assert!(matches!(err, BoardError::Persistence(_)));
        assert_eq!(board.state(&Relay2), RelayState::On);
    }

    #[test]
    fn descriptions_are_kept_and_persisted() {
        let device = MockDevice::acking();
        let mut board = board(&device, "describe");

        board.set_description(&Relay4, " Garden lights ").unwrap();
        assert_eq!(board.description(&Relay4), "Garden lights");
        assert_eq!(board.description_store.load()[3], "Garden lights");

        board.clear_description(&Relay4).unwrap();
        assert_eq!(board.description(&Relay4), "");
        assert!(device.log.borrow().opened.is_empty());
        fs::remove_file(board.description_store.path()).unwrap();
    }

    #[test]
    fn multiline_description_is_kept_as_stored() {
        let device = MockDevice::acking();
        let mut board = board(&device, "multiline");

        board.set_description(&Relay1, "Pump").unwrap();
        board
            .set_description(&Relay2, "Valve\nRelay 1: overwritten")
            .unwrap();

        let stored = board.description_store.load();
        assert_eq!(stored[0], "Pump");
        assert_eq!(board.description(&Relay2), "Valve Relay 1: overwritten");
        assert_eq!(board.description(&Relay2), stored[1]);
        fs::remove_file(board.description_store.path()).unwrap();
    }
}
