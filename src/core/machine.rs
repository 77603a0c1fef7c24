//! Alarm state machine
//!
//! Transition table (unlisted pairs leave the state unchanged):
//! - IDLE     --in range-->        DETECTED
//! - DETECTED --out of range-->    OCCLUDED
//! - DETECTED --alert reached-->   ALARM
//! - OCCLUDED --in range-->        DETECTED
//! - OCCLUDED --occlusion timeout--> IDLE
//! - ALARM    --out of range-->    ARMED
//! - ARMED    --in range-->        ALARM
//! - ARMED    --occlusion timeout--> IDLE

use std::collections::HashMap;

use crate::types::{ConfigError, ConfigResult, Event, State};

/// Immutable (state, event) → state mapping
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTable {
    entries: HashMap<(State, Event), State>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::loitering()
    }
}

impl TransitionTable {
    /// Build a table from (from, event, to) triples. Each (from, event) pair may
    /// appear once.
    pub fn new<I>(entries: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (State, Event, State)>,
    {
        let mut map = HashMap::new();
        for (from, event, to) in entries {
            if map.insert((from, event), to).is_some() {
                return Err(ConfigError::DuplicateTransition { state: from, event });
            }
        }
        Ok(Self { entries: map })
    }

    /// The loitering alarm table
    pub fn loitering() -> Self {
        use Event::*;
        use State::*;

        let entries = [
            (Idle, TargetInRange, Detected),
            (Detected, TargetOutOfRange, Occluded),
            (Detected, AlertTimeReached, Alarm),
            (Occluded, TargetInRange, Detected),
            (Occluded, OcclusionTimeout, Idle),
            (Alarm, TargetOutOfRange, Armed),
            (Armed, TargetInRange, Alarm),
            (Armed, OcclusionTimeout, Idle),
        ];
        Self {
            entries: entries
                .into_iter()
                .map(|(from, event, to)| ((from, event), to))
                .collect(),
        }
    }

    /// Target of (state, event), if mapped
    pub fn lookup(&self, state: State, event: Event) -> Option<State> {
        self.entries.get(&(state, event)).copied()
    }

    /// Number of mapped pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Deterministic automaton over [`State`] and [`Event`]
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: State,
    table: TransitionTable,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(TransitionTable::loitering())
    }
}

impl StateMachine {
    /// New machine in `Idle`
    pub fn new(table: TransitionTable) -> Self {
        Self {
            state: State::Idle,
            table,
        }
    }

    /// Apply an event and return the (possibly unchanged) state
    pub fn transition(&mut self, event: Event) -> State {
        if let Some(next) = self.table.lookup(self.state, event) {
            self.state = next;
        }
        self.state
    }

    /// Get current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Get transition table
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in(state: State) -> StateMachine {
        StateMachine {
            state,
            table: TransitionTable::loitering(),
        }
    }

    #[test]
    fn test_initial_state_is_idle() {
        assert_eq!(StateMachine::default().state(), State::Idle);
    }

    #[test]
    fn test_full_table() {
        use Event::*;
        use State::*;

        let expected = [
            (Idle, [Some(Detected), None, None, None]),
            (Detected, [None, Some(Occluded), Some(Alarm), None]),
            (Occluded, [Some(Detected), None, None, Some(Idle)]),
            (Alarm, [None, Some(Armed), None, None]),
            (Armed, [Some(Alarm), None, None, Some(Idle)]),
        ];

        for (from, row) in expected {
            for (event, to) in Event::ALL.into_iter().zip(row) {
                let mut machine = machine_in(from);
                let next = machine.transition(event);
                assert_eq!(next, to.unwrap_or(from), "({:?}, {:?})", from, event);
                assert_eq!(machine.state(), next);
            }
        }
    }

    #[test]
    fn test_unmatched_event_is_noop() {
        let mut machine = StateMachine::default();
        for _ in 0..5 {
            assert_eq!(machine.transition(Event::TargetOutOfRange), State::Idle);
        }
        assert_eq!(machine.transition(Event::OcclusionTimeout), State::Idle);
    }

    #[test]
    fn test_loitering_table_size() {
        let table = TransitionTable::loitering();
        assert_eq!(table.len(), 8);

        let mapped = State::ALL
            .into_iter()
            .flat_map(|state| Event::ALL.into_iter().map(move |event| (state, event)))
            .filter(|&(state, event)| table.lookup(state, event).is_some())
            .count();
        assert_eq!(mapped, table.len());
    }

    #[test]
    fn test_custom_table() {
        let table = TransitionTable::new([
            (State::Idle, Event::TargetInRange, State::Alarm),
            (State::Alarm, Event::OcclusionTimeout, State::Idle),
        ])
        .unwrap();
        let mut machine = StateMachine::new(table);
        assert_eq!(machine.transition(Event::TargetInRange), State::Alarm);
        assert_eq!(machine.transition(Event::TargetOutOfRange), State::Alarm);
        assert_eq!(machine.transition(Event::OcclusionTimeout), State::Idle);
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let result = TransitionTable::new([
            (State::Idle, Event::TargetInRange, State::Detected),
            (State::Idle, Event::TargetInRange, State::Alarm),
        ]);
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateTransition {
                state: State::Idle,
                event: Event::TargetInRange
            })
        ));
    }
}
