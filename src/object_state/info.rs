//! Immutable snapshot of an object's current states

use std::collections::HashSet;

use super::request::ObjectStateRow;
use super::state::ObjectState;

/// Set of states effective for one object at the time it was read.
///
/// Only trustworthy while the object's state-request lock is held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectStatesInfo {
    states: HashSet<ObjectState>,
}

impl ObjectStatesInfo {
    pub fn new(rows: &[ObjectStateRow]) -> Self {
        Self {
            states: rows.iter().map(|row| row.state).collect(),
        }
    }

    #[inline]
    pub fn presents(&self, state: ObjectState) -> bool {
        self.states.contains(&state)
    }

    #[inline]
    pub fn absents(&self, state: ObjectState) -> bool {
        !self.presents(state)
    }

    /// True if any of `states` is present
    pub fn presents_any(&self, states: &[ObjectState]) -> bool {
        states.iter().any(|state| self.presents(*state))
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectState> + '_ {
        self.states.iter().copied()
    }
}

impl FromIterator<ObjectState> for ObjectStatesInfo {
    fn from_iter<I: IntoIterator<Item = ObjectState>>(iter: I) -> Self {
        Self {
            states: iter.into_iter().collect(),
        }
    }
}
