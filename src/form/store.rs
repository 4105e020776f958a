use std::sync::{Arc, RwLock};

use super::actions::{Action, ActionKind, Dispatcher};
use super::controller::{read_lock, write_lock};

/// A dispatcher that keeps every action it receives, in order.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    actions: Arc<RwLock<Vec<Action>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<Action> {
        read_lock(&self.actions).clone()
    }

    pub fn of_kind(&self, kind: ActionKind) -> Vec<Action> {
        read_lock(&self.actions)
            .iter()
            .filter(|action| action.is(kind))
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        read_lock(&self.actions)
            .iter()
            .filter(|action| action.is(kind))
            .count()
    }

    pub fn last(&self) -> Option<Action> {
        read_lock(&self.actions).last().cloned()
    }

    pub fn len(&self) -> usize {
        read_lock(&self.actions).len()
    }

    pub fn is_empty(&self) -> bool {
        read_lock(&self.actions).is_empty()
    }

    pub fn clear(&self) {
        write_lock(&self.actions).clear();
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, action: Action) {
        write_lock(&self.actions).push(action);
    }
}
