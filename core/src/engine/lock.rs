use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Channel ids excluded from automatic redistribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockSet(BTreeSet<String>);

impl LockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the channel was not locked before.
    pub fn lock(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    /// Returns `true` if the channel was locked before.
    pub fn unlock(&mut self, id: &str) -> bool {
        self.0.remove(id)
    }

    /// Flips the lock and returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.unlock(id) {
            false
        } else {
            self.lock(id)
        }
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<S: Into<String>> FromIterator<S> for LockSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
