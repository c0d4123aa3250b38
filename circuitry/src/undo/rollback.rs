use std::ops::{Deref, DerefMut};

type Action<'a, T> = Box<dyn FnOnce(&mut T) + 'a>;

/// Compensating actions for a multi-step mutation of `T`.
///
/// The guard mutably borrows the target and hands it out through
/// `Deref`/`DerefMut`. Every completed step registers the action which
/// reverts it. Dropping the guard without calling [`ScopeGuardList::dismiss`]
/// runs the actions in reverse order, so returning early with `?` leaves the
/// target as it was before the first step.
pub struct ScopeGuardList<'a, T> {
    target: &'a mut T,
    actions: Vec<Action<'a, T>>,
}

impl<'a, T> ScopeGuardList<'a, T> {
    pub fn new(target: &'a mut T) -> Self {
        Self {
            target,
            actions: Vec::new(),
        }
    }

    pub fn with_capacity(target: &'a mut T, capacity: usize) -> Self {
        Self {
            target,
            actions: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, action: impl FnOnce(&mut T) + 'a) {
        self.actions.push(Box::new(action));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Keep all changes made so far.
    pub fn dismiss(mut self) {
        self.actions.clear();
    }
}

impl<T> Deref for ScopeGuardList<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.target
    }
}

impl<T> DerefMut for ScopeGuardList<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.target
    }
}

impl<T> Drop for ScopeGuardList<'_, T> {
    fn drop(&mut self) {
        if self.actions.is_empty() {
            return;
        }
        tracing::debug!(count = self.actions.len(), "Rolling back partial operation");
        while let Some(action) = self.actions.pop() {
            action(&mut *self.target);
        }
    }
}
