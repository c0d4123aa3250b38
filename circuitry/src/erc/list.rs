use std::collections::BTreeSet;

use super::message::{ErcCategory, ErcMsgKey, ErcMsgType, ErcOwner};
use crate::serialization::{SExp, SExpError};

/// A currently visible diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErcEntry {
    pub key: ErcMsgKey,
    pub msg_type: ErcMsgType,
    pub text: String,
    pub ignored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErcChange {
    Added(ErcMsgKey),
    Removed(ErcMsgKey),
    Changed(ErcMsgKey),
}

/// Registry of all visible ERC messages of a project.
///
/// Entries are kept in the order they became visible. The ignore state is
/// stored by key, so it survives a message disappearing and coming back.
#[derive(Debug, Clone, Default)]
pub struct ErcMsgList {
    entries: Vec<ErcEntry>,
    ignored: BTreeSet<ErcMsgKey>,
    changes: Vec<ErcChange>,
}

impl ErcMsgList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErcEntry> {
        self.entries.iter()
    }

    pub fn find(&self, key: &ErcMsgKey) -> Option<&ErcEntry> {
        self.entries.iter().find(|entry| &entry.key == key)
    }

    pub fn contains(&self, key: &ErcMsgKey) -> bool {
        self.find(key).is_some()
    }

    /// Number of visible, not ignored messages which are errors.
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.ignored && e.msg_type.is_error())
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.ignored && !e.msg_type.is_error())
            .count()
    }

    pub(crate) fn add(&mut self, key: ErcMsgKey, text: &str) {
        assert!(!self.contains(&key), "ERC message {key} is already registered");
        self.entries.push(ErcEntry {
            key,
            msg_type: key.category.msg_type(),
            text: text.to_string(),
            ignored: self.ignored.contains(&key),
        });
        self.changes.push(ErcChange::Added(key));
    }

    pub(crate) fn remove(&mut self, key: &ErcMsgKey) {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.key == key)
            .unwrap_or_else(|| panic!("ERC message {key} is not registered"));
        self.entries.remove(index);
        self.changes.push(ErcChange::Removed(*key));
    }

    pub(crate) fn update(&mut self, key: &ErcMsgKey, text: &str) {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| &entry.key == key)
            .unwrap_or_else(|| panic!("ERC message {key} is not registered"));
        entry.text = text.to_string();
        self.changes.push(ErcChange::Changed(*key));
    }

    pub fn is_ignored(&self, key: &ErcMsgKey) -> bool {
        self.ignored.contains(key)
    }

    pub fn set_ignored(&mut self, key: ErcMsgKey, ignored: bool) {
        let changed = if ignored {
            self.ignored.insert(key)
        } else {
            self.ignored.remove(&key)
        };
        if !changed {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            entry.ignored = ignored;
            self.changes.push(ErcChange::Changed(key));
        }
    }

    pub fn ignored_keys(&self) -> impl Iterator<Item = &ErcMsgKey> {
        self.ignored.iter()
    }

    pub fn drain_changes(&mut self) -> Vec<ErcChange> {
        std::mem::take(&mut self.changes)
    }

    /// `(erc (ignore (item <class> "<key>" <category>)) ...)`
    pub fn serialize(&self) -> SExp {
        let mut ignore = SExp::list("ignore");
        for key in &self.ignored {
            ignore.append(
                SExp::list("item")
                    .with_token(key.owner.class_name())
                    .with_string(key.owner.key())
                    .with_token(key.category),
            );
        }
        SExp::list("erc").with_child(ignore)
    }

    /// Restore the ignore state written by [`ErcMsgList::serialize`].
    pub fn load_ignored(&mut self, node: &SExp) -> Result<(), SExpError> {
        node.expect_name("erc")?;
        let Some(ignore) = node.child("ignore") else {
            return Ok(());
        };
        for item in ignore.children("item") {
            let class_name = item.value(0)?;
            let owner_key = item.value(1)?;
            let owner = ErcOwner::from_parts(class_name, owner_key).ok_or_else(|| {
                SExpError::InvalidValue {
                    node: "item".to_string(),
                    value: format!("{class_name} {owner_key}"),
                    reason: "unknown ERC message owner".to_string(),
                }
            })?;
            let category: ErcCategory = item.parse_value(2)?;
            self.set_ignored(ErcMsgKey { owner, category }, true);
        }
        Ok(())
    }
}
