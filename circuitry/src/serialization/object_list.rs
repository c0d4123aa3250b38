//! Ordered collection whose elements are unique by key.

use std::fmt;
use thiserror::Error;

use super::sexp::SExp;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("There is already a {tag} with the key \"{key}\"")]
    DuplicateKey { tag: &'static str, key: String },
    #[error("There is no {tag} with the key \"{key}\"")]
    KeyNotFound { tag: &'static str, key: String },
    #[error("Index {index} is out of range for a list of {len} {tag} elements")]
    IndexOutOfRange {
        tag: &'static str,
        index: usize,
        len: usize,
    },
}

/// An element which can live in an [`ObjectList`].
pub trait ListElement: Clone + fmt::Debug {
    type Key: Clone + PartialEq + fmt::Debug + fmt::Display;

    /// Node name used when the element is serialized, also used in messages.
    const TAG: &'static str;

    fn key(&self) -> Self::Key;

    fn serialize(&self) -> SExp;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectList<T> {
    items: Vec<T>,
}

impl<T> Default for ObjectList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: ListElement> ObjectList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from elements, rejecting duplicate keys.
    pub fn from_elements(elements: impl IntoIterator<Item = T>) -> Result<Self, ListError> {
        let mut list = Self::new();
        for element in elements {
            list.append(element)?;
        }
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn index_of(&self, key: &T::Key) -> Option<usize> {
        self.items.iter().position(|item| &item.key() == key)
    }

    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.index_of(key).is_some()
    }

    pub fn find(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|item| &item.key() == key)
    }

    pub fn find_mut(&mut self, key: &T::Key) -> Option<&mut T> {
        self.items.iter_mut().find(|item| &item.key() == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = T::Key> + '_ {
        self.items.iter().map(ListElement::key)
    }

    /// Insert `element` at `index` (clamped to the list length) and return
    /// the index it actually landed on.
    pub fn insert(&mut self, index: usize, element: T) -> Result<usize, ListError> {
        let key = element.key();
        if self.contains_key(&key) {
            return Err(ListError::DuplicateKey {
                tag: T::TAG,
                key: key.to_string(),
            });
        }
        let index = index.min(self.items.len());
        self.items.insert(index, element);
        Ok(index)
    }

    pub fn append(&mut self, element: T) -> Result<usize, ListError> {
        self.insert(self.items.len(), element)
    }

    pub fn remove(&mut self, index: usize) -> Result<T, ListError> {
        if index >= self.items.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.items.remove(index))
    }

    pub fn remove_key(&mut self, key: &T::Key) -> Result<(usize, T), ListError> {
        let index = self.index_of(key).ok_or_else(|| ListError::KeyNotFound {
            tag: T::TAG,
            key: key.to_string(),
        })?;
        Ok((index, self.items.remove(index)))
    }

    pub fn swap(&mut self, i: usize, j: usize) -> Result<(), ListError> {
        for index in [i, j] {
            if index >= self.items.len() {
                return Err(self.out_of_range(index));
            }
        }
        self.items.swap(i, j);
        Ok(())
    }

    /// Append every element as a child of `parent`.
    pub fn serialize_into(&self, parent: &mut SExp) {
        for item in &self.items {
            parent.append(item.serialize());
        }
    }

    fn out_of_range(&self, index: usize) -> ListError {
        ListError::IndexOutOfRange {
            tag: T::TAG,
            index,
            len: self.items.len(),
        }
    }
}

impl<'a, T> IntoIterator for &'a ObjectList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str, u32);

    impl ListElement for Item {
        type Key = &'static str;
        const TAG: &'static str = "item";

        fn key(&self) -> Self::Key {
            self.0
        }

        fn serialize(&self) -> SExp {
            SExp::list(Self::TAG).with_string(self.0).with_token(self.1)
        }
    }

    #[test]
    fn test_insert_clamps_and_reports_index() {
        let mut list = ObjectList::new();
        assert_eq!(list.append(Item("a", 1)).unwrap(), 0);
        assert_eq!(list.insert(99, Item("b", 2)).unwrap(), 1);
        assert_eq!(list.insert(0, Item("c", 3)).unwrap(), 0);
        let keys: Vec<_> = list.keys().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut list = ObjectList::from_elements([Item("a", 1)]).unwrap();
        let err = list.append(Item("a", 2)).unwrap_err();
        assert_eq!(
            err,
            ListError::DuplicateKey {
                tag: "item",
                key: "a".to_string()
            }
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list.find(&"a"), Some(&Item("a", 1)));
    }

    #[test]
    fn test_remove_and_swap() {
        let mut list = ObjectList::from_elements([Item("a", 1), Item("b", 2), Item("c", 3)]).unwrap();
        list.swap(0, 2).unwrap();
        assert_eq!(list.keys().collect::<Vec<_>>(), vec!["c", "b", "a"]);
        assert!(list.swap(0, 3).is_err());
        let (index, removed) = list.remove_key(&"b").unwrap();
        assert_eq!((index, removed), (1, Item("b", 2)));
        assert!(list.remove(5).is_err());
        assert!(matches!(list.remove_key(&"zzz"), Err(ListError::KeyNotFound { .. })));
    }

    #[test]
    fn test_serialize_into() {
        let list = ObjectList::from_elements([Item("a", 1), Item("b", 2)]).unwrap();
        let mut root = SExp::list("root");
        list.serialize_into(&mut root);
        assert_eq!(root.to_string(), "(root (item \"a\" 1) (item \"b\" 2))");
    }
}
