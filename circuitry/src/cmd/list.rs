//! Generic insert/remove/swap commands for the ordered lists of a project.

use std::fmt;
use std::marker::PhantomData;

use super::Command;
use crate::attributes::Attribute;
use crate::circuit::CircuitError;
use crate::project::{DeviceInstance, Project, SymbolInstance};
use crate::serialization::{ListElement, ListError, ObjectList};
use crate::types::Uuid;

/// A list of the project addressable by the list commands.
pub trait ProjectList: fmt::Debug {
    type Element: ListElement;
    /// Identifies the object owning the list, e.g. a component instance.
    type Owner: Copy + fmt::Debug + fmt::Display;

    /// Run `edit` on the list of `owner`.
    fn with_list<R>(
        project: &mut Project,
        owner: &Self::Owner,
        edit: impl FnOnce(&mut ObjectList<Self::Element>) -> Result<R, ListError>,
    ) -> Result<R, CircuitError>;

    /// Refuse removing an element other model parts still refer to.
    fn check_remove(
        _project: &Project,
        _owner: &Self::Owner,
        _key: &<Self::Element as ListElement>::Key,
    ) -> Result<(), CircuitError> {
        Ok(())
    }
}

/// Attributes of a component instance.
#[derive(Debug)]
pub struct ComponentAttributes;

impl ProjectList for ComponentAttributes {
    type Element = Attribute;
    type Owner = Uuid;

    fn with_list<R>(
        project: &mut Project,
        owner: &Uuid,
        edit: impl FnOnce(&mut ObjectList<Attribute>) -> Result<R, ListError>,
    ) -> Result<R, CircuitError> {
        project.circuit_mut().edit_component_attributes(owner, edit)
    }
}

/// Symbols of a schematic.
#[derive(Debug)]
pub struct SchematicSymbols;

impl ProjectList for SchematicSymbols {
    type Element = SymbolInstance;
    type Owner = Uuid;

    fn with_list<R>(
        project: &mut Project,
        owner: &Uuid,
        edit: impl FnOnce(&mut ObjectList<SymbolInstance>) -> Result<R, ListError>,
    ) -> Result<R, CircuitError> {
        Ok(edit(&mut project.schematic_mut(owner)?.symbols)?)
    }

    fn check_remove(project: &Project, owner: &Uuid, key: &Uuid) -> Result<(), CircuitError> {
        let Some(symbol) = project.schematic(owner).and_then(|s| s.symbols.find(key)) else {
            return Ok(());
        };
        let registered = project
            .circuit()
            .component_instance(&symbol.component)
            .and_then(|c| c.symbol_of_item(&symbol.item))
            .is_some_and(|placed| placed.symbol == *key);
        if registered {
            return Err(CircuitError::StillRegistered {
                kind: "symbol",
                element: key.to_str(),
            });
        }
        Ok(())
    }
}

/// Devices of a board.
#[derive(Debug)]
pub struct BoardDevices;

impl ProjectList for BoardDevices {
    type Element = DeviceInstance;
    type Owner = Uuid;

    fn with_list<R>(
        project: &mut Project,
        owner: &Uuid,
        edit: impl FnOnce(&mut ObjectList<DeviceInstance>) -> Result<R, ListError>,
    ) -> Result<R, CircuitError> {
        Ok(edit(&mut project.board_mut(owner)?.devices)?)
    }

    fn check_remove(project: &Project, owner: &Uuid, key: &Uuid) -> Result<(), CircuitError> {
        let registered = project
            .circuit()
            .component_instance(key)
            .and_then(|c| c.device_on_board(owner))
            .is_some();
        if registered {
            return Err(CircuitError::StillRegistered {
                kind: "device",
                element: key.to_str(),
            });
        }
        Ok(())
    }
}

/// Insert one element, by default at the end of the list.
///
/// The insertion index is resolved once on execution, undo removes the
/// element at that index and redo inserts it there again.
#[derive(Debug)]
pub struct CmdListElementInsert<L: ProjectList> {
    owner: L::Owner,
    element: L::Element,
    index: Option<usize>,
    resolved: Option<usize>,
    list: PhantomData<L>,
}

impl<L: ProjectList> CmdListElementInsert<L> {
    pub fn new(owner: L::Owner, element: L::Element, index: Option<usize>) -> Self {
        Self {
            owner,
            element,
            index,
            resolved: None,
            list: PhantomData,
        }
    }

    /// Index the element was inserted at, once executed.
    pub fn resolved_index(&self) -> Option<usize> {
        self.resolved
    }

    fn expect_resolved(&self) -> usize {
        let tag = <L::Element as ListElement>::TAG;
        self.resolved
            .unwrap_or_else(|| panic!("{tag} was never inserted into {}", self.owner))
    }
}

impl<L: ProjectList> Command for CmdListElementInsert<L> {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        let index = self.index.unwrap_or(usize::MAX);
        let element = self.element.clone();
        self.resolved = Some(L::with_list(project, &self.owner, |list| list.insert(index, element))?);
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        let index = self.expect_resolved();
        L::with_list(project, &self.owner, |list| list.remove(index)).map(drop)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        let index = self.expect_resolved();
        let element = self.element.clone();
        L::with_list(project, &self.owner, |list| list.insert(index, element)).map(drop)
    }
}

/// Remove the element with a given key, remembering its position.
#[derive(Debug)]
pub struct CmdListElementRemove<L: ProjectList> {
    owner: L::Owner,
    key: <L::Element as ListElement>::Key,
    removed: Option<(usize, L::Element)>,
    list: PhantomData<L>,
}

impl<L: ProjectList> CmdListElementRemove<L> {
    pub fn new(owner: L::Owner, key: <L::Element as ListElement>::Key) -> Self {
        Self {
            owner,
            key,
            removed: None,
            list: PhantomData,
        }
    }

    fn expect_removed(&self) -> &(usize, L::Element) {
        let tag = <L::Element as ListElement>::TAG;
        self.removed
            .as_ref()
            .unwrap_or_else(|| panic!("{tag} \"{}\" was never removed", self.key))
    }
}

impl<L: ProjectList> Command for CmdListElementRemove<L> {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        L::check_remove(project, &self.owner, &self.key)?;
        let key = self.key.clone();
        self.removed = Some(L::with_list(project, &self.owner, |list| list.remove_key(&key))?);
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        let (index, element) = self.expect_removed().clone();
        L::with_list(project, &self.owner, |list| list.insert(index, element)).map(drop)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        let index = self.expect_removed().0;
        L::with_list(project, &self.owner, |list| list.remove(index)).map(drop)
    }
}

/// Swap two elements by index.
#[derive(Debug)]
pub struct CmdListElementsSwap<L: ProjectList> {
    owner: L::Owner,
    i: usize,
    j: usize,
    list: PhantomData<L>,
}

impl<L: ProjectList> CmdListElementsSwap<L> {
    pub fn new(owner: L::Owner, i: usize, j: usize) -> Self {
        Self {
            owner,
            i,
            j,
            list: PhantomData,
        }
    }

    fn swap(&self, project: &mut Project) -> Result<(), CircuitError> {
        let (i, j) = (self.i, self.j);
        L::with_list(project, &self.owner, |list| list.swap(i, j))
    }
}

impl<L: ProjectList> Command for CmdListElementsSwap<L> {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        self.swap(project)?;
        Ok(self.i != self.j)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        self.swap(project)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        self.swap(project)
    }
}
