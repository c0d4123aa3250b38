//! Reversible commands, the undo stack and the rollback guard used for
//! all-or-nothing mutations.

pub mod command;
pub mod rollback;
pub mod stack;

pub use command::{CommandGroup, CommandState, UndoCommand};
pub use rollback::ScopeGuardList;
pub use stack::UndoStack;
