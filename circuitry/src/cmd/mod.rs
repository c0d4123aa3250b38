//! Concrete undoable commands.
//!
//! Every command kind is a variant of [`CommandKind`], wrapped into an
//! [`UndoCommand`](crate::undo::UndoCommand) which enforces the
//! execute/undo/redo state machine. Placement commands that touch both a
//! schematic or board list and the circuit are built as command groups by
//! the functions in [`placement`].

pub mod circuit;
pub mod list;
pub mod placement;

pub use circuit::{
    CmdCompSigInstSetNetSignal, CmdComponentInstanceAdd, CmdComponentInstanceEdit,
    CmdComponentInstanceRemove, CmdNetClassAdd, CmdNetClassEdit, CmdNetClassRemove,
    CmdNetSignalAdd, CmdNetSignalEdit, CmdNetSignalRemove, CmdNetSignalSetNetClass,
    CmdProjectSetAttributes,
};
pub use list::{
    BoardDevices, CmdListElementInsert, CmdListElementRemove, CmdListElementsSwap,
    ComponentAttributes, ProjectList, SchematicSymbols,
};
pub use placement::{
    add_device_to_board, add_symbol_to_schematic, remove_device_from_board,
    remove_symbol_from_schematic, CmdDeviceRegister, CmdDeviceUnregister, CmdSymbolRegister,
    CmdSymbolUnregister,
};

use crate::circuit::CircuitError;
use crate::project::Project;
use crate::undo::CommandGroup;

/// The three steps every command kind implements. Only called through
/// [`UndoCommand`](crate::undo::UndoCommand).
pub(crate) trait Command {
    /// Apply the change. Returns whether anything changed; on `Err` the
    /// project must be unchanged.
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError>;

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError>;

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError>;
}

impl Command for CommandGroup {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        CommandGroup::perform_execute(self, project)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        CommandGroup::perform_undo(self, project)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        CommandGroup::perform_redo(self, project)
    }
}

macro_rules! command_kinds {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        #[derive(Debug)]
        pub enum CommandKind {
            $($variant($ty),)*
        }

        $(
            impl From<$ty> for CommandKind {
                fn from(cmd: $ty) -> Self {
                    CommandKind::$variant(cmd)
                }
            }
        )*

        impl CommandKind {
            pub(crate) fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
                match self {
                    $(CommandKind::$variant(cmd) => Command::perform_execute(cmd, project),)*
                }
            }

            pub(crate) fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
                match self {
                    $(CommandKind::$variant(cmd) => Command::perform_undo(cmd, project),)*
                }
            }

            pub(crate) fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
                match self {
                    $(CommandKind::$variant(cmd) => Command::perform_redo(cmd, project),)*
                }
            }
        }
    };
}

command_kinds! {
    Group(CommandGroup),
    AddComponentInstance(CmdComponentInstanceAdd),
    RemoveComponentInstance(CmdComponentInstanceRemove),
    EditComponentInstance(CmdComponentInstanceEdit),
    AddNetClass(CmdNetClassAdd),
    RemoveNetClass(CmdNetClassRemove),
    EditNetClass(CmdNetClassEdit),
    SetNetSignalNetClass(CmdNetSignalSetNetClass),
    AddNetSignal(CmdNetSignalAdd),
    RemoveNetSignal(CmdNetSignalRemove),
    EditNetSignal(CmdNetSignalEdit),
    SetSignalNet(CmdCompSigInstSetNetSignal),
    SetProjectAttributes(CmdProjectSetAttributes),
    InsertAttribute(CmdListElementInsert<ComponentAttributes>),
    RemoveAttribute(CmdListElementRemove<ComponentAttributes>),
    SwapAttributes(CmdListElementsSwap<ComponentAttributes>),
    InsertSymbol(CmdListElementInsert<SchematicSymbols>),
    RemoveSymbol(CmdListElementRemove<SchematicSymbols>),
    SwapSymbols(CmdListElementsSwap<SchematicSymbols>),
    InsertDevice(CmdListElementInsert<BoardDevices>),
    RemoveDevice(CmdListElementRemove<BoardDevices>),
    SwapDevices(CmdListElementsSwap<BoardDevices>),
    RegisterSymbol(CmdSymbolRegister),
    UnregisterSymbol(CmdSymbolUnregister),
    RegisterDevice(CmdDeviceRegister),
    UnregisterDevice(CmdDeviceUnregister),
}
