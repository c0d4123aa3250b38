use thiserror::Error;

use crate::library::LibraryError;
use crate::serialization::{ListError, SExpError};
use crate::types::Uuid;

/// Recoverable failure of a model operation.
///
/// The model is unchanged whenever one of these is returned. The messages
/// are meant to be shown to the user as they are.
#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("Parse error: {0}")]
    Parse(#[from] SExpError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    List(#[from] ListError),

    #[error("There is already a component with the UUID \"{0}\"!")]
    DuplicateComponentUuid(Uuid),
    #[error("There is already a component with the name \"{0}\"!")]
    DuplicateComponentName(String),
    #[error("Invalid component name: \"{0}\"")]
    InvalidComponentName(String),
    #[error("Component \"{0}\" not found")]
    ComponentNotFound(String),
    #[error("The component \"{0}\" cannot be removed because it is still in use!")]
    ComponentInUse(String),
    #[error("Symbol variant \"{0}\" not found")]
    SymbolVariantNotFound(Uuid),
    #[error("The component \"{component}\" has {found} signals, but its library element defines {expected}")]
    SignalCountMismatch {
        component: String,
        expected: usize,
        found: usize,
    },
    #[error("Signal \"{signal}\" of component \"{component}\" not found")]
    SignalNotFound { component: String, signal: String },

    #[error("There is already a net signal with the UUID \"{0}\"!")]
    DuplicateNetSignalUuid(Uuid),
    #[error("There is already a net signal with the name \"{0}\"!")]
    DuplicateNetSignalName(String),
    #[error("Invalid net signal name: \"{0}\"")]
    InvalidNetSignalName(String),
    #[error("Net signal \"{0}\" not found")]
    NetSignalNotFound(String),
    #[error("The net signal \"{0}\" cannot be removed because it is still in use!")]
    NetSignalInUse(String),
    #[error("There is already a net class with the UUID \"{0}\"!")]
    DuplicateNetClassUuid(Uuid),
    #[error("There is already a net class with the name \"{0}\"!")]
    DuplicateNetClassName(String),
    #[error("Invalid net class name: \"{0}\"")]
    InvalidNetClassName(String),
    #[error("Net class \"{0}\" not found")]
    NetClassNotFound(String),
    #[error("The net class \"{0}\" cannot be removed because it is still in use!")]
    NetClassInUse(String),
    #[error("The component signal \"{signal}\" of \"{component}\" is already part of net signal \"{net}\"")]
    SignalAlreadyRegistered {
        component: String,
        signal: String,
        net: String,
    },
    #[error("The net signal of the component signal \"{component}:{signal}\" cannot be changed because it is still in use!")]
    SignalInUse { component: String, signal: String },

    #[error("All symbols of a component must be placed in the same schematic.")]
    SymbolsOnDifferentSchematics,
    #[error("The symbol \"{item}\" of component \"{component}\" is already placed")]
    SymbolAlreadyPlaced { component: String, item: Uuid },
    #[error("The component \"{0}\" is schematic-only and cannot be added to a board")]
    SchematicOnlyComponent(String),
    #[error("The component \"{component}\" already has a device on board \"{board}\"")]
    DeviceAlreadyPlaced { component: String, board: String },
    #[error("The device \"{device}\" does not implement the component \"{component}\"")]
    DeviceMismatch { component: String, device: Uuid },
    #[error("The {kind} \"{element}\" cannot be removed because it is still connected")]
    StillConnected { kind: &'static str, element: Uuid },
    #[error("The {kind} \"{element}\" is already registered with its component")]
    AlreadyRegistered { kind: &'static str, element: Uuid },
    #[error("The {kind} \"{element}\" is still registered with its component")]
    StillRegistered { kind: &'static str, element: String },
    #[error("There is already a schematic with the UUID \"{0}\"!")]
    DuplicateSchematicUuid(Uuid),
    #[error("There is already a board with the UUID \"{0}\"!")]
    DuplicateBoardUuid(Uuid),
    #[error("Schematic \"{0}\" not found")]
    SchematicNotFound(String),
    #[error("Board \"{0}\" not found")]
    BoardNotFound(String),
    #[error("Symbol \"{0}\" not found")]
    SymbolNotFound(Uuid),
    #[error("No device of component \"{0}\" found on the board")]
    DeviceNotFound(String),
    #[error("Pin or pad \"{0}\" not found")]
    TerminalNotFound(Uuid),

    #[error("Another command group is already active")]
    CommandGroupActive,
    #[error("There is no active command group")]
    NoActiveCommandGroup,
}
