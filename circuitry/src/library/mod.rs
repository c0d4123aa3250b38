pub mod component;
pub mod lookup;

pub use component::{
    Component, ComponentSignal, Device, PadSignalMapItem, PinSignalMapItem, SymbolVariant,
    SymbolVariantItem,
};
pub use lookup::{Library, LibraryError, LibraryLookup};
