//! The netlist model: component instances, their signals, net signals and
//! net classes.

pub mod component_instance;
pub mod error;
pub mod events;
pub mod net_class;
pub mod net_signal;
pub mod netlist;
pub mod signal_instance;

pub use component_instance::{ComponentInstance, DeviceRef, SymbolRef};
pub use error::CircuitError;
pub use events::CircuitEvent;
pub use net_class::NetClass;
pub use net_signal::{NetSignal, SignalKey};
pub use netlist::Circuit;
pub use signal_instance::{ComponentSignalInstance, PadRef, PinRef};
