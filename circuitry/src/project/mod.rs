//! The project: circuit, placement collaborators and library handle.
//!
//! Schematics and boards only carry what the circuit needs to know about
//! placements. Adding a symbol or device to them and registering it with
//! its component instance are separate steps, combined by the commands in
//! [`crate::cmd`].

pub mod board;
pub mod schematic;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use board::{Board, DeviceInstance};
pub use schematic::{Schematic, SymbolInstance};

use crate::attributes::{deserialize_attributes, ProjectScope};
use crate::circuit::{Circuit, CircuitError, ComponentInstance, DeviceRef, PadRef, PinRef, SymbolRef};
use crate::library::LibraryLookup;
use crate::serialization::SExp;
use crate::types::Uuid;

pub type SharedLibrary = Arc<dyn LibraryLookup + Send + Sync>;

pub struct Project {
    library: SharedLibrary,
    circuit: Circuit,
    schematics: BTreeMap<Uuid, Schematic>,
    boards: BTreeMap<Uuid, Board>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name())
            .field("circuit", &self.circuit)
            .field("schematics", &self.schematics)
            .field("boards", &self.boards)
            .finish_non_exhaustive()
    }
}

impl Project {
    pub fn new(name: &str, library: SharedLibrary) -> Self {
        Self {
            library,
            circuit: Circuit::new(ProjectScope::new(name, Default::default())),
            schematics: BTreeMap::new(),
            boards: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.circuit.project_scope().name
    }

    pub fn library(&self) -> &SharedLibrary {
        &self.library
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn schematics(&self) -> impl Iterator<Item = &Schematic> {
        self.schematics.values()
    }

    pub fn schematic(&self, uuid: &Uuid) -> Option<&Schematic> {
        self.schematics.get(uuid)
    }

    pub fn schematic_by_name(&self, name: &str) -> Option<&Schematic> {
        self.schematics.values().find(|s| s.name == name)
    }

    pub(crate) fn schematic_mut(&mut self, uuid: &Uuid) -> Result<&mut Schematic, CircuitError> {
        self.schematics
            .get_mut(uuid)
            .ok_or_else(|| CircuitError::SchematicNotFound(uuid.to_str()))
    }

    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.boards.values()
    }

    pub fn board(&self, uuid: &Uuid) -> Option<&Board> {
        self.boards.get(uuid)
    }

    pub fn board_by_name(&self, name: &str) -> Option<&Board> {
        self.boards.values().find(|b| b.name == name)
    }

    pub(crate) fn board_mut(&mut self, uuid: &Uuid) -> Result<&mut Board, CircuitError> {
        self.boards
            .get_mut(uuid)
            .ok_or_else(|| CircuitError::BoardNotFound(uuid.to_str()))
    }

    /// Add an empty schematic page.
    pub fn add_schematic(&mut self, uuid: Uuid, name: &str) -> Result<(), CircuitError> {
        if self.schematics.contains_key(&uuid) {
            return Err(CircuitError::DuplicateSchematicUuid(uuid));
        }
        self.schematics.insert(uuid, Schematic::new(uuid, name));
        Ok(())
    }

    /// Add an empty board.
    pub fn add_board(&mut self, uuid: Uuid, name: &str) -> Result<(), CircuitError> {
        if self.boards.contains_key(&uuid) {
            return Err(CircuitError::DuplicateBoardUuid(uuid));
        }
        self.boards.insert(uuid, Board::new(uuid, name));
        Ok(())
    }

    /// Create a detached instance of a library component, named after the
    /// component prefix unless `name` is given.
    pub fn create_component_instance(
        &self,
        lib_component: &Uuid,
        symbol_variant: Option<Uuid>,
        name: Option<&str>,
    ) -> Result<ComponentInstance, CircuitError> {
        let component = self.library.component(lib_component)?;
        let variant = match symbol_variant {
            Some(uuid) => uuid,
            None => component
                .default_symbol_variant()
                .map(|variant| variant.uuid)
                .ok_or_else(|| CircuitError::SymbolVariantNotFound(*lib_component))?,
        };
        let name = match name {
            Some(name) => name.to_string(),
            None => self.circuit.generate_auto_component_name(&component.prefix),
        };
        ComponentInstance::new(Uuid::new_random(), component, variant, &name)
    }

    // Registration of placed symbols and devices with the circuit.

    fn symbol_instance(&self, schematic: &Uuid, symbol: &Uuid) -> Result<SymbolInstance, CircuitError> {
        self.schematics
            .get(schematic)
            .ok_or_else(|| CircuitError::SchematicNotFound(schematic.to_str()))?
            .symbols
            .find(symbol)
            .cloned()
            .ok_or(CircuitError::SymbolNotFound(*symbol))
    }

    /// Pins of `symbol` and the signals they are mapped to.
    fn symbol_pins(&self, symbol: &SymbolInstance) -> Result<Vec<(Uuid, PinRef)>, CircuitError> {
        let component = self
            .circuit
            .component_instance(&symbol.component)
            .ok_or_else(|| CircuitError::ComponentNotFound(symbol.component.to_str()))?;
        let item = component
            .symbol_variant()
            .item(&symbol.item)
            .ok_or(CircuitError::SymbolNotFound(symbol.item))?;
        Ok(item
            .pin_signal_map
            .iter()
            .filter_map(|mapping| {
                mapping.signal.map(|signal| {
                    (
                        signal,
                        PinRef {
                            symbol: symbol.uuid,
                            pin: mapping.pin,
                        },
                    )
                })
            })
            .collect())
    }

    /// Register a symbol of a schematic and its pins with its component.
    pub fn register_symbol(&mut self, schematic: &Uuid, symbol: &Uuid) -> Result<(), CircuitError> {
        let symbol = self.symbol_instance(schematic, symbol)?;
        let pins = self.symbol_pins(&symbol)?;
        let component = self
            .circuit
            .component_instance(&symbol.component)
            .ok_or_else(|| CircuitError::ComponentNotFound(symbol.component.to_str()))?;
        if component.symbol_of_item(&symbol.item).is_some() {
            return Err(CircuitError::SymbolAlreadyPlaced {
                component: component.name().to_string(),
                item: symbol.item,
            });
        }
        let mut seen = Vec::with_capacity(pins.len());
        for (signal, pin) in &pins {
            let signal_instance = component.signal(signal).ok_or_else(|| CircuitError::SignalNotFound {
                component: component.name().to_string(),
                signal: signal.to_str(),
            })?;
            if seen.contains(&pin.pin) || signal_instance.is_pin_connected(pin).is_some() {
                return Err(CircuitError::AlreadyRegistered {
                    kind: "pin",
                    element: pin.pin,
                });
            }
            seen.push(pin.pin);
        }
        self.circuit.register_symbol(
            &symbol.component,
            symbol.item,
            SymbolRef {
                symbol: symbol.uuid,
                schematic: *schematic,
            },
        )?;
        for (signal, pin) in pins {
            self.circuit.register_symbol_pin(&symbol.component, &signal, pin);
        }
        tracing::debug!(symbol = %symbol.uuid, "Symbol registered");
        Ok(())
    }

    /// Reverse of [`Project::register_symbol`]. Fails while a pin is connected.
    pub fn unregister_symbol(&mut self, schematic: &Uuid, symbol: &Uuid) -> Result<(), CircuitError> {
        let symbol = self.symbol_instance(schematic, symbol)?;
        let pins = self.symbol_pins(&symbol)?;
        let component = self
            .circuit
            .component_instance(&symbol.component)
            .ok_or_else(|| CircuitError::ComponentNotFound(symbol.component.to_str()))?;
        for (signal, pin) in &pins {
            let connected = component
                .signal(signal)
                .and_then(|s| s.is_pin_connected(pin))
                .unwrap_or(false);
            if connected {
                return Err(CircuitError::StillConnected {
                    kind: "pin",
                    element: pin.pin,
                });
            }
        }
        for (signal, pin) in &pins {
            self.circuit.unregister_symbol_pin(&symbol.component, signal, pin);
        }
        self.circuit
            .unregister_symbol(&symbol.component, &symbol.item, &symbol.uuid);
        tracing::debug!(symbol = %symbol.uuid, "Symbol unregistered");
        Ok(())
    }

    fn device_instance(&self, board: &Uuid, component: &Uuid) -> Result<DeviceInstance, CircuitError> {
        self.boards
            .get(board)
            .ok_or_else(|| CircuitError::BoardNotFound(board.to_str()))?
            .devices
            .find(component)
            .cloned()
            .ok_or_else(|| CircuitError::DeviceNotFound(component.to_str()))
    }

    fn device_pads(&self, board: &Uuid, device: &DeviceInstance) -> Result<Vec<(Uuid, PadRef)>, CircuitError> {
        let lib_device = self.library.device(&device.lib_device)?;
        Ok(lib_device
            .pad_signal_map
            .iter()
            .filter_map(|mapping| {
                mapping.signal.map(|signal| {
                    (
                        signal,
                        PadRef {
                            board: *board,
                            pad: mapping.pad,
                        },
                    )
                })
            })
            .collect())
    }

    /// Register the device of `component` on `board` and its pads.
    pub fn register_device(&mut self, board: &Uuid, component: &Uuid) -> Result<(), CircuitError> {
        let device = self.device_instance(board, component)?;
        let instance = self
            .circuit
            .component_instance(component)
            .ok_or_else(|| CircuitError::ComponentNotFound(component.to_str()))?;
        if instance.lib_component().schematic_only {
            return Err(CircuitError::SchematicOnlyComponent(instance.name().to_string()));
        }
        if instance.device_on_board(board).is_some() {
            return Err(CircuitError::DeviceAlreadyPlaced {
                component: instance.name().to_string(),
                board: board.to_str(),
            });
        }
        let lib_device = self.library.device(&device.lib_device)?;
        if lib_device.component != instance.lib_component().uuid {
            return Err(CircuitError::DeviceMismatch {
                component: instance.name().to_string(),
                device: device.lib_device,
            });
        }
        let pads = self.device_pads(board, &device)?;
        let mut seen = Vec::with_capacity(pads.len());
        for (signal, pad) in &pads {
            let signal_instance = instance.signal(signal).ok_or_else(|| CircuitError::SignalNotFound {
                component: instance.name().to_string(),
                signal: signal.to_str(),
            })?;
            if seen.contains(&pad.pad) || signal_instance.is_pad_connected(pad).is_some() {
                return Err(CircuitError::AlreadyRegistered {
                    kind: "pad",
                    element: pad.pad,
                });
            }
            seen.push(pad.pad);
        }
        self.circuit.register_device(
            component,
            DeviceRef {
                board: *board,
                lib_device: device.lib_device,
            },
        );
        for (signal, pad) in pads {
            self.circuit.register_footprint_pad(component, &signal, pad);
        }
        tracing::debug!(component = %component, board = %board, "Device registered");
        Ok(())
    }

    pub fn unregister_device(&mut self, board: &Uuid, component: &Uuid) -> Result<(), CircuitError> {
        let device = self.device_instance(board, component)?;
        let pads = self.device_pads(board, &device)?;
        let instance = self
            .circuit
            .component_instance(component)
            .ok_or_else(|| CircuitError::ComponentNotFound(component.to_str()))?;
        for (signal, pad) in &pads {
            let connected = instance
                .signal(signal)
                .and_then(|s| s.is_pad_connected(pad))
                .unwrap_or(false);
            if connected {
                return Err(CircuitError::StillConnected {
                    kind: "pad",
                    element: pad.pad,
                });
            }
        }
        for (signal, pad) in &pads {
            self.circuit.unregister_footprint_pad(component, signal, pad);
        }
        self.circuit.unregister_device(component, board);
        tracing::debug!(component = %component, board = %board, "Device unregistered");
        Ok(())
    }

    /// Mark a pin of a placed symbol as (dis)connected to a wire.
    pub fn set_symbol_pin_connected(
        &mut self,
        schematic: &Uuid,
        symbol: &Uuid,
        pin: &Uuid,
        connected: bool,
    ) -> Result<(), CircuitError> {
        let symbol = self.symbol_instance(schematic, symbol)?;
        let (signal, pin) = self
            .symbol_pins(&symbol)?
            .into_iter()
            .find(|(_, pin_ref)| &pin_ref.pin == pin)
            .ok_or(CircuitError::TerminalNotFound(*pin))?;
        let registered = self
            .circuit
            .component_instance(&symbol.component)
            .and_then(|c| c.signal(&signal))
            .and_then(|s| s.is_pin_connected(&pin))
            .is_some();
        if !registered {
            return Err(CircuitError::TerminalNotFound(pin.pin));
        }
        self.circuit
            .set_symbol_pin_connected(&symbol.component, &signal, &pin, connected);
        Ok(())
    }

    /// Mark a pad of a placed device as (dis)connected to a trace.
    pub fn set_footprint_pad_connected(
        &mut self,
        board: &Uuid,
        component: &Uuid,
        pad: &Uuid,
        connected: bool,
    ) -> Result<(), CircuitError> {
        let device = self.device_instance(board, component)?;
        let (signal, pad) = self
            .device_pads(board, &device)?
            .into_iter()
            .find(|(_, pad_ref)| &pad_ref.pad == pad)
            .ok_or(CircuitError::TerminalNotFound(*pad))?;
        let registered = self
            .circuit
            .component_instance(component)
            .and_then(|c| c.signal(&signal))
            .and_then(|s| s.is_pad_connected(&pad))
            .is_some();
        if !registered {
            return Err(CircuitError::TerminalNotFound(pad.pad));
        }
        self.circuit
            .set_footprint_pad_connected(component, &signal, &pad, connected);
        Ok(())
    }

    // Persistence

    /// ```text
    /// (circuitry_project (name "Demo") (attribute ...)
    ///  (circuit ...) (schematic ...) (board ...) (erc (ignore ...)))
    /// ```
    pub fn serialize(&self) -> SExp {
        let scope = self.circuit.project_scope();
        let mut node = SExp::list("circuitry_project")
            .with_child(SExp::list("name").with_string(scope.name.as_str()));
        scope.attributes.serialize_into(&mut node);
        node.append(self.circuit.serialize());
        for schematic in self.schematics.values() {
            node.append(schematic.serialize());
        }
        for board in self.boards.values() {
            node.append(board.serialize());
        }
        node.append(self.circuit.erc().serialize());
        node
    }

    pub fn deserialize(node: &SExp, library: SharedLibrary) -> Result<Self, CircuitError> {
        node.expect_name("circuitry_project")?;
        let scope = ProjectScope::new(node.child_value("name")?, deserialize_attributes(node)?);
        let circuit = Circuit::deserialize(node.require_child("circuit")?, library.as_ref(), scope)?;
        let mut project = Project {
            library,
            circuit,
            schematics: BTreeMap::new(),
            boards: BTreeMap::new(),
        };
        for schematic_node in node.children("schematic") {
            let schematic = Schematic::deserialize(schematic_node)?;
            let uuid = schematic.uuid;
            let symbols: Vec<Uuid> = schematic.symbols.keys().collect();
            project.schematics.insert(uuid, schematic);
            for symbol in symbols {
                project.register_symbol(&uuid, &symbol)?;
            }
        }
        for board_node in node.children("board") {
            let board = Board::deserialize(board_node)?;
            let uuid = board.uuid;
            let components: Vec<Uuid> = board.devices.keys().collect();
            project.boards.insert(uuid, board);
            for component in components {
                project.register_device(&uuid, &component)?;
            }
        }
        if let Some(erc) = node.child("erc") {
            project.circuit.erc_mut().load_ignored(erc)?;
        }
        project.circuit.drain_events();
        Ok(project)
    }

    pub fn from_text(text: &str, library: SharedLibrary) -> Result<Self, CircuitError> {
        Self::deserialize(&SExp::parse(text)?, library)
    }

    pub fn to_text(&self) -> String {
        self.serialize().to_file_string()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::library::test_support as lib;

    pub const SCHEMATIC: Uuid = Uuid::from_u128(0xa001);
    pub const SCHEMATIC_2: Uuid = Uuid::from_u128(0xa002);
    pub const BOARD: Uuid = Uuid::from_u128(0xb001);

    /// Empty project with one schematic and one board.
    pub fn project() -> Project {
        let mut project = Project::new("Demo", Arc::new(lib::library()));
        project.add_schematic(SCHEMATIC, "Main").unwrap();
        project.add_schematic(SCHEMATIC_2, "Power").unwrap();
        project.add_board(BOARD, "PCB").unwrap();
        project
    }
}
