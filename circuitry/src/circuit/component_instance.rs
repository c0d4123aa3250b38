use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::error::CircuitError;
use super::net_signal::NetSignal;
use super::signal_instance::ComponentSignalInstance;
use crate::attributes::{deserialize_attributes, AttributeList, AttributeProvider, ComponentScope};
use crate::erc::{ErcCategory, ErcMsg, ErcMsgList, ErcOwner};
use crate::library::{Component, LibraryLookup, SymbolVariant};
use crate::serialization::{ObjectList, SExp, SExpError};
use crate::types::Uuid;

/// Placement of one symbol variant item in a schematic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRef {
    pub symbol: Uuid,
    pub schematic: Uuid,
}

/// Placement of a device on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRef {
    pub board: Uuid,
    pub lib_device: Uuid,
}

/// One occurrence of a library component in the circuit.
#[derive(Debug, Clone)]
pub struct ComponentInstance {
    uuid: Uuid,
    lib_component: Arc<Component>,
    variant_index: usize,
    name: String,
    value: String,
    attributes: AttributeList,
    signals: BTreeMap<Uuid, ComponentSignalInstance>,
    added_to_circuit: bool,
    symbols: BTreeMap<Uuid, SymbolRef>,
    devices: Vec<DeviceRef>,
    unplaced_required_msg: ErcMsg,
    unplaced_optional_msg: ErcMsg,
}

impl ComponentInstance {
    /// Create a detached instance with the library's default value and
    /// attributes and no net bindings.
    pub fn new(
        uuid: Uuid,
        lib_component: Arc<Component>,
        symbol_variant: Uuid,
        name: &str,
    ) -> Result<Self, CircuitError> {
        let value = lib_component.default_value.clone();
        let attributes = ObjectList::from_elements(lib_component.attributes.iter().cloned())?;
        Self::with_parts(uuid, lib_component, symbol_variant, name, &value, attributes)
    }

    fn with_parts(
        uuid: Uuid,
        lib_component: Arc<Component>,
        symbol_variant: Uuid,
        name: &str,
        value: &str,
        attributes: AttributeList,
    ) -> Result<Self, CircuitError> {
        Self::validate_name(name)?;
        let variant_index = lib_component
            .symbol_variant_index(&symbol_variant)
            .ok_or(CircuitError::SymbolVariantNotFound(symbol_variant))?;
        let signals = lib_component
            .signals
            .iter()
            .map(|signal| {
                (
                    signal.uuid,
                    ComponentSignalInstance::new(uuid, signal.clone(), None),
                )
            })
            .collect();
        let owner = ErcOwner::ComponentInstance(uuid);
        Ok(Self {
            uuid,
            lib_component,
            variant_index,
            name: name.to_string(),
            value: value.to_string(),
            attributes,
            signals,
            added_to_circuit: false,
            symbols: BTreeMap::new(),
            devices: Vec::new(),
            unplaced_required_msg: ErcMsg::new(owner, ErcCategory::UnplacedRequiredSymbols),
            unplaced_optional_msg: ErcMsg::new(owner, ErcCategory::UnplacedOptionalSymbols),
        })
    }

    pub fn validate_name(name: &str) -> Result<(), CircuitError> {
        if name.is_empty() || name.chars().count() > 32 || name.chars().any(char::is_whitespace) {
            return Err(CircuitError::InvalidComponentName(name.to_string()));
        }
        Ok(())
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn attributes(&self) -> &AttributeList {
        &self.attributes
    }

    pub fn lib_component(&self) -> &Arc<Component> {
        &self.lib_component
    }

    pub fn symbol_variant(&self) -> &SymbolVariant {
        &self.lib_component.symbol_variants[self.variant_index]
    }

    pub fn is_added_to_circuit(&self) -> bool {
        self.added_to_circuit
    }

    pub fn signal(&self, uuid: &Uuid) -> Option<&ComponentSignalInstance> {
        self.signals.get(uuid)
    }

    pub fn signal_by_name(&self, name: &str) -> Option<&ComponentSignalInstance> {
        self.signals.values().find(|signal| signal.lib_signal().name == name)
    }

    pub fn signals(&self) -> impl Iterator<Item = &ComponentSignalInstance> {
        self.signals.values()
    }

    pub fn registered_symbols(&self) -> impl Iterator<Item = (&Uuid, &SymbolRef)> {
        self.symbols.iter()
    }

    pub fn symbol_of_item(&self, item: &Uuid) -> Option<&SymbolRef> {
        self.symbols.get(item)
    }

    pub fn registered_devices(&self) -> &[DeviceRef] {
        &self.devices
    }

    pub fn device_on_board(&self, board: &Uuid) -> Option<&DeviceRef> {
        self.devices.iter().find(|device| &device.board == board)
    }

    /// Placed symbols or devices, or signals referenced by pins or pads.
    pub fn is_used(&self) -> bool {
        !self.symbols.is_empty()
            || !self.devices.is_empty()
            || self.signals.values().any(ComponentSignalInstance::is_used)
    }

    pub fn unplaced_required_symbol_count(&self) -> usize {
        self.unplaced_symbol_count(true)
    }

    pub fn unplaced_optional_symbol_count(&self) -> usize {
        self.unplaced_symbol_count(false)
    }

    fn unplaced_symbol_count(&self, required: bool) -> usize {
        self.symbol_variant()
            .items
            .iter()
            .filter(|item| item.required == required && !self.symbols.contains_key(&item.uuid))
            .count()
    }

    pub fn unplaced_required_msg(&self) -> &ErcMsg {
        &self.unplaced_required_msg
    }

    pub fn unplaced_optional_msg(&self) -> &ErcMsg {
        &self.unplaced_optional_msg
    }

    /// Bind a signal to a net before the instance is added to a circuit.
    pub fn assign_net_signal(&mut self, signal: &Uuid, net: Option<Uuid>) -> Result<(), CircuitError> {
        assert!(
            !self.added_to_circuit,
            "Nets of component \"{}\" must be changed through the circuit",
            self.name
        );
        let name = self.name.clone();
        let instance = self
            .signals
            .get_mut(signal)
            .ok_or_else(|| CircuitError::SignalNotFound {
                component: name,
                signal: signal.to_str(),
            })?;
        instance.set_net_signal(net);
        Ok(())
    }

    pub(crate) fn signal_mut(&mut self, uuid: &Uuid) -> Option<&mut ComponentSignalInstance> {
        self.signals.get_mut(uuid)
    }

    pub(crate) fn set_added_to_circuit(&mut self, added: bool) {
        self.added_to_circuit = added;
        for signal in self.signals.values_mut() {
            signal.set_added_to_circuit(added);
        }
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut AttributeList {
        &mut self.attributes
    }

    pub(crate) fn register_symbol(&mut self, item: Uuid, symbol: SymbolRef) -> Result<(), CircuitError> {
        assert!(
            self.added_to_circuit,
            "Component \"{}\" is not added to the circuit",
            self.name
        );
        assert!(
            self.symbol_variant().item(&item).is_some(),
            "Symbol variant item {item} does not exist on component \"{}\"",
            self.name
        );
        assert!(
            !self.symbols.contains_key(&item),
            "Symbol variant item {item} of component \"{}\" is already placed",
            self.name
        );
        if self
            .symbols
            .values()
            .any(|placed| placed.schematic != symbol.schematic)
        {
            tracing::warn!(component = %self.name, "Rejected symbol on a second schematic");
            return Err(CircuitError::SymbolsOnDifferentSchematics);
        }
        self.symbols.insert(item, symbol);
        Ok(())
    }

    pub(crate) fn unregister_symbol(&mut self, item: &Uuid, symbol: &Uuid) {
        assert!(
            self.added_to_circuit,
            "Component \"{}\" is not added to the circuit",
            self.name
        );
        let removed = self.symbols.remove(item);
        assert!(
            removed.is_some_and(|placed| &placed.symbol == symbol),
            "Symbol {symbol} is not registered on component \"{}\"",
            self.name
        );
    }

    pub(crate) fn register_device(&mut self, device: DeviceRef) {
        assert!(
            self.added_to_circuit,
            "Component \"{}\" is not added to the circuit",
            self.name
        );
        assert!(
            !self.lib_component.schematic_only,
            "Component \"{}\" is schematic-only",
            self.name
        );
        assert!(
            self.device_on_board(&device.board).is_none(),
            "Component \"{}\" already has a device on board {}",
            self.name,
            device.board
        );
        self.devices.push(device);
    }

    pub(crate) fn unregister_device(&mut self, board: &Uuid) {
        assert!(
            self.added_to_circuit,
            "Component \"{}\" is not added to the circuit",
            self.name
        );
        let index = self
            .devices
            .iter()
            .position(|device| &device.board == board)
            .unwrap_or_else(|| panic!("Component \"{}\" has no device on board {board}", self.name));
        self.devices.remove(index);
    }

    /// Recompute text and visibility of all messages of this instance and
    /// its signals.
    pub(crate) fn update_erc_messages(
        &mut self,
        nets: &BTreeMap<Uuid, NetSignal>,
        project: &dyn AttributeProvider,
        erc: &mut ErcMsgList,
    ) {
        let required = self.unplaced_required_symbol_count();
        let optional = self.unplaced_optional_symbol_count();
        self.unplaced_required_msg.update(
            format!("Unplaced required symbols of component \"{}\": {}", self.name, required),
            self.added_to_circuit && required > 0,
            erc,
        );
        self.unplaced_optional_msg.update(
            format!("Unplaced optional symbols of component \"{}\": {}", self.name, optional),
            self.added_to_circuit && optional > 0,
            erc,
        );

        let scope = ComponentScope {
            name: &self.name,
            value: &self.value,
            attributes: &self.attributes,
            parent: project,
        };
        for signal in self.signals.values_mut() {
            signal.update_erc_messages(nets, &scope, &self.name, erc);
        }
    }

    /// Value with all placeholders expanded.
    pub fn resolved_value(&self, project: &dyn AttributeProvider) -> String {
        let scope = ComponentScope {
            name: &self.name,
            value: &self.value,
            attributes: &self.attributes,
            parent: project,
        };
        crate::attributes::substitute(&self.value, &scope, true)
    }

    pub fn serialize(&self) -> SExp {
        let mut node = SExp::list("component")
            .with_token(self.uuid)
            .with_child(SExp::list("lib_component").with_token(self.lib_component.uuid))
            .with_child(SExp::list("lib_variant").with_token(self.symbol_variant().uuid))
            .with_child(SExp::list("name").with_string(self.name.as_str()))
            .with_child(SExp::list("value").with_string(self.value.as_str()));
        self.attributes.serialize_into(&mut node);
        for signal in self.signals.values() {
            node.append(signal.serialize());
        }
        node
    }

    /// Build a detached instance from its serialized form.
    pub fn deserialize(node: &SExp, library: &dyn LibraryLookup) -> Result<Self, CircuitError> {
        node.expect_name("component")?;
        let uuid: Uuid = node.parse_value(0)?;
        let lib_component = library.component(&node.parse_child_value("lib_component")?)?;
        let variant: Uuid = node.parse_child_value("lib_variant")?;
        let name = node.child_value("name")?;
        let value = node.child_value("value")?;
        let attributes = deserialize_attributes(node)?;
        let mut instance = Self::with_parts(uuid, lib_component, variant, name, value, attributes)?;

        let mut seen = BTreeSet::new();
        for signal_node in node.children("signal") {
            let signal: Uuid = signal_node.parse_value(0)?;
            let net = match signal_node.child_value("net")? {
                "none" => None,
                _ => Some(signal_node.parse_child_value::<Uuid>("net")?),
            };
            if !seen.insert(signal) {
                return Err(SExpError::InvalidValue {
                    node: "signal".to_string(),
                    value: signal.to_str(),
                    reason: "duplicate signal".to_string(),
                }
                .into());
            }
            instance.assign_net_signal(&signal, net)?;
        }
        if seen.len() != instance.signals.len() {
            return Err(CircuitError::SignalCountMismatch {
                component: instance.name,
                expected: instance.signals.len(),
                found: seen.len(),
            });
        }
        Ok(instance)
    }
}
