use std::collections::BTreeMap;

use super::component_instance::{ComponentInstance, DeviceRef, SymbolRef};
use super::error::CircuitError;
use super::events::CircuitEvent;
use super::net_class::NetClass;
use super::net_signal::NetSignal;
use super::signal_instance::{ComponentSignalInstance, PadRef, PinRef};
use crate::attributes::{AttributeList, ProjectScope};
use crate::erc::ErcMsgList;
use crate::library::LibraryLookup;
use crate::serialization::{ListError, SExp};
use crate::types::Uuid;
use crate::undo::ScopeGuardList;

/// Aggregate root of the netlist: all component instances, net signals and
/// net classes of a project together with their ERC messages.
#[derive(Debug, Default)]
pub struct Circuit {
    project: ProjectScope,
    net_classes: BTreeMap<Uuid, NetClass>,
    net_signals: BTreeMap<Uuid, NetSignal>,
    components: BTreeMap<Uuid, ComponentInstance>,
    erc: ErcMsgList,
    events: Vec<CircuitEvent>,
}

impl Circuit {
    pub fn new(project: ProjectScope) -> Self {
        Self {
            project,
            ..Self::default()
        }
    }

    pub fn project_scope(&self) -> &ProjectScope {
        &self.project
    }

    pub fn erc(&self) -> &ErcMsgList {
        &self.erc
    }

    pub fn erc_mut(&mut self) -> &mut ErcMsgList {
        &mut self.erc
    }

    /// Take all change events recorded since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<CircuitEvent> {
        self.flush_erc_changes();
        std::mem::take(&mut self.events)
    }

    fn flush_erc_changes(&mut self) {
        let changes = self.erc.drain_changes();
        self.events.extend(changes.into_iter().map(CircuitEvent::from));
    }

    fn notify(&mut self, event: CircuitEvent) {
        self.flush_erc_changes();
        self.events.push(event);
    }

    // Net classes

    pub fn net_classes(&self) -> impl Iterator<Item = &NetClass> {
        self.net_classes.values()
    }

    pub fn net_class(&self, uuid: &Uuid) -> Option<&NetClass> {
        self.net_classes.get(uuid)
    }

    pub fn net_class_by_name(&self, name: &str) -> Option<&NetClass> {
        self.net_classes.values().find(|class| class.name() == name)
    }

    pub fn add_net_class(&mut self, mut net_class: NetClass) -> Result<(), CircuitError> {
        assert!(
            !net_class.is_added_to_circuit(),
            "Net class \"{}\" is already added to a circuit",
            net_class.name()
        );
        assert!(!net_class.is_used(), "Net class \"{}\" is in use", net_class.name());
        if self.net_classes.contains_key(&net_class.uuid()) {
            return Err(CircuitError::DuplicateNetClassUuid(net_class.uuid()));
        }
        if self.net_class_by_name(net_class.name()).is_some() {
            return Err(CircuitError::DuplicateNetClassName(net_class.name().to_string()));
        }
        let uuid = net_class.uuid();
        net_class.set_added_to_circuit(true);
        net_class.update_erc_messages(&mut self.erc);
        tracing::debug!(net_class = %net_class.name(), "Net class added");
        self.net_classes.insert(uuid, net_class);
        self.notify(CircuitEvent::NetClassAdded(uuid));
        Ok(())
    }

    /// Remove a net class no net signal is assigned to and return it detached.
    pub fn remove_net_class(&mut self, uuid: &Uuid) -> Result<NetClass, CircuitError> {
        let net_class = self
            .net_classes
            .get(uuid)
            .ok_or_else(|| CircuitError::NetClassNotFound(uuid.to_str()))?;
        if net_class.is_used() {
            tracing::warn!(net_class = %net_class.name(), "Refused to remove net class in use");
            return Err(CircuitError::NetClassInUse(net_class.name().to_string()));
        }
        let mut net_class = self
            .net_classes
            .remove(uuid)
            .ok_or_else(|| CircuitError::NetClassNotFound(uuid.to_str()))?;
        net_class.set_added_to_circuit(false);
        net_class.update_erc_messages(&mut self.erc);
        tracing::debug!(net_class = %net_class.name(), "Net class removed");
        self.notify(CircuitEvent::NetClassRemoved(*uuid));
        Ok(net_class)
    }

    pub fn set_net_class_name(&mut self, uuid: &Uuid, name: &str) -> Result<(), CircuitError> {
        NetClass::validate_name(name)?;
        let net_class = self
            .net_classes
            .get(uuid)
            .ok_or_else(|| CircuitError::NetClassNotFound(uuid.to_str()))?;
        if net_class.name() == name {
            return Ok(());
        }
        if self.net_class_by_name(name).is_some() {
            return Err(CircuitError::DuplicateNetClassName(name.to_string()));
        }
        if let Some(net_class) = self.net_classes.get_mut(uuid) {
            net_class.set_name(name);
            net_class.update_erc_messages(&mut self.erc);
        }
        self.notify(CircuitEvent::NetClassNameChanged {
            uuid: *uuid,
            name: name.to_string(),
        });
        Ok(())
    }

    /// Move a net signal to another net class (or to none).
    pub fn set_net_signal_net_class(&mut self, net: &Uuid, net_class: Option<Uuid>) -> Result<(), CircuitError> {
        let old = self
            .net_signals
            .get(net)
            .ok_or_else(|| CircuitError::NetSignalNotFound(net.to_str()))?
            .net_class();
        if old == net_class {
            return Ok(());
        }
        let net_uuid = *net;
        let mut guard = ScopeGuardList::new(&mut self.net_classes);
        if let Some(old_uuid) = old {
            guard
                .get_mut(&old_uuid)
                .ok_or_else(|| CircuitError::NetClassNotFound(old_uuid.to_str()))?
                .unregister_net_signal(&net_uuid);
            guard.add(move |classes| {
                if let Some(class) = classes.get_mut(&old_uuid) {
                    class.register_net_signal(net_uuid).ok();
                }
            });
        }
        if let Some(new_uuid) = net_class {
            guard
                .get_mut(&new_uuid)
                .ok_or_else(|| CircuitError::NetClassNotFound(new_uuid.to_str()))?
                .register_net_signal(net_uuid)?;
        }
        guard.dismiss();

        if let Some(net_signal) = self.net_signals.get_mut(net) {
            net_signal.set_net_class(net_class);
        }
        for class in old.iter().chain(net_class.iter()) {
            self.refresh_net_class_erc(class);
        }
        tracing::debug!(net = %net, "Net class of net signal changed");
        self.notify(CircuitEvent::NetSignalNetClassChanged {
            uuid: *net,
            net_class,
        });
        Ok(())
    }

    fn refresh_net_class_erc(&mut self, uuid: &Uuid) {
        if let Some(net_class) = self.net_classes.get_mut(uuid) {
            net_class.update_erc_messages(&mut self.erc);
        }
    }

    // Net signals

    pub fn net_signals(&self) -> impl Iterator<Item = &NetSignal> {
        self.net_signals.values()
    }

    pub fn net_signal(&self, uuid: &Uuid) -> Option<&NetSignal> {
        self.net_signals.get(uuid)
    }

    pub fn net_signal_by_name(&self, name: &str) -> Option<&NetSignal> {
        self.net_signals.values().find(|net| net.name() == name)
    }

    /// Lowest free name of the form `N#<n>`.
    pub fn generate_auto_net_signal_name(&self) -> String {
        (1..)
            .map(|i| format!("N#{i}"))
            .find(|name| self.net_signal_by_name(name).is_none())
            .unwrap_or_default()
    }

    pub fn add_net_signal(&mut self, net: NetSignal) -> Result<(), CircuitError> {
        assert!(!net.is_used(), "Net signal \"{}\" is already in use", net.name());
        if self.net_signals.contains_key(&net.uuid()) {
            return Err(CircuitError::DuplicateNetSignalUuid(net.uuid()));
        }
        if self.net_signal_by_name(net.name()).is_some() {
            return Err(CircuitError::DuplicateNetSignalName(net.name().to_string()));
        }
        let uuid = net.uuid();
        if let Some(class_uuid) = net.net_class() {
            self.net_classes
                .get_mut(&class_uuid)
                .ok_or_else(|| CircuitError::NetClassNotFound(class_uuid.to_str()))?
                .register_net_signal(uuid)?;
            self.refresh_net_class_erc(&class_uuid);
        }
        tracing::debug!(net = %net.name(), "Net signal added");
        self.net_signals.insert(uuid, net);
        self.notify(CircuitEvent::NetSignalAdded(uuid));
        Ok(())
    }

    pub fn remove_net_signal(&mut self, uuid: &Uuid) -> Result<NetSignal, CircuitError> {
        let net = self
            .net_signals
            .get(uuid)
            .ok_or_else(|| CircuitError::NetSignalNotFound(uuid.to_str()))?;
        if net.is_used() {
            tracing::warn!(net = %net.name(), "Refused to remove net signal in use");
            return Err(CircuitError::NetSignalInUse(net.name().to_string()));
        }
        let net = self
            .net_signals
            .remove(uuid)
            .ok_or_else(|| CircuitError::NetSignalNotFound(uuid.to_str()))?;
        if let Some(class_uuid) = net.net_class() {
            if let Some(net_class) = self.net_classes.get_mut(&class_uuid) {
                net_class.unregister_net_signal(uuid);
            }
            self.refresh_net_class_erc(&class_uuid);
        }
        tracing::debug!(net = %net.name(), "Net signal removed");
        self.notify(CircuitEvent::NetSignalRemoved(*uuid));
        Ok(net)
    }

    pub fn set_net_signal_name(
        &mut self,
        uuid: &Uuid,
        name: &str,
        has_auto_name: bool,
    ) -> Result<(), CircuitError> {
        NetSignal::validate_name(name)?;
        let net = self
            .net_signals
            .get(uuid)
            .ok_or_else(|| CircuitError::NetSignalNotFound(uuid.to_str()))?;
        if net.name() == name && net.has_auto_name() == has_auto_name {
            return Ok(());
        }
        if self
            .net_signal_by_name(name)
            .is_some_and(|other| other.uuid() != *uuid)
        {
            return Err(CircuitError::DuplicateNetSignalName(name.to_string()));
        }
        if let Some(net) = self.net_signals.get_mut(uuid) {
            net.set_name(name, has_auto_name);
        }
        self.refresh_all_erc_messages();
        self.notify(CircuitEvent::NetSignalNameChanged {
            uuid: *uuid,
            name: name.to_string(),
        });
        Ok(())
    }

    // Component instances

    pub fn component_instances(&self) -> impl Iterator<Item = &ComponentInstance> {
        self.components.values()
    }

    pub fn component_instance(&self, uuid: &Uuid) -> Option<&ComponentInstance> {
        self.components.get(uuid)
    }

    pub fn component_instance_by_name(&self, name: &str) -> Option<&ComponentInstance> {
        self.components.values().find(|c| c.name() == name)
    }

    /// Lowest free name made of `prefix` and a number, e.g. `R3`.
    pub fn generate_auto_component_name(&self, prefix: &str) -> String {
        let prefix = if prefix.is_empty() { "C" } else { prefix };
        (1..)
            .map(|i| format!("{prefix}{i}"))
            .find(|name| self.component_instance_by_name(name).is_none())
            .unwrap_or_default()
    }

    fn component_mut(&mut self, uuid: &Uuid) -> Result<&mut ComponentInstance, CircuitError> {
        self.components
            .get_mut(uuid)
            .ok_or_else(|| CircuitError::ComponentNotFound(uuid.to_str()))
    }

    /// Like [`Circuit::component_mut`], for operations whose callers must
    /// have checked existence already.
    fn expect_component_mut(&mut self, uuid: &Uuid) -> &mut ComponentInstance {
        self.components
            .get_mut(uuid)
            .unwrap_or_else(|| panic!("Component {uuid} is not part of the circuit"))
    }

    /// Add a detached instance, registering all its signals with their nets.
    pub fn add_component_instance(&mut self, mut instance: ComponentInstance) -> Result<(), CircuitError> {
        assert!(
            !instance.is_added_to_circuit(),
            "Component \"{}\" is already added to a circuit",
            instance.name()
        );
        assert!(!instance.is_used(), "Component \"{}\" is in use", instance.name());
        if self.components.contains_key(&instance.uuid()) {
            return Err(CircuitError::DuplicateComponentUuid(instance.uuid()));
        }
        if self.component_instance_by_name(instance.name()).is_some() {
            return Err(CircuitError::DuplicateComponentName(instance.name().to_string()));
        }

        let mut guard = ScopeGuardList::with_capacity(&mut self.net_signals, instance.signals().count());
        for signal in instance.signals() {
            let Some(net_uuid) = signal.net_signal() else {
                continue;
            };
            let key = signal.key();
            guard
                .get_mut(&net_uuid)
                .ok_or_else(|| CircuitError::NetSignalNotFound(net_uuid.to_str()))?
                .register_component_signal(key)?;
            guard.add(move |nets| {
                if let Some(net) = nets.get_mut(&net_uuid) {
                    net.unregister_component_signal(&key);
                }
            });
        }
        guard.dismiss();

        instance.set_added_to_circuit(true);
        let uuid = instance.uuid();
        tracing::debug!(component = %instance.name(), "Component added to circuit");
        self.components.insert(uuid, instance);
        self.refresh_erc_messages(&uuid);
        self.notify(CircuitEvent::ComponentAdded(uuid));
        Ok(())
    }

    /// Remove an unused instance and return it detached.
    pub fn remove_component_instance(&mut self, uuid: &Uuid) -> Result<ComponentInstance, CircuitError> {
        let instance = self
            .components
            .get(uuid)
            .ok_or_else(|| CircuitError::ComponentNotFound(uuid.to_str()))?;
        assert!(
            instance.is_added_to_circuit(),
            "Component \"{}\" is not added to the circuit",
            instance.name()
        );
        if instance.is_used() {
            tracing::warn!(component = %instance.name(), "Refused to remove component in use");
            return Err(CircuitError::ComponentInUse(instance.name().to_string()));
        }

        let mut guard = ScopeGuardList::new(&mut self.net_signals);
        for signal in instance.signals() {
            let Some(net_uuid) = signal.net_signal() else {
                continue;
            };
            let key = signal.key();
            guard
                .get_mut(&net_uuid)
                .ok_or_else(|| CircuitError::NetSignalNotFound(net_uuid.to_str()))?
                .unregister_component_signal(&key);
            guard.add(move |nets| {
                if let Some(net) = nets.get_mut(&net_uuid) {
                    net.restore_component_signal(key);
                }
            });
        }
        guard.dismiss();

        let mut instance = self
            .components
            .remove(uuid)
            .ok_or_else(|| CircuitError::ComponentNotFound(uuid.to_str()))?;
        instance.set_added_to_circuit(false);
        instance.update_erc_messages(&self.net_signals, &self.project, &mut self.erc);
        tracing::debug!(component = %instance.name(), "Component removed from circuit");
        self.notify(CircuitEvent::ComponentRemoved(*uuid));
        Ok(instance)
    }

    pub fn set_component_name(&mut self, uuid: &Uuid, name: &str) -> Result<(), CircuitError> {
        ComponentInstance::validate_name(name)?;
        let current = self.component_mut(uuid)?;
        if current.name() == name {
            return Ok(());
        }
        if self
            .component_instance_by_name(name)
            .is_some_and(|other| other.uuid() != *uuid)
        {
            return Err(CircuitError::DuplicateComponentName(name.to_string()));
        }
        self.expect_component_mut(uuid).set_name(name);
        self.attributes_changed(uuid);
        Ok(())
    }

    pub fn set_component_value(&mut self, uuid: &Uuid, value: &str) -> Result<(), CircuitError> {
        let instance = self.component_mut(uuid)?;
        if instance.value() == value {
            return Ok(());
        }
        instance.set_value(value);
        self.attributes_changed(uuid);
        Ok(())
    }

    pub fn set_component_attributes(&mut self, uuid: &Uuid, attributes: AttributeList) -> Result<(), CircuitError> {
        let instance = self.component_mut(uuid)?;
        if instance.attributes() == &attributes {
            return Ok(());
        }
        *instance.attributes_mut() = attributes;
        self.attributes_changed(uuid);
        Ok(())
    }

    /// Run `edit` on the attribute list of a component. On success the ERC
    /// messages are refreshed and `AttributesChanged` is emitted.
    pub fn edit_component_attributes<R>(
        &mut self,
        uuid: &Uuid,
        edit: impl FnOnce(&mut AttributeList) -> Result<R, ListError>,
    ) -> Result<R, CircuitError> {
        let attributes = self.component_mut(uuid)?.attributes_mut();
        let before = attributes.clone();
        let result = edit(attributes)?;
        if *attributes != before {
            self.attributes_changed(uuid);
        }
        Ok(result)
    }

    fn attributes_changed(&mut self, uuid: &Uuid) {
        self.refresh_erc_messages(uuid);
        self.notify(CircuitEvent::AttributesChanged(*uuid));
    }

    pub fn set_project_attributes(&mut self, project: ProjectScope) {
        if project == self.project {
            return;
        }
        self.project = project;
        self.refresh_all_erc_messages();
        self.notify(CircuitEvent::ProjectAttributesChanged);
    }

    /// Bind a component signal to another net (or to none).
    pub fn set_signal_net(
        &mut self,
        component: &Uuid,
        signal: &Uuid,
        net: Option<Uuid>,
    ) -> Result<(), CircuitError> {
        let instance = self
            .components
            .get(component)
            .ok_or_else(|| CircuitError::ComponentNotFound(component.to_str()))?;
        let signal_instance = instance
            .signal(signal)
            .ok_or_else(|| CircuitError::SignalNotFound {
                component: instance.name().to_string(),
                signal: signal.to_str(),
            })?;
        let old = signal_instance.net_signal();
        if old == net {
            return Ok(());
        }
        assert!(
            signal_instance.is_added_to_circuit(),
            "Signal is not added to the circuit"
        );
        if signal_instance.is_live() {
            tracing::warn!(component = %instance.name(), "Refused to change net of a connected signal");
            return Err(CircuitError::SignalInUse {
                component: instance.name().to_string(),
                signal: signal_instance.lib_signal().name.clone(),
            });
        }
        let key = signal_instance.key();

        let mut guard = ScopeGuardList::new(&mut self.net_signals);
        if let Some(old_uuid) = old {
            guard
                .get_mut(&old_uuid)
                .ok_or_else(|| CircuitError::NetSignalNotFound(old_uuid.to_str()))?
                .unregister_component_signal(&key);
            guard.add(move |nets| {
                if let Some(net) = nets.get_mut(&old_uuid) {
                    net.restore_component_signal(key);
                }
            });
        }
        if let Some(new_uuid) = net {
            guard
                .get_mut(&new_uuid)
                .ok_or_else(|| CircuitError::NetSignalNotFound(new_uuid.to_str()))?
                .register_component_signal(key)?;
        }
        guard.dismiss();

        if let Some(signal_instance) = self.expect_component_mut(component).signal_mut(signal) {
            signal_instance.set_net_signal(net);
        }
        tracing::debug!(component = %component, signal = %signal, "Signal net changed");
        self.refresh_erc_messages(component);
        self.notify(CircuitEvent::SignalNetChanged {
            component: *component,
            signal: *signal,
            net,
        });
        Ok(())
    }

    // Placement registrations. Callers check the recoverable conditions, so
    // broken preconditions here are programming errors.

    pub fn register_symbol(&mut self, component: &Uuid, item: Uuid, symbol: SymbolRef) -> Result<(), CircuitError> {
        self.expect_component_mut(component).register_symbol(item, symbol)?;
        self.refresh_erc_messages(component);
        Ok(())
    }

    pub fn unregister_symbol(&mut self, component: &Uuid, item: &Uuid, symbol: &Uuid) {
        self.expect_component_mut(component).unregister_symbol(item, symbol);
        self.refresh_erc_messages(component);
    }

    pub fn register_device(&mut self, component: &Uuid, device: DeviceRef) {
        self.expect_component_mut(component).register_device(device);
        self.refresh_erc_messages(component);
    }

    pub fn unregister_device(&mut self, component: &Uuid, board: &Uuid) {
        self.expect_component_mut(component).unregister_device(board);
        self.refresh_erc_messages(component);
    }

    fn expect_signal_mut(
        &mut self,
        component: &Uuid,
        signal: &Uuid,
    ) -> &mut ComponentSignalInstance {
        self.expect_component_mut(component)
            .signal_mut(signal)
            .unwrap_or_else(|| panic!("Signal {signal} does not exist on component {component}"))
    }

    pub fn register_symbol_pin(&mut self, component: &Uuid, signal: &Uuid, pin: PinRef) {
        self.expect_signal_mut(component, signal).register_pin(pin);
    }

    pub fn unregister_symbol_pin(&mut self, component: &Uuid, signal: &Uuid, pin: &PinRef) {
        self.expect_signal_mut(component, signal).unregister_pin(pin);
    }

    pub fn set_symbol_pin_connected(&mut self, component: &Uuid, signal: &Uuid, pin: &PinRef, connected: bool) {
        self.expect_signal_mut(component, signal).set_pin_connected(pin, connected);
    }

    pub fn register_footprint_pad(&mut self, component: &Uuid, signal: &Uuid, pad: PadRef) {
        self.expect_signal_mut(component, signal).register_pad(pad);
    }

    pub fn unregister_footprint_pad(&mut self, component: &Uuid, signal: &Uuid, pad: &PadRef) {
        self.expect_signal_mut(component, signal).unregister_pad(pad);
    }

    pub fn set_footprint_pad_connected(&mut self, component: &Uuid, signal: &Uuid, pad: &PadRef, connected: bool) {
        self.expect_signal_mut(component, signal).set_pad_connected(pad, connected);
    }

    // ERC

    fn refresh_erc_messages(&mut self, component: &Uuid) {
        if let Some(instance) = self.components.get_mut(component) {
            instance.update_erc_messages(&self.net_signals, &self.project, &mut self.erc);
        }
    }

    pub fn refresh_all_erc_messages(&mut self) {
        for instance in self.components.values_mut() {
            instance.update_erc_messages(&self.net_signals, &self.project, &mut self.erc);
        }
        for net_class in self.net_classes.values_mut() {
            net_class.update_erc_messages(&mut self.erc);
        }
    }

    // Persistence

    pub fn serialize(&self) -> SExp {
        let mut node = SExp::list("circuit");
        for net_class in self.net_classes.values() {
            node.append(net_class.serialize());
        }
        for net in self.net_signals.values() {
            node.append(net.serialize());
        }
        for component in self.components.values() {
            node.append(component.serialize());
        }
        node
    }

    pub fn deserialize(
        node: &SExp,
        library: &dyn LibraryLookup,
        project: ProjectScope,
    ) -> Result<Self, CircuitError> {
        node.expect_name("circuit")?;
        let mut circuit = Circuit::new(project);
        for class_node in node.children("netclass") {
            circuit.add_net_class(NetClass::deserialize(class_node)?)?;
        }
        for net_node in node.children("netsignal") {
            circuit.add_net_signal(NetSignal::deserialize(net_node)?)?;
        }
        for component_node in node.children("component") {
            circuit.add_component_instance(ComponentInstance::deserialize(component_node, library)?)?;
        }
        circuit.events.clear();
        circuit.erc.drain_changes();
        tracing::debug!(
            nets = circuit.net_signals.len(),
            components = circuit.components.len(),
            "Circuit loaded"
        );
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erc::ErcCategory;
    use crate::library::test_support::{self, *};
    use crate::library::Library;

    const NET_VCC: Uuid = Uuid::from_u128(0x5001);
    const NET_GND: Uuid = Uuid::from_u128(0x5002);
    const U1: Uuid = Uuid::from_u128(0x6001);
    const R1: Uuid = Uuid::from_u128(0x6002);

    fn circuit_with_nets() -> (Library, Circuit) {
        let library = test_support::library();
        let mut circuit = Circuit::default();
        circuit
            .add_net_signal(NetSignal::new(NET_VCC, "VCC", false).unwrap())
            .unwrap();
        circuit
            .add_net_signal(NetSignal::new(NET_GND, "GND", false).unwrap())
            .unwrap();
        circuit.drain_events();
        (library, circuit)
    }

    fn mcu(library: &Library, name: &str) -> ComponentInstance {
        ComponentInstance::new(U1, library.component(&MCU).unwrap(), MCU_VARIANT, name).unwrap()
    }

    fn resistor(library: &Library) -> ComponentInstance {
        ComponentInstance::new(R1, library.component(&RESISTOR).unwrap(), R_VARIANT, "R1").unwrap()
    }

    #[test]
    fn test_add_registers_signals_with_nets() {
        let (library, mut circuit) = circuit_with_nets();
        let mut instance = mcu(&library, "U1");
        instance.assign_net_signal(&MCU_VCC, Some(NET_VCC)).unwrap();
        circuit.add_component_instance(instance).unwrap();

        let net = circuit.net_signal(&NET_VCC).unwrap();
        assert!(net.is_used());
        let added = circuit.component_instance(&U1).unwrap();
        assert!(added.is_added_to_circuit());
        assert!(added.unplaced_required_msg().is_visible());
        assert_eq!(added.unplaced_required_symbol_count(), 2);
    }

    #[test]
    fn test_add_with_dangling_net_rolls_back() {
        let (library, mut circuit) = circuit_with_nets();
        let mut instance = mcu(&library, "U1");
        instance.assign_net_signal(&MCU_VCC, Some(NET_VCC)).unwrap();
        instance.assign_net_signal(&MCU_GND, Some(NET_GND)).unwrap();
        instance
            .assign_net_signal(&MCU_IO, Some(Uuid::from_u128(0xdead)))
            .unwrap();
        let before = circuit.serialize();

        let err = circuit.add_component_instance(instance).unwrap_err();
        assert!(matches!(err, CircuitError::NetSignalNotFound(_)));
        assert!(!circuit.net_signal(&NET_VCC).unwrap().is_used());
        assert!(!circuit.net_signal(&NET_GND).unwrap().is_used());
        assert_eq!(circuit.serialize(), before);
        assert!(circuit.erc().is_empty());
    }

    #[test]
    fn test_duplicate_uuid_and_name() {
        let (library, mut circuit) = circuit_with_nets();
        circuit.add_component_instance(mcu(&library, "U1")).unwrap();
        assert!(matches!(
            circuit.add_component_instance(mcu(&library, "U2")),
            Err(CircuitError::DuplicateComponentUuid(_))
        ));
        let other = ComponentInstance::new(Uuid::from_u128(9), library.component(&MCU).unwrap(), MCU_VARIANT, "U1")
            .unwrap();
        assert!(matches!(
            circuit.add_component_instance(other),
            Err(CircuitError::DuplicateComponentName(_))
        ));
    }

    #[test]
    fn test_add_remove_roundtrip() {
        let (library, mut circuit) = circuit_with_nets();
        let before = circuit.serialize();
        let mut instance = mcu(&library, "U1");
        instance.assign_net_signal(&MCU_VCC, Some(NET_VCC)).unwrap();
        circuit.add_component_instance(instance).unwrap();
        let removed = circuit.remove_component_instance(&U1).unwrap();
        assert!(!removed.is_added_to_circuit());
        assert!(!removed.is_used());
        assert_eq!(removed.registered_symbols().count(), 0);
        assert!(!circuit.net_signal(&NET_VCC).unwrap().is_used());
        assert_eq!(circuit.serialize(), before);
        assert!(circuit.erc().is_empty());
    }

    #[test]
    fn test_remove_with_device_fails() {
        let (library, mut circuit) = circuit_with_nets();
        circuit.add_component_instance(resistor(&library)).unwrap();
        let board = Uuid::from_u128(0x7001);
        circuit.register_device(
            &R1,
            DeviceRef {
                board,
                lib_device: R_DEVICE,
            },
        );
        let err = circuit.remove_component_instance(&R1).unwrap_err();
        assert!(matches!(err, CircuitError::ComponentInUse(_)));
        let instance = circuit.component_instance(&R1).unwrap();
        assert!(instance.is_added_to_circuit());
        assert_eq!(instance.registered_devices().len(), 1);
    }

    #[test]
    fn test_unplaced_required_symbols_scenario() {
        let (library, mut circuit) = circuit_with_nets();
        circuit.add_component_instance(mcu(&library, "U1")).unwrap();
        let msg_text = |circuit: &Circuit| {
            circuit
                .component_instance(&U1)
                .map(|c| (c.unplaced_required_msg().is_visible(), c.unplaced_required_msg().text().to_string()))
                .unwrap()
        };
        assert_eq!(
            msg_text(&circuit),
            (true, "Unplaced required symbols of component \"U1\": 2".to_string())
        );
        let schematic = Uuid::from_u128(0x8000);
        for (n, item) in [MCU_ITEM_A, MCU_ITEM_B].into_iter().enumerate() {
            circuit
                .register_symbol(
                    &U1,
                    item,
                    SymbolRef {
                        symbol: Uuid::from_u128(0x8100 + n as u128),
                        schematic,
                    },
                )
                .unwrap();
        }
        assert!(!msg_text(&circuit).0);
        assert_eq!(circuit.component_instance(&U1).unwrap().unplaced_required_symbol_count(), 0);
    }

    #[test]
    fn test_symbols_must_share_schematic() {
        let (library, mut circuit) = circuit_with_nets();
        circuit.add_component_instance(mcu(&library, "U1")).unwrap();
        let place = |schematic: u128, symbol: u128| SymbolRef {
            symbol: Uuid::from_u128(symbol),
            schematic: Uuid::from_u128(schematic),
        };
        circuit.register_symbol(&U1, MCU_ITEM_A, place(1, 10)).unwrap();
        let err = circuit.register_symbol(&U1, MCU_ITEM_B, place(2, 11)).unwrap_err();
        assert_eq!(err.to_string(), "All symbols of a component must be placed in the same schematic.");
        assert!(circuit.component_instance(&U1).unwrap().symbol_of_item(&MCU_ITEM_B).is_none());
    }

    #[test]
    fn test_forced_net_name_scenario() {
        let (library, mut circuit) = circuit_with_nets();
        let mut instance = mcu(&library, "U1");
        instance.assign_net_signal(&MCU_VCC, Some(NET_VCC)).unwrap();
        circuit.add_component_instance(instance).unwrap();
        let conflict = |circuit: &Circuit| {
            let msg = circuit.component_instance(&U1).unwrap().signal(&MCU_VCC).unwrap().forced_name_msg().clone();
            (msg.is_visible(), msg.text().to_string())
        };
        assert!(!conflict(&circuit).0);

        circuit.set_net_signal_name(&NET_VCC, "PWR", false).unwrap();
        let (visible, text) = conflict(&circuit);
        assert!(visible);
        assert!(text.contains("PWR"));
        assert!(text.contains("VCC"));
        assert_eq!(
            circuit.erc().iter().filter(|e| e.key.category == ErcCategory::ForcedNetSignalNameConflict).count(),
            1
        );
    }

    #[test]
    fn test_set_signal_net_same_value_is_noop() {
        let (library, mut circuit) = circuit_with_nets();
        let mut instance = mcu(&library, "U1");
        instance.assign_net_signal(&MCU_VCC, Some(NET_VCC)).unwrap();
        circuit.add_component_instance(instance).unwrap();
        circuit.drain_events();
        let texts: Vec<String> = circuit.erc().iter().map(|e| e.text.clone()).collect();

        circuit.set_signal_net(&U1, &MCU_VCC, Some(NET_VCC)).unwrap();
        assert!(circuit.drain_events().is_empty());
        let after: Vec<String> = circuit.erc().iter().map(|e| e.text.clone()).collect();
        assert_eq!(texts, after);
    }

    #[test]
    fn test_set_signal_net_moves_registration() {
        let (library, mut circuit) = circuit_with_nets();
        let mut instance = mcu(&library, "U1");
        instance.assign_net_signal(&MCU_GND, Some(NET_VCC)).unwrap();
        circuit.add_component_instance(instance).unwrap();
        circuit.drain_events();

        circuit.set_signal_net(&U1, &MCU_GND, Some(NET_GND)).unwrap();
        assert!(!circuit.net_signal(&NET_VCC).unwrap().is_used());
        assert!(circuit.net_signal(&NET_GND).unwrap().is_used());
        assert!(circuit.drain_events().contains(&CircuitEvent::SignalNetChanged {
            component: U1,
            signal: MCU_GND,
            net: Some(NET_GND),
        }));

        let err = circuit
            .set_signal_net(&U1, &MCU_GND, Some(Uuid::from_u128(0xdead)))
            .unwrap_err();
        assert!(matches!(err, CircuitError::NetSignalNotFound(_)));
        assert!(circuit.net_signal(&NET_GND).unwrap().is_used());
        assert_eq!(
            circuit.component_instance(&U1).unwrap().signal(&MCU_GND).unwrap().net_signal(),
            Some(NET_GND)
        );
    }

    #[test]
    fn test_live_signal_keeps_its_net() {
        let (library, mut circuit) = circuit_with_nets();
        circuit.add_component_instance(resistor(&library)).unwrap();
        let pin = PinRef {
            symbol: Uuid::from_u128(1),
            pin: R_PIN1,
        };
        circuit.register_symbol_pin(&R1, &R_SIG1, pin);
        circuit.set_symbol_pin_connected(&R1, &R_SIG1, &pin, true);
        assert!(matches!(
            circuit.set_signal_net(&R1, &R_SIG1, Some(NET_GND)),
            Err(CircuitError::SignalInUse { .. })
        ));
    }

    #[test]
    fn test_remove_net_in_use_fails() {
        let (library, mut circuit) = circuit_with_nets();
        let mut instance = resistor(&library);
        instance.assign_net_signal(&R_SIG1, Some(NET_GND)).unwrap();
        circuit.add_component_instance(instance).unwrap();
        assert!(matches!(
            circuit.remove_net_signal(&NET_GND),
            Err(CircuitError::NetSignalInUse(_))
        ));
        assert!(circuit.remove_net_signal(&NET_VCC).is_ok());
    }

    #[test]
    fn test_auto_names() {
        let (library, mut circuit) = circuit_with_nets();
        assert_eq!(circuit.generate_auto_net_signal_name(), "N#1");
        circuit.add_component_instance(resistor(&library)).unwrap();
        assert_eq!(circuit.generate_auto_component_name("R"), "R2");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let (library, mut circuit) = circuit_with_nets();
        let mut instance = mcu(&library, "U1");
        instance.assign_net_signal(&MCU_VCC, Some(NET_VCC)).unwrap();
        circuit.add_component_instance(instance).unwrap();
        circuit.add_component_instance(resistor(&library)).unwrap();

        let text = circuit.serialize().to_file_string();
        let node = SExp::parse(&text).unwrap();
        let back = Circuit::deserialize(&node, &library, ProjectScope::default()).unwrap();
        assert_eq!(back.serialize().to_file_string(), text);
        assert_eq!(back.erc().len(), circuit.erc().len());
    }

    #[test]
    fn test_deserialize_duplicate_net_name() {
        let library = test_support::library();
        let text = format!(
            "(circuit (netsignal {} (name \"A\") (auto false)) (netsignal {} (name \"A\") (auto false)))",
            Uuid::from_u128(1),
            Uuid::from_u128(2)
        );
        let node = SExp::parse(&text).unwrap();
        assert!(matches!(
            Circuit::deserialize(&node, &library, ProjectScope::default()),
            Err(CircuitError::DuplicateNetSignalName(_))
        ));
    }

    #[test]
    fn test_attribute_edit_without_change_emits_nothing() {
        let (library, mut circuit) = circuit_with_nets();
        circuit.add_component_instance(resistor(&library)).unwrap();
        circuit.drain_events();

        circuit
            .edit_component_attributes(&R1, |list| list.swap(0, 0))
            .unwrap();
        assert!(circuit.drain_events().is_empty());

        circuit
            .edit_component_attributes(&R1, |list| list.remove(0).map(drop))
            .unwrap();
        assert!(circuit.drain_events().contains(&CircuitEvent::AttributesChanged(R1)));
    }

    const CLASS_POWER: Uuid = Uuid::from_u128(0x7001);
    const CLASS_SIGNAL: Uuid = Uuid::from_u128(0x7002);

    fn unused_class_messages(circuit: &Circuit) -> usize {
        circuit
            .erc()
            .iter()
            .filter(|e| e.key.category == ErcCategory::UnusedNetClass)
            .count()
    }

    #[test]
    fn test_net_class_unused_message() {
        let (_, mut circuit) = circuit_with_nets();
        circuit
            .add_net_class(NetClass::new(CLASS_POWER, "Power").unwrap())
            .unwrap();
        assert_eq!(unused_class_messages(&circuit), 1);
        assert!(circuit.drain_events().contains(&CircuitEvent::NetClassAdded(CLASS_POWER)));

        circuit.set_net_signal_net_class(&NET_VCC, Some(CLASS_POWER)).unwrap();
        assert_eq!(unused_class_messages(&circuit), 0);
        assert_eq!(circuit.net_signal(&NET_VCC).unwrap().net_class(), Some(CLASS_POWER));
        assert!(circuit.net_class(&CLASS_POWER).unwrap().is_used());

        circuit.set_net_signal_net_class(&NET_VCC, None).unwrap();
        assert_eq!(unused_class_messages(&circuit), 1);
        let removed = circuit.remove_net_class(&CLASS_POWER).unwrap();
        assert!(!removed.unused_msg().is_visible());
        assert_eq!(unused_class_messages(&circuit), 0);
    }

    #[test]
    fn test_net_class_duplicates_and_rename() {
        let (_, mut circuit) = circuit_with_nets();
        circuit
            .add_net_class(NetClass::new(CLASS_POWER, "Power").unwrap())
            .unwrap();
        assert!(matches!(
            circuit.add_net_class(NetClass::new(CLASS_POWER, "Other").unwrap()),
            Err(CircuitError::DuplicateNetClassUuid(_))
        ));
        assert!(matches!(
            circuit.add_net_class(NetClass::new(CLASS_SIGNAL, "Power").unwrap()),
            Err(CircuitError::DuplicateNetClassName(_))
        ));
        circuit
            .add_net_class(NetClass::new(CLASS_SIGNAL, "Signal").unwrap())
            .unwrap();
        assert!(matches!(
            circuit.set_net_class_name(&CLASS_SIGNAL, "Power"),
            Err(CircuitError::DuplicateNetClassName(_))
        ));
        assert!(matches!(
            circuit.set_net_class_name(&CLASS_SIGNAL, ""),
            Err(CircuitError::InvalidNetClassName(_))
        ));
        circuit.drain_events();
        circuit.set_net_class_name(&CLASS_SIGNAL, "Data").unwrap();
        assert_eq!(circuit.net_class_by_name("Data").unwrap().uuid(), CLASS_SIGNAL);
        assert!(circuit
            .erc()
            .iter()
            .any(|e| e.text == "Unused net class: \"Data\""));
        let events = circuit.drain_events();
        assert!(events.contains(&CircuitEvent::NetClassNameChanged {
            uuid: CLASS_SIGNAL,
            name: "Data".to_string(),
        }));
        assert!(events
            .iter()
            .any(|e| matches!(e, CircuitEvent::ErcMessageChanged(key) if key.category == ErcCategory::UnusedNetClass)));
    }

    #[test]
    fn test_set_net_class_to_missing_class_rolls_back() {
        let (_, mut circuit) = circuit_with_nets();
        circuit
            .add_net_class(NetClass::new(CLASS_POWER, "Power").unwrap())
            .unwrap();
        circuit.set_net_signal_net_class(&NET_VCC, Some(CLASS_POWER)).unwrap();
        circuit.drain_events();

        let err = circuit
            .set_net_signal_net_class(&NET_VCC, Some(Uuid::from_u128(0xdead)))
            .unwrap_err();
        assert!(matches!(err, CircuitError::NetClassNotFound(_)));
        let power = circuit.net_class(&CLASS_POWER).unwrap();
        assert_eq!(power.registered_net_signals().collect::<Vec<_>>(), vec![&NET_VCC]);
        assert_eq!(circuit.net_signal(&NET_VCC).unwrap().net_class(), Some(CLASS_POWER));
        assert!(circuit.drain_events().is_empty());
    }

    #[test]
    fn test_net_class_in_use_cannot_be_removed() {
        let (_, mut circuit) = circuit_with_nets();
        circuit
            .add_net_class(NetClass::new(CLASS_POWER, "Power").unwrap())
            .unwrap();
        circuit.set_net_signal_net_class(&NET_GND, Some(CLASS_POWER)).unwrap();
        assert!(matches!(
            circuit.remove_net_class(&CLASS_POWER),
            Err(CircuitError::NetClassInUse(_))
        ));

        let net = circuit.remove_net_signal(&NET_GND).unwrap();
        assert_eq!(net.net_class(), Some(CLASS_POWER));
        assert!(!circuit.net_class(&CLASS_POWER).unwrap().is_used());
        circuit.add_net_signal(net).unwrap();
        assert!(circuit.net_class(&CLASS_POWER).unwrap().is_used());
    }

    #[test]
    fn test_serialize_roundtrip_with_net_classes() {
        let (library, mut circuit) = circuit_with_nets();
        circuit
            .add_net_class(NetClass::new(CLASS_POWER, "Power").unwrap())
            .unwrap();
        circuit
            .add_net_class(NetClass::new(CLASS_SIGNAL, "Signal").unwrap())
            .unwrap();
        circuit.set_net_signal_net_class(&NET_VCC, Some(CLASS_POWER)).unwrap();

        let text = circuit.serialize().to_file_string();
        let node = SExp::parse(&text).unwrap();
        let back = Circuit::deserialize(&node, &library, ProjectScope::default()).unwrap();
        assert_eq!(back.serialize().to_file_string(), text);
        assert!(back.net_class(&CLASS_POWER).unwrap().is_used());
        assert_eq!(unused_class_messages(&back), 1);
    }

    #[test]
    #[should_panic(expected = "is not part of the circuit")]
    fn test_register_device_unknown_component_panics() {
        let (_, mut circuit) = circuit_with_nets();
        circuit.register_device(
            &U1,
            DeviceRef {
                board: Uuid::from_u128(1),
                lib_device: R_DEVICE,
            },
        );
    }
}
