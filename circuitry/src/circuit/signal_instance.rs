use std::collections::BTreeMap;

use super::net_signal::{NetSignal, SignalKey};
use crate::attributes::{substitute, AttributeProvider};
use crate::erc::{ErcCategory, ErcMsg, ErcMsgList, ErcOwner};
use crate::library::ComponentSignal;
use crate::serialization::SExp;
use crate::types::Uuid;

/// A symbol pin referencing a component signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinRef {
    pub symbol: Uuid,
    pub pin: Uuid,
}

/// A footprint pad referencing a component signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PadRef {
    pub board: Uuid,
    pub pad: Uuid,
}

/// Binding of one library signal of a component instance to a net.
///
/// Pins and pads register themselves here while their symbol or device is
/// placed; the flag stored with each tells whether it is electrically
/// connected. A signal with a connected pin or pad is "live" and its net can
/// not be changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSignalInstance {
    component: Uuid,
    lib_signal: ComponentSignal,
    net_signal: Option<Uuid>,
    added_to_circuit: bool,
    pins: BTreeMap<PinRef, bool>,
    pads: BTreeMap<PadRef, bool>,
    unconnected_msg: ErcMsg,
    forced_name_msg: ErcMsg,
}

impl ComponentSignalInstance {
    pub fn new(component: Uuid, lib_signal: ComponentSignal, net_signal: Option<Uuid>) -> Self {
        let owner = ErcOwner::ComponentSignalInstance {
            component,
            signal: lib_signal.uuid,
        };
        Self {
            component,
            lib_signal,
            net_signal,
            added_to_circuit: false,
            pins: BTreeMap::new(),
            pads: BTreeMap::new(),
            unconnected_msg: ErcMsg::new(owner, ErcCategory::UnconnectedRequiredSignal),
            forced_name_msg: ErcMsg::new(owner, ErcCategory::ForcedNetSignalNameConflict),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.lib_signal.uuid
    }

    pub fn key(&self) -> SignalKey {
        SignalKey {
            component: self.component,
            signal: self.lib_signal.uuid,
        }
    }

    pub fn lib_signal(&self) -> &ComponentSignal {
        &self.lib_signal
    }

    pub fn net_signal(&self) -> Option<Uuid> {
        self.net_signal
    }

    pub fn is_added_to_circuit(&self) -> bool {
        self.added_to_circuit
    }

    /// Whether any pin or pad references this signal.
    pub fn is_used(&self) -> bool {
        !self.pins.is_empty() || !self.pads.is_empty()
    }

    /// Whether any referencing pin or pad is electrically connected.
    pub fn is_live(&self) -> bool {
        self.pins.values().any(|connected| *connected) || self.pads.values().any(|connected| *connected)
    }

    pub fn registered_pins(&self) -> impl Iterator<Item = (&PinRef, bool)> {
        self.pins.iter().map(|(pin, connected)| (pin, *connected))
    }

    pub fn registered_pads(&self) -> impl Iterator<Item = (&PadRef, bool)> {
        self.pads.iter().map(|(pad, connected)| (pad, *connected))
    }

    pub fn unconnected_msg(&self) -> &ErcMsg {
        &self.unconnected_msg
    }

    pub fn forced_name_msg(&self) -> &ErcMsg {
        &self.forced_name_msg
    }

    pub(crate) fn set_added_to_circuit(&mut self, added: bool) {
        self.added_to_circuit = added;
    }

    pub(crate) fn set_net_signal(&mut self, net_signal: Option<Uuid>) {
        self.net_signal = net_signal;
    }

    pub(crate) fn register_pin(&mut self, pin: PinRef) {
        assert!(self.added_to_circuit, "Signal {} is not added to the circuit", self.lib_signal.name);
        let previous = self.pins.insert(pin, false);
        assert!(previous.is_none(), "Pin {} is already registered", pin.pin);
    }

    pub(crate) fn unregister_pin(&mut self, pin: &PinRef) {
        let removed = self.pins.remove(pin);
        assert!(removed.is_some(), "Pin {} is not registered", pin.pin);
    }

    pub(crate) fn register_pad(&mut self, pad: PadRef) {
        assert!(self.added_to_circuit, "Signal {} is not added to the circuit", self.lib_signal.name);
        let previous = self.pads.insert(pad, false);
        assert!(previous.is_none(), "Pad {} is already registered", pad.pad);
    }

    pub(crate) fn unregister_pad(&mut self, pad: &PadRef) {
        let removed = self.pads.remove(pad);
        assert!(removed.is_some(), "Pad {} is not registered", pad.pad);
    }

    pub fn is_pin_connected(&self, pin: &PinRef) -> Option<bool> {
        self.pins.get(pin).copied()
    }

    pub fn is_pad_connected(&self, pad: &PadRef) -> Option<bool> {
        self.pads.get(pad).copied()
    }

    pub(crate) fn set_pin_connected(&mut self, pin: &PinRef, connected: bool) {
        match self.pins.get_mut(pin) {
            Some(flag) => *flag = connected,
            None => panic!("Pin {} is not registered", pin.pin),
        }
    }

    pub(crate) fn set_pad_connected(&mut self, pad: &PadRef, connected: bool) {
        match self.pads.get_mut(pad) {
            Some(flag) => *flag = connected,
            None => panic!("Pad {} is not registered", pad.pad),
        }
    }

    /// Net name forced by the library signal, with placeholders expanded.
    pub fn forced_net_name(&self, scope: &dyn AttributeProvider) -> Option<String> {
        if !self.lib_signal.is_net_signal_name_forced() {
            return None;
        }
        let raw = self.lib_signal.forced_net_name.as_deref().unwrap_or_default();
        Some(substitute(raw, scope, true))
    }

    pub(crate) fn update_erc_messages(
        &mut self,
        nets: &BTreeMap<Uuid, NetSignal>,
        scope: &dyn AttributeProvider,
        component_name: &str,
        erc: &mut ErcMsgList,
    ) {
        let net_name = self
            .net_signal
            .and_then(|uuid| nets.get(&uuid))
            .map(|net| net.name().to_string());

        let unconnected = self.added_to_circuit && self.net_signal.is_none() && self.lib_signal.required;
        self.unconnected_msg.update(
            format!(
                "Unconnected component signal: \"{}\" from \"{}\"",
                self.lib_signal.name, component_name
            ),
            unconnected,
            erc,
        );

        let forced = self.forced_net_name(scope);
        let conflict = match (&forced, &net_name) {
            (Some(forced), Some(net)) => forced != net,
            (Some(_), None) => true,
            (None, _) => false,
        };
        self.forced_name_msg.update(
            format!(
                "Signal name conflict: \"{}\" != \"{}\" (\"{}\" from \"{}\")",
                net_name.as_deref().unwrap_or_default(),
                forced.as_deref().unwrap_or_default(),
                self.lib_signal.name,
                component_name
            ),
            self.added_to_circuit && conflict,
            erc,
        );
    }

    /// `(signal <lib-signal> (net <uuid>|none))`
    pub fn serialize(&self) -> SExp {
        let net = match self.net_signal {
            Some(uuid) => uuid.to_str(),
            None => "none".to_string(),
        };
        SExp::list("signal")
            .with_token(self.lib_signal.uuid)
            .with_child(SExp::list("net").with_token(net))
    }
}
