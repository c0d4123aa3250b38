use std::collections::BTreeSet;

use super::error::CircuitError;
use crate::erc::{ErcCategory, ErcMsg, ErcMsgList, ErcOwner};
use crate::serialization::SExp;
use crate::types::Uuid;

/// A named group of net signals sharing design rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetClass {
    uuid: Uuid,
    name: String,
    added_to_circuit: bool,
    net_signals: BTreeSet<Uuid>,
    unused_msg: ErcMsg,
}

impl NetClass {
    pub fn new(uuid: Uuid, name: &str) -> Result<Self, CircuitError> {
        Self::validate_name(name)?;
        Ok(Self {
            uuid,
            name: name.to_string(),
            added_to_circuit: false,
            net_signals: BTreeSet::new(),
            unused_msg: ErcMsg::new(ErcOwner::NetClass(uuid), ErcCategory::UnusedNetClass),
        })
    }

    /// Class names may contain spaces but must not be blank.
    pub fn validate_name(name: &str) -> Result<(), CircuitError> {
        if name.trim().is_empty() || name.trim() != name {
            return Err(CircuitError::InvalidNetClassName(name.to_string()));
        }
        Ok(())
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_added_to_circuit(&self) -> bool {
        self.added_to_circuit
    }

    pub fn net_signal_count(&self) -> usize {
        self.net_signals.len()
    }

    pub fn is_used(&self) -> bool {
        !self.net_signals.is_empty()
    }

    pub fn registered_net_signals(&self) -> impl Iterator<Item = &Uuid> {
        self.net_signals.iter()
    }

    pub fn unused_msg(&self) -> &ErcMsg {
        &self.unused_msg
    }

    pub(crate) fn set_added_to_circuit(&mut self, added: bool) {
        self.added_to_circuit = added;
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn register_net_signal(&mut self, net: Uuid) -> Result<(), CircuitError> {
        assert!(self.added_to_circuit, "Net class \"{}\" is not added to the circuit", self.name);
        if !self.net_signals.insert(net) {
            return Err(CircuitError::AlreadyRegistered {
                kind: "net signal",
                element: net,
            });
        }
        Ok(())
    }

    pub(crate) fn unregister_net_signal(&mut self, net: &Uuid) {
        let removed = self.net_signals.remove(net);
        assert!(removed, "Net signal {net} is not registered in net class \"{}\"", self.name);
    }

    pub(crate) fn update_erc_messages(&mut self, erc: &mut ErcMsgList) {
        let unused = self.added_to_circuit && !self.is_used();
        self.unused_msg
            .update(format!("Unused net class: \"{}\"", self.name), unused, erc);
    }

    pub fn serialize(&self) -> SExp {
        SExp::list("netclass")
            .with_token(self.uuid)
            .with_child(SExp::list("name").with_string(self.name.as_str()))
    }

    pub fn deserialize(node: &SExp) -> Result<Self, CircuitError> {
        node.expect_name("netclass")?;
        let uuid: Uuid = node.parse_value(0)?;
        Self::new(uuid, node.child_value("name")?)
    }
}
