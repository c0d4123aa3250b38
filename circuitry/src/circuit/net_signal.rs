use std::collections::BTreeSet;

use super::error::CircuitError;
use crate::serialization::SExp;
use crate::types::Uuid;

/// Back-reference from a net signal to a bound component signal instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalKey {
    pub component: Uuid,
    pub signal: Uuid,
}

/// A named electrical net.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetSignal {
    uuid: Uuid,
    name: String,
    has_auto_name: bool,
    net_class: Option<Uuid>,
    signals: BTreeSet<SignalKey>,
}

impl NetSignal {
    pub fn new(uuid: Uuid, name: &str, has_auto_name: bool) -> Result<Self, CircuitError> {
        Self::validate_name(name)?;
        Ok(Self {
            uuid,
            name: name.to_string(),
            has_auto_name,
            net_class: None,
            signals: BTreeSet::new(),
        })
    }

    /// Assign the net to a net class before it is added to a circuit.
    pub fn with_net_class(mut self, net_class: Option<Uuid>) -> Self {
        self.net_class = net_class;
        self
    }

    /// Net names are non-empty, contain no whitespace and are at most 32
    /// characters long.
    pub fn validate_name(name: &str) -> Result<(), CircuitError> {
        if name.is_empty() || name.chars().count() > 32 || name.chars().any(char::is_whitespace) {
            return Err(CircuitError::InvalidNetSignalName(name.to_string()));
        }
        Ok(())
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_auto_name(&self) -> bool {
        self.has_auto_name
    }

    pub fn net_class(&self) -> Option<Uuid> {
        self.net_class
    }

    pub fn is_used(&self) -> bool {
        !self.signals.is_empty()
    }

    pub fn registered_signals(&self) -> impl Iterator<Item = &SignalKey> {
        self.signals.iter()
    }

    pub(crate) fn set_name(&mut self, name: &str, has_auto_name: bool) {
        self.name = name.to_string();
        self.has_auto_name = has_auto_name;
    }

    pub(crate) fn set_net_class(&mut self, net_class: Option<Uuid>) {
        self.net_class = net_class;
    }

    pub(crate) fn register_component_signal(&mut self, key: SignalKey) -> Result<(), CircuitError> {
        if self.signals.contains(&key) {
            return Err(CircuitError::SignalAlreadyRegistered {
                component: key.component.to_str(),
                signal: key.signal.to_str(),
                net: self.name.clone(),
            });
        }
        self.signals.insert(key);
        Ok(())
    }

    /// Put back a registration removed by [`NetSignal::unregister_component_signal`].
    pub(crate) fn restore_component_signal(&mut self, key: SignalKey) {
        self.signals.insert(key);
    }

    pub(crate) fn unregister_component_signal(&mut self, key: &SignalKey) {
        let removed = self.signals.remove(key);
        assert!(
            removed,
            "Component signal {}/{} is not registered in net signal \"{}\"",
            key.component, key.signal, self.name
        );
    }

    /// `(netsignal <uuid> (name "VCC") (auto false) (netclass <uuid>))`, the
    /// class only when assigned.
    pub fn serialize(&self) -> SExp {
        let mut node = SExp::list("netsignal")
            .with_token(self.uuid)
            .with_child(SExp::list("name").with_string(self.name.as_str()))
            .with_child(SExp::list("auto").with_token(self.has_auto_name));
        if let Some(net_class) = self.net_class {
            node.append(SExp::list("netclass").with_token(net_class));
        }
        node
    }

    pub fn deserialize(node: &SExp) -> Result<Self, CircuitError> {
        node.expect_name("netsignal")?;
        let uuid: Uuid = node.parse_value(0)?;
        let name = node.child_value("name")?;
        let has_auto_name: bool = node.parse_child_value("auto")?;
        let net_class = match node.child("netclass") {
            Some(class_node) => Some(class_node.parse_value::<Uuid>(0)?),
            None => None,
        };
        Ok(Self::new(uuid, name, has_auto_name)?.with_net_class(net_class))
    }
}
