use crate::erc::{ErcChange, ErcMsgKey};
use crate::types::Uuid;

/// Structured change notification, drained by the owner of the circuit.
///
/// Payloads always describe the state after the mutation which produced
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitEvent {
    ComponentAdded(Uuid),
    ComponentRemoved(Uuid),
    AttributesChanged(Uuid),
    NetSignalAdded(Uuid),
    NetSignalRemoved(Uuid),
    NetSignalNameChanged {
        uuid: Uuid,
        name: String,
    },
    NetSignalNetClassChanged {
        uuid: Uuid,
        net_class: Option<Uuid>,
    },
    NetClassAdded(Uuid),
    NetClassRemoved(Uuid),
    NetClassNameChanged {
        uuid: Uuid,
        name: String,
    },
    SignalNetChanged {
        component: Uuid,
        signal: Uuid,
        net: Option<Uuid>,
    },
    ProjectAttributesChanged,
    ErcMessageAdded(ErcMsgKey),
    ErcMessageRemoved(ErcMsgKey),
    ErcMessageChanged(ErcMsgKey),
}

impl From<ErcChange> for CircuitEvent {
    fn from(change: ErcChange) -> Self {
        match change {
            ErcChange::Added(key) => CircuitEvent::ErcMessageAdded(key),
            ErcChange::Removed(key) => CircuitEvent::ErcMessageRemoved(key),
            ErcChange::Changed(key) => CircuitEvent::ErcMessageChanged(key),
        }
    }
}
