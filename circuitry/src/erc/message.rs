use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::list::ErcMsgList;
use crate::types::Uuid;

/// Severity and origin of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErcMsgType {
    CircuitError,
    CircuitWarning,
    SchematicError,
    SchematicWarning,
    BoardError,
    BoardWarning,
}

impl ErcMsgType {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ErcMsgType::CircuitError | ErcMsgType::SchematicError | ErcMsgType::BoardError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErcMsgType::CircuitError => "circuit error",
            ErcMsgType::CircuitWarning => "circuit warning",
            ErcMsgType::SchematicError => "schematic error",
            ErcMsgType::SchematicWarning => "schematic warning",
            ErcMsgType::BoardError => "board error",
            ErcMsgType::BoardWarning => "board warning",
        }
    }
}

impl fmt::Display for ErcMsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErcOwner {
    ComponentInstance(Uuid),
    ComponentSignalInstance { component: Uuid, signal: Uuid },
    NetClass(Uuid),
}

impl ErcOwner {
    pub fn class_name(&self) -> &'static str {
        match self {
            ErcOwner::ComponentInstance(_) => "ComponentInstance",
            ErcOwner::ComponentSignalInstance { .. } => "ComponentSignalInstance",
            ErcOwner::NetClass(_) => "NetClass",
        }
    }

    /// Stable textual key of the owner within its class.
    pub fn key(&self) -> String {
        match self {
            ErcOwner::ComponentInstance(uuid) => uuid.to_str(),
            ErcOwner::ComponentSignalInstance { component, signal } => format!("{component}/{signal}"),
            ErcOwner::NetClass(uuid) => uuid.to_str(),
        }
    }

    pub fn from_parts(class_name: &str, key: &str) -> Option<Self> {
        match class_name {
            "ComponentInstance" => Uuid::parse(key).ok().map(ErcOwner::ComponentInstance),
            "NetClass" => Uuid::parse(key).ok().map(ErcOwner::NetClass),
            "ComponentSignalInstance" => {
                let (component, signal) = key.split_once('/')?;
                Some(ErcOwner::ComponentSignalInstance {
                    component: Uuid::parse(component).ok()?,
                    signal: Uuid::parse(signal).ok()?,
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErcCategory {
    UnplacedRequiredSymbols,
    UnplacedOptionalSymbols,
    UnconnectedRequiredSignal,
    ForcedNetSignalNameConflict,
    UnusedNetClass,
}

impl ErcCategory {
    pub const ALL: [ErcCategory; 5] = [
        ErcCategory::UnplacedRequiredSymbols,
        ErcCategory::UnplacedOptionalSymbols,
        ErcCategory::UnconnectedRequiredSignal,
        ErcCategory::ForcedNetSignalNameConflict,
        ErcCategory::UnusedNetClass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErcCategory::UnplacedRequiredSymbols => "UnplacedRequiredSymbols",
            ErcCategory::UnplacedOptionalSymbols => "UnplacedOptionalSymbols",
            ErcCategory::UnconnectedRequiredSignal => "UnconnectedRequiredSignal",
            ErcCategory::ForcedNetSignalNameConflict => "ForcedNetSignalNameConflict",
            ErcCategory::UnusedNetClass => "UnusedNetClass",
        }
    }

    pub fn msg_type(&self) -> ErcMsgType {
        match self {
            ErcCategory::UnplacedRequiredSymbols => ErcMsgType::SchematicError,
            ErcCategory::UnplacedOptionalSymbols => ErcMsgType::SchematicWarning,
            ErcCategory::UnconnectedRequiredSignal => ErcMsgType::CircuitError,
            ErcCategory::ForcedNetSignalNameConflict => ErcMsgType::SchematicError,
            ErcCategory::UnusedNetClass => ErcMsgType::CircuitWarning,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErcCategory::UnplacedRequiredSymbols => {
                "A component has required symbols which are not placed in any schematic"
            }
            ErcCategory::UnplacedOptionalSymbols => {
                "A component has optional symbols which are not placed in any schematic"
            }
            ErcCategory::UnconnectedRequiredSignal => {
                "A required component signal is not connected to any net"
            }
            ErcCategory::ForcedNetSignalNameConflict => {
                "A component signal forces a net name which differs from its net"
            }
            ErcCategory::UnusedNetClass => "A net class has no net signals assigned",
        }
    }
}

impl fmt::Display for ErcCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErcCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErcCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown ERC category \"{s}\""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErcMsgKey {
    pub owner: ErcOwner,
    pub category: ErcCategory,
}

impl fmt::Display for ErcMsgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.owner.class_name(), self.owner.key(), self.category)
    }
}

/// A diagnostic owned by a model entity.
///
/// The message is created once together with its owner and then only
/// updated. Whenever it is visible it is also present in the [`ErcMsgList`]
/// passed to the mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErcMsg {
    key: ErcMsgKey,
    text: String,
    visible: bool,
}

impl ErcMsg {
    pub fn new(owner: ErcOwner, category: ErcCategory) -> Self {
        Self {
            key: ErcMsgKey { owner, category },
            text: String::new(),
            visible: false,
        }
    }

    pub fn key(&self) -> ErcMsgKey {
        self.key
    }

    pub fn msg_type(&self) -> ErcMsgType {
        self.key.category.msg_type()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_text(&mut self, text: String, list: &mut ErcMsgList) {
        if text == self.text {
            return;
        }
        self.text = text;
        if self.visible {
            list.update(&self.key, &self.text);
        }
    }

    pub fn set_visible(&mut self, visible: bool, list: &mut ErcMsgList) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            list.add(self.key, &self.text);
        } else {
            list.remove(&self.key);
        }
    }

    /// Set text and visibility together, without announcing a text change
    /// for a message that is about to disappear.
    pub fn update(&mut self, text: String, visible: bool, list: &mut ErcMsgList) {
        if visible {
            self.set_text(text, list);
            self.set_visible(true, list);
        } else {
            self.set_visible(false, list);
            self.set_text(text, list);
        }
    }
}
