//! Immutable library definitions consumed by the circuit.

use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;
use crate::types::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSignal {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    /// Net name every net bound to this signal must have. May contain
    /// attribute placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_net_name: Option<String>,
}

impl ComponentSignal {
    pub fn is_net_signal_name_forced(&self) -> bool {
        self.forced_net_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSignalMapItem {
    pub pin: Uuid,
    #[serde(default)]
    pub signal: Option<Uuid>,
}

/// One symbol slot of a symbol variant (a "gate").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolVariantItem {
    pub uuid: Uuid,
    pub symbol: Uuid,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub pin_signal_map: Vec<PinSignalMapItem>,
}

impl SymbolVariantItem {
    /// Signal connected to `pin`, if any.
    pub fn signal_of_pin(&self, pin: &Uuid) -> Option<Uuid> {
        self.pin_signal_map
            .iter()
            .find(|item| &item.pin == pin)
            .and_then(|item| item.signal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolVariant {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub norm: String,
    pub items: Vec<SymbolVariantItem>,
}

impl SymbolVariant {
    pub fn item(&self, uuid: &Uuid) -> Option<&SymbolVariantItem> {
        self.items.iter().find(|item| &item.uuid == uuid)
    }

    pub fn required_item_count(&self) -> usize {
        self.items.iter().filter(|item| item.required).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub uuid: Uuid,
    pub name: String,
    /// Schematic-only components (frames, labels) never get a device.
    #[serde(default)]
    pub schematic_only: bool,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub signals: Vec<ComponentSignal>,
    pub symbol_variants: Vec<SymbolVariant>,
}

impl Component {
    pub fn signal(&self, uuid: &Uuid) -> Option<&ComponentSignal> {
        self.signals.iter().find(|signal| &signal.uuid == uuid)
    }

    pub fn signal_by_name(&self, name: &str) -> Option<&ComponentSignal> {
        self.signals.iter().find(|signal| signal.name == name)
    }

    pub fn symbol_variant(&self, uuid: &Uuid) -> Option<&SymbolVariant> {
        self.symbol_variants.iter().find(|variant| &variant.uuid == uuid)
    }

    pub fn symbol_variant_index(&self, uuid: &Uuid) -> Option<usize> {
        self.symbol_variants.iter().position(|variant| &variant.uuid == uuid)
    }

    pub fn default_symbol_variant(&self) -> Option<&SymbolVariant> {
        self.symbol_variants.first()
    }

    /// Check internal consistency, returning a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol_variants.is_empty() {
            return Err("component has no symbol variant".to_string());
        }
        for attr in &self.attributes {
            if !Attribute::is_valid_key(&attr.key) {
                return Err(format!("invalid attribute key \"{}\"", attr.key));
            }
        }
        if let Some(dup) = first_duplicate(self.attributes.iter().map(|attr| attr.key.clone())) {
            return Err(format!("duplicate attribute \"{dup}\""));
        }
        if let Some(dup) = first_duplicate(self.signals.iter().map(|s| s.uuid)) {
            return Err(format!("duplicate signal {dup}"));
        }
        if let Some(dup) = first_duplicate(self.signals.iter().map(|s| s.name.clone())) {
            return Err(format!("duplicate signal name \"{dup}\""));
        }
        if let Some(dup) = first_duplicate(self.symbol_variants.iter().map(|v| v.uuid)) {
            return Err(format!("duplicate symbol variant {dup}"));
        }
        for variant in &self.symbol_variants {
            if let Some(dup) = first_duplicate(variant.items.iter().map(|i| i.uuid)) {
                return Err(format!("duplicate item {dup} in variant \"{}\"", variant.name));
            }
            for item in &variant.items {
                if let Some(dup) = first_duplicate(item.pin_signal_map.iter().map(|m| m.pin)) {
                    return Err(format!("pin {dup} mapped twice in item {}", item.uuid));
                }
                for mapping in &item.pin_signal_map {
                    if let Some(signal) = mapping.signal {
                        if self.signal(&signal).is_none() {
                            return Err(format!("pin {} maps to unknown signal {signal}", mapping.pin));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadSignalMapItem {
    pub pad: Uuid,
    #[serde(default)]
    pub signal: Option<Uuid>,
}

/// A component bound to a concrete package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub uuid: Uuid,
    pub name: String,
    pub component: Uuid,
    pub package: Uuid,
    #[serde(default)]
    pub pad_signal_map: Vec<PadSignalMapItem>,
}

impl Device {
    pub fn signal_of_pad(&self, pad: &Uuid) -> Option<Uuid> {
        self.pad_signal_map
            .iter()
            .find(|item| &item.pad == pad)
            .and_then(|item| item.signal)
    }
}

pub(crate) fn first_duplicate<T: PartialEq>(items: impl Iterator<Item = T>) -> Option<T> {
    let mut seen: Vec<T> = Vec::new();
    for item in items {
        if seen.contains(&item) {
            return Some(item);
        }
        seen.push(item);
    }
    None
}
