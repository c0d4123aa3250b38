use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::component::{first_duplicate, Component, Device};
use crate::types::Uuid;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Library {kind} \"{uuid}\" not found")]
    NotFound { kind: &'static str, uuid: Uuid },
    #[error("Failed to parse library: {0}")]
    Parse(String),
    #[error("Invalid library element \"{uuid}\": {reason}")]
    Invalid { uuid: Uuid, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LibraryError {
    fn from(e: serde_json::Error) -> Self {
        LibraryError::Parse(e.to_string())
    }
}

/// Read-only access to library definitions.
///
/// Lookups are synchronous and may fail with [`LibraryError::NotFound`], for
/// example while an external index is still being built.
pub trait LibraryLookup {
    fn component(&self, uuid: &Uuid) -> Result<Arc<Component>, LibraryError>;

    fn device(&self, uuid: &Uuid) -> Result<Arc<Device>, LibraryError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    components: Vec<Component>,
    #[serde(default)]
    devices: Vec<Device>,
}

/// In-memory library, usually loaded from a JSON file.
#[derive(Debug, Default, Clone)]
pub struct Library {
    components: BTreeMap<Uuid, Arc<Component>>,
    devices: BTreeMap<Uuid, Arc<Device>>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        let file: LibraryFile = serde_json::from_str(json)?;
        let mut library = Library::new();
        for component in file.components {
            library.add_component(component)?;
        }
        for device in file.devices {
            library.add_device(device)?;
        }
        tracing::debug!(
            components = library.components.len(),
            devices = library.devices.len(),
            "Library parsed"
        );
        Ok(library)
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, LibraryError> {
        let file = LibraryFile {
            components: self.components.values().map(|c| (**c).clone()).collect(),
            devices: self.devices.values().map(|d| (**d).clone()).collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn add_component(&mut self, component: Component) -> Result<(), LibraryError> {
        component.validate().map_err(|reason| LibraryError::Invalid {
            uuid: component.uuid,
            reason,
        })?;
        if self.components.contains_key(&component.uuid) {
            return Err(LibraryError::Invalid {
                uuid: component.uuid,
                reason: "duplicate component".to_string(),
            });
        }
        self.components.insert(component.uuid, Arc::new(component));
        Ok(())
    }

    /// Add a device. Its component must already be part of the library and
    /// every mapped signal must exist on it.
    pub fn add_device(&mut self, device: Device) -> Result<(), LibraryError> {
        let invalid = |reason: String| LibraryError::Invalid {
            uuid: device.uuid,
            reason,
        };
        if self.devices.contains_key(&device.uuid) {
            return Err(invalid("duplicate device".to_string()));
        }
        let component = self
            .components
            .get(&device.component)
            .ok_or_else(|| invalid(format!("unknown component {}", device.component)))?;
        if component.schematic_only {
            return Err(invalid(format!(
                "component \"{}\" is schematic-only",
                component.name
            )));
        }
        if let Some(dup) = first_duplicate(device.pad_signal_map.iter().map(|m| m.pad)) {
            return Err(invalid(format!("pad {dup} mapped twice")));
        }
        for mapping in &device.pad_signal_map {
            if let Some(signal) = mapping.signal {
                if component.signal(&signal).is_none() {
                    return Err(invalid(format!(
                        "pad {} maps to unknown signal {signal}",
                        mapping.pad
                    )));
                }
            }
        }
        self.devices.insert(device.uuid, Arc::new(device));
        Ok(())
    }

    pub fn components(&self) -> impl Iterator<Item = &Arc<Component>> {
        self.components.values()
    }

    pub fn devices(&self) -> impl Iterator<Item = &Arc<Device>> {
        self.devices.values()
    }

    /// Devices implementing the given component.
    pub fn devices_of(&self, component: &Uuid) -> impl Iterator<Item = &Arc<Device>> + '_ {
        let component = *component;
        self.devices.values().filter(move |d| d.component == component)
    }
}

impl LibraryLookup for Library {
    fn component(&self, uuid: &Uuid) -> Result<Arc<Component>, LibraryError> {
        self.components
            .get(uuid)
            .cloned()
            .ok_or(LibraryError::NotFound {
                kind: "component",
                uuid: *uuid,
            })
    }

    fn device(&self, uuid: &Uuid) -> Result<Arc<Device>, LibraryError> {
        self.devices.get(uuid).cloned().ok_or(LibraryError::NotFound {
            kind: "device",
            uuid: *uuid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::test_support;
    use crate::library::PadSignalMapItem;

    #[test]
    fn test_lookup_and_not_found() {
        let library = test_support::library();
        let resistor = library.component(&test_support::RESISTOR).unwrap();
        assert_eq!(resistor.name, "Resistor");
        assert!(matches!(
            library.component(&Uuid::from_u128(0xdead)),
            Err(LibraryError::NotFound { kind: "component", .. })
        ));
        assert_eq!(library.devices_of(&test_support::RESISTOR).count(), 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let library = test_support::library();
        let json = library.to_json().unwrap();
        let back = Library::from_json(&json).unwrap();
        assert_eq!(back.components().count(), library.components().count());
        assert_eq!(
            back.component(&test_support::MCU).unwrap(),
            library.component(&test_support::MCU).unwrap()
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Library::from_json("{ nope"), Err(LibraryError::Parse(_))));
    }

    #[test]
    fn test_device_requires_component() {
        let mut library = Library::new();
        let device = Device {
            uuid: Uuid::from_u128(1),
            name: "orphan".to_string(),
            component: Uuid::from_u128(2),
            package: Uuid::from_u128(3),
            pad_signal_map: vec![],
        };
        assert!(matches!(library.add_device(device), Err(LibraryError::Invalid { .. })));
    }

    #[test]
    fn test_pin_mapped_twice_rejected() {
        let mut resistor = test_support::resistor();
        let first = resistor.symbol_variants[0].items[0].pin_signal_map[0].clone();
        resistor.symbol_variants[0].items[0].pin_signal_map.push(first);
        let mut library = Library::new();
        assert!(matches!(
            library.add_component(resistor),
            Err(LibraryError::Invalid { uuid, .. }) if uuid == test_support::RESISTOR
        ));
    }

    #[test]
    fn test_pad_mapped_twice_rejected() {
        let mut library = Library::new();
        library.add_component(test_support::resistor()).unwrap();
        let pad = PadSignalMapItem {
            pad: test_support::R_PAD1,
            signal: Some(test_support::R_SIG1),
        };
        let device = Device {
            uuid: test_support::R_DEVICE,
            name: "Resistor 0603".to_string(),
            component: test_support::RESISTOR,
            package: Uuid::from_u128(0x140),
            pad_signal_map: vec![pad.clone(), pad],
        };
        assert!(matches!(library.add_device(device), Err(LibraryError::Invalid { .. })));
    }

    #[test]
    fn test_duplicate_component_rejected() {
        let mut library = test_support::library();
        let copy = (*library.component(&test_support::RESISTOR).unwrap()).clone();
        assert!(library.add_component(copy).is_err());
    }
}
