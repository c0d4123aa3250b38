use super::schematic::{deserialize_position, deserialize_rotation, serialize_position};
use crate::serialization::{ListElement, ObjectList, SExp, SExpError};
use crate::types::{Angle, Point, Uuid};

/// A component instance placed on a board through one of its library
/// devices. A board holds at most one device per component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInstance {
    pub component: Uuid,
    pub lib_device: Uuid,
    pub position: Point,
    pub rotation: Angle,
    pub mirrored: bool,
}

impl DeviceInstance {
    pub fn new(component: Uuid, lib_device: Uuid, position: Point, rotation: Angle) -> Self {
        Self {
            component,
            lib_device,
            position,
            rotation,
            mirrored: false,
        }
    }

    pub fn deserialize(node: &SExp) -> Result<Self, SExpError> {
        node.expect_name(Self::TAG)?;
        Ok(Self {
            component: node.parse_value(0)?,
            lib_device: node.parse_child_value("lib_device")?,
            position: deserialize_position(node)?,
            rotation: deserialize_rotation(node)?,
            mirrored: node.parse_child_value("mirror")?,
        })
    }
}

impl ListElement for DeviceInstance {
    type Key = Uuid;
    const TAG: &'static str = "device";

    fn key(&self) -> Uuid {
        self.component
    }

    fn serialize(&self) -> SExp {
        SExp::list(Self::TAG)
            .with_token(self.component)
            .with_child(SExp::list("lib_device").with_token(self.lib_device))
            .with_child(serialize_position(&self.position))
            .with_child(SExp::list("rotation").with_token(self.rotation.to_deg_string()))
            .with_child(SExp::list("mirror").with_token(self.mirrored))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub uuid: Uuid,
    pub name: String,
    pub devices: ObjectList<DeviceInstance>,
}

impl Board {
    pub fn new(uuid: Uuid, name: &str) -> Self {
        Self {
            uuid,
            name: name.to_string(),
            devices: ObjectList::new(),
        }
    }

    pub fn serialize(&self) -> SExp {
        let mut node = SExp::list("board")
            .with_token(self.uuid)
            .with_child(SExp::list("name").with_string(self.name.as_str()));
        self.devices.serialize_into(&mut node);
        node
    }

    pub fn deserialize(node: &SExp) -> Result<Self, SExpError> {
        node.expect_name("board")?;
        let mut board = Board::new(node.parse_value(0)?, node.child_value("name")?);
        for device_node in node.children(DeviceInstance::TAG) {
            board
                .devices
                .append(DeviceInstance::deserialize(device_node)?)
                .map_err(|e| SExpError::InvalidValue {
                    node: "board".to_string(),
                    value: DeviceInstance::TAG.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(board)
    }
}
