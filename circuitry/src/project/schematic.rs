use crate::serialization::{ListElement, ObjectList, SExp, SExpError};
use crate::types::{Angle, Length, Point, Uuid};

/// A placed symbol, the schematic representation of one symbol variant item
/// of a component instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInstance {
    pub uuid: Uuid,
    pub component: Uuid,
    pub item: Uuid,
    pub position: Point,
    pub rotation: Angle,
}

impl SymbolInstance {
    pub fn new(uuid: Uuid, component: Uuid, item: Uuid, position: Point, rotation: Angle) -> Self {
        Self {
            uuid,
            component,
            item,
            position,
            rotation,
        }
    }

    pub fn deserialize(node: &SExp) -> Result<Self, SExpError> {
        node.expect_name(Self::TAG)?;
        Ok(Self {
            uuid: node.parse_value(0)?,
            component: node.parse_child_value("component")?,
            item: node.parse_child_value("lib_gate")?,
            position: deserialize_position(node)?,
            rotation: deserialize_rotation(node)?,
        })
    }
}

impl ListElement for SymbolInstance {
    type Key = Uuid;
    const TAG: &'static str = "symbol";

    fn key(&self) -> Uuid {
        self.uuid
    }

    fn serialize(&self) -> SExp {
        SExp::list(Self::TAG)
            .with_token(self.uuid)
            .with_child(SExp::list("component").with_token(self.component))
            .with_child(SExp::list("lib_gate").with_token(self.item))
            .with_child(serialize_position(&self.position))
            .with_child(SExp::list("rotation").with_token(self.rotation.to_deg_string()))
    }
}

pub(crate) fn serialize_position(position: &Point) -> SExp {
    SExp::list("position")
        .with_token(position.x.to_mm_string())
        .with_token(position.y.to_mm_string())
}

pub(crate) fn deserialize_position(node: &SExp) -> Result<Point, SExpError> {
    let position = node.require_child("position")?;
    let parse = |index: usize| -> Result<Length, SExpError> {
        let raw = position.value(index)?;
        Length::parse_mm(raw).map_err(|e| SExpError::InvalidValue {
            node: "position".to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
    };
    Ok(Point::new(parse(0)?, parse(1)?))
}

pub(crate) fn deserialize_rotation(node: &SExp) -> Result<Angle, SExpError> {
    let raw = node.child_value("rotation")?;
    Angle::parse_deg(raw).map_err(|e| SExpError::InvalidValue {
        node: "rotation".to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schematic {
    pub uuid: Uuid,
    pub name: String,
    pub symbols: ObjectList<SymbolInstance>,
}

impl Schematic {
    pub fn new(uuid: Uuid, name: &str) -> Self {
        Self {
            uuid,
            name: name.to_string(),
            symbols: ObjectList::new(),
        }
    }

    pub fn serialize(&self) -> SExp {
        let mut node = SExp::list("schematic")
            .with_token(self.uuid)
            .with_child(SExp::list("name").with_string(self.name.as_str()));
        self.symbols.serialize_into(&mut node);
        node
    }

    pub fn deserialize(node: &SExp) -> Result<Self, SExpError> {
        node.expect_name("schematic")?;
        let mut schematic = Schematic::new(node.parse_value(0)?, node.child_value("name")?);
        for symbol_node in node.children(SymbolInstance::TAG) {
            let symbol = SymbolInstance::deserialize(symbol_node)?;
            schematic.symbols.append(symbol).map_err(|e| SExpError::InvalidValue {
                node: "schematic".to_string(),
                value: SymbolInstance::TAG.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(schematic)
    }
}
