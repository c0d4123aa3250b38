use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::serialization::{ListElement, ObjectList, SExp, SExpError};

/// Kind of quantity an attribute value describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    #[default]
    String,
    Resistance,
    Capacitance,
    Inductance,
    Voltage,
    Current,
    Power,
    Frequency,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Resistance => "resistance",
            AttributeType::Capacitance => "capacitance",
            AttributeType::Inductance => "inductance",
            AttributeType::Voltage => "voltage",
            AttributeType::Current => "current",
            AttributeType::Power => "power",
            AttributeType::Frequency => "frequency",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(AttributeType::String),
            "resistance" => Ok(AttributeType::Resistance),
            "capacitance" => Ok(AttributeType::Capacitance),
            "inductance" => Ok(AttributeType::Inductance),
            "voltage" => Ok(AttributeType::Voltage),
            "current" => Ok(AttributeType::Current),
            "power" => Ok(AttributeType::Power),
            "frequency" => Ok(AttributeType::Frequency),
            other => Err(format!("unknown attribute type \"{other}\"")),
        }
    }
}

/// Symbol appended to a value when it is shown to the user.
fn unit_symbol(unit: &str) -> &str {
    match unit {
        "ohm" => "Ω",
        "kiloohm" => "kΩ",
        "megaohm" => "MΩ",
        "farad" => "F",
        "microfarad" => "µF",
        "nanofarad" => "nF",
        "picofarad" => "pF",
        "henry" => "H",
        "microhenry" => "µH",
        "volt" => "V",
        "millivolt" => "mV",
        "ampere" => "A",
        "milliampere" => "mA",
        "watt" => "W",
        "milliwatt" => "mW",
        "hertz" => "Hz",
        "kilohertz" => "kHz",
        "megahertz" => "MHz",
        other => other,
    }
}

/// A key/value pair attached to a component or project.
///
/// Keys consist of uppercase letters, digits and underscores so they can be
/// referenced from `{{KEY}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    #[serde(rename = "type", default)]
    pub attr_type: AttributeType,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Attribute {
    pub fn new(key: &str, attr_type: AttributeType, value: &str, unit: Option<&str>) -> Result<Self, String> {
        if !Self::is_valid_key(key) {
            return Err(format!("invalid attribute key \"{key}\""));
        }
        Ok(Self {
            key: key.to_string(),
            attr_type,
            value: value.to_string(),
            unit: unit.map(str::to_string),
        })
    }

    /// Plain text attribute without unit.
    pub fn text(key: &str, value: &str) -> Result<Self, String> {
        Self::new(key, AttributeType::String, value, None)
    }

    pub fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && key.len() <= 40
            && key
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    }

    /// Value with its unit symbol, e.g. `10kΩ`.
    pub fn value_with_unit(&self) -> String {
        match &self.unit {
            Some(unit) if !self.value.is_empty() => format!("{}{}", self.value, unit_symbol(unit)),
            _ => self.value.clone(),
        }
    }

    /// `(attribute "KEY" (type resistance) (unit ohm) (value "10k"))`
    pub fn serialize(&self) -> SExp {
        SExp::list("attribute")
            .with_string(self.key.as_str())
            .with_child(SExp::list("type").with_token(self.attr_type))
            .with_child(SExp::list("unit").with_token(self.unit.as_deref().unwrap_or("none")))
            .with_child(SExp::list("value").with_string(self.value.as_str()))
    }

    pub fn deserialize(node: &SExp) -> Result<Self, SExpError> {
        node.expect_name("attribute")?;
        let key = node.value(0)?;
        let attr_type: AttributeType = node.parse_child_value("type")?;
        let unit = match node.child_value("unit")? {
            "none" => None,
            unit => Some(unit),
        };
        let value = node.child_value("value")?;
        Attribute::new(key, attr_type, value, unit).map_err(|reason| SExpError::InvalidValue {
            node: "attribute".to_string(),
            value: key.to_string(),
            reason,
        })
    }
}

impl ListElement for Attribute {
    type Key = String;
    const TAG: &'static str = "attribute";

    fn key(&self) -> String {
        self.key.clone()
    }

    fn serialize(&self) -> SExp {
        Attribute::serialize(self)
    }
}

pub type AttributeList = ObjectList<Attribute>;

/// Read all `(attribute ...)` children of `node`.
pub fn deserialize_attributes(node: &SExp) -> Result<AttributeList, SExpError> {
    let attributes = node
        .children("attribute")
        .map(Attribute::deserialize)
        .collect::<Result<Vec<_>, _>>()?;
    ObjectList::from_elements(attributes).map_err(|e| SExpError::InvalidValue {
        node: node.name().to_string(),
        value: "attribute".to_string(),
        reason: e.to_string(),
    })
}
