pub mod attribute;
pub mod substitution;

pub use attribute::{deserialize_attributes, Attribute, AttributeList, AttributeType};
pub use substitution::{substitute, AttributeProvider, ComponentScope, ProjectScope};
