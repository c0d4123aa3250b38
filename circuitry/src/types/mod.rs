//! Leaf value types: identifiers and physical quantities.

pub mod units;
pub mod uuid;

pub use units::{Angle, Length, ParseUnitError, Point};
pub use uuid::{ParseUuidError, Uuid};
