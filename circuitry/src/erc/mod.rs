//! Electrical rule check messages.

pub mod list;
pub mod message;

pub use list::{ErcChange, ErcEntry, ErcMsgList};
pub use message::{ErcCategory, ErcMsg, ErcMsgKey, ErcMsgType, ErcOwner};
