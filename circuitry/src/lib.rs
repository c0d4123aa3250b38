//! Circuitry - transactional netlist model with undo/redo and incremental ERC
//!
//! This library holds the in-memory circuit of a schematic/PCB project
//! (component instances, their signals and net signals), keeps it
//! consistent under reversible commands and recomputes the electrical rule
//! check messages after every change.
//!
//! # Quick Start
//!
//! ```no_run
//! use circuitry::{CheckOptions, CircuitryCore};
//! use std::path::Path;
//!
//! let report = CircuitryCore::check_files(
//!     Path::new("demo.cirp"),
//!     Path::new("library.json"),
//!     &CheckOptions::default(),
//! ).unwrap();
//!
//! for finding in &report.findings {
//!     println!("{:?}: {}", finding.severity, finding.message);
//! }
//! ```
//!
//! # Features
//!
//! - **Netlist model**: component instances, signal instances, net signals
//! - **Undo/redo**: reversible commands, command groups, all-or-nothing execution
//! - **ERC**: unplaced symbols, unconnected signals, forced net name conflicts
//! - **Edit scripts**: replay JSON edit sessions through the undo stack

pub mod attributes;
pub mod circuit;
pub mod cmd;
pub mod core;
pub mod erc;
pub mod library;
pub mod project;
pub mod script;
pub mod serialization;
pub mod types;
pub mod undo;

// Re-export main types
pub use crate::core::{
    CheckOptions, CircuitryCore, CircuitryError, ErcFinding, ErcReport, ErcStats,
};
pub use circuit::{Circuit, CircuitError, CircuitEvent, ComponentInstance, NetClass, NetSignal};
pub use erc::{ErcCategory, ErcMsgType};
pub use library::{Library, LibraryError, LibraryLookup};
pub use project::Project;
pub use script::{EditScript, EditStep, ReplaySummary, ScriptRunner};
pub use types::Uuid;
pub use undo::{UndoCommand, UndoStack};

/// Load a project and its library (convenience wrapper).
pub fn load_project(
    path: &std::path::Path,
    library: &std::path::Path,
) -> Result<Project, CircuitryError> {
    CircuitryCore::load_project(path, library)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cmd::*;
    pub use crate::{
        CheckOptions, Circuit, CircuitError, CircuitryCore, CircuitryError, EditScript,
        ErcCategory, ErcReport, Project, UndoCommand, UndoStack, Uuid,
    };
}
