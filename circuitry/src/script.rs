//! Scripted edit sessions.
//!
//! An edit script is a JSON document listing edit steps. Components, nets,
//! schematics and boards are referenced by name so scripts stay readable:
//!
//! ```json
//! { "steps": [
//!   { "op": "add_net", "name": "VCC" },
//!   { "op": "add_net_class", "name": "Power" },
//!   { "op": "set_net_class", "net": "VCC", "net_class": "Power" },
//!   { "op": "add_component", "library_component": "…", "name": "R1" },
//!   { "op": "connect", "component": "R1", "signal": "1", "net": "VCC" },
//!   { "op": "undo" }
//! ] }
//! ```
//!
//! Every edit runs as an undoable command on an [`UndoStack`], so `undo`,
//! `redo` and command groups behave exactly like in an interactive session.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;
use crate::circuit::CircuitError;
use crate::cmd::{
    add_device_to_board, add_symbol_to_schematic, remove_device_from_board,
    remove_symbol_from_schematic, CmdCompSigInstSetNetSignal, CmdComponentInstanceAdd,
    CmdComponentInstanceEdit, CmdComponentInstanceRemove, CmdListElementInsert,
    CmdListElementRemove, CmdNetClassAdd, CmdNetClassEdit, CmdNetClassRemove, CmdNetSignalAdd,
    CmdNetSignalEdit, CmdNetSignalRemove, CmdNetSignalSetNetClass, ComponentAttributes,
};
use crate::core::CircuitryError;
use crate::project::{DeviceInstance, Project, SymbolInstance};
use crate::types::{Angle, Point, Uuid};
use crate::undo::{UndoCommand, UndoStack};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditScript {
    pub steps: Vec<EditStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditStep {
    AddComponent {
        library_component: Uuid,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        symbol_variant: Option<Uuid>,
    },
    RemoveComponent {
        component: String,
    },
    SetComponentName {
        component: String,
        name: String,
    },
    SetComponentValue {
        component: String,
        value: String,
    },
    AddAttribute {
        component: String,
        attribute: Attribute,
        #[serde(default)]
        index: Option<usize>,
    },
    RemoveAttribute {
        component: String,
        key: String,
    },
    AddNet {
        #[serde(default)]
        name: Option<String>,
    },
    RemoveNet {
        net: String,
    },
    RenameNet {
        net: String,
        name: String,
    },
    AddNetClass {
        name: String,
    },
    RemoveNetClass {
        net_class: String,
    },
    RenameNetClass {
        net_class: String,
        name: String,
    },
    /// Assign a net to a net class, or clear its class when `net_class` is
    /// missing.
    SetNetClass {
        net: String,
        #[serde(default)]
        net_class: Option<String>,
    },
    /// Bind a component signal (by library signal name) to a net, or
    /// unbind it when `net` is missing.
    Connect {
        component: String,
        signal: String,
        #[serde(default)]
        net: Option<String>,
    },
    PlaceSymbol {
        schematic: String,
        component: String,
        item: Uuid,
        #[serde(default)]
        x_mm: f64,
        #[serde(default)]
        y_mm: f64,
        #[serde(default)]
        rotation_deg: f64,
    },
    RemoveSymbol {
        schematic: String,
        component: String,
        item: Uuid,
    },
    PlaceDevice {
        board: String,
        component: String,
        device: Uuid,
        #[serde(default)]
        x_mm: f64,
        #[serde(default)]
        y_mm: f64,
        #[serde(default)]
        rotation_deg: f64,
    },
    RemoveDevice {
        board: String,
        component: String,
    },
    BeginGroup {
        text: String,
    },
    CommitGroup,
    AbortGroup,
    Undo,
    Redo,
}

impl EditStep {
    /// Short description used as undo text and in logs.
    pub fn describe(&self) -> String {
        match self {
            EditStep::AddComponent { name, .. } => {
                format!("Add component {}", name.as_deref().unwrap_or("(auto)"))
            }
            EditStep::RemoveComponent { component } => format!("Remove component {component}"),
            EditStep::SetComponentName { component, name } => format!("Rename {component} to {name}"),
            EditStep::SetComponentValue { component, .. } => format!("Set value of {component}"),
            EditStep::AddAttribute { component, attribute, .. } => {
                format!("Add attribute {} to {component}", attribute.key)
            }
            EditStep::RemoveAttribute { component, key } => format!("Remove attribute {key} from {component}"),
            EditStep::AddNet { name } => format!("Add net {}", name.as_deref().unwrap_or("(auto)")),
            EditStep::RemoveNet { net } => format!("Remove net {net}"),
            EditStep::RenameNet { net, name } => format!("Rename net {net} to {name}"),
            EditStep::AddNetClass { name } => format!("Add net class {name}"),
            EditStep::RemoveNetClass { net_class } => format!("Remove net class {net_class}"),
            EditStep::RenameNetClass { net_class, name } => format!("Rename net class {net_class} to {name}"),
            EditStep::SetNetClass { net, net_class } => match net_class {
                Some(net_class) => format!("Set net class of {net} to {net_class}"),
                None => format!("Clear net class of {net}"),
            },
            EditStep::Connect { component, signal, net } => match net {
                Some(net) => format!("Connect {component}:{signal} to {net}"),
                None => format!("Disconnect {component}:{signal}"),
            },
            EditStep::PlaceSymbol { component, .. } => format!("Place symbol of {component}"),
            EditStep::RemoveSymbol { component, .. } => format!("Remove symbol of {component}"),
            EditStep::PlaceDevice { component, .. } => format!("Place device of {component}"),
            EditStep::RemoveDevice { component, .. } => format!("Remove device of {component}"),
            EditStep::BeginGroup { text } => format!("Begin group {text}"),
            EditStep::CommitGroup => "Commit group".to_string(),
            EditStep::AbortGroup => "Abort group".to_string(),
            EditStep::Undo => "Undo".to_string(),
            EditStep::Redo => "Redo".to_string(),
        }
    }
}

impl EditScript {
    pub fn from_json(text: &str) -> Result<Self, CircuitryError> {
        serde_json::from_str(text).map_err(|e| CircuitryError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, CircuitryError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Outcome of a replayed script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub steps: usize,
    /// Steps which changed the project (undo and redo included).
    pub modified: usize,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub events: usize,
}

/// Executes edit steps against a project through an undo stack.
pub struct ScriptRunner<'a> {
    project: &'a mut Project,
    stack: UndoStack,
    summary: ReplaySummary,
}

impl<'a> ScriptRunner<'a> {
    pub fn new(project: &'a mut Project) -> Self {
        Self {
            project,
            stack: UndoStack::new(),
            summary: ReplaySummary::default(),
        }
    }

    pub fn stack(&self) -> &UndoStack {
        &self.stack
    }

    pub fn project(&self) -> &Project {
        self.project
    }

    /// Run all steps, stopping at the first failing one. An open command
    /// group is aborted on failure.
    pub fn run(mut self, script: &EditScript) -> Result<ReplaySummary, CircuitryError> {
        for (index, step) in script.steps.iter().enumerate() {
            if let Err(source) = self.run_step(step) {
                tracing::warn!(step = index + 1, error = %source, "Script step failed");
                if self.stack.is_command_group_active() {
                    self.stack.abort_cmd_group(self.project)?;
                }
                return Err(CircuitryError::Step {
                    step: index + 1,
                    description: step.describe(),
                    source,
                });
            }
        }
        if self.stack.is_command_group_active() {
            self.stack.commit_cmd_group()?;
        }
        self.summary.undo_depth = self.stack.current_index();
        self.summary.redo_depth = self.stack.len() - self.stack.current_index();
        Ok(self.summary)
    }

    pub fn run_step(&mut self, step: &EditStep) -> Result<(), CircuitError> {
        tracing::debug!(step = %step.describe(), "Run script step");
        self.summary.steps += 1;
        let modified = match step {
            EditStep::BeginGroup { text } => {
                self.stack.begin_cmd_group(text.as_str(), self.project)?;
                false
            }
            EditStep::CommitGroup => self.stack.commit_cmd_group()?,
            EditStep::AbortGroup => {
                self.stack.abort_cmd_group(self.project)?;
                false
            }
            EditStep::Undo => {
                let possible = self.stack.can_undo();
                self.stack.undo(self.project)?;
                possible
            }
            EditStep::Redo => {
                let possible = self.stack.can_redo();
                self.stack.redo(self.project)?;
                possible
            }
            _ => {
                let cmd = self.build_command(step)?;
                if self.stack.is_command_group_active() {
                    self.stack.append_to_cmd_group(cmd, self.project)?
                } else {
                    self.stack.exec_cmd(cmd, self.project)?
                }
            }
        };
        if modified {
            self.summary.modified += 1;
        }
        self.summary.events += self.project.circuit_mut().drain_events().len();
        Ok(())
    }

    fn component(&self, name: &str) -> Result<Uuid, CircuitError> {
        self.project
            .circuit()
            .component_instance_by_name(name)
            .map(|c| c.uuid())
            .ok_or_else(|| CircuitError::ComponentNotFound(name.to_string()))
    }

    fn net(&self, name: &str) -> Result<Uuid, CircuitError> {
        self.project
            .circuit()
            .net_signal_by_name(name)
            .map(|n| n.uuid())
            .ok_or_else(|| CircuitError::NetSignalNotFound(name.to_string()))
    }

    fn net_class(&self, name: &str) -> Result<Uuid, CircuitError> {
        self.project
            .circuit()
            .net_class_by_name(name)
            .map(|c| c.uuid())
            .ok_or_else(|| CircuitError::NetClassNotFound(name.to_string()))
    }

    fn schematic(&self, name: &str) -> Result<Uuid, CircuitError> {
        self.project
            .schematic_by_name(name)
            .map(|s| s.uuid)
            .ok_or_else(|| CircuitError::SchematicNotFound(name.to_string()))
    }

    fn board(&self, name: &str) -> Result<Uuid, CircuitError> {
        self.project
            .board_by_name(name)
            .map(|b| b.uuid)
            .ok_or_else(|| CircuitError::BoardNotFound(name.to_string()))
    }

    fn build_command(&self, step: &EditStep) -> Result<UndoCommand, CircuitError> {
        let text = step.describe();
        let cmd = match step {
            EditStep::AddComponent {
                library_component,
                name,
                symbol_variant,
            } => {
                let instance =
                    self.project
                        .create_component_instance(library_component, *symbol_variant, name.as_deref())?;
                UndoCommand::new(text, CmdComponentInstanceAdd::new(instance))
            }
            EditStep::RemoveComponent { component } => {
                UndoCommand::new(text, CmdComponentInstanceRemove::new(self.component(component)?))
            }
            EditStep::SetComponentName { component, name } => {
                let mut edit = CmdComponentInstanceEdit::new(self.component(component)?);
                edit.set_name(name);
                UndoCommand::new(text, edit)
            }
            EditStep::SetComponentValue { component, value } => {
                let mut edit = CmdComponentInstanceEdit::new(self.component(component)?);
                edit.set_value(value);
                UndoCommand::new(text, edit)
            }
            EditStep::AddAttribute {
                component,
                attribute,
                index,
            } => UndoCommand::new(
                text,
                CmdListElementInsert::<ComponentAttributes>::new(
                    self.component(component)?,
                    attribute.clone(),
                    *index,
                ),
            ),
            EditStep::RemoveAttribute { component, key } => UndoCommand::new(
                text,
                CmdListElementRemove::<ComponentAttributes>::new(self.component(component)?, key.clone()),
            ),
            EditStep::AddNet { name } => {
                UndoCommand::new(text, CmdNetSignalAdd::new(Uuid::new_random(), name.as_deref()))
            }
            EditStep::RemoveNet { net } => UndoCommand::new(text, CmdNetSignalRemove::new(self.net(net)?)),
            EditStep::RenameNet { net, name } => {
                UndoCommand::new(text, CmdNetSignalEdit::new(self.net(net)?, name, false))
            }
            EditStep::AddNetClass { name } => {
                UndoCommand::new(text, CmdNetClassAdd::new(Uuid::new_random(), name))
            }
            EditStep::RemoveNetClass { net_class } => {
                UndoCommand::new(text, CmdNetClassRemove::new(self.net_class(net_class)?))
            }
            EditStep::RenameNetClass { net_class, name } => {
                UndoCommand::new(text, CmdNetClassEdit::new(self.net_class(net_class)?, name))
            }
            EditStep::SetNetClass { net, net_class } => {
                let net_class = net_class.as_deref().map(|name| self.net_class(name)).transpose()?;
                UndoCommand::new(text, CmdNetSignalSetNetClass::new(self.net(net)?, net_class))
            }
            EditStep::Connect { component, signal, net } => {
                let uuid = self.component(component)?;
                let signal_uuid = self
                    .project
                    .circuit()
                    .component_instance(&uuid)
                    .and_then(|c| c.signal_by_name(signal))
                    .map(|s| s.uuid())
                    .ok_or_else(|| CircuitError::SignalNotFound {
                        component: component.clone(),
                        signal: signal.clone(),
                    })?;
                let net = net.as_deref().map(|net| self.net(net)).transpose()?;
                UndoCommand::new(text, CmdCompSigInstSetNetSignal::new(uuid, signal_uuid, net))
            }
            EditStep::PlaceSymbol {
                schematic,
                component,
                item,
                x_mm,
                y_mm,
                rotation_deg,
            } => {
                let symbol = SymbolInstance::new(
                    Uuid::new_random(),
                    self.component(component)?,
                    *item,
                    Point::from_mm(*x_mm, *y_mm),
                    Angle::from_deg(*rotation_deg),
                );
                let mut cmd = add_symbol_to_schematic(self.schematic(schematic)?, symbol);
                cmd.set_text(text);
                cmd
            }
            EditStep::RemoveSymbol {
                schematic,
                component,
                item,
            } => {
                let uuid = self.component(component)?;
                let symbol = self
                    .project
                    .circuit()
                    .component_instance(&uuid)
                    .and_then(|c| c.symbol_of_item(item))
                    .map(|placed| placed.symbol)
                    .ok_or(CircuitError::SymbolNotFound(*item))?;
                let mut cmd = remove_symbol_from_schematic(self.schematic(schematic)?, symbol);
                cmd.set_text(text);
                cmd
            }
            EditStep::PlaceDevice {
                board,
                component,
                device,
                x_mm,
                y_mm,
                rotation_deg,
            } => {
                let device = DeviceInstance::new(
                    self.component(component)?,
                    *device,
                    Point::from_mm(*x_mm, *y_mm),
                    Angle::from_deg(*rotation_deg),
                );
                let mut cmd = add_device_to_board(self.board(board)?, device);
                cmd.set_text(text);
                cmd
            }
            EditStep::RemoveDevice { board, component } => {
                let mut cmd = remove_device_from_board(self.board(board)?, self.component(component)?);
                cmd.set_text(text);
                cmd
            }
            EditStep::BeginGroup { .. }
            | EditStep::CommitGroup
            | EditStep::AbortGroup
            | EditStep::Undo
            | EditStep::Redo => unreachable!("stack operations are not commands"),
        };
        Ok(cmd)
    }
}
