//! Commands on the netlist itself: component instances, net classes, net
//! signals and signal bindings.

use super::Command;
use crate::attributes::{AttributeList, ProjectScope};
use crate::circuit::{CircuitError, ComponentInstance, NetClass, NetSignal};
use crate::project::Project;
use crate::types::Uuid;

/// Add a detached component instance to the circuit.
#[derive(Debug)]
pub struct CmdComponentInstanceAdd {
    uuid: Uuid,
    instance: Option<ComponentInstance>,
}

impl CmdComponentInstanceAdd {
    pub fn new(instance: ComponentInstance) -> Self {
        Self {
            uuid: instance.uuid(),
            instance: Some(instance),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn add(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        let instance = self
            .instance
            .as_ref()
            .unwrap_or_else(|| panic!("Component {} is not held by the command", self.uuid));
        project.circuit_mut().add_component_instance(instance.clone())?;
        self.instance = None;
        Ok(())
    }
}

impl Command for CmdComponentInstanceAdd {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        self.add(project)?;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        self.instance = Some(project.circuit_mut().remove_component_instance(&self.uuid)?);
        Ok(())
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        self.add(project)
    }
}

/// Remove an unused component instance from the circuit.
#[derive(Debug)]
pub struct CmdComponentInstanceRemove {
    uuid: Uuid,
    removed: Option<ComponentInstance>,
}

impl CmdComponentInstanceRemove {
    pub fn new(uuid: Uuid) -> Self {
        Self { uuid, removed: None }
    }
}

impl Command for CmdComponentInstanceRemove {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        self.perform_redo(project)?;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        let Some(instance) = self.removed.take() else {
            panic!("Component {} was not removed by the command", self.uuid);
        };
        project.circuit_mut().add_component_instance(instance)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        self.removed = Some(project.circuit_mut().remove_component_instance(&self.uuid)?);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComponentProperties {
    name: String,
    value: String,
    attributes: AttributeList,
}

/// Change name, value and/or attributes of a component instance. Fields
/// which are not set keep their current content.
#[derive(Debug)]
pub struct CmdComponentInstanceEdit {
    uuid: Uuid,
    name: Option<String>,
    value: Option<String>,
    attributes: Option<AttributeList>,
    old: Option<ComponentProperties>,
    new: Option<ComponentProperties>,
}

impl CmdComponentInstanceEdit {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            name: None,
            value: None,
            attributes: None,
            old: None,
            new: None,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = Some(value.to_string());
    }

    pub fn set_attributes(&mut self, attributes: AttributeList) {
        self.attributes = Some(attributes);
    }

    fn apply(project: &mut Project, uuid: &Uuid, props: &ComponentProperties) -> Result<(), CircuitError> {
        // The name is the only property which can be rejected, so it goes first.
        let circuit = project.circuit_mut();
        circuit.set_component_name(uuid, &props.name)?;
        circuit.set_component_value(uuid, &props.value)?;
        circuit.set_component_attributes(uuid, props.attributes.clone())
    }
}

impl Command for CmdComponentInstanceEdit {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        let instance = project
            .circuit()
            .component_instance(&self.uuid)
            .ok_or_else(|| CircuitError::ComponentNotFound(self.uuid.to_str()))?;
        let old = ComponentProperties {
            name: instance.name().to_string(),
            value: instance.value().to_string(),
            attributes: instance.attributes().clone(),
        };
        let new = ComponentProperties {
            name: self.name.clone().unwrap_or_else(|| old.name.clone()),
            value: self.value.clone().unwrap_or_else(|| old.value.clone()),
            attributes: self.attributes.clone().unwrap_or_else(|| old.attributes.clone()),
        };
        if new == old {
            return Ok(false);
        }
        Self::apply(project, &self.uuid, &new)?;
        self.old = Some(old);
        self.new = Some(new);
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        match &self.old {
            Some(old) => Self::apply(project, &self.uuid, old),
            None => Ok(()),
        }
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        match &self.new {
            Some(new) => Self::apply(project, &self.uuid, new),
            None => Ok(()),
        }
    }
}

/// Add a new, unused net signal. Without an explicit name the lowest free
/// auto name is picked on execution.
#[derive(Debug)]
pub struct CmdNetSignalAdd {
    uuid: Uuid,
    name: Option<String>,
    resolved: Option<(String, bool)>,
}

impl CmdNetSignalAdd {
    pub fn new(uuid: Uuid, name: Option<&str>) -> Self {
        Self {
            uuid,
            name: name.map(str::to_string),
            resolved: None,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Name the net got on execution.
    pub fn resolved_name(&self) -> Option<&str> {
        self.resolved.as_ref().map(|(name, _)| name.as_str())
    }

    fn add(&self, project: &mut Project, name: &str, auto: bool) -> Result<(), CircuitError> {
        project
            .circuit_mut()
            .add_net_signal(NetSignal::new(self.uuid, name, auto)?)
    }
}

impl Command for CmdNetSignalAdd {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        let (name, auto) = match &self.name {
            Some(name) => (name.clone(), false),
            None => (project.circuit().generate_auto_net_signal_name(), true),
        };
        self.add(project, &name, auto)?;
        self.resolved = Some((name, auto));
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.circuit_mut().remove_net_signal(&self.uuid).map(drop)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        let Some((name, auto)) = self.resolved.clone() else {
            panic!("Net signal {} was never added", self.uuid);
        };
        self.add(project, &name, auto)
    }
}

/// Remove a net signal no component signal is bound to.
#[derive(Debug)]
pub struct CmdNetSignalRemove {
    uuid: Uuid,
    removed: Option<NetSignal>,
}

impl CmdNetSignalRemove {
    pub fn new(uuid: Uuid) -> Self {
        Self { uuid, removed: None }
    }
}

impl Command for CmdNetSignalRemove {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        self.perform_redo(project)?;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        let Some(net) = self.removed.take() else {
            panic!("Net signal {} was not removed by the command", self.uuid);
        };
        project.circuit_mut().add_net_signal(net)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        self.removed = Some(project.circuit_mut().remove_net_signal(&self.uuid)?);
        Ok(())
    }
}

/// Rename a net signal.
#[derive(Debug)]
pub struct CmdNetSignalEdit {
    uuid: Uuid,
    name: String,
    has_auto_name: bool,
    old: Option<(String, bool)>,
}

impl CmdNetSignalEdit {
    pub fn new(uuid: Uuid, name: &str, has_auto_name: bool) -> Self {
        Self {
            uuid,
            name: name.to_string(),
            has_auto_name,
            old: None,
        }
    }
}

impl Command for CmdNetSignalEdit {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        let net = project
            .circuit()
            .net_signal(&self.uuid)
            .ok_or_else(|| CircuitError::NetSignalNotFound(self.uuid.to_str()))?;
        let old = (net.name().to_string(), net.has_auto_name());
        if old.0 == self.name && old.1 == self.has_auto_name {
            return Ok(false);
        }
        self.perform_redo(project)?;
        self.old = Some(old);
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        if let Some((name, auto)) = &self.old {
            project.circuit_mut().set_net_signal_name(&self.uuid, name, *auto)?;
        }
        Ok(())
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project
            .circuit_mut()
            .set_net_signal_name(&self.uuid, &self.name, self.has_auto_name)
    }
}

/// Add a new, unused net class.
#[derive(Debug)]
pub struct CmdNetClassAdd {
    uuid: Uuid,
    name: String,
}

impl CmdNetClassAdd {
    pub fn new(uuid: Uuid, name: &str) -> Self {
        Self {
            uuid,
            name: name.to_string(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl Command for CmdNetClassAdd {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        self.perform_redo(project)?;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.circuit_mut().remove_net_class(&self.uuid).map(drop)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project
            .circuit_mut()
            .add_net_class(NetClass::new(self.uuid, &self.name)?)
    }
}

/// Remove a net class no net signal is assigned to.
#[derive(Debug)]
pub struct CmdNetClassRemove {
    uuid: Uuid,
    removed: Option<NetClass>,
}

impl CmdNetClassRemove {
    pub fn new(uuid: Uuid) -> Self {
        Self { uuid, removed: None }
    }
}

impl Command for CmdNetClassRemove {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        self.perform_redo(project)?;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        let Some(net_class) = self.removed.take() else {
            panic!("Net class {} was not removed by the command", self.uuid);
        };
        project.circuit_mut().add_net_class(net_class)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        self.removed = Some(project.circuit_mut().remove_net_class(&self.uuid)?);
        Ok(())
    }
}

/// Rename a net class.
#[derive(Debug)]
pub struct CmdNetClassEdit {
    uuid: Uuid,
    name: String,
    old: Option<String>,
}

impl CmdNetClassEdit {
    pub fn new(uuid: Uuid, name: &str) -> Self {
        Self {
            uuid,
            name: name.to_string(),
            old: None,
        }
    }
}

impl Command for CmdNetClassEdit {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        let old = project
            .circuit()
            .net_class(&self.uuid)
            .ok_or_else(|| CircuitError::NetClassNotFound(self.uuid.to_str()))?
            .name()
            .to_string();
        if old == self.name {
            return Ok(false);
        }
        self.perform_redo(project)?;
        self.old = Some(old);
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        if let Some(name) = &self.old {
            project.circuit_mut().set_net_class_name(&self.uuid, name)?;
        }
        Ok(())
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.circuit_mut().set_net_class_name(&self.uuid, &self.name)
    }
}

/// Assign a net signal to a net class, or clear its class with `None`.
#[derive(Debug)]
pub struct CmdNetSignalSetNetClass {
    net: Uuid,
    net_class: Option<Uuid>,
    old: Option<Uuid>,
}

impl CmdNetSignalSetNetClass {
    pub fn new(net: Uuid, net_class: Option<Uuid>) -> Self {
        Self {
            net,
            net_class,
            old: None,
        }
    }
}

impl Command for CmdNetSignalSetNetClass {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        let old = project
            .circuit()
            .net_signal(&self.net)
            .ok_or_else(|| CircuitError::NetSignalNotFound(self.net.to_str()))?
            .net_class();
        if old == self.net_class {
            return Ok(false);
        }
        self.perform_redo(project)?;
        self.old = old;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.circuit_mut().set_net_signal_net_class(&self.net, self.old)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project
            .circuit_mut()
            .set_net_signal_net_class(&self.net, self.net_class)
    }
}

/// Bind a component signal to a net signal, or unbind it with `None`.
#[derive(Debug)]
pub struct CmdCompSigInstSetNetSignal {
    component: Uuid,
    signal: Uuid,
    net: Option<Uuid>,
    old: Option<Uuid>,
}

impl CmdCompSigInstSetNetSignal {
    pub fn new(component: Uuid, signal: Uuid, net: Option<Uuid>) -> Self {
        Self {
            component,
            signal,
            net,
            old: None,
        }
    }
}

impl Command for CmdCompSigInstSetNetSignal {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        let instance = project
            .circuit()
            .component_instance(&self.component)
            .ok_or_else(|| CircuitError::ComponentNotFound(self.component.to_str()))?;
        let old = instance
            .signal(&self.signal)
            .ok_or_else(|| CircuitError::SignalNotFound {
                component: instance.name().to_string(),
                signal: self.signal.to_str(),
            })?
            .net_signal();
        if old == self.net {
            return Ok(false);
        }
        self.perform_redo(project)?;
        self.old = old;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project
            .circuit_mut()
            .set_signal_net(&self.component, &self.signal, self.old)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project
            .circuit_mut()
            .set_signal_net(&self.component, &self.signal, self.net)
    }
}

/// Replace the project name and attributes.
#[derive(Debug)]
pub struct CmdProjectSetAttributes {
    new: ProjectScope,
    old: Option<ProjectScope>,
}

impl CmdProjectSetAttributes {
    pub fn new(name: &str, attributes: AttributeList) -> Self {
        Self {
            new: ProjectScope::new(name, attributes),
            old: None,
        }
    }
}

impl Command for CmdProjectSetAttributes {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        let old = project.circuit().project_scope().clone();
        if old == self.new {
            return Ok(false);
        }
        project.circuit_mut().set_project_attributes(self.new.clone());
        self.old = Some(old);
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        if let Some(old) = &self.old {
            project.circuit_mut().set_project_attributes(old.clone());
        }
        Ok(())
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.circuit_mut().set_project_attributes(self.new.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::test_support::*;
    use crate::project::test_support::project;
    use crate::undo::{UndoCommand, UndoStack};

    const NET_VCC: Uuid = Uuid::from_u128(0x7001);
    const CLASS_POWER: Uuid = Uuid::from_u128(0x7101);

    fn add_mcu(project: &mut Project, stack: &mut UndoStack) -> Uuid {
        let instance = project.create_component_instance(&MCU, None, None).unwrap();
        let uuid = instance.uuid();
        stack
            .exec_cmd(UndoCommand::new("Add component", CmdComponentInstanceAdd::new(instance)), project)
            .unwrap();
        uuid
    }

    #[test]
    fn test_add_component_undo_redo() {
        let mut project = project();
        let mut stack = UndoStack::new();
        let uuid = add_mcu(&mut project, &mut stack);
        assert!(project.circuit().component_instance(&uuid).is_some());

        stack.undo(&mut project).unwrap();
        assert!(project.circuit().component_instance(&uuid).is_none());
        stack.redo(&mut project).unwrap();
        assert!(project.circuit().component_instance(&uuid).unwrap().is_added_to_circuit());
    }

    #[test]
    fn test_duplicate_name_leaves_command_reusable() {
        let mut project = project();
        let mut stack = UndoStack::new();
        add_mcu(&mut project, &mut stack);
        let clash = project.create_component_instance(&MCU, None, Some("U1")).unwrap();
        let mut cmd = UndoCommand::new("Add component", CmdComponentInstanceAdd::new(clash));
        assert!(matches!(
            cmd.execute(&mut project),
            Err(CircuitError::DuplicateComponentName(_))
        ));
        assert_eq!(project.circuit().component_instances().count(), 1);
    }

    #[test]
    fn test_edit_component_without_change_is_empty() {
        let mut project = project();
        let mut stack = UndoStack::new();
        let uuid = add_mcu(&mut project, &mut stack);
        let mut edit = CmdComponentInstanceEdit::new(uuid);
        edit.set_name("U1");
        assert!(!stack.exec_cmd(UndoCommand::new("Edit", edit), &mut project).unwrap());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_edit_component_rejects_bad_name() {
        let mut project = project();
        let mut stack = UndoStack::new();
        let uuid = add_mcu(&mut project, &mut stack);
        let mut edit = CmdComponentInstanceEdit::new(uuid);
        edit.set_name("U 1");
        edit.set_value("changed");
        assert!(stack.exec_cmd(UndoCommand::new("Edit", edit), &mut project).is_err());
        let instance = project.circuit().component_instance(&uuid).unwrap();
        assert_eq!(instance.name(), "U1");
        assert_ne!(instance.value(), "changed");
    }

    #[test]
    fn test_net_signal_auto_name_is_stable_on_redo() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack
            .exec_cmd(UndoCommand::new("Add net", CmdNetSignalAdd::new(NET_VCC, None)), &mut project)
            .unwrap();
        assert_eq!(project.circuit().net_signal(&NET_VCC).unwrap().name(), "N#1");
        stack.undo(&mut project).unwrap();
        stack.redo(&mut project).unwrap();
        let net = project.circuit().net_signal(&NET_VCC).unwrap();
        assert_eq!(net.name(), "N#1");
        assert!(net.has_auto_name());
    }

    #[test]
    fn test_set_signal_net_roundtrip() {
        let mut project = project();
        let mut stack = UndoStack::new();
        let uuid = add_mcu(&mut project, &mut stack);
        stack
            .exec_cmd(UndoCommand::new("Add net", CmdNetSignalAdd::new(NET_VCC, Some("VCC"))), &mut project)
            .unwrap();
        let before = project.to_text();
        stack
            .exec_cmd(
                UndoCommand::new("Connect", CmdCompSigInstSetNetSignal::new(uuid, MCU_VCC, Some(NET_VCC))),
                &mut project,
            )
            .unwrap();
        let after = project.to_text();
        assert!(project.circuit().net_signal(&NET_VCC).unwrap().is_used());

        stack.undo(&mut project).unwrap();
        assert_eq!(project.to_text(), before);
        stack.redo(&mut project).unwrap();
        assert_eq!(project.to_text(), after);
    }

    #[test]
    fn test_remove_used_net_fails() {
        let mut project = project();
        let mut stack = UndoStack::new();
        let uuid = add_mcu(&mut project, &mut stack);
        stack
            .exec_cmd(UndoCommand::new("Add net", CmdNetSignalAdd::new(NET_VCC, Some("VCC"))), &mut project)
            .unwrap();
        stack
            .exec_cmd(
                UndoCommand::new("Connect", CmdCompSigInstSetNetSignal::new(uuid, MCU_VCC, Some(NET_VCC))),
                &mut project,
            )
            .unwrap();
        let result = stack.exec_cmd(UndoCommand::new("Remove net", CmdNetSignalRemove::new(NET_VCC)), &mut project);
        assert!(matches!(result, Err(CircuitError::NetSignalInUse(_))));
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn test_net_class_assignment_undo_redo() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack
            .exec_cmd(UndoCommand::new("Add net", CmdNetSignalAdd::new(NET_VCC, Some("VCC"))), &mut project)
            .unwrap();
        stack
            .exec_cmd(UndoCommand::new("Add class", CmdNetClassAdd::new(CLASS_POWER, "Power")), &mut project)
            .unwrap();
        let before = project.to_text();
        stack
            .exec_cmd(
                UndoCommand::new("Set class", CmdNetSignalSetNetClass::new(NET_VCC, Some(CLASS_POWER))),
                &mut project,
            )
            .unwrap();
        assert!(project.circuit().net_class(&CLASS_POWER).unwrap().is_used());
        let result = stack.exec_cmd(UndoCommand::new("Remove class", CmdNetClassRemove::new(CLASS_POWER)), &mut project);
        assert!(matches!(result, Err(CircuitError::NetClassInUse(_))));

        stack.undo(&mut project).unwrap();
        assert_eq!(project.to_text(), before);
        assert!(!project.circuit().net_class(&CLASS_POWER).unwrap().is_used());
        stack.redo(&mut project).unwrap();
        assert_eq!(project.circuit().net_signal(&NET_VCC).unwrap().net_class(), Some(CLASS_POWER));
    }

    #[test]
    fn test_net_class_rename_and_remove() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack
            .exec_cmd(UndoCommand::new("Add class", CmdNetClassAdd::new(CLASS_POWER, "Power")), &mut project)
            .unwrap();
        assert!(!stack
            .exec_cmd(UndoCommand::new("Rename", CmdNetClassEdit::new(CLASS_POWER, "Power")), &mut project)
            .unwrap());
        stack
            .exec_cmd(UndoCommand::new("Rename", CmdNetClassEdit::new(CLASS_POWER, "Supply")), &mut project)
            .unwrap();
        stack
            .exec_cmd(UndoCommand::new("Remove class", CmdNetClassRemove::new(CLASS_POWER)), &mut project)
            .unwrap();
        assert!(project.circuit().net_class(&CLASS_POWER).is_none());

        stack.undo(&mut project).unwrap();
        assert_eq!(project.circuit().net_class(&CLASS_POWER).unwrap().name(), "Supply");
        stack.undo(&mut project).unwrap();
        assert_eq!(project.circuit().net_class(&CLASS_POWER).unwrap().name(), "Power");
        stack.undo(&mut project).unwrap();
        assert!(project.circuit().net_classes().next().is_none());
    }
}
