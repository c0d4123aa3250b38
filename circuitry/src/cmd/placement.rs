//! Registration of placed symbols and devices with their component
//! instances, and the composite add/remove placement commands.

use super::list::{BoardDevices, CmdListElementInsert, CmdListElementRemove, SchematicSymbols};
use super::Command;
use crate::circuit::CircuitError;
use crate::project::{DeviceInstance, Project, SymbolInstance};
use crate::types::Uuid;
use crate::undo::{CommandGroup, UndoCommand};

/// Register a symbol already in a schematic list with its component.
#[derive(Debug)]
pub struct CmdSymbolRegister {
    schematic: Uuid,
    symbol: Uuid,
}

impl CmdSymbolRegister {
    pub fn new(schematic: Uuid, symbol: Uuid) -> Self {
        Self { schematic, symbol }
    }
}

impl Command for CmdSymbolRegister {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        self.perform_redo(project)?;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.unregister_symbol(&self.schematic, &self.symbol)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.register_symbol(&self.schematic, &self.symbol)
    }
}

#[derive(Debug)]
pub struct CmdSymbolUnregister {
    schematic: Uuid,
    symbol: Uuid,
}

impl CmdSymbolUnregister {
    pub fn new(schematic: Uuid, symbol: Uuid) -> Self {
        Self { schematic, symbol }
    }
}

impl Command for CmdSymbolUnregister {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        self.perform_redo(project)?;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.register_symbol(&self.schematic, &self.symbol)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.unregister_symbol(&self.schematic, &self.symbol)
    }
}

/// Register the device of a component, already in a board list, with the
/// component.
#[derive(Debug)]
pub struct CmdDeviceRegister {
    board: Uuid,
    component: Uuid,
}

impl CmdDeviceRegister {
    pub fn new(board: Uuid, component: Uuid) -> Self {
        Self { board, component }
    }
}

impl Command for CmdDeviceRegister {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        self.perform_redo(project)?;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.unregister_device(&self.board, &self.component)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.register_device(&self.board, &self.component)
    }
}

#[derive(Debug)]
pub struct CmdDeviceUnregister {
    board: Uuid,
    component: Uuid,
}

impl CmdDeviceUnregister {
    pub fn new(board: Uuid, component: Uuid) -> Self {
        Self { board, component }
    }
}

impl Command for CmdDeviceUnregister {
    fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        self.perform_redo(project)?;
        Ok(true)
    }

    fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.register_device(&self.board, &self.component)
    }

    fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        project.unregister_device(&self.board, &self.component)
    }
}

/// Insert `symbol` into a schematic and register it and its pins.
pub fn add_symbol_to_schematic(schematic: Uuid, symbol: SymbolInstance) -> UndoCommand {
    let uuid = symbol.uuid;
    UndoCommand::new(
        "Add symbol",
        CommandGroup::new()
            .with_child(UndoCommand::new(
                "Insert symbol",
                CmdListElementInsert::<SchematicSymbols>::new(schematic, symbol, None),
            ))
            .with_child(UndoCommand::new(
                "Register symbol",
                CmdSymbolRegister::new(schematic, uuid),
            )),
    )
}

pub fn remove_symbol_from_schematic(schematic: Uuid, symbol: Uuid) -> UndoCommand {
    UndoCommand::new(
        "Remove symbol",
        CommandGroup::new()
            .with_child(UndoCommand::new(
                "Unregister symbol",
                CmdSymbolUnregister::new(schematic, symbol),
            ))
            .with_child(UndoCommand::new(
                "Remove symbol from list",
                CmdListElementRemove::<SchematicSymbols>::new(schematic, symbol),
            )),
    )
}

/// Insert `device` into a board and register it and its pads.
pub fn add_device_to_board(board: Uuid, device: DeviceInstance) -> UndoCommand {
    let component = device.component;
    UndoCommand::new(
        "Add device",
        CommandGroup::new()
            .with_child(UndoCommand::new(
                "Insert device",
                CmdListElementInsert::<BoardDevices>::new(board, device, None),
            ))
            .with_child(UndoCommand::new(
                "Register device",
                CmdDeviceRegister::new(board, component),
            )),
    )
}

pub fn remove_device_from_board(board: Uuid, component: Uuid) -> UndoCommand {
    UndoCommand::new(
        "Remove device",
        CommandGroup::new()
            .with_child(UndoCommand::new(
                "Unregister device",
                CmdDeviceUnregister::new(board, component),
            ))
            .with_child(UndoCommand::new(
                "Remove device from list",
                CmdListElementRemove::<BoardDevices>::new(board, component),
            )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::CmdComponentInstanceRemove;
    use crate::library::test_support::*;
    use crate::project::test_support::{project, BOARD, SCHEMATIC, SCHEMATIC_2};
    use crate::types::{Angle, Point};
    use crate::undo::UndoStack;

    fn add_component(project: &mut Project, lib: &Uuid) -> Uuid {
        let instance = project.create_component_instance(lib, None, None).unwrap();
        let uuid = instance.uuid();
        project.circuit_mut().add_component_instance(instance).unwrap();
        uuid
    }

    fn symbol(uuid: u128, component: Uuid, item: Uuid) -> SymbolInstance {
        SymbolInstance::new(Uuid::from_u128(uuid), component, item, Point::default(), Angle::deg0())
    }

    #[test]
    fn test_add_symbol_undo_restores_text() {
        let mut project = project();
        let r1 = add_component(&mut project, &RESISTOR);
        let mut stack = UndoStack::new();
        let before = project.to_text();

        stack
            .exec_cmd(add_symbol_to_schematic(SCHEMATIC, symbol(0xe001, r1, R_ITEM)), &mut project)
            .unwrap();
        let after = project.to_text();
        assert_eq!(
            project
                .circuit()
                .component_instance(&r1)
                .unwrap()
                .unplaced_required_symbol_count(),
            0
        );

        stack.undo(&mut project).unwrap();
        assert_eq!(project.to_text(), before);
        assert_eq!(
            project
                .circuit()
                .component_instance(&r1)
                .unwrap()
                .unplaced_required_symbol_count(),
            1
        );
        stack.redo(&mut project).unwrap();
        assert_eq!(project.to_text(), after);
    }

    #[test]
    fn test_second_schematic_rolls_back_insert() {
        let mut project = project();
        let u1 = add_component(&mut project, &MCU);
        let mut stack = UndoStack::new();
        stack
            .exec_cmd(add_symbol_to_schematic(SCHEMATIC, symbol(0xe001, u1, MCU_ITEM_A)), &mut project)
            .unwrap();
        let before = project.to_text();

        let result = stack.exec_cmd(
            add_symbol_to_schematic(SCHEMATIC_2, symbol(0xe002, u1, MCU_ITEM_B)),
            &mut project,
        );
        assert!(matches!(result, Err(CircuitError::SymbolsOnDifferentSchematics)));
        assert_eq!(project.to_text(), before);
        assert!(project.schematic(&SCHEMATIC_2).unwrap().symbols.is_empty());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_component_with_device_cannot_be_removed() {
        let mut project = project();
        let r1 = add_component(&mut project, &RESISTOR);
        let mut stack = UndoStack::new();
        stack
            .exec_cmd(
                add_device_to_board(BOARD, DeviceInstance::new(r1, R_DEVICE, Point::default(), Angle::deg0())),
                &mut project,
            )
            .unwrap();

        let result = stack.exec_cmd(
            UndoCommand::new("Remove", CmdComponentInstanceRemove::new(r1)),
            &mut project,
        );
        assert!(matches!(result, Err(CircuitError::ComponentInUse(_))));
        let instance = project.circuit().component_instance(&r1).unwrap();
        assert!(instance.is_added_to_circuit());
        assert_eq!(instance.registered_devices().len(), 1);
        assert!(project.board(&BOARD).unwrap().devices.contains_key(&r1));
    }

    #[test]
    fn test_remove_device_then_component() {
        let mut project = project();
        let r1 = add_component(&mut project, &RESISTOR);
        let mut stack = UndoStack::new();
        stack
            .exec_cmd(
                add_device_to_board(BOARD, DeviceInstance::new(r1, R_DEVICE, Point::default(), Angle::deg0())),
                &mut project,
            )
            .unwrap();
        stack
            .exec_cmd(remove_device_from_board(BOARD, r1), &mut project)
            .unwrap();
        stack
            .exec_cmd(UndoCommand::new("Remove", CmdComponentInstanceRemove::new(r1)), &mut project)
            .unwrap();
        assert!(project.circuit().component_instance(&r1).is_none());

        stack.undo(&mut project).unwrap();
        stack.undo(&mut project).unwrap();
        let instance = project.circuit().component_instance(&r1).unwrap();
        assert_eq!(instance.registered_devices().len(), 1);
    }

    #[test]
    fn test_remove_symbol_with_connected_pin_fails() {
        let mut project = project();
        let r1 = add_component(&mut project, &RESISTOR);
        let mut stack = UndoStack::new();
        stack
            .exec_cmd(add_symbol_to_schematic(SCHEMATIC, symbol(0xe001, r1, R_ITEM)), &mut project)
            .unwrap();
        project
            .set_symbol_pin_connected(&SCHEMATIC, &Uuid::from_u128(0xe001), &R_PIN2, true)
            .unwrap();
        let result = stack.exec_cmd(
            remove_symbol_from_schematic(SCHEMATIC, Uuid::from_u128(0xe001)),
            &mut project,
        );
        assert!(matches!(result, Err(CircuitError::StillConnected { .. })));
        assert_eq!(project.schematic(&SCHEMATIC).unwrap().symbols.len(), 1);
    }
}
