//! Integration tests for the circuit model and its undoable commands.

use circuitry::cmd::{
    add_device_to_board, add_symbol_to_schematic, CmdCompSigInstSetNetSignal,
    CmdComponentInstanceAdd, CmdComponentInstanceRemove, CmdNetClassAdd, CmdNetSignalAdd,
    CmdNetSignalEdit, CmdNetSignalSetNetClass,
};
use circuitry::erc::ErcCategory;
use circuitry::project::{DeviceInstance, SymbolInstance};
use circuitry::types::{Angle, Point};
use circuitry::undo::CommandGroup;
use circuitry::{
    CheckOptions, CircuitError, CircuitEvent, CircuitryCore, CircuitryError, Project, UndoCommand,
    LibraryError, UndoStack, Uuid,
};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const RESISTOR: Uuid = Uuid::from_u128(0x100);
const R_SIG2: Uuid = Uuid::from_u128(0x102);
const R_ITEM: Uuid = Uuid::from_u128(0x111);
const R_DEVICE: Uuid = Uuid::from_u128(0x130);
const MCU: Uuid = Uuid::from_u128(0x200);
const MCU_VCC: Uuid = Uuid::from_u128(0x201);
const MCU_ITEM_A: Uuid = Uuid::from_u128(0x211);
const MCU_ITEM_B: Uuid = Uuid::from_u128(0x212);
const NET_VCC: Uuid = Uuid::from_u128(0x5001);
const U1: Uuid = Uuid::from_u128(0x6001);
const R1: Uuid = Uuid::from_u128(0x6002);
const MAIN: Uuid = Uuid::from_u128(0xa001);
const POWER: Uuid = Uuid::from_u128(0xa002);
const PCB: Uuid = Uuid::from_u128(0xb001);

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_demo() -> Project {
    let dir = fixtures_dir();
    CircuitryCore::load_project(&dir.join("demo.cirp"), &dir.join("library.json"))
        .expect("Failed to load demo project")
}

fn erc_visible(project: &Project, category: ErcCategory, owner_text: &str) -> Option<String> {
    project
        .circuit()
        .erc()
        .iter()
        .find(|entry| entry.key.category == category && entry.text.contains(owner_text))
        .map(|entry| entry.text.clone())
}

fn new_symbol(uuid: u128, component: Uuid, item: Uuid) -> SymbolInstance {
    SymbolInstance::new(Uuid::from_u128(uuid), component, item, Point::default(), Angle::deg0())
}

#[test]
fn test_load_demo_project() {
    let project = load_demo();
    assert_eq!(project.name(), "Demo");
    assert_eq!(project.circuit().component_instances().count(), 2);
    assert_eq!(project.circuit().net_signals().count(), 2);

    let u1 = project.circuit().component_instance(&U1).unwrap();
    assert_eq!(u1.unplaced_required_symbol_count(), 1);
    let r1 = project.circuit().component_instance(&R1).unwrap();
    assert_eq!(r1.registered_devices().len(), 1);
    assert_eq!(r1.resolved_value(project.circuit().project_scope()), "10kΩ");
}

#[test]
fn test_demo_report() {
    let dir = fixtures_dir();
    let report = CircuitryCore::check_files(
        &dir.join("demo.cirp"),
        &dir.join("library.json"),
        &CheckOptions::default(),
    )
    .unwrap();
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.warnings, 0);
    assert_eq!(report.findings[0].category, ErcCategory::UnplacedRequiredSymbols);
    assert_eq!(
        report.findings[0].message,
        "Unplaced required symbols of component \"U1\": 1"
    );
}

#[test]
fn test_dangling_net_reference_fails_to_load() {
    let dir = fixtures_dir();
    let result = CircuitryCore::load_project(&dir.join("broken_net.cirp"), &dir.join("library.json"));
    assert!(matches!(
        result,
        Err(CircuitryError::Circuit(CircuitError::NetSignalNotFound(_)))
    ));
}

#[test]
fn test_serialization_roundtrip_is_identical() {
    let project = load_demo();
    let text = project.to_text();
    let reloaded = Project::from_text(&text, project.library().clone()).unwrap();
    assert_eq!(reloaded.to_text(), text);
}

/// Run `cmd`, then check that undo restores the text before and redo the
/// text after execution.
fn assert_reversible(project: &mut Project, cmd: UndoCommand) {
    let mut stack = UndoStack::new();
    let before = project.to_text();
    assert!(stack.exec_cmd(cmd, project).unwrap());
    let after = project.to_text();
    assert_ne!(before, after);

    stack.undo(project).unwrap();
    assert_eq!(project.to_text(), before);
    stack.redo(project).unwrap();
    assert_eq!(project.to_text(), after);
}

#[test]
fn test_commands_are_reversible() {
    let mut project = load_demo();
    assert_reversible(
        &mut project,
        add_symbol_to_schematic(MAIN, new_symbol(0xc003, U1, MCU_ITEM_B)),
    );
    assert_reversible(
        &mut project,
        UndoCommand::new("Disconnect", CmdCompSigInstSetNetSignal::new(R1, Uuid::from_u128(0x101), None)),
    );
    assert_reversible(
        &mut project,
        UndoCommand::new("Rename", CmdNetSignalEdit::new(NET_VCC, "PWR", false)),
    );
    let instance = project.create_component_instance(&MCU, None, None).unwrap();
    assert_reversible(
        &mut project,
        UndoCommand::new("Add", CmdComponentInstanceAdd::new(instance)),
    );
}

#[test]
fn test_composite_failure_at_every_position_is_atomic() {
    let base = load_demo();
    let net = Uuid::from_u128(0x5003);
    let valid: Vec<fn() -> UndoCommand> = vec![
        || UndoCommand::new("Add net", CmdNetSignalAdd::new(Uuid::from_u128(0x5003), Some("SIG"))),
        || {
            UndoCommand::new(
                "Connect",
                CmdCompSigInstSetNetSignal::new(R1, R_SIG2, Some(Uuid::from_u128(0x5003))),
            )
        },
        || add_symbol_to_schematic(MAIN, new_symbol(0xc003, U1, MCU_ITEM_B)),
        || UndoCommand::new("Rename", CmdNetSignalEdit::new(NET_VCC, "PWR", false)),
    ];

    for k in 0..=valid.len() {
        let mut project = Project::from_text(&base.to_text(), base.library().clone()).unwrap();
        let before = project.to_text();
        let mut group = CommandGroup::new();
        for (i, make) in valid.iter().enumerate() {
            if i == k {
                group = group.with_child(UndoCommand::new(
                    "Duplicate net",
                    CmdNetSignalAdd::new(Uuid::from_u128(0x5004), Some("GND")),
                ));
            }
            group = group.with_child(make());
        }
        if k == valid.len() {
            group = group.with_child(UndoCommand::new(
                "Duplicate net",
                CmdNetSignalAdd::new(Uuid::from_u128(0x5004), Some("GND")),
            ));
        }

        let mut stack = UndoStack::new();
        let result = stack.exec_cmd(UndoCommand::new("Composite", group), &mut project);
        assert!(
            matches!(result, Err(CircuitError::DuplicateNetSignalName(_))),
            "k = {k}"
        );
        assert_eq!(project.to_text(), before, "k = {k}");
        assert!(project.circuit().net_signal(&net).is_none());
        assert!(stack.is_empty());
    }
}

#[test]
fn test_exec_after_undo_discards_redo() {
    let mut project = load_demo();
    let mut stack = UndoStack::new();
    stack
        .exec_cmd(UndoCommand::new("Rename", CmdNetSignalEdit::new(NET_VCC, "PWR", false)), &mut project)
        .unwrap();
    stack.undo(&mut project).unwrap();
    stack
        .exec_cmd(UndoCommand::new("Rename", CmdNetSignalEdit::new(NET_VCC, "VDD", false)), &mut project)
        .unwrap();
    assert!(!stack.can_redo());
    stack.redo(&mut project).unwrap();
    assert_eq!(project.circuit().net_signal(&NET_VCC).unwrap().name(), "VDD");
}

#[test]
fn test_unplaced_required_symbols_scenario() {
    let mut project = load_demo();
    let mut stack = UndoStack::new();
    let instance = project.create_component_instance(&MCU, None, Some("U2")).unwrap();
    let u2 = instance.uuid();
    stack
        .exec_cmd(UndoCommand::new("Add", CmdComponentInstanceAdd::new(instance)), &mut project)
        .unwrap();
    assert_eq!(
        erc_visible(&project, ErcCategory::UnplacedRequiredSymbols, "\"U2\"").as_deref(),
        Some("Unplaced required symbols of component \"U2\": 2")
    );

    stack
        .exec_cmd(add_symbol_to_schematic(POWER, new_symbol(0xd001, u2, MCU_ITEM_A)), &mut project)
        .unwrap();
    assert_eq!(
        erc_visible(&project, ErcCategory::UnplacedRequiredSymbols, "\"U2\"").as_deref(),
        Some("Unplaced required symbols of component \"U2\": 1")
    );
    stack
        .exec_cmd(add_symbol_to_schematic(POWER, new_symbol(0xd002, u2, MCU_ITEM_B)), &mut project)
        .unwrap();
    assert!(erc_visible(&project, ErcCategory::UnplacedRequiredSymbols, "\"U2\"").is_none());

    let u2 = project.circuit().component_instance(&u2).unwrap();
    assert_eq!(u2.unplaced_required_symbol_count(), 0);
}

#[test]
fn test_forced_net_name_scenario() {
    let mut project = load_demo();
    assert!(erc_visible(&project, ErcCategory::ForcedNetSignalNameConflict, "U1").is_none());

    let mut stack = UndoStack::new();
    stack
        .exec_cmd(UndoCommand::new("Rename", CmdNetSignalEdit::new(NET_VCC, "PWR", false)), &mut project)
        .unwrap();
    let text = erc_visible(&project, ErcCategory::ForcedNetSignalNameConflict, "U1").unwrap();
    assert!(text.contains("PWR"));
    assert!(text.contains("VCC"));

    stack.undo(&mut project).unwrap();
    assert!(erc_visible(&project, ErcCategory::ForcedNetSignalNameConflict, "U1").is_none());
}

#[test]
fn test_remove_component_with_device_scenario() {
    let mut project = load_demo();
    let before = project.to_text();
    let mut stack = UndoStack::new();
    let result = stack.exec_cmd(UndoCommand::new("Remove", CmdComponentInstanceRemove::new(R1)), &mut project);
    assert!(matches!(result, Err(CircuitError::ComponentInUse(_))));

    let r1 = project.circuit().component_instance(&R1).unwrap();
    assert!(r1.is_added_to_circuit());
    assert_eq!(r1.registered_devices().len(), 1);
    assert_eq!(project.to_text(), before);
}

#[test]
fn test_setting_same_net_emits_nothing() {
    let mut project = load_demo();
    project.circuit_mut().drain_events();
    let erc_before: Vec<String> = project.circuit().erc().iter().map(|e| e.text.clone()).collect();

    let mut stack = UndoStack::new();
    let modified = stack
        .exec_cmd(
            UndoCommand::new("Connect", CmdCompSigInstSetNetSignal::new(U1, MCU_VCC, Some(NET_VCC))),
            &mut project,
        )
        .unwrap();
    assert!(!modified);
    assert!(project.circuit_mut().drain_events().is_empty());
    let erc_after: Vec<String> = project.circuit().erc().iter().map(|e| e.text.clone()).collect();
    assert_eq!(erc_before, erc_after);
}

#[test]
fn test_events_follow_mutations() {
    let mut project = load_demo();
    project.circuit_mut().drain_events();
    let mut stack = UndoStack::new();
    stack
        .exec_cmd(UndoCommand::new("Rename", CmdNetSignalEdit::new(NET_VCC, "PWR", false)), &mut project)
        .unwrap();
    let events = project.circuit_mut().drain_events();
    assert!(events.iter().any(|e| matches!(e, CircuitEvent::ErcMessageAdded(_))));
    assert_eq!(
        events.last(),
        Some(&CircuitEvent::NetSignalNameChanged {
            uuid: NET_VCC,
            name: "PWR".to_string(),
        })
    );
}

#[test]
fn test_add_then_remove_leaves_detached_instance() {
    let mut project = load_demo();
    let instance = project.create_component_instance(&RESISTOR, None, None).unwrap();
    let uuid = instance.uuid();
    assert_eq!(instance.name(), "R2");
    project.circuit_mut().add_component_instance(instance).unwrap();
    let removed = project.circuit_mut().remove_component_instance(&uuid).unwrap();
    assert!(!removed.is_added_to_circuit());
    assert_eq!(removed.registered_symbols().count(), 0);
    assert!(removed.registered_devices().is_empty());
    assert!(removed.signals().all(|s| !s.is_used()));
}

#[test]
fn test_symbols_on_second_schematic_rejected() {
    let mut project = load_demo();
    let before = project.to_text();
    let mut stack = UndoStack::new();
    let result = stack.exec_cmd(
        add_symbol_to_schematic(POWER, new_symbol(0xc003, U1, MCU_ITEM_B)),
        &mut project,
    );
    match result {
        Err(e) => assert_eq!(
            e.to_string(),
            "All symbols of a component must be placed in the same schematic."
        ),
        Ok(_) => panic!("symbol placed on a second schematic"),
    }
    assert_eq!(project.to_text(), before);
}

#[test]
fn test_second_device_on_same_board_rejected() {
    let mut project = load_demo();
    let mut stack = UndoStack::new();
    let result = stack.exec_cmd(
        add_device_to_board(PCB, DeviceInstance::new(R1, R_DEVICE, Point::default(), Angle::deg0())),
        &mut project,
    );
    assert!(matches!(result, Err(CircuitError::List(_))));
    assert_eq!(project.board(&PCB).unwrap().devices.len(), 1);
}

#[test]
fn test_symbol_of_placed_item_rejected() {
    let mut project = load_demo();
    let mut stack = UndoStack::new();
    let result = stack.exec_cmd(
        add_symbol_to_schematic(MAIN, new_symbol(0xc003, R1, R_ITEM)),
        &mut project,
    );
    assert!(matches!(result, Err(CircuitError::SymbolAlreadyPlaced { .. })));
    assert_eq!(project.schematic(&MAIN).unwrap().symbols.len(), 2);
}

#[test]
#[should_panic(expected = "undone without being executed")]
fn test_undo_before_execute_panics() {
    let mut project = load_demo();
    let mut cmd = UndoCommand::new("Rename", CmdNetSignalEdit::new(NET_VCC, "PWR", false));
    cmd.undo(&mut project);
}

#[test]
fn test_library_with_pin_mapped_twice_is_rejected() {
    let dir = fixtures_dir();
    let json = std::fs::read_to_string(dir.join("library.json")).unwrap();
    let pin = r#"{ "pin": "00000000-0000-0000-0000-000000000121", "signal": "00000000-0000-0000-0000-000000000101" },"#;
    assert!(json.contains(pin));
    let broken = json.replacen(pin, &format!("{pin}\n{pin}"), 1);
    let mut library = NamedTempFile::new().unwrap();
    library.write_all(broken.as_bytes()).unwrap();

    let result = CircuitryCore::load_project(&dir.join("demo.cirp"), library.path());
    assert!(matches!(
        result,
        Err(CircuitryError::Library(LibraryError::Invalid { .. }))
    ));
}

#[test]
fn test_net_class_scenario() {
    let mut project = load_demo();
    let mut stack = UndoStack::new();
    let class = Uuid::from_u128(0xd001);
    let original = project.to_text();
    let unused_classes = |project: &Project| {
        project
            .circuit()
            .erc()
            .iter()
            .filter(|entry| entry.key.category == ErcCategory::UnusedNetClass)
            .count()
    };

    stack
        .exec_cmd(UndoCommand::new("Add class", CmdNetClassAdd::new(class, "Power")), &mut project)
        .unwrap();
    assert_eq!(
        erc_visible(&project, ErcCategory::UnusedNetClass, "Power").as_deref(),
        Some("Unused net class: \"Power\"")
    );

    stack
        .exec_cmd(
            UndoCommand::new("Set class", CmdNetSignalSetNetClass::new(NET_VCC, Some(class))),
            &mut project,
        )
        .unwrap();
    assert_eq!(unused_classes(&project), 0);
    let text = project.to_text();
    assert!(text.contains("(netclass 00000000-0000-0000-0000-00000000d001)"));

    let reloaded = Project::from_text(&text, project.library().clone()).unwrap();
    assert_eq!(reloaded.to_text(), text);
    assert!(reloaded.circuit().net_class(&class).unwrap().is_used());

    stack.undo(&mut project).unwrap();
    assert_eq!(unused_classes(&project), 1);
    stack.undo(&mut project).unwrap();
    assert_eq!(project.to_text(), original);
    assert_eq!(unused_classes(&project), 0);
}
