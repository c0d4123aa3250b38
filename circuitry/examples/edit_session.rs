//! Edit session example: build a small circuit through the undo stack and
//! print the ERC messages after every step.

use circuitry::prelude::*;
use circuitry::project::SymbolInstance;
use circuitry::types::{Angle, Point};
use std::path::Path;
use std::sync::Arc;

fn print_erc(project: &Project) {
    let erc = project.circuit().erc();
    if erc.is_empty() {
        println!("  ERC: clean");
    }
    for entry in erc.iter() {
        println!("  {:<16} {}", entry.msg_type.as_str(), entry.text);
    }
}

fn main() -> Result<(), CircuitryError> {
    let library = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/library.json".to_string());
    let library = Path::new(&library);

    if !library.exists() {
        eprintln!("File not found: {}", library.display());
        eprintln!("Usage: cargo run --example edit_session [path/to/library.json]");
        std::process::exit(1);
    }

    let library = Arc::new(CircuitryCore::load_library(library)?);
    let resistor = library
        .components()
        .next()
        .map(|c| c.uuid)
        .ok_or_else(|| CircuitryError::Other("Library has no components".to_string()))?;

    let mut project = Project::new("Example", library);
    let sheet = Uuid::new_random();
    project.add_schematic(sheet, "Main")?;
    let mut stack = UndoStack::new();

    println!("Add component");
    let instance = project.create_component_instance(&resistor, None, None)?;
    let component = instance.uuid();
    let name = instance.name().to_string();
    stack.exec_cmd(UndoCommand::new("Add component", CmdComponentInstanceAdd::new(instance)), &mut project)?;
    print_erc(&project);

    println!("Place all symbols of {name}");
    let items: Vec<Uuid> = project
        .circuit()
        .component_instance(&component)
        .map(|c| c.symbol_variant().items.iter().map(|i| i.uuid).collect())
        .unwrap_or_default();
    stack.begin_cmd_group("Place symbols", &mut project)?;
    for item in items {
        let symbol = SymbolInstance::new(Uuid::new_random(), component, item, Point::default(), Angle::deg0());
        stack.append_to_cmd_group(add_symbol_to_schematic(sheet, symbol), &mut project)?;
    }
    stack.commit_cmd_group()?;
    print_erc(&project);

    println!("Undo: {}", stack.undo_text().unwrap_or("-"));
    stack.undo(&mut project)?;
    print_erc(&project);

    println!("Redo");
    stack.redo(&mut project)?;
    print_erc(&project);

    println!();
    println!("{}", project.to_text());
    Ok(())
}
