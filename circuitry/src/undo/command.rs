use crate::circuit::CircuitError;
use crate::cmd::CommandKind;
use crate::project::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Initial,
    Executed,
    Undone,
}

/// A reversible modification of a [`Project`].
///
/// A command is executed exactly once and then alternates between undo and
/// redo. Any other sequence is a programming error and panics. Execution may
/// fail, in which case the project is unchanged; undo and redo only replay
/// validated changes, so a failure there panics as well.
#[derive(Debug)]
pub struct UndoCommand {
    text: String,
    state: CommandState,
    modified: bool,
    kind: CommandKind,
}

impl UndoCommand {
    pub fn new(text: impl Into<String>, kind: impl Into<CommandKind>) -> Self {
        Self {
            text: text.into(),
            state: CommandState::Initial,
            modified: false,
            kind: kind.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    /// Whether executing the command changed anything. Unmodified commands
    /// are never pushed to an undo stack.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        assert_eq!(
            self.state,
            CommandState::Initial,
            "Command \"{}\" executed twice",
            self.text
        );
        tracing::debug!(command = %self.text, "Execute");
        self.modified = self.kind.perform_execute(project)?;
        self.state = CommandState::Executed;
        Ok(self.modified)
    }

    pub fn undo(&mut self, project: &mut Project) {
        assert_eq!(
            self.state,
            CommandState::Executed,
            "Command \"{}\" undone without being executed",
            self.text
        );
        tracing::debug!(command = %self.text, "Undo");
        if self.modified {
            if let Err(e) = self.kind.perform_undo(project) {
                panic!("Undo of \"{}\" failed: {e}", self.text);
            }
        }
        self.state = CommandState::Undone;
    }

    pub fn redo(&mut self, project: &mut Project) {
        assert_eq!(
            self.state,
            CommandState::Undone,
            "Command \"{}\" redone without being undone",
            self.text
        );
        tracing::debug!(command = %self.text, "Redo");
        if self.modified {
            if let Err(e) = self.kind.perform_redo(project) {
                panic!("Redo of \"{}\" failed: {e}", self.text);
            }
        }
        self.state = CommandState::Executed;
    }

    /// Execute `child` and append it to this already executed group.
    pub(crate) fn append_child(&mut self, child: UndoCommand, project: &mut Project) -> Result<bool, CircuitError> {
        assert_eq!(
            self.state,
            CommandState::Executed,
            "Children can only be appended to an executed group"
        );
        let CommandKind::Group(group) = &mut self.kind else {
            panic!("Command \"{}\" is not a group", self.text);
        };
        let modified = group.exec_new_child(child, project)?;
        self.modified |= modified;
        Ok(modified)
    }
}

/// Ordered children executed as one step.
///
/// If a child fails, the children executed before it are undone in reverse
/// order before the error is returned.
#[derive(Debug, Default)]
pub struct CommandGroup {
    children: Vec<UndoCommand>,
}

impl CommandGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child to be run when the group is executed.
    pub fn with_child(mut self, child: UndoCommand) -> Self {
        self.children.push(child);
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> &[UndoCommand] {
        &self.children
    }

    pub(crate) fn perform_execute(&mut self, project: &mut Project) -> Result<bool, CircuitError> {
        let mut modified = false;
        for i in 0..self.children.len() {
            match self.children[i].execute(project) {
                Ok(child_modified) => modified |= child_modified,
                Err(e) => {
                    for executed in self.children[..i].iter_mut().rev() {
                        executed.undo(project);
                    }
                    return Err(e);
                }
            }
        }
        Ok(modified)
    }

    pub(crate) fn perform_undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        for child in self.children.iter_mut().rev() {
            child.undo(project);
        }
        Ok(())
    }

    pub(crate) fn perform_redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        for child in &mut self.children {
            child.redo(project);
        }
        Ok(())
    }

    /// Execute a child right away and keep it if it changed something.
    pub(crate) fn exec_new_child(&mut self, mut child: UndoCommand, project: &mut Project) -> Result<bool, CircuitError> {
        let modified = child.execute(project)?;
        if modified {
            self.children.push(child);
        }
        Ok(modified)
    }
}
