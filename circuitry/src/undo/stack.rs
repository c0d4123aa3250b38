use super::command::{CommandGroup, UndoCommand};
use crate::circuit::CircuitError;
use crate::project::Project;

/// History of executed commands with undo/redo navigation.
///
/// Commands left of the cursor can be undone, commands right of it redone.
/// Executing a new command drops everything right of the cursor. While a
/// command group is active, commands are appended to the group instead and
/// undo/redo are refused.
#[derive(Debug)]
pub struct UndoStack {
    commands: Vec<UndoCommand>,
    current: usize,
    clean_index: Option<usize>,
    active_group: Option<UndoCommand>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            current: 0,
            clean_index: Some(0),
            active_group: None,
        }
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_command_group_active(&self) -> bool {
        self.active_group.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.active_group.is_none() && self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.active_group.is_none() && self.current < self.commands.len()
    }

    pub fn undo_text(&self) -> Option<&str> {
        self.can_undo().then(|| self.commands[self.current - 1].text())
    }

    pub fn redo_text(&self) -> Option<&str> {
        self.can_redo().then(|| self.commands[self.current].text())
    }

    pub fn is_clean(&self) -> bool {
        self.active_group.is_none() && self.clean_index == Some(self.current)
    }

    pub fn set_clean(&mut self) {
        self.clean_index = Some(self.current);
    }

    /// Forget the whole history. Not allowed while a group is active.
    pub fn clear(&mut self) -> Result<(), CircuitError> {
        if self.active_group.is_some() {
            return Err(CircuitError::CommandGroupActive);
        }
        self.commands.clear();
        self.current = 0;
        self.clean_index = Some(0);
        Ok(())
    }

    /// Execute `cmd` and push it, unless it changed nothing.
    pub fn exec_cmd(&mut self, mut cmd: UndoCommand, project: &mut Project) -> Result<bool, CircuitError> {
        if self.active_group.is_some() {
            return Err(CircuitError::CommandGroupActive);
        }
        let modified = cmd.execute(project)?;
        if modified {
            self.push(cmd);
        }
        Ok(modified)
    }

    pub fn begin_cmd_group(&mut self, text: impl Into<String>, project: &mut Project) -> Result<(), CircuitError> {
        if self.active_group.is_some() {
            return Err(CircuitError::CommandGroupActive);
        }
        let mut group = UndoCommand::new(text, CommandGroup::new());
        group.execute(project)?;
        tracing::debug!(group = %group.text(), "Command group started");
        self.active_group = Some(group);
        Ok(())
    }

    pub fn append_to_cmd_group(&mut self, cmd: UndoCommand, project: &mut Project) -> Result<bool, CircuitError> {
        let group = self
            .active_group
            .as_mut()
            .ok_or(CircuitError::NoActiveCommandGroup)?;
        group.append_child(cmd, project)
    }

    /// Close the active group. It becomes one undo step if anything in it
    /// changed the project.
    pub fn commit_cmd_group(&mut self) -> Result<bool, CircuitError> {
        let group = self
            .active_group
            .take()
            .ok_or(CircuitError::NoActiveCommandGroup)?;
        let modified = group.is_modified();
        tracing::debug!(group = %group.text(), modified, "Command group committed");
        if modified {
            self.push(group);
        }
        Ok(modified)
    }

    /// Revert everything appended to the active group and drop it.
    pub fn abort_cmd_group(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        let mut group = self
            .active_group
            .take()
            .ok_or(CircuitError::NoActiveCommandGroup)?;
        group.undo(project);
        tracing::debug!(group = %group.text(), "Command group aborted");
        Ok(())
    }

    pub fn undo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        if self.active_group.is_some() {
            return Err(CircuitError::CommandGroupActive);
        }
        if self.current == 0 {
            return Ok(());
        }
        self.current -= 1;
        self.commands[self.current].undo(project);
        Ok(())
    }

    pub fn redo(&mut self, project: &mut Project) -> Result<(), CircuitError> {
        if self.active_group.is_some() {
            return Err(CircuitError::CommandGroupActive);
        }
        if self.current >= self.commands.len() {
            return Ok(());
        }
        self.commands[self.current].redo(project);
        self.current += 1;
        Ok(())
    }

    fn push(&mut self, cmd: UndoCommand) {
        self.commands.truncate(self.current);
        if self.clean_index.is_some_and(|clean| clean > self.current) {
            self.clean_index = None;
        }
        self.commands.push(cmd);
        self.current += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::CircuitError;
    use crate::cmd::{CmdNetSignalAdd, CmdNetSignalEdit};
    use crate::project::test_support::project;
    use crate::types::Uuid;

    fn add_net(uuid: u128, name: &str) -> UndoCommand {
        UndoCommand::new(format!("Add {name}"), CmdNetSignalAdd::new(Uuid::from_u128(uuid), Some(name)))
    }

    fn net_names(project: &Project) -> Vec<String> {
        project
            .circuit()
            .net_signals()
            .map(|net| net.name().to_string())
            .collect()
    }

    #[test]
    fn test_undo_redo_moves_cursor() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack.exec_cmd(add_net(1, "A"), &mut project).unwrap();
        stack.exec_cmd(add_net(2, "B"), &mut project).unwrap();
        assert_eq!(stack.undo_text(), Some("Add B"));

        stack.undo(&mut project).unwrap();
        assert_eq!(net_names(&project), ["A"]);
        assert_eq!(stack.redo_text(), Some("Add B"));
        stack.redo(&mut project).unwrap();
        assert_eq!(net_names(&project), ["A", "B"]);
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_undo_at_bottom_is_noop() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack.undo(&mut project).unwrap();
        stack.redo(&mut project).unwrap();
        assert_eq!(stack.current_index(), 0);
    }

    #[test]
    fn test_exec_after_undo_discards_redo_tail() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack.exec_cmd(add_net(1, "A"), &mut project).unwrap();
        stack.exec_cmd(add_net(2, "B"), &mut project).unwrap();
        stack.undo(&mut project).unwrap();
        stack.exec_cmd(add_net(3, "C"), &mut project).unwrap();
        assert_eq!(stack.len(), 2);
        assert!(!stack.can_redo());
        assert_eq!(net_names(&project), ["A", "C"]);
    }

    #[test]
    fn test_failed_command_is_not_pushed() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack.exec_cmd(add_net(1, "A"), &mut project).unwrap();
        let result = stack.exec_cmd(add_net(2, "A"), &mut project);
        assert!(matches!(result, Err(CircuitError::DuplicateNetSignalName(_))));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_group_is_one_step() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack.begin_cmd_group("Add nets", &mut project).unwrap();
        assert!(!stack.can_undo());
        stack.append_to_cmd_group(add_net(1, "A"), &mut project).unwrap();
        stack.append_to_cmd_group(add_net(2, "B"), &mut project).unwrap();
        assert!(matches!(stack.undo(&mut project), Err(CircuitError::CommandGroupActive)));
        assert!(stack.commit_cmd_group().unwrap());

        assert_eq!(stack.len(), 1);
        stack.undo(&mut project).unwrap();
        assert!(net_names(&project).is_empty());
        stack.redo(&mut project).unwrap();
        assert_eq!(net_names(&project), ["A", "B"]);
    }

    #[test]
    fn test_empty_group_pushes_nothing() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack.exec_cmd(add_net(1, "A"), &mut project).unwrap();
        stack.begin_cmd_group("Rename", &mut project).unwrap();
        stack
            .append_to_cmd_group(
                UndoCommand::new("Rename", CmdNetSignalEdit::new(Uuid::from_u128(1), "A", false)),
                &mut project,
            )
            .unwrap();
        assert!(!stack.commit_cmd_group().unwrap());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_abort_group_reverts_children() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack.begin_cmd_group("Add nets", &mut project).unwrap();
        stack.append_to_cmd_group(add_net(1, "A"), &mut project).unwrap();
        stack.abort_cmd_group(&mut project).unwrap();
        assert!(net_names(&project).is_empty());
        assert!(stack.is_empty());
        assert!(matches!(stack.commit_cmd_group(), Err(CircuitError::NoActiveCommandGroup)));
    }

    #[test]
    fn test_exec_while_group_active_fails() {
        let mut project = project();
        let mut stack = UndoStack::new();
        stack.begin_cmd_group("Group", &mut project).unwrap();
        assert!(matches!(
            stack.exec_cmd(add_net(1, "A"), &mut project),
            Err(CircuitError::CommandGroupActive)
        ));
        assert!(matches!(stack.clear(), Err(CircuitError::CommandGroupActive)));
    }

    #[test]
    fn test_clean_state_tracking() {
        let mut project = project();
        let mut stack = UndoStack::new();
        assert!(stack.is_clean());
        stack.exec_cmd(add_net(1, "A"), &mut project).unwrap();
        assert!(!stack.is_clean());
        stack.set_clean();
        stack.undo(&mut project).unwrap();
        assert!(!stack.is_clean());
        stack.redo(&mut project).unwrap();
        assert!(stack.is_clean());

        stack.undo(&mut project).unwrap();
        stack.exec_cmd(add_net(2, "B"), &mut project).unwrap();
        assert!(!stack.is_clean());
    }

    #[test]
    #[should_panic(expected = "executed twice")]
    fn test_command_executes_once() {
        let mut project = project();
        let mut cmd = add_net(1, "A");
        cmd.execute(&mut project).unwrap();
        let _ = cmd.execute(&mut project);
    }
}
