//! Reversible column edits and the stack that records them.
//!
//! Every public mutator of [`crate::Column`] builds a [`Command`]. A column
//! attached to an [`UndoStack`] pushes it there (which runs `redo` once);
//! an unattached column runs `redo` and drops the command.

pub mod column_cmds;
pub mod swap;

use std::cell::RefCell;

pub use column_cmds::*;
pub use swap::SwapSlot;

pub trait Command {
    fn redo(&mut self);
    fn undo(&mut self);
    fn text(&self) -> String;
}

/// Several commands undone and redone as one step.
pub struct MacroCommand {
    text: String,
    children: Vec<Box<dyn Command>>,
}

impl MacroCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Command for MacroCommand {
    fn redo(&mut self) {
        for child in self.children.iter_mut() {
            child.redo();
        }
    }

    fn undo(&mut self) {
        for child in self.children.iter_mut().rev() {
            child.undo();
        }
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

#[derive(Default)]
struct StackState {
    done: Vec<Box<dyn Command>>,
    undone: Vec<Box<dyn Command>>,
    open_macros: Vec<MacroCommand>,
}

/// Linear undo history with nested macro grouping.
///
/// The internal state is never borrowed while a command runs, so a command
/// whose notifications trigger further pushes does not conflict.
#[derive(Default)]
pub struct UndoStack {
    state: RefCell<StackState>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute `cmd` and record it. Clears the redo history unless a macro
    /// is open, in which case the command joins that macro.
    pub fn push(&self, mut cmd: Box<dyn Command>) {
        #[cfg(feature = "tracing")]
        tracing::debug!(command = %cmd.text(), "push");

        cmd.redo();
        let dropped = {
            let mut state = self.state.borrow_mut();
            if let Some(open) = state.open_macros.last_mut() {
                open.children.push(cmd);
                Vec::new()
            } else {
                state.done.push(cmd);
                std::mem::take(&mut state.undone)
            }
        };
        drop(dropped);
    }

    pub fn begin_macro(&self, text: impl Into<String>) {
        self.state
            .borrow_mut()
            .open_macros
            .push(MacroCommand::new(text));
    }

    /// Close the innermost macro. An empty macro leaves no undo step.
    pub fn end_macro(&self) {
        let dropped = {
            let mut state = self.state.borrow_mut();
            let Some(closed) = state.open_macros.pop() else {
                return;
            };
            if closed.is_empty() {
                return;
            }
            if let Some(parent) = state.open_macros.last_mut() {
                parent.children.push(Box::new(closed));
                Vec::new()
            } else {
                state.done.push(Box::new(closed));
                std::mem::take(&mut state.undone)
            }
        };
        drop(dropped);
    }

    pub fn is_in_macro(&self) -> bool {
        !self.state.borrow().open_macros.is_empty()
    }

    /// Undo the newest step. Returns `false` when there is nothing to undo
    /// or a macro is still open.
    pub fn undo(&self) -> bool {
        let cmd = {
            let mut state = self.state.borrow_mut();
            if !state.open_macros.is_empty() {
                return false;
            }
            state.done.pop()
        };
        let Some(mut cmd) = cmd else {
            return false;
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(command = %cmd.text(), "undo");
        cmd.undo();
        self.state.borrow_mut().undone.push(cmd);
        true
    }

    pub fn redo(&self) -> bool {
        let cmd = {
            let mut state = self.state.borrow_mut();
            if !state.open_macros.is_empty() {
                return false;
            }
            state.undone.pop()
        };
        let Some(mut cmd) = cmd else {
            return false;
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(command = %cmd.text(), "redo");
        cmd.redo();
        self.state.borrow_mut().done.push(cmd);
        true
    }

    pub fn can_undo(&self) -> bool {
        let state = self.state.borrow();
        state.open_macros.is_empty() && !state.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        let state = self.state.borrow();
        state.open_macros.is_empty() && !state.undone.is_empty()
    }

    pub fn undo_text(&self) -> Option<String> {
        self.state.borrow().done.last().map(|c| c.text())
    }

    pub fn redo_text(&self) -> Option<String> {
        self.state.borrow().undone.last().map(|c| c.text())
    }

    /// Number of recorded undo steps.
    pub fn count(&self) -> usize {
        self.state.borrow().done.len()
    }

    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.state.borrow_mut());
        drop(dropped);
    }
}
