//! Change notifications delivered to column observers.
//!
//! Observers are held weakly; a dropped observer is pruned on the next
//! emission. Delivery happens after the emitting column has released every
//! internal borrow, so a handler may read from or write to that column.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnEvent {
    RowsAboutToBeInserted { position: usize, count: usize },
    RowsInserted { position: usize, count: usize },
    RowsAboutToBeRemoved { position: usize, count: usize },
    RowsRemoved { position: usize, count: usize },
    DataAboutToChange,
    DataChanged,
    ModeAboutToChange,
    ModeChanged,
    MaskingChanged,
    FormulaChanged,
    WidthChanged,
    PlotDesignationChanged,
    AboutToBeRemoved,
}

impl ColumnEvent {
    /// Events after which dependent formula columns recompute.
    pub fn affects_values(&self) -> bool {
        matches!(
            self,
            ColumnEvent::DataChanged
                | ColumnEvent::ModeChanged
                | ColumnEvent::MaskingChanged
                | ColumnEvent::RowsInserted { .. }
                | ColumnEvent::RowsRemoved { .. }
        )
    }
}

pub trait ColumnObserver {
    fn on_column_event(&self, column: &Column, event: &ColumnEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
pub(crate) struct ObserverList {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(ObserverId, Weak<dyn ColumnObserver>)>>,
}

impl ObserverList {
    pub(crate) fn subscribe(&self, observer: Weak<dyn ColumnObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(eid, _)| *eid != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Live observers at the moment of the call; dead ones are dropped.
    fn snapshot(&self) -> Vec<Rc<dyn ColumnObserver>> {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|(_, w)| w.strong_count() > 0);
        entries.iter().filter_map(|(_, w)| w.upgrade()).collect()
    }

    pub(crate) fn emit(&self, column: &Column, event: ColumnEvent) {
        for observer in self.snapshot() {
            observer.on_column_event(column, &event);
        }
    }
}

/// Records every event it sees; handy for asserting emission order.
#[derive(Default)]
pub struct EventRecorder {
    events: RefCell<Vec<ColumnEvent>>,
}

impl EventRecorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ColumnEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<ColumnEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl ColumnObserver for EventRecorder {
    fn on_column_event(&self, _column: &Column, event: &ColumnEvent) {
        self.events.borrow_mut().push(*event);
    }
}
