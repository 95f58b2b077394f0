/// Holds the inactive half of a swap-based command.
///
/// The first `redo` primes the slot with the post-edit state; from then on
/// `redo` and `undo` both exchange the slot with the live state, so each
/// step after the first is O(1).
#[derive(Debug)]
pub struct SwapSlot<T> {
    inactive: Option<T>,
}

impl<T> Default for SwapSlot<T> {
    fn default() -> Self {
        Self { inactive: None }
    }
}

impl<T> SwapSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_primed(&self) -> bool {
        self.inactive.is_some()
    }

    pub fn prime(&mut self, value: T) {
        self.inactive = Some(value);
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.inactive.as_mut()
    }

    /// Exchange with `live`. Does nothing on an unprimed slot.
    pub fn swap(&mut self, live: &mut T) -> bool {
        match self.inactive.as_mut() {
            Some(held) => {
                std::mem::swap(held, live);
                true
            }
            None => false,
        }
    }
}
