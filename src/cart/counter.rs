// Optimistic cart counter
//
// displayed = authoritative + pending_delta. An add bumps the pending
// delta immediately; a fresh fetch of the cart replaces the authoritative
// count and clears the delta. A failed add drops the delta.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartCounter {
    authoritative: usize,
    pending_delta: i64,
}

impl CartCounter {
    pub fn new(authoritative: usize) -> Self {
        Self {
            authoritative,
            pending_delta: 0,
        }
    }

    pub fn displayed(&self) -> usize {
        let shown = self.authoritative as i64 + self.pending_delta;
        shown.max(0) as usize
    }

    pub fn pending_delta(&self) -> i64 {
        self.pending_delta
    }

    pub fn increment(&mut self) {
        self.pending_delta += 1;
    }

    pub fn decrement(&mut self) {
        self.pending_delta -= 1;
    }

    /// Replace the authoritative count with a freshly fetched one
    pub fn reconcile(&mut self, authoritative: usize) {
        self.authoritative = authoritative;
        self.pending_delta = 0;
    }

    /// Discard optimistic changes
    pub fn rollback(&mut self) {
        self.pending_delta = 0;
    }
}
